pub const SEARCH_STATUS_HEADER: &str = "X-Offer-Search-Status";
pub const SEARCH_STATUS_HEALTHY: &str = "healthy";
pub const SEARCH_STATUS_READY: &str = "ready";
pub const SEARCH_STATUS_PENDING: &str = "pending";

/// Message shown when a search matches nothing.
pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// Outcome of a successful search, as reported in the body and status header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Ok,
    NoResults,
}

impl SearchStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            SearchStatus::Ok => "ok",
            SearchStatus::NoResults => "no_results",
        }
    }

    #[inline]
    pub fn for_result_count(count: usize) -> Self {
        if count == 0 {
            SearchStatus::NoResults
        } else {
            SearchStatus::Ok
        }
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}
