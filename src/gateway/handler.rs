use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::embedding::QueryEmbedder;
use crate::fusion::SearchResultRow;
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::gateway::status::{NO_RESULTS_MESSAGE, SEARCH_STATUS_HEADER, SearchStatus};
use crate::vectordb::FacetSearchBackend;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub results: Vec<SearchResultRow>,
}

impl SearchResponse {
    pub fn from_rows(results: Vec<SearchResultRow>) -> Self {
        let status = SearchStatus::for_result_count(results.len());
        let message = match status {
            SearchStatus::NoResults => Some(NO_RESULTS_MESSAGE),
            SearchStatus::Ok => None,
        };
        Self {
            status,
            message,
            results,
        }
    }
}

/// Checks the request shape and rejects blank queries before any model work.
///
/// The body is parsed here rather than by an extractor so malformed JSON still gets
/// the status header.
pub fn parse_search_request(body: &[u8]) -> Result<SearchRequest, GatewayError> {
    let request: SearchRequest = serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    if request.query.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "query must not be empty".to_string(),
        ));
    }

    Ok(request)
}

#[instrument(skip(state, body), fields(query_len = tracing::field::Empty))]
pub async fn search_handler<E, B>(
    State(state): State<HandlerState<E, B>>,
    body: Bytes,
) -> Result<Response, GatewayError>
where
    E: QueryEmbedder + 'static,
    B: FacetSearchBackend + 'static,
{
    let request = parse_search_request(&body)?;
    tracing::Span::current().record("query_len", request.query.len());

    let ranker = state.ranker.clone();
    let query = request.query;
    let vector = tokio::task::spawn_blocking(move || ranker.embed(&query))
        .await
        .map_err(|e| GatewayError::InternalError(format!("embedding task failed: {e}")))?
        .inspect_err(|e| warn!(error = %e, "Query embedding failed"))?;
    debug!(dim = vector.len(), "Query embedded");

    let ranked = state.ranker.rank_vector(&vector).await.inspect_err(|e| {
        warn!(error = %e, facet = e.facet(), "Fusion search failed");
    })?;

    let rows: Vec<SearchResultRow> = ranked.iter().map(SearchResultRow::from_ranked).collect();
    info!(results = rows.len(), "Search complete");

    Ok(make_response(SearchResponse::from_rows(rows)))
}

pub fn make_response(response: SearchResponse) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        SEARCH_STATUS_HEADER,
        HeaderValue::from_static(response.status.as_header_value()),
    );

    (StatusCode::OK, headers, Json(response)).into_response()
}
