use std::time::Duration;

use crate::constants::{
    BRAND_FACET, BRAND_FIELD, BRAND_VECTOR_FIELD, CATEGORY_FACET, CATEGORY_FIELD,
    CATEGORY_VECTOR_FIELD, DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_DIM, DEFAULT_NUM_CANDIDATES,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TOP_K, OFFER_FIELD, RETAILER_FACET,
    RETAILER_FIELD, RETAILER_VECTOR_FIELD,
};

use super::error::FusionError;

/// Upper bound on a single retry delay.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// One facet: a named vector field plus its lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSpec {
    /// Facet name reported in errors and results, e.g. `brand`.
    pub name: String,
    /// Named vector in the collection, e.g. `BRANDVECTOR`.
    pub vector_field: String,
    /// Top results per facet.
    pub k: u64,
    /// Backend candidate pool size.
    pub num_candidates: u64,
    /// Payload fields fetched with each hit.
    pub payload_fields: Vec<String>,
    /// `k` and `num_candidates` were set for this facet alone and survive
    /// [`FusionConfig::default_limits`].
    pub pinned_limits: bool,
}

impl FacetSpec {
    pub fn new(name: &str, vector_field: &str) -> Self {
        Self {
            name: name.to_string(),
            vector_field: vector_field.to_string(),
            k: DEFAULT_TOP_K,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            payload_fields: Vec::new(),
            pinned_limits: false,
        }
    }

    pub fn brand() -> Self {
        Self::new(BRAND_FACET, BRAND_VECTOR_FIELD).payload_fields(&[OFFER_FIELD, BRAND_FIELD])
    }

    pub fn category() -> Self {
        Self::new(CATEGORY_FACET, CATEGORY_VECTOR_FIELD)
            .payload_fields(&[OFFER_FIELD, CATEGORY_FIELD])
    }

    pub fn retailer() -> Self {
        Self::new(RETAILER_FACET, RETAILER_VECTOR_FIELD)
            .payload_fields(&[OFFER_FIELD, RETAILER_FIELD])
    }

    pub fn k(mut self, k: u64) -> Self {
        self.k = k;
        self
    }

    pub fn num_candidates(mut self, num_candidates: u64) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    /// Sets this facet's own `k` and `num_candidates`.
    pub fn limits(mut self, k: u64, num_candidates: u64) -> Self {
        self.k = k;
        self.num_candidates = num_candidates;
        self.pinned_limits = true;
        self
    }

    pub fn payload_fields(mut self, fields: &[&str]) -> Self {
        self.payload_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

/// Parses `name:VECTOR_FIELD[:FIELD|FIELD...][@K/NUM_CANDIDATES]`.
impl std::str::FromStr for FacetSpec {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FusionError::InvalidConfig {
            reason: format!(
                "facet '{s}' must look like name:VECTOR_FIELD[:FIELD|FIELD][@K/NUM_CANDIDATES]"
            ),
        };

        let (body, limits) = match s.trim().rsplit_once('@') {
            Some((body, limits)) => (body, Some(limits)),
            None => (s.trim(), None),
        };

        let mut parts = body.splitn(3, ':');
        let name = parts.next().map(str::trim).unwrap_or_default();
        let vector_field = parts.next().map(str::trim).unwrap_or_default();

        if name.is_empty() || vector_field.is_empty() {
            return Err(invalid());
        }

        let fields: Vec<&str> = parts
            .next()
            .map(|f| f.split('|').map(str::trim).filter(|f| !f.is_empty()).collect())
            .unwrap_or_default();

        let spec = Self::new(name, vector_field).payload_fields(&fields);

        match limits {
            None => Ok(spec),
            Some(limits) => {
                let (k, num_candidates) = limits.split_once('/').ok_or_else(invalid)?;
                let k = k.trim().parse().map_err(|_| invalid())?;
                let num_candidates = num_candidates.trim().parse().map_err(|_| invalid())?;
                Ok(spec.limits(k, num_candidates))
            }
        }
    }
}

/// Optional per-facet score rescaling applied before fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreNormalization {
    /// Use backend scores as-is; assumes all facets share one scale.
    #[default]
    None,
    /// Rescale each facet's hits to `[0, 1]` by its own min and max.
    MinMax,
}

impl std::str::FromStr for ScoreNormalization {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "minmax" | "min_max" | "min-max" => Ok(Self::MinMax),
            other => Err(FusionError::InvalidConfig {
                reason: format!("unknown score normalization '{other}'"),
            }),
        }
    }
}

/// Bounded exponential backoff for facet lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per lookup, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(factor)
            .min(MAX_RETRY_BACKOFF)
    }
}

#[derive(Debug, Clone)]
pub struct FusionConfig {
    pub collection: String,
    /// Facets queried per search, in merge order.
    pub facets: Vec<FacetSpec>,
    /// Dimension every query vector must have.
    pub embedding_dim: usize,
    pub normalization: ScoreNormalization,
    pub retry: RetryPolicy,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            facets: vec![
                FacetSpec::brand(),
                FacetSpec::category(),
                FacetSpec::retailer(),
            ],
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            normalization: ScoreNormalization::None,
            retry: RetryPolicy::default(),
        }
    }
}

impl FusionConfig {
    pub fn collection(mut self, name: &str) -> Self {
        self.collection = name.to_string();
        self
    }

    pub fn facets(mut self, facets: Vec<FacetSpec>) -> Self {
        self.facets = facets;
        self
    }

    /// Sets `k` on every facet.
    pub fn top_k(mut self, k: u64) -> Self {
        for facet in &mut self.facets {
            facet.k = k;
        }
        self
    }

    /// Sets `num_candidates` on every facet.
    pub fn num_candidates(mut self, num_candidates: u64) -> Self {
        for facet in &mut self.facets {
            facet.num_candidates = num_candidates;
        }
        self
    }

    /// Sets `k` and `num_candidates` on facets without their own limits.
    pub fn default_limits(mut self, k: u64, num_candidates: u64) -> Self {
        for facet in self.facets.iter_mut().filter(|f| !f.pinned_limits) {
            facet.k = k;
            facet.num_candidates = num_candidates;
        }
        self
    }

    pub fn embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn normalization(mut self, normalization: ScoreNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        let invalid = |reason: String| Err(FusionError::InvalidConfig { reason });

        if self.collection.trim().is_empty() {
            return invalid("collection must not be empty".to_string());
        }
        if self.facets.is_empty() {
            return invalid("at least one facet is required".to_string());
        }
        if self.embedding_dim == 0 {
            return invalid("embedding_dim must be > 0".to_string());
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be >= 1".to_string());
        }

        for (i, facet) in self.facets.iter().enumerate() {
            if facet.name.trim().is_empty() || facet.vector_field.trim().is_empty() {
                return invalid(format!("facet #{i} needs a name and a vector field"));
            }
            if facet.k == 0 {
                return invalid(format!("facet '{}': k must be > 0", facet.name));
            }
            if facet.num_candidates < facet.k {
                return invalid(format!(
                    "facet '{}': num_candidates ({}) cannot be less than k ({})",
                    facet.name, facet.num_candidates, facet.k
                ));
            }
            if self.facets[..i].iter().any(|f| f.name == facet.name) {
                return invalid(format!("duplicate facet name '{}'", facet.name));
            }
        }

        Ok(())
    }
}
