//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `OFFER_SEARCH_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_DIM, DEFAULT_NUM_CANDIDATES, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TOP_K,
};
use crate::embedding::DevicePreference;
use crate::fusion::{FacetSpec, FusionConfig, RetryPolicy, ScoreNormalization};
use crate::vectordb::VectorMetric;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `OFFER_SEARCH_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Qdrant endpoint URL, or `mock:` for the in-memory backend.
    pub qdrant_url: String,

    /// Collection holding the offer vectors. Default: `offer_search`.
    pub collection: String,

    /// Sentence model directory (config.json, tokenizer.json, model.safetensors).
    /// Unset runs the deterministic stub embedder.
    pub model_path: Option<PathBuf>,

    /// Compute device for the sentence model.
    pub device: DevicePreference,

    /// Dimension of the indexed facet vectors. Default: `768`.
    pub embedding_dim: usize,

    /// Facets queried per search. Default: brand, category, retailer.
    pub facets: Vec<FacetSpec>,

    /// Hits per facet, unless the facet sets its own. Default: `4`.
    pub top_k: u64,

    /// Candidate pool per facet lookup, unless the facet sets its own. Default: `1000`.
    pub num_candidates: u64,

    /// Distance the collection's vectors were indexed with.
    pub vector_metric: VectorMetric,

    pub score_normalization: ScoreNormalization,

    /// Lets the stub embedder serve a real Qdrant index. Default: `false`.
    pub allow_stub_embedder: bool,

    /// Attempts per facet lookup, including the first. Default: `3`.
    pub retry_attempts: u32,

    /// Initial retry delay in milliseconds. Default: `50`.
    pub retry_backoff_ms: u64,
}

/// Default Qdrant URL used when `OFFER_SEARCH_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            model_path: None,
            device: DevicePreference::Auto,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            facets: vec![
                FacetSpec::brand(),
                FacetSpec::category(),
                FacetSpec::retailer(),
            ],
            top_k: DEFAULT_TOP_K,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            vector_metric: VectorMetric::Cosine,
            score_normalization: ScoreNormalization::None,
            allow_stub_embedder: false,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "OFFER_SEARCH_PORT";
    const ENV_BIND_ADDR: &'static str = "OFFER_SEARCH_BIND_ADDR";
    const ENV_QDRANT_URL: &'static str = "OFFER_SEARCH_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "OFFER_SEARCH_COLLECTION";
    const ENV_MODEL_PATH: &'static str = "OFFER_SEARCH_MODEL_PATH";
    const ENV_DEVICE: &'static str = "OFFER_SEARCH_DEVICE";
    const ENV_EMBEDDING_DIM: &'static str = "OFFER_SEARCH_EMBEDDING_DIM";
    const ENV_FACETS: &'static str = "OFFER_SEARCH_FACETS";
    const ENV_TOP_K: &'static str = "OFFER_SEARCH_TOP_K";
    const ENV_NUM_CANDIDATES: &'static str = "OFFER_SEARCH_NUM_CANDIDATES";
    const ENV_VECTOR_METRIC: &'static str = "OFFER_SEARCH_VECTOR_METRIC";
    const ENV_SCORE_NORMALIZATION: &'static str = "OFFER_SEARCH_SCORE_NORMALIZATION";
    const ENV_ALLOW_STUB_EMBEDDER: &'static str = "OFFER_SEARCH_ALLOW_STUB_EMBEDDER";
    const ENV_RETRY_ATTEMPTS: &'static str = "OFFER_SEARCH_RETRY_ATTEMPTS";
    const ENV_RETRY_BACKOFF_MS: &'static str = "OFFER_SEARCH_RETRY_BACKOFF_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let device = Self::parse_from_env(Self::ENV_DEVICE, defaults.device)?;
        let embedding_dim =
            Self::parse_u64_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim as u64)
                as usize;
        let facets = Self::parse_facets_from_env(defaults.facets)?;
        let top_k = Self::parse_u64_from_env(Self::ENV_TOP_K, defaults.top_k);
        let num_candidates =
            Self::parse_u64_from_env(Self::ENV_NUM_CANDIDATES, defaults.num_candidates);
        let vector_metric = Self::parse_from_env(Self::ENV_VECTOR_METRIC, defaults.vector_metric)?;
        let score_normalization =
            Self::parse_from_env(Self::ENV_SCORE_NORMALIZATION, defaults.score_normalization)?;
        let allow_stub_embedder =
            Self::parse_bool_from_env(Self::ENV_ALLOW_STUB_EMBEDDER, defaults.allow_stub_embedder)?;
        let retry_attempts = Self::parse_u64_from_env(
            Self::ENV_RETRY_ATTEMPTS,
            u64::from(defaults.retry_attempts),
        )
        .min(u64::from(u32::MAX)) as u32;
        let retry_backoff_ms =
            Self::parse_u64_from_env(Self::ENV_RETRY_BACKOFF_MS, defaults.retry_backoff_ms);

        Ok(Self {
            port,
            bind_addr,
            qdrant_url,
            collection,
            model_path,
            device,
            embedding_dim,
            facets,
            top_k,
            num_candidates,
            vector_metric,
            score_normalization,
            allow_stub_embedder,
            retry_attempts,
            retry_backoff_ms,
        })
    }

    /// Validates paths and basic invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_EMBEDDING_DIM,
                reason: "must be at least 1".to_string(),
            });
        }

        if self.qdrant_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_QDRANT_URL,
                reason: "must not be empty".to_string(),
            });
        }

        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_TOP_K,
                reason: "must be at least 1".to_string(),
            });
        }

        if self.num_candidates < self.top_k {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_NUM_CANDIDATES,
                reason: format!(
                    "{} is below {} ({})",
                    self.num_candidates,
                    Self::ENV_TOP_K,
                    self.top_k
                ),
            });
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_RETRY_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }

        self.fusion_config()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                name: Self::ENV_FACETS,
                reason: e.to_string(),
            })
    }

    /// Refuses the stub embedder in front of a real index unless explicitly allowed.
    pub fn check_stub_embedder(
        &self,
        embedder_is_stub: bool,
        backend_is_mock: bool,
    ) -> Result<(), ConfigError> {
        if embedder_is_stub && !backend_is_mock && !self.allow_stub_embedder {
            return Err(ConfigError::StubEmbedderNotAllowed {
                url: self.qdrant_url.clone(),
            });
        }
        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Ranker settings derived from this configuration.
    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig::default()
            .collection(&self.collection)
            .facets(self.facets.clone())
            .default_limits(self.top_k, self.num_candidates)
            .embedding_dim(self.embedding_dim)
            .normalization(self.score_normalization)
            .retry(RetryPolicy::new(
                self.retry_attempts,
                Duration::from_millis(self.retry_backoff_ms),
            ))
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    /// `name:VECTOR_FIELD[:FIELD|FIELD][@K/NUM_CANDIDATES]`, comma separated.
    fn parse_facets_from_env(default: Vec<FacetSpec>) -> Result<Vec<FacetSpec>, ConfigError> {
        let Some(value) = Self::non_empty_var(Self::ENV_FACETS) else {
            return Ok(default);
        };

        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<FacetSpec>()
                    .map_err(|e| ConfigError::InvalidValue {
                        name: Self::ENV_FACETS,
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::non_empty_var(var_name) {
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                name: var_name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match Self::non_empty_var(var_name) {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    reason: format!("expected true or false, got '{value}'"),
                }),
            },
            None => Ok(default),
        }
    }

    fn non_empty_var(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::non_empty_var(var_name).map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
