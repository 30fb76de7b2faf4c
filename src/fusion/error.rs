use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
/// Errors returned by a fusion search. No partial ranking accompanies any of them.
pub enum FusionError {
    /// The query text could not be vectorized.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The query vector does not fit the facet index.
    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A facet lookup failed; the whole ranking is abandoned.
    #[error("retrieval failed for facet '{facet}' after {attempts} attempt(s): {source}")]
    Retrieval {
        facet: String,
        attempts: u32,
        #[source]
        source: VectorDbError,
    },

    #[error("invalid fusion configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Coarse failure category for callers that branch on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The query could not be encoded.
    Embedding,
    /// A facet lookup failed at the backend.
    Retrieval,
    /// The model, index and ranker settings disagree; no query can succeed.
    Config,
}

impl FusionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FusionError::DimensionMismatch { .. }
            | FusionError::Embedding(EmbeddingError::DimensionMismatch { .. })
            | FusionError::InvalidConfig { .. } => FailureKind::Config,
            FusionError::Embedding(_) => FailureKind::Embedding,
            FusionError::Retrieval { .. } => FailureKind::Retrieval,
        }
    }

    /// Facet that failed, for retrieval errors.
    pub fn facet(&self) -> Option<&str> {
        match self {
            FusionError::Retrieval { facet, .. } => Some(facet),
            _ => None,
        }
    }
}

pub type FusionResult<T> = Result<T, FusionError>;
