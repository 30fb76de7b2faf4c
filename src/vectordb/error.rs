use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by vector database operations.
pub enum VectorDbError {
    /// Could not connect to the Qdrant endpoint.
    #[error("failed to connect to Qdrant at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Collection does not exist.
    #[error("collection not found: {collection}")]
    CollectionNotFound {
        /// Collection name.
        collection: String,
    },

    /// Nearest-neighbour search failed.
    #[error("failed to search '{vector_field}' in '{collection}': {message}")]
    SearchFailed {
        /// Collection name.
        collection: String,
        /// Named vector that was queried.
        vector_field: String,
        /// Error message.
        message: String,
    },

    /// Query vector dimension mismatch.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// A hit came back with a score that cannot be ranked (non-finite or negative).
    #[error("unrankable score {score} for point '{point_id}' in '{vector_field}'")]
    InvalidScore {
        /// Named vector that was queried.
        vector_field: String,
        /// Offending point.
        point_id: String,
        /// Raw score.
        score: f32,
    },

    /// Search parameters were rejected before reaching the backend.
    #[error("invalid search request: {reason}")]
    InvalidRequest {
        /// Error message.
        reason: String,
    },
}

impl VectorDbError {
    /// `true` for failures a later attempt may not hit (network, server-side search errors).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VectorDbError::ConnectionFailed { .. } | VectorDbError::SearchFailed { .. }
        )
    }
}
