//! Cross-cutting, shared constants.
//!
//! The facet layout mirrors the `offer_search` index: one collection, three named
//! vector fields of [`DEFAULT_EMBEDDING_DIM`] floats, plus plain-text payload fields.

pub const DEFAULT_EMBEDDING_DIM: usize = 768;
pub const DEFAULT_VECTOR_SIZE_U64: u64 = DEFAULT_EMBEDDING_DIM as u64;

/// Tokens accepted by the sentence model before input is rejected.
pub const DEFAULT_MAX_SEQ_LEN: usize = 384;

/// Nearest neighbours returned per facet.
pub const DEFAULT_TOP_K: u64 = 4;

/// Backend candidate pool size per facet lookup.
pub const DEFAULT_NUM_CANDIDATES: u64 = 1000;

pub const DEFAULT_COLLECTION_NAME: &str = "offer_search";

pub const BRAND_FACET: &str = "brand";
pub const CATEGORY_FACET: &str = "category";
pub const RETAILER_FACET: &str = "retailer";

pub const BRAND_VECTOR_FIELD: &str = "BRANDVECTOR";
pub const CATEGORY_VECTOR_FIELD: &str = "CATEGORYVECTOR";
pub const RETAILER_VECTOR_FIELD: &str = "RETAILERVECTOR";

pub const OFFER_FIELD: &str = "OFFER";
pub const BRAND_FIELD: &str = "BRAND";
pub const CATEGORY_FIELD: &str = "CATEGORY";
pub const RETAILER_FIELD: &str = "RETAILER";

/// Label shown for offers whose payload carries no [`OFFER_FIELD`].
pub const MISSING_OFFER_LABEL: &str = "No Offer Details";

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 50;

/// Checks that an embedding has the dimension the index was built with.
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::Mismatch { expected, actual });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimValidationError {
    #[error("embedding dimension cannot be zero")]
    ZeroDimension,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_embedding_dim_accepts_match() {
        assert!(validate_embedding_dim(768, DEFAULT_EMBEDDING_DIM).is_ok());
    }

    #[test]
    fn test_validate_embedding_dim_rejects_mismatch() {
        assert_eq!(
            validate_embedding_dim(384, 768),
            Err(DimValidationError::Mismatch {
                expected: 768,
                actual: 384
            })
        );
    }

    #[test]
    fn test_validate_embedding_dim_rejects_zero() {
        assert_eq!(
            validate_embedding_dim(0, 0),
            Err(DimValidationError::ZeroDimension)
        );
    }
}
