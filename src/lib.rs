//! Offer search library crate (used by the server binary and integration tests).
//!
//! A query is embedded once, looked up against every facet's named vector
//! (brand, category, retailer by default), and the per-facet hits are fused into
//! a single ranking by average similarity.
//!
//! # Public API Surface
//!
//! ## Fusion
//! - [`FusionRanker`] - embed, fan out, fuse, rank
//! - [`FusionConfig`], [`FacetSpec`], [`RetryPolicy`], [`ScoreNormalization`]
//! - [`fuse_and_rank`] - the I/O-free merge over already-fetched hits
//!
//! ## Embedding
//! - [`QueryEmbedder`] - embedder seam
//! - [`SentenceEmbedder`], [`EmbedderConfig`] - candle BERT embedder with stub mode
//!
//! ## Vector Database
//! - [`FacetSearchBackend`] - facet lookup seam
//! - [`QdrantFacetClient`], [`FacetBackend`] - Qdrant named-vector search
//!
//! ## Server
//! - [`Config`] - `OFFER_SEARCH_*` environment configuration
//! - [`gateway`] - axum router
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod fusion;
pub mod gateway;
pub mod vectordb;

pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use embedding::{
    DevicePreference, EmbedderConfig, EmbeddingError, QueryEmbedder, SENTENCE_EMBEDDING_DIM,
    SENTENCE_MAX_SEQ_LEN, SentenceEmbedder,
};
pub use fusion::{
    AggregatedResult, FacetSpec, FailureKind, FusionConfig, FusionError, FusionRanker,
    FusionResult, RankedResult, RetryPolicy, ScoreNormalization, SearchResultRow, fuse_and_rank,
};
pub use gateway::{HandlerState, SEARCH_STATUS_HEADER, create_router_with_state};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockFacetClient;
pub use vectordb::{
    DEFAULT_COLLECTION_NAME, FacetBackend, FacetHit, FacetQuery, FacetSearchBackend, Payload,
    QdrantFacetClient, VectorDbError, VectorMetric,
};
