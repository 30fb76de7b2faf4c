//! Qdrant vector database integration.
//!
//! Each offer is one point carrying a named vector per facet; a facet lookup is a
//! nearest-neighbour search against one of those named vectors.

pub mod backend;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use backend::FacetBackend;
pub use client::{FacetSearchBackend, QdrantFacetClient};
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockFacetClient;
pub use model::{FacetHit, FacetQuery, Payload, VectorMetric, cosine_similarity};

pub const DEFAULT_COLLECTION_NAME: &str = crate::constants::DEFAULT_COLLECTION_NAME;

pub const DEFAULT_VECTOR_SIZE: u64 = crate::constants::DEFAULT_VECTOR_SIZE_U64;
