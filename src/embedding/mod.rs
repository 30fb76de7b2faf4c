//! Query embedding.
//!
//! - [`QueryEmbedder`] is the seam the fusion ranker depends on.
//! - [`sentence`] provides the candle-backed implementation (with a stub mode).

/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Sentence-transformer embedder.
pub mod sentence;
/// Tokenizer loading helpers.
pub mod utils;

pub use device::DevicePreference;
pub use error::EmbeddingError;
pub use sentence::{EmbedderConfig, SENTENCE_EMBEDDING_DIM, SENTENCE_MAX_SEQ_LEN, SentenceEmbedder};

/// Maps query text to a vector in the shared facet embedding space.
///
/// Callers must pass non-empty text; implementations are not required to check.
/// Output must be deterministic for a fixed model.
pub trait QueryEmbedder: Send + Sync {
    /// Embeds `text`. Failures are returned to the caller unchanged.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimension of every vector returned by [`embed`](Self::embed).
    fn embedding_dim(&self) -> usize;

    /// `true` when the embedder produces placeholder vectors.
    fn is_stub(&self) -> bool {
        false
    }
}

impl<T: QueryEmbedder + ?Sized> QueryEmbedder for std::sync::Arc<T> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }

    fn is_stub(&self) -> bool {
        (**self).is_stub()
    }
}
