use std::sync::Arc;

use crate::embedding::QueryEmbedder;
use crate::fusion::FusionRanker;
use crate::vectordb::FacetSearchBackend;

/// Shared handler state: one ranker, built at startup, read by every request.
pub struct HandlerState<E, B>
where
    E: QueryEmbedder + 'static,
    B: FacetSearchBackend + 'static,
{
    pub ranker: Arc<FusionRanker<E, B>>,
}

impl<E, B> HandlerState<E, B>
where
    E: QueryEmbedder + 'static,
    B: FacetSearchBackend + 'static,
{
    pub fn new(ranker: FusionRanker<E, B>) -> Self {
        Self {
            ranker: Arc::new(ranker),
        }
    }

    pub fn from_shared(ranker: Arc<FusionRanker<E, B>>) -> Self {
        Self { ranker }
    }
}

impl<E, B> Clone for HandlerState<E, B>
where
    E: QueryEmbedder + 'static,
    B: FacetSearchBackend + 'static,
{
    fn clone(&self) -> Self {
        Self {
            ranker: Arc::clone(&self.ranker),
        }
    }
}
