use futures_util::future::try_join_all;
use tracing::{debug, info, instrument, warn};

use crate::constants::validate_embedding_dim;
use crate::embedding::QueryEmbedder;
use crate::vectordb::{FacetHit, FacetQuery, FacetSearchBackend, VectorDbError};

use super::aggregate::fuse_and_rank;
use super::config::{FacetSpec, FusionConfig};
use super::error::{FusionError, FusionResult};
use super::types::RankedResult;

/// Embeds a query, looks it up in every facet, and fuses the hits into one ranking.
///
/// Built once and shared read-only; nothing is cached between searches.
pub struct FusionRanker<E: QueryEmbedder, B: FacetSearchBackend> {
    embedder: E,
    backend: B,
    config: FusionConfig,
}

impl<E: QueryEmbedder, B: FacetSearchBackend> std::fmt::Debug for FusionRanker<E, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionRanker")
            .field("embedding_dim", &self.embedder.embedding_dim())
            .field("embedder_stub", &self.embedder.is_stub())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: QueryEmbedder, B: FacetSearchBackend> FusionRanker<E, B> {
    /// Validates `config` and checks the embedder emits vectors the index accepts.
    pub fn new(embedder: E, backend: B, config: FusionConfig) -> FusionResult<Self> {
        config.validate()?;

        if embedder.embedding_dim() != config.embedding_dim {
            return Err(FusionError::InvalidConfig {
                reason: format!(
                    "embedder produces {}-dim vectors but the index expects {}",
                    embedder.embedding_dim(),
                    config.embedding_dim
                ),
            });
        }

        Ok(Self {
            embedder,
            backend,
            config,
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Embeds `text`. Never retried.
    pub fn embed(&self, text: &str) -> FusionResult<Vec<f32>> {
        Ok(self.embedder.embed(text)?)
    }

    /// Embeds `text` and ranks it. `text` must be non-empty.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn search(&self, text: &str) -> FusionResult<Vec<RankedResult>> {
        let vector = self.embed(text)?;
        self.rank_vector(&vector).await
    }

    /// Runs every facet lookup concurrently and fuses the results.
    ///
    /// The first failing facet fails the whole call; hits already fetched from the
    /// other facets are dropped.
    #[instrument(skip(self, vector), fields(facets = self.config.facets.len()))]
    pub async fn rank_vector(&self, vector: &[f32]) -> FusionResult<Vec<RankedResult>> {
        validate_embedding_dim(vector.len(), self.config.embedding_dim).map_err(|_| {
            FusionError::DimensionMismatch {
                expected: self.config.embedding_dim,
                actual: vector.len(),
            }
        })?;

        let lookups = self
            .config
            .facets
            .iter()
            .map(|facet| self.lookup_facet(facet, vector));
        let per_facet = try_join_all(lookups).await?;

        let total_hits: usize = per_facet.iter().map(Vec::len).sum();
        let ranked = fuse_and_rank(
            self.config
                .facets
                .iter()
                .map(|f| f.name.as_str())
                .zip(per_facet),
            self.config.normalization,
        );

        info!(
            hits = total_hits,
            offers = ranked.len(),
            top_score = ranked.first().map(|r| r.normalized_score),
            "Fusion ranking complete"
        );

        Ok(ranked)
    }

    async fn lookup_facet(&self, facet: &FacetSpec, vector: &[f32]) -> FusionResult<Vec<FacetHit>> {
        let query = FacetQuery {
            collection: &self.config.collection,
            vector_field: &facet.vector_field,
            vector,
            k: facet.k,
            num_candidates: facet.num_candidates,
            payload_fields: &facet.payload_fields,
        };
        let retry = self.config.retry;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.backend.knn_search(query).await {
                Ok(hits) => {
                    debug!(facet = %facet.name, hits = hits.len(), attempt, "Facet lookup complete");
                    return check_scores(facet, hits).map_err(|source| FusionError::Retrieval {
                        facet: facet.name.clone(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                    let delay = retry.backoff_for(attempt);
                    warn!(
                        facet = %facet.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Facet lookup failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    warn!(facet = %facet.name, attempt, error = %source, "Facet lookup failed");
                    return Err(FusionError::Retrieval {
                        facet: facet.name.clone(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

fn check_scores(facet: &FacetSpec, hits: Vec<FacetHit>) -> Result<Vec<FacetHit>, VectorDbError> {
    if let Some(bad) = hits
        .iter()
        .find(|h| !h.similarity_score.is_finite() || h.similarity_score < 0.0)
    {
        return Err(VectorDbError::InvalidScore {
            vector_field: facet.vector_field.clone(),
            point_id: bad.offer_id.clone(),
            score: bad.similarity_score,
        });
    }
    Ok(hits)
}
