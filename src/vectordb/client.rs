use qdrant_client::Qdrant;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::{PayloadIncludeSelector, SearchParamsBuilder, SearchPointsBuilder};
use tracing::debug;

use super::error::VectorDbError;
use super::model::{FacetHit, FacetQuery, VectorMetric};

#[derive(Clone)]
/// Qdrant client for named-vector facet lookups.
pub struct QdrantFacetClient {
    client: Qdrant,
    url: String,
    metric: VectorMetric,
}

impl std::fmt::Debug for QdrantFacetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantFacetClient")
            .field("url", &self.url)
            .field("metric", &self.metric)
            .finish_non_exhaustive()
    }
}

impl QdrantFacetClient {
    /// Creates a client for `url`. No request is made until the first search.
    pub fn new(url: &str, metric: VectorMetric) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
            metric,
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the metric the facet vectors were indexed with.
    pub fn metric(&self) -> VectorMetric {
        self.metric
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Runs one nearest-neighbour search against a named vector.
    pub async fn knn_search(&self, query: FacetQuery<'_>) -> Result<Vec<FacetHit>, VectorDbError> {
        validate_query(&query)?;

        let payload_selector = if query.payload_fields.is_empty() {
            SelectorOptions::from(true)
        } else {
            SelectorOptions::Include(PayloadIncludeSelector {
                fields: query.payload_fields.to_vec(),
            })
        };

        let search = SearchPointsBuilder::new(query.collection, query.vector.to_vec(), query.k)
            .vector_name(query.vector_field)
            .params(SearchParamsBuilder::default().hnsw_ef(query.num_candidates))
            .with_payload(payload_selector);

        let response =
            self.client
                .search_points(search)
                .await
                .map_err(|e| VectorDbError::SearchFailed {
                    collection: query.collection.to_string(),
                    vector_field: query.vector_field.to_string(),
                    message: e.to_string(),
                })?;

        let metric = self.metric;
        let hits: Vec<FacetHit> = response
            .result
            .into_iter()
            .filter_map(|point| {
                let score = metric.to_similarity(point.score);
                FacetHit::from_scored_point(point, score)
            })
            .collect();

        debug!(
            vector_field = query.vector_field,
            hits = hits.len(),
            "Qdrant facet search complete"
        );

        Ok(hits)
    }
}

/// Rejects requests the backend would fail on anyway.
pub(crate) fn validate_query(query: &FacetQuery<'_>) -> Result<(), VectorDbError> {
    if query.vector.is_empty() {
        return Err(VectorDbError::InvalidRequest {
            reason: "query vector is empty".to_string(),
        });
    }
    if query.k == 0 {
        return Err(VectorDbError::InvalidRequest {
            reason: "k must be > 0".to_string(),
        });
    }
    if query.vector_field.is_empty() {
        return Err(VectorDbError::InvalidRequest {
            reason: "vector_field must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Async interface the fusion ranker issues facet lookups through.
pub trait FacetSearchBackend: Send + Sync {
    /// Returns up to `query.k` hits, best first.
    fn knn_search(
        &self,
        query: FacetQuery<'_>,
    ) -> impl std::future::Future<Output = Result<Vec<FacetHit>, VectorDbError>> + Send;

    /// Returns `true` if the backend answers requests.
    fn is_ready(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Returns `true` for in-memory backends that hold no indexed offers.
    fn is_mock(&self) -> bool {
        false
    }
}

impl FacetSearchBackend for QdrantFacetClient {
    async fn knn_search(&self, query: FacetQuery<'_>) -> Result<Vec<FacetHit>, VectorDbError> {
        QdrantFacetClient::knn_search(self, query).await
    }

    async fn is_ready(&self) -> bool {
        self.health_check().await.is_ok()
    }
}
