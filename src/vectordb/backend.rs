use super::client::{FacetSearchBackend, QdrantFacetClient};
use super::error::VectorDbError;
use super::model::{FacetHit, FacetQuery, VectorMetric};

#[cfg(any(test, feature = "mock"))]
use super::mock::MockFacetClient;

#[derive(Clone, Debug)]
/// Facet backend wrapper (real or mock).
pub enum FacetBackend {
    /// Real Qdrant-backed client.
    Real(QdrantFacetClient),
    #[cfg(any(test, feature = "mock"))]
    /// In-memory mock backend.
    Mock(MockFacetClient),
}

impl FacetBackend {
    /// Builds a backend from a URL (`mock:` URLs require the `mock` feature).
    pub fn from_url(url: &str, metric: VectorMetric) -> Result<Self, VectorDbError> {
        if url.starts_with("mock:") {
            #[cfg(any(test, feature = "mock"))]
            {
                Ok(Self::Mock(MockFacetClient::with_metric(metric)))
            }
            #[cfg(not(any(test, feature = "mock")))]
            {
                let _ = metric;
                Err(VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: "Mock backend not enabled. Compile with --features mock".to_string(),
                })
            }
        } else {
            Ok(Self::Real(QdrantFacetClient::new(url, metric)?))
        }
    }
}

impl FacetSearchBackend for FacetBackend {
    async fn knn_search(&self, query: FacetQuery<'_>) -> Result<Vec<FacetHit>, VectorDbError> {
        match self {
            FacetBackend::Real(c) => c.knn_search(query).await,
            #[cfg(any(test, feature = "mock"))]
            FacetBackend::Mock(c) => FacetSearchBackend::knn_search(c, query).await,
        }
    }

    async fn is_ready(&self) -> bool {
        match self {
            FacetBackend::Real(c) => c.health_check().await.is_ok(),
            #[cfg(any(test, feature = "mock"))]
            FacetBackend::Mock(c) => c.is_ready().await,
        }
    }

    fn is_mock(&self) -> bool {
        match self {
            FacetBackend::Real(_) => false,
            #[cfg(any(test, feature = "mock"))]
            FacetBackend::Mock(_) => true,
        }
    }
}
