use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::client::{FacetSearchBackend, validate_query};
use super::model::{FacetHit, FacetQuery, Payload, VectorMetric};
use super::VectorDbError;

#[derive(Default, Clone)]
/// In-memory facet backend with scripted responses and failure injection.
///
/// Clones share state, so a test can keep a handle while the ranker owns another.
pub struct MockFacetClient {
    state: Arc<RwLock<MockState>>,
    metric: VectorMetric,
}

impl std::fmt::Debug for MockFacetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MockFacetClient")
            .field("metric", &self.metric)
            .field("offers", &state.points.len())
            .field("offline", &state.offline)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct MockState {
    points: Vec<MockPoint>,
    scripted: HashMap<String, Vec<FacetHit>>,
    failures: HashMap<String, MockFailure>,
    calls: HashMap<String, usize>,
    offline: bool,
}

struct MockPoint {
    offer_id: String,
    vectors: HashMap<String, Vec<f32>>,
    payload: Payload,
}

enum MockFailure {
    Always,
    Times(u32),
}

impl MockFacetClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores stored vectors with `metric`, mapped the way the Qdrant client maps it.
    pub fn with_metric(metric: VectorMetric) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    pub fn metric(&self) -> VectorMetric {
        self.metric
    }

    /// Stores an offer with one vector per named field.
    pub fn insert_offer(
        &self,
        offer_id: impl Into<String>,
        vectors: impl IntoIterator<Item = (String, Vec<f32>)>,
        payload: Payload,
    ) {
        let offer_id = offer_id.into();
        let mut state = self.state.write();
        state.points.retain(|p| p.offer_id != offer_id);
        state.points.push(MockPoint {
            offer_id,
            vectors: vectors.into_iter().collect(),
            payload,
        });
    }

    /// Makes lookups against `vector_field` return `hits` verbatim (truncated to `k`).
    pub fn script_hits(&self, vector_field: &str, hits: Vec<FacetHit>) {
        self.state
            .write()
            .scripted
            .insert(vector_field.to_string(), hits);
    }

    /// Every lookup against `vector_field` fails.
    pub fn fail_field(&self, vector_field: &str) {
        self.state
            .write()
            .failures
            .insert(vector_field.to_string(), MockFailure::Always);
    }

    /// The next `times` lookups against `vector_field` fail, later ones succeed.
    pub fn fail_field_times(&self, vector_field: &str, times: u32) {
        self.state
            .write()
            .failures
            .insert(vector_field.to_string(), MockFailure::Times(times));
    }

    /// Clears injected failures.
    pub fn heal(&self) {
        self.state.write().failures.clear();
    }

    /// Marks the backend unreachable for readiness checks.
    pub fn set_offline(&self, offline: bool) {
        self.state.write().offline = offline;
    }

    /// Number of lookups issued against `vector_field`, including failed ones.
    pub fn call_count(&self, vector_field: &str) -> usize {
        self.state
            .read()
            .calls
            .get(vector_field)
            .copied()
            .unwrap_or(0)
    }

    pub fn offer_count(&self) -> usize {
        self.state.read().points.len()
    }

    fn search(&self, query: FacetQuery<'_>) -> Result<Vec<FacetHit>, VectorDbError> {
        let mut state = self.state.write();
        *state
            .calls
            .entry(query.vector_field.to_string())
            .or_insert(0) += 1;

        let fail = match state.failures.get_mut(query.vector_field) {
            Some(MockFailure::Always) => true,
            Some(MockFailure::Times(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if fail || state.offline {
            return Err(VectorDbError::SearchFailed {
                collection: query.collection.to_string(),
                vector_field: query.vector_field.to_string(),
                message: "injected failure".to_string(),
            });
        }

        validate_query(&query)?;

        if let Some(hits) = state.scripted.get(query.vector_field) {
            return Ok(hits
                .iter()
                .take(query.k as usize)
                .map(|hit| FacetHit {
                    facet_payload: select_fields(&hit.facet_payload, query.payload_fields),
                    ..hit.clone()
                })
                .collect());
        }

        let mut hits = Vec::new();
        for point in &state.points {
            let Some(stored) = point.vectors.get(query.vector_field) else {
                continue;
            };
            if stored.len() != query.vector.len() {
                return Err(VectorDbError::InvalidDimension {
                    expected: stored.len(),
                    actual: query.vector.len(),
                });
            }
            hits.push(FacetHit {
                offer_id: point.offer_id.clone(),
                similarity_score: self
                    .metric
                    .to_similarity(self.metric.raw_score(query.vector, stored)),
                facet_payload: select_fields(&point.payload, query.payload_fields),
            });
        }

        hits.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.k as usize);

        Ok(hits)
    }
}

fn select_fields(payload: &Payload, fields: &[String]) -> Payload {
    if fields.is_empty() {
        return payload.clone();
    }
    payload
        .iter()
        .filter(|(key, _)| fields.iter().any(|f| f == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl FacetSearchBackend for MockFacetClient {
    async fn knn_search(&self, query: FacetQuery<'_>) -> Result<Vec<FacetHit>, VectorDbError> {
        self.search(query)
    }

    async fn is_ready(&self) -> bool {
        !self.state.read().offline
    }

    fn is_mock(&self) -> bool {
        true
    }
}
