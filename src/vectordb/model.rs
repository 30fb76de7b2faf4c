use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{ScoredPoint, Value};

/// Offer fields returned alongside a hit.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One nearest-neighbour lookup against one named vector.
#[derive(Debug, Clone, Copy)]
pub struct FacetQuery<'a> {
    pub collection: &'a str,
    /// Named vector field, e.g. `BRANDVECTOR`.
    pub vector_field: &'a str,
    pub vector: &'a [f32],
    /// Number of hits to return.
    pub k: u64,
    /// Candidate pool the backend explores before picking `k`.
    pub num_candidates: u64,
    /// Payload fields to return; empty means all.
    pub payload_fields: &'a [String],
}

/// A single facet lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetHit {
    pub offer_id: String,
    /// Higher is more similar.
    pub similarity_score: f32,
    pub facet_payload: Payload,
}

impl FacetHit {
    pub fn new(offer_id: impl Into<String>, similarity_score: f32) -> Self {
        Self {
            offer_id: offer_id.into(),
            similarity_score,
            facet_payload: Payload::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.facet_payload.insert(name.to_string(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.facet_payload = payload;
        self
    }

    /// Converts a Qdrant point. Returns `None` for points without an id.
    pub fn from_scored_point(point: ScoredPoint, similarity_score: f32) -> Option<Self> {
        let offer_id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n.to_string(),
            Some(PointIdOptions::Uuid(uuid)) => uuid,
            None => return None,
        };

        let facet_payload = point
            .payload
            .into_iter()
            .map(|(key, value)| (key, qdrant_value_to_json(value)))
            .collect();

        Some(Self {
            offer_id,
            similarity_score,
            facet_payload,
        })
    }
}

/// How the backend scores a named vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorMetric {
    /// Cosine similarity in `[-1, 1]`.
    #[default]
    Cosine,
    /// Unbounded dot product.
    Dot,
    /// Euclidean distance; lower is better.
    Euclid,
}

impl VectorMetric {
    /// Maps a raw backend score onto a non-negative "higher is more similar" scale.
    ///
    /// Uses the curves Elasticsearch scores dense vectors with.
    ///
    /// | metric | raw | similarity |
    /// |---|---|---|
    /// | cosine | `c` | `(1 + c) / 2` |
    /// | dot | `p < 0` | `1 / (1 - p)` |
    /// | dot | `p >= 0` | `p + 1` |
    /// | euclid | `d` | `1 / (1 + d²)` |
    pub fn to_similarity(self, raw: f32) -> f32 {
        match self {
            VectorMetric::Cosine => ((1.0 + raw) / 2.0).max(0.0),
            VectorMetric::Dot if raw < 0.0 => 1.0 / (1.0 - raw),
            VectorMetric::Dot => raw + 1.0,
            VectorMetric::Euclid => 1.0 / (1.0 + raw * raw),
        }
    }

    /// Raw backend score between two vectors of equal length.
    pub fn raw_score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            VectorMetric::Cosine => cosine_similarity(a, b),
            VectorMetric::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            VectorMetric::Euclid => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

impl std::str::FromStr for VectorMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            "euclid" | "l2" | "l2_norm" => Ok(Self::Euclid),
            other => Err(format!("unknown vector metric '{other}'")),
        }
    }
}

pub(crate) fn qdrant_value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => serde_json::Value::Array(
            list.values.into_iter().map(qdrant_value_to_json).collect(),
        ),
        Some(Kind::StructValue(st)) => serde_json::Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}

/// Cosine similarity; zero for mismatched or zero-length input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
