use serde::Serialize;

use crate::constants::{MISSING_OFFER_LABEL, OFFER_FIELD};
use crate::vectordb::Payload;

/// Per-offer accumulator built while folding facet hits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    pub offer_id: String,
    /// Sum of every contributing similarity score.
    pub total_score: f64,
    /// Number of hits folded in.
    pub hit_count: usize,
    /// Union of facet payloads, later facets overwriting earlier ones per field.
    pub payload: Payload,
    /// Facets the offer was found in, in merge order.
    pub matched_facets: Vec<String>,
}

impl AggregatedResult {
    pub(crate) fn first(facet: &str, offer_id: String, score: f32, payload: Payload) -> Self {
        Self {
            offer_id,
            total_score: f64::from(score),
            hit_count: 1,
            payload,
            matched_facets: vec![facet.to_string()],
        }
    }

    pub(crate) fn absorb(&mut self, facet: &str, score: f32, payload: Payload) {
        self.total_score += f64::from(score);
        self.hit_count += 1;
        self.payload.extend(payload);
        self.matched_facets.push(facet.to_string());
    }

    /// `total_score / hit_count`, the ranking key.
    pub fn normalized_score(&self) -> f64 {
        if self.hit_count == 0 {
            return 0.0;
        }
        self.total_score / self.hit_count as f64
    }
}

/// An aggregate with its ranking key, as returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub aggregate: AggregatedResult,
    pub normalized_score: f64,
}

impl RankedResult {
    pub fn new(aggregate: AggregatedResult) -> Self {
        let normalized_score = aggregate.normalized_score();
        Self {
            aggregate,
            normalized_score,
        }
    }

    pub fn offer_id(&self) -> &str {
        &self.aggregate.offer_id
    }

    pub fn hit_count(&self) -> usize {
        self.aggregate.hit_count
    }

    pub fn total_score(&self) -> f64 {
        self.aggregate.total_score
    }

    pub fn payload(&self) -> &Payload {
        &self.aggregate.payload
    }

    /// Human-readable label taken from `field`, or a placeholder.
    pub fn label(&self, field: &str) -> String {
        match self.aggregate.payload.get(field) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => MISSING_OFFER_LABEL.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultRow {
    pub offer: String,
    /// Normalized score rounded to 2 decimals.
    pub score: f64,
}

impl SearchResultRow {
    pub fn from_ranked(result: &RankedResult) -> Self {
        Self::with_label_field(result, OFFER_FIELD)
    }

    pub fn with_label_field(result: &RankedResult, field: &str) -> Self {
        Self {
            offer: result.label(field),
            score: round_to_cents(result.normalized_score),
        }
    }
}

pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
