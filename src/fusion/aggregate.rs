//! The I/O-free half of fusion: fold facet hits by offer, then rank.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::vectordb::FacetHit;

use super::config::ScoreNormalization;
use super::types::{AggregatedResult, RankedResult};

/// Scores within this distance of each other count as equal for min-max scaling.
const MIN_MAX_EPSILON: f32 = 1e-9;

/// Folds per-facet hit lists into one aggregate per offer.
///
/// Facets are visited in the given order and hits in backend order; the returned
/// vector keeps first-seen order, which [`rank_aggregates`] uses to break ties.
pub fn fuse_hits<'a, I>(facet_hits: I) -> Vec<AggregatedResult>
where
    I: IntoIterator<Item = (&'a str, Vec<FacetHit>)>,
{
    let mut aggregates: Vec<AggregatedResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (facet, hits) in facet_hits {
        for hit in hits {
            match index.get(&hit.offer_id) {
                Some(&slot) => {
                    aggregates[slot].absorb(facet, hit.similarity_score, hit.facet_payload)
                }
                None => {
                    index.insert(hit.offer_id.clone(), aggregates.len());
                    aggregates.push(AggregatedResult::first(
                        facet,
                        hit.offer_id,
                        hit.similarity_score,
                        hit.facet_payload,
                    ));
                }
            }
        }
    }

    aggregates
}

/// Sorts by normalized score, highest first. Equal scores keep input order.
pub fn rank_aggregates(aggregates: Vec<AggregatedResult>) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = aggregates.into_iter().map(RankedResult::new).collect();

    ranked.sort_by(|a, b| {
        b.normalized_score
            .partial_cmp(&a.normalized_score)
            .unwrap_or(Ordering::Equal)
    });

    ranked
}

/// Rescales one facet's scores in place.
///
/// With [`ScoreNormalization::MinMax`] the best hit maps to 1.0 and the worst to 0.0;
/// a facet whose hits all score the same maps every hit to 1.0.
pub fn normalize_facet_scores(hits: &mut [FacetHit], normalization: ScoreNormalization) {
    if normalization == ScoreNormalization::None || hits.is_empty() {
        return;
    }

    let (min, max) = hits.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| {
        (lo.min(h.similarity_score), hi.max(h.similarity_score))
    });
    let range = max - min;

    for hit in hits.iter_mut() {
        hit.similarity_score = if range <= MIN_MAX_EPSILON {
            1.0
        } else {
            (hit.similarity_score - min) / range
        };
    }
}

/// Full pipeline over already-fetched hits.
pub fn fuse_and_rank<'a, I>(facet_hits: I, normalization: ScoreNormalization) -> Vec<RankedResult>
where
    I: IntoIterator<Item = (&'a str, Vec<FacetHit>)>,
{
    let normalized = facet_hits.into_iter().map(|(facet, mut hits)| {
        normalize_facet_scores(&mut hits, normalization);
        (facet, hits)
    });

    rank_aggregates(fuse_hits(normalized))
}
