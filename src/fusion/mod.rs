//! Multi-facet score fusion.
//!
//! A search embeds the query once, runs one nearest-neighbour lookup per configured
//! facet with that same vector, and folds the hits by offer id:
//!
//! - every hit adds its similarity to the offer's `total_score` and bumps `hit_count`
//! - payload fields are merged, later facets overwriting earlier ones
//! - offers are ranked by `total_score / hit_count`, ties kept in first-seen order
//!
//! Averaging means an offer found in three facets is not rewarded for breadth alone:
//! scores `{5, 5, 5}` and `{5}` tie. The facets are assumed to share one embedding
//! space; [`ScoreNormalization::MinMax`] rescales each facet when that does not hold.
//!
//! Lookups run concurrently. Any facet failing fails the search with
//! [`FusionError::Retrieval`]; a ranking over a subset of facets is never returned,
//! since missing facets would silently change what `hit_count` means.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ranker;
pub mod types;


pub use aggregate::{fuse_and_rank, fuse_hits, normalize_facet_scores, rank_aggregates};
pub use config::{FacetSpec, FusionConfig, MAX_RETRY_BACKOFF, RetryPolicy, ScoreNormalization};
pub use error::{FailureKind, FusionError, FusionResult};
pub use ranker::FusionRanker;
pub use types::{AggregatedResult, RankedResult, SearchResultRow};
