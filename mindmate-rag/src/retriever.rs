//! Retrieval ranking.
//!
//! The [`Retriever`] turns raw nearest-neighbour output into a bounded,
//! score-ordered list of [`RankedResult`]s:
//!
//! 1. query the [`VectorIndex`] with the caller's `top_k` and filter
//! 2. score each candidate as `1 - distance`, or `1.0` when the index gave
//!    no distance for it, clamped to `[0, 1]`
//! 3. stable sort by descending score, drop results under the similarity
//!    threshold, truncate to `top_k`
//!
//! An empty index answer yields an empty list, which callers read as "no
//! knowledge available". Index failures propagate unchanged; there is no
//! retry.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{RankedResult, ResultSource, RetrievalCandidate};
use crate::error::Result;
use crate::vectorstore::{MetadataFilter, VectorIndex};

/// Convert a raw distance into a relevance score in `[0, 1]`.
///
/// A missing distance counts as full confidence. Distances outside `[0, 1]`
/// (raw L2, cosine distance of opposed vectors) are clamped, and a NaN
/// distance scores zero.
pub fn score_from_distance(distance: Option<f32>) -> f32 {
    match distance {
        None => 1.0,
        Some(d) if d.is_nan() => 0.0,
        Some(d) => (1.0 - d).clamp(0.0, 1.0),
    }
}

/// Score, order and bound a candidate list.
///
/// Ties keep the order the index returned them in.
pub fn rank_candidates(
    candidates: Vec<RetrievalCandidate>,
    top_k: usize,
    threshold: f32,
) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = candidates
        .into_iter()
        .map(|c| RankedResult {
            score: score_from_distance(c.raw_distance),
            id: c.id,
            content: c.content,
            metadata: c.metadata,
            source: ResultSource::Vector,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.retain(|r| r.score >= threshold);
    ranked.truncate(top_k);
    ranked
}

/// Estimate answer confidence on a 0–100 scale from ranked results.
///
/// This is the best score scaled by 100, capped at 100 and rounded to two
/// decimals; an empty list has confidence 0.
pub fn confidence(results: &[RankedResult]) -> f32 {
    let best = results.iter().map(|r| r.score).fold(f32::NEG_INFINITY, f32::max);
    if best == f32::NEG_INFINITY {
        return 0.0;
    }
    let scaled = (best * 100.0).min(100.0);
    (scaled * 100.0).round() / 100.0
}

/// Ranks vector-index hits for a query.
///
/// # Example
///
/// ```rust,ignore
/// use mindmate_rag::{Retriever, InMemoryVectorIndex};
///
/// let retriever = Retriever::new(index);
/// let results = retriever.retrieve("best beaches in goa", 5, None).await?;
/// let confidence = mindmate_rag::confidence(&results);
/// ```
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    similarity_threshold: f32,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index, similarity_threshold: 0.0 }
    }

    /// Drop ranked results scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Retrieve at most `top_k` ranked results for `query`.
    ///
    /// # Errors
    ///
    /// Propagates the index error if the nearest-neighbour query fails.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RankedResult>> {
        let raw = self.index.query(query, top_k, filter).await.map_err(|e| {
            error!(error = %e, "vector search failed");
            e
        })?;

        if raw.is_empty() {
            info!(query_len = query.len(), "retrieval found no candidates");
            return Ok(Vec::new());
        }
        debug!(candidates = raw.len(), "vector search returned candidates");

        let ranked = rank_candidates(raw.into_candidates(), top_k, self.similarity_threshold);
        info!(result_count = ranked.len(), "retrieved documents");
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;

    fn candidate(id: &str, distance: Option<f32>) -> RetrievalCandidate {
        RetrievalCandidate {
            id: id.into(),
            content: format!("content of {id}"),
            metadata: Metadata::new(),
            raw_distance: distance,
        }
    }

    fn ranked(score: f32) -> RankedResult {
        RankedResult {
            id: "x".into(),
            content: String::new(),
            metadata: Metadata::new(),
            score,
            source: ResultSource::Vector,
        }
    }

    #[test]
    fn score_is_one_minus_distance() {
        assert!((score_from_distance(Some(0.1)) - 0.9).abs() < 1e-6);
        assert_eq!(score_from_distance(None), 1.0);
    }

    #[test]
    fn out_of_range_distances_are_clamped() {
        assert_eq!(score_from_distance(Some(1.7)), 0.0);
        assert_eq!(score_from_distance(Some(-0.2)), 1.0);
        assert_eq!(score_from_distance(Some(f32::NAN)), 0.0);
    }

    #[test]
    fn ranking_sorts_descending_and_keeps_ties_stable() {
        let results = rank_candidates(
            vec![
                candidate("far", Some(0.8)),
                candidate("tie-a", Some(0.3)),
                candidate("near", Some(0.05)),
                candidate("tie-b", Some(0.3)),
            ],
            10,
            0.0,
        );
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["near", "tie-a", "tie-b", "far"]);
        assert!(results.iter().all(|r| r.source == ResultSource::Vector));
    }

    #[test]
    fn missing_distance_ranks_first() {
        let results = rank_candidates(vec![candidate("a", Some(0.2)), candidate("b", None)], 10, 0.0);
        assert_eq!(results[0].id, "b");
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn ranking_truncates_and_applies_threshold() {
        let candidates = vec![
            candidate("a", Some(0.1)),
            candidate("b", Some(0.5)),
            candidate("c", Some(0.9)),
        ];
        assert_eq!(rank_candidates(candidates.clone(), 2, 0.0).len(), 2);
        let filtered = rank_candidates(candidates, 10, 0.4);
        let ids: Vec<_> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn confidence_of_empty_is_zero() {
        assert_eq!(confidence(&[]), 0.0);
    }

    #[test]
    fn confidence_uses_best_score() {
        assert_eq!(confidence(&[ranked(0.42), ranked(0.87), ranked(0.1)]), 87.0);
        assert_eq!(confidence(&[ranked(1.0)]), 100.0);
        assert_eq!(confidence(&[ranked(0.12344)]), 12.34);
    }
}
