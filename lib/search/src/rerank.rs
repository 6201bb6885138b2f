//! Reranking of merged candidates
//!
//! A [`Reranker`] scores (query, document) pairs; [`RerankStage`] sends the
//! whole candidate batch to it in one call on the compute pool and sorts ids
//! by descending score.

use crate::distance::{token_coverage, trigram_similarity};
use crate::pool::ComputePool;
use crate::types::CandidateSet;
use crate::{Result, SearchError};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Pairwise relevance scorer (cross-encoder style).
///
/// Must return one score per pair, in input order.
pub trait Reranker: Send + Sync {
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>>;
}

/// Model-free scorer: weighted query-token coverage plus trigram similarity
#[derive(Debug, Clone)]
pub struct LexicalReranker {
    coverage_weight: f32,
    trigram_weight: f32,
}

impl LexicalReranker {
    pub fn new(coverage_weight: f32, trigram_weight: f32) -> Result<Self> {
        if coverage_weight < 0.0 || trigram_weight < 0.0 {
            return Err(SearchError::InvalidConfig(
                "reranker weights must not be negative".to_string(),
            ));
        }
        let total = coverage_weight + trigram_weight;
        if total <= 0.0 {
            return Err(SearchError::InvalidConfig(
                "reranker weights must not both be zero".to_string(),
            ));
        }
        Ok(Self {
            coverage_weight: coverage_weight / total,
            trigram_weight: trigram_weight / total,
        })
    }

    fn score_pair(&self, query: &str, document: &str) -> f32 {
        self.coverage_weight * token_coverage(query, document)
            + self.trigram_weight * trigram_similarity(query, document)
    }
}

impl Default for LexicalReranker {
    fn default() -> Self {
        Self {
            coverage_weight: 0.7,
            trigram_weight: 0.3,
        }
    }
}

impl Reranker for LexicalReranker {
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(query, document)| self.score_pair(query, document))
            .collect())
    }
}

/// Runs a [`Reranker`] over merged candidates on the compute pool
pub struct RerankStage {
    reranker: Arc<dyn Reranker>,
    pool: Arc<ComputePool>,
}

impl RerankStage {
    pub fn new(reranker: Arc<dyn Reranker>, pool: Arc<ComputePool>) -> Self {
        Self { reranker, pool }
    }

    /// Candidate ids sorted by descending relevance.
    ///
    /// An empty candidate set returns immediately without scoring.
    pub async fn rerank(&self, query: &str, candidates: CandidateSet) -> Result<Vec<String>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let reranker = self.reranker.clone();
        let query = query.to_string();
        let count = candidates.len();
        let ranked = self
            .pool
            .run(move || score_and_sort(reranker.as_ref(), &query, candidates))
            .await??;
        debug!(count, "reranked candidates");
        Ok(ranked)
    }
}

/// Score every candidate against `query` in one batch and sort
pub fn score_and_sort(
    reranker: &dyn Reranker,
    query: &str,
    candidates: CandidateSet,
) -> Result<Vec<String>> {
    let scores = {
        let pairs: Vec<(&str, &str)> = candidates
            .iter()
            .map(|c| (query, c.document.as_str()))
            .collect();
        let scores = reranker.score(&pairs)?;
        if scores.len() != pairs.len() {
            return Err(SearchError::Rerank(format!(
                "scorer returned {} scores for {} pairs",
                scores.len(),
                pairs.len()
            )));
        }
        scores
    };

    Ok(order_by_score(candidates.into_ids(), &scores))
}

/// Sort ids by descending score.
///
/// The sort is stable: exact ties keep candidate order. NaN scores rank
/// after every real score.
pub fn order_by_score(ids: Vec<String>, scores: &[f32]) -> Vec<String> {
    let mut ranked: Vec<(String, f32)> = ids.into_iter().zip(scores.iter().copied()).collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked.into_iter().map(|(id, _)| id).collect()
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedReranker;
    use crate::types::Candidate;

    fn candidates(pairs: &[(&str, &str)]) -> CandidateSet {
        pairs.iter().map(|(id, doc)| Candidate::new(*id, *doc)).collect()
    }

    fn stage(reranker: Arc<dyn Reranker>) -> RerankStage {
        RerankStage::new(reranker, Arc::new(ComputePool::new(1).unwrap()))
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_scorer() {
        let scorer = Arc::new(ScriptedReranker::new(&[]));
        let ranked = stage(scorer.clone())
            .rerank("anything", CandidateSet::new())
            .await
            .unwrap();
        assert!(ranked.is_empty());
        assert_eq!(scorer.calls(), 0);
    }

    #[tokio::test]
    async fn test_higher_score_ranks_first() {
        let scorer = Arc::new(ScriptedReranker::new(&[("doc_a", 0.2), ("doc_b", 0.9)]));
        let ranked = stage(scorer.clone())
            .rerank("query", candidates(&[("A", "doc_a"), ("B", "doc_b")]))
            .await
            .unwrap();
        assert_eq!(ranked, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(scorer.calls(), 1);
    }

    #[tokio::test]
    async fn test_scorer_sees_one_batch_in_candidate_order() {
        let scorer = Arc::new(ScriptedReranker::new(&[]));
        stage(scorer.clone())
            .rerank("q", candidates(&[("X", "doc_x"), ("Y", "doc_y"), ("Z", "doc_z")]))
            .await
            .unwrap();
        assert_eq!(scorer.calls(), 1);
        assert_eq!(
            scorer.last_pairs(),
            vec![
                ("q".to_string(), "doc_x".to_string()),
                ("q".to_string(), "doc_y".to_string()),
                ("q".to_string(), "doc_z".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_score_count_mismatch_is_fatal() {
        struct ShortScorer;
        impl Reranker for ShortScorer {
            fn score(&self, _pairs: &[(&str, &str)]) -> Result<Vec<f32>> {
                Ok(vec![1.0])
            }
        }

        let err = stage(Arc::new(ShortScorer))
            .rerank("q", candidates(&[("A", "a"), ("B", "b")]))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Rerank(_)));
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let ids = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let ranked = order_by_score(ids, &[0.5, 0.9, 0.5]);
        assert_eq!(ranked, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let ids = vec!["nan".to_string(), "low".to_string(), "high".to_string()];
        let ranked = order_by_score(ids, &[f32::NAN, -1.0, 3.0]);
        assert_eq!(ranked, vec!["high", "low", "nan"]);
    }

    #[test]
    fn test_lexical_reranker_prefers_matching_document() {
        let reranker = LexicalReranker::default();
        let scores = reranker
            .score(&[
                ("gaming laptop", "Acme gaming laptop 16GB RAM"),
                ("gaming laptop", "Ceramic coffee mug"),
            ])
            .unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_lexical_reranker_rejects_bad_weights() {
        assert!(LexicalReranker::new(-1.0, 1.0).is_err());
        assert!(LexicalReranker::new(0.0, 0.0).is_err());
        assert!(LexicalReranker::new(1.0, 0.0).is_ok());
    }
}
