//! Concurrent candidate retrieval
//!
//! One [`ScopedQuery`] per predicted category (or a single unscoped fallback
//! query) is spawned on the runtime. The join waits for every task, and the
//! merge walks outcomes in submission order so completion order never
//! changes which document wins an id collision.

use crate::config::SearchConfig;
use crate::store::VectorStore;
use crate::types::{CandidateSet, LookupStats, MetadataFilter, ScopedQuery, TaskOutcome};
use crate::{Result, SearchError};
use futures_util::future::join_all;
use prodex_core::Vector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run one query under an optional timeout
pub(crate) async fn run_scoped(
    store: &dyn VectorStore,
    query: ScopedQuery,
    timeout: Option<Duration>,
) -> TaskOutcome {
    let lookup = store.query(query);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, lookup).await {
            Ok(result) => result,
            Err(_) => return TaskOutcome::TimedOut,
        },
        None => lookup.await,
    };

    match result {
        Ok(hits) => TaskOutcome::Completed(hits),
        Err(e) => TaskOutcome::Failed(e),
    }
}

pub struct CandidateRetriever {
    store: Arc<dyn VectorStore>,
    collection: String,
    category_field: String,
    per_category: usize,
    fallback_limit: usize,
    timeout: Option<Duration>,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn VectorStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            collection: config.product_collection.clone(),
            category_field: config.category_field.clone(),
            per_category: config.candidates_per_category,
            fallback_limit: config.fallback_candidate_count,
            timeout: config.task_timeout(),
        }
    }

    /// One scoped query per label, or one unscoped fallback query
    pub fn plan_queries(&self, embedding: &Arc<Vector>, labels: &[String]) -> Vec<ScopedQuery> {
        if labels.is_empty() {
            return vec![ScopedQuery::unscoped(
                self.collection.clone(),
                embedding.clone(),
                self.fallback_limit,
            )];
        }

        labels
            .iter()
            .map(|label| {
                ScopedQuery::scoped(
                    self.collection.clone(),
                    embedding.clone(),
                    self.per_category,
                    MetadataFilter::eq(self.category_field.clone(), label.clone()),
                )
            })
            .collect()
    }

    /// Spawn every query and wait for all of them.
    ///
    /// Outcomes come back in submission order. A task that panics is
    /// reported as failed.
    pub async fn fan_out(&self, queries: Vec<ScopedQuery>) -> Vec<TaskOutcome> {
        let handles: Vec<_> = queries
            .into_iter()
            .map(|query| {
                let store = self.store.clone();
                let timeout = self.timeout;
                tokio::spawn(async move { run_scoped(store.as_ref(), query, timeout).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| TaskOutcome::Failed(SearchError::Task(e.to_string())))
            })
            .collect()
    }

    pub async fn retrieve_candidates(
        &self,
        embedding: &Arc<Vector>,
        labels: &[String],
    ) -> Result<CandidateSet> {
        let (candidates, _) = self.retrieve_with_stats(embedding, labels).await?;
        Ok(candidates)
    }

    pub async fn retrieve_with_stats(
        &self,
        embedding: &Arc<Vector>,
        labels: &[String],
    ) -> Result<(CandidateSet, LookupStats)> {
        let queries = self.plan_queries(embedding, labels);
        if labels.is_empty() {
            info!(limit = self.fallback_limit, "no categories predicted, using unscoped fallback");
        } else {
            info!(
                per_category = self.per_category,
                categories = labels.len(),
                "fetching candidates per category"
            );
        }

        let outcomes = self.fan_out(queries).await;
        let (candidates, stats) = merge_outcomes(outcomes)?;
        debug!(
            unique = candidates.len(),
            completed = stats.completed,
            timed_out = stats.timed_out,
            failed = stats.failed,
            "candidate fetch complete"
        );
        Ok((candidates, stats))
    }
}

/// Merge task outcomes, first writer wins on id collisions.
///
/// Failed tasks contribute nothing; timed-out tasks count as empty. Only when
/// every task failed is the retrieval itself an error.
pub fn merge_outcomes(outcomes: Vec<TaskOutcome>) -> Result<(CandidateSet, LookupStats)> {
    let mut candidates = CandidateSet::new();
    let mut stats = LookupStats::default();
    let mut last_error = None;

    for (task, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            TaskOutcome::Completed(result) => {
                stats.completed += 1;
                for hit in result.hits {
                    candidates.insert(hit);
                }
            }
            TaskOutcome::TimedOut => {
                stats.timed_out += 1;
                warn!(task, "candidate lookup timed out, treating as empty");
            }
            TaskOutcome::Failed(e) => {
                stats.failed += 1;
                warn!(task, error = %e, "candidate lookup failed, skipping");
                last_error = Some(e.to_string());
            }
        }
    }

    if stats.failed > 0 && stats.failed == stats.total() {
        return Err(SearchError::Retrieval {
            failed: stats.failed,
            last_error: last_error.unwrap_or_default(),
        });
    }
    Ok((candidates, stats))
}
