//! Query intent classification
//!
//! The category collection holds many search phrases per label, each stored
//! with the label as its document. The nearest phrases to a query vote for
//! their labels; the first `top_k` distinct labels win.

use crate::config::SearchConfig;
use crate::retriever::run_scoped;
use crate::store::VectorStore;
use crate::types::{ScopedQuery, TaskOutcome};
use ahash::AHashSet;
use prodex_core::Vector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct IntentClassifier {
    store: Arc<dyn VectorStore>,
    collection: String,
    oversample_factor: usize,
    timeout: Option<Duration>,
}

impl IntentClassifier {
    pub fn new(store: Arc<dyn VectorStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            collection: config.category_collection.clone(),
            oversample_factor: config.oversample_factor,
            timeout: config.task_timeout(),
        }
    }

    /// Up to `top_k` distinct labels, nearest first.
    ///
    /// Never fails: a lookup error or timeout yields an empty list, which
    /// sends retrieval down the unscoped fallback path.
    pub async fn predict_categories(&self, embedding: &Arc<Vector>, top_k: usize) -> Vec<String> {
        if top_k == 0 {
            return Vec::new();
        }

        let limit = top_k.saturating_mul(self.oversample_factor);
        let query = ScopedQuery::unscoped(self.collection.clone(), embedding.clone(), limit);

        match run_scoped(self.store.as_ref(), query, self.timeout).await {
            TaskOutcome::Completed(result) => {
                let labels = dedup_labels(result.hits.into_iter().map(|hit| hit.document), top_k);
                debug!(?labels, "predicted categories");
                labels
            }
            TaskOutcome::TimedOut => {
                warn!(collection = %self.collection, "category lookup timed out");
                Vec::new()
            }
            TaskOutcome::Failed(e) => {
                warn!(collection = %self.collection, error = %e, "category lookup failed");
                Vec::new()
            }
        }
    }
}

/// First `top_k` distinct labels in input order
pub fn dedup_labels<I>(labels: I, top_k: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = AHashSet::new();
    let mut unique = Vec::with_capacity(top_k);
    for label in labels {
        if unique.len() == top_k {
            break;
        }
        if seen.insert(label.clone()) {
            unique.push(label);
        }
    }
    unique
}
