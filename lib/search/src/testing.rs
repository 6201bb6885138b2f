//! Test doubles for the embedder, reranker and vector store seams

use crate::embedder::Embedder;
use crate::rerank::Reranker;
use crate::store::VectorStore;
use crate::types::{Candidate, CollectionBatch, ScopedQuery, ScopedQueryResult};
use crate::{Result, SearchError};
use async_trait::async_trait;
use parking_lot::Mutex;
use prodex_core::{Error, Vector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns the same vector for every text
pub struct FixedEmbedder {
    vector: Vector,
    fail: bool,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Vector::new(vector),
            fail: false,
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![1.0, 0.0])
        }
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FixedEmbedder {
    fn encode(&self, _text: &str) -> Result<Vector> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SearchError::Embedding("model unavailable".to_string()));
        }
        Ok(self.vector.clone())
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SearchError::Embedding("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.vector.dim()
    }
}

/// Scores pairs by looking the document up in a fixed table (0.0 if absent)
pub struct ScriptedReranker {
    scores: HashMap<String, f32>,
    calls: AtomicUsize,
    last_pairs: Mutex<Vec<(String, String)>>,
}

impl ScriptedReranker {
    pub fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            scores: scores.iter().map(|(d, s)| (d.to_string(), *s)).collect(),
            calls: AtomicUsize::new(0),
            last_pairs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_pairs(&self) -> Vec<(String, String)> {
        self.last_pairs.lock().clone()
    }
}

impl Reranker for ScriptedReranker {
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_pairs.lock() = pairs
            .iter()
            .map(|(q, d)| (q.to_string(), d.to_string()))
            .collect();
        Ok(pairs
            .iter()
            .map(|(_, d)| self.scores.get(*d).copied().unwrap_or(0.0))
            .collect())
    }
}

/// Canned reply for one (collection, filter value) key
#[derive(Clone, Default)]
pub struct MockReply {
    pub hits: Vec<Candidate>,
    pub delay: Duration,
    pub fail: bool,
}

impl MockReply {
    pub fn hits(hits: &[(&str, &str)]) -> Self {
        Self {
            hits: hits.iter().map(|(id, doc)| Candidate::new(*id, *doc)).collect(),
            ..Self::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

/// Records every call. Unknown keys answer with an empty hit list; collections
/// marked missing answer `CollectionNotFound`.
#[derive(Default)]
pub struct MockStore {
    replies: Mutex<HashMap<(String, Option<String>), MockReply>>,
    missing: Mutex<Vec<String>>,
    queries: Mutex<Vec<ScopedQuery>>,
    batches: Mutex<Vec<CollectionBatch>>,
    fail_adds: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_adds() -> Self {
        Self {
            fail_adds: true,
            ..Self::default()
        }
    }

    /// Reply for queries on `collection` filtered by `scope` (`None` = unscoped)
    pub fn reply(&self, collection: &str, scope: Option<&str>, reply: MockReply) {
        self.replies
            .lock()
            .insert((collection.to_string(), scope.map(str::to_string)), reply);
    }

    pub fn mark_missing(&self, collection: &str) {
        self.missing.lock().push(collection.to_string());
    }

    pub fn queries(&self) -> Vec<ScopedQuery> {
        self.queries.lock().clone()
    }

    pub fn batches(&self) -> Vec<CollectionBatch> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl VectorStore for MockStore {
    async fn query(&self, query: ScopedQuery) -> Result<ScopedQueryResult> {
        self.queries.lock().push(query.clone());
        if self.missing.lock().contains(&query.collection) {
            return Err(Error::CollectionNotFound(query.collection).into());
        }

        let key = (
            query.collection.clone(),
            query.filter.as_ref().map(|f| f.value.clone()),
        );
        let reply = self.replies.lock().get(&key).cloned().unwrap_or_default();
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        if reply.fail {
            return Err(SearchError::Task(format!("lookup on {} failed", query.collection)));
        }

        let mut hits = reply.hits;
        hits.truncate(query.limit);
        Ok(ScopedQueryResult::new(hits))
    }

    async fn add(&self, batch: CollectionBatch) -> Result<usize> {
        batch.validate()?;
        let written = batch.len();
        self.batches.lock().push(batch);
        if self.fail_adds {
            return Err(Error::InvalidConfig("store is read-only".to_string()).into());
        }
        Ok(written)
    }
}
