//! Vector store seam
//!
//! The pipeline talks to its similarity index only through [`VectorStore`].
//! [`LocalStore`] adapts the in-process [`StorageManager`].

use crate::types::{Candidate, CollectionBatch, ScopedQuery, ScopedQueryResult};
use crate::{Result, SearchError};
use async_trait::async_trait;
use prodex_storage::StorageManager;
use std::sync::Arc;

/// A set of named collections supporting batch add and nearest-neighbour query.
///
/// Implementations own their concurrency safety; the pipeline issues
/// concurrent queries without any locking of its own.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `query.limit` hits, most similar first. An empty hit list is a
    /// valid answer, not an error.
    async fn query(&self, query: ScopedQuery) -> Result<ScopedQueryResult>;

    /// Write a caller-prepared batch; returns the number of items written
    async fn add(&self, batch: CollectionBatch) -> Result<usize>;
}

/// [`VectorStore`] over an in-process [`StorageManager`].
///
/// Scans run on tokio's blocking pool so they never stall the executor.
#[derive(Clone)]
pub struct LocalStore {
    storage: Arc<StorageManager>,
}

impl LocalStore {
    pub fn new(storage: Arc<StorageManager>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn query(&self, query: ScopedQuery) -> Result<ScopedQueryResult> {
        let storage = self.storage.clone();
        let hits = tokio::task::spawn_blocking(move || {
            let condition = query.filter.as_ref().map(|f| f.to_condition());
            storage.query(
                &query.collection,
                &query.embedding,
                query.limit,
                condition.as_ref(),
            )
        })
        .await
        .map_err(|e| SearchError::Task(e.to_string()))??;

        Ok(ScopedQueryResult::new(
            hits.into_iter()
                .map(|hit| Candidate::new(hit.id, hit.document))
                .collect(),
        ))
    }

    async fn add(&self, batch: CollectionBatch) -> Result<usize> {
        batch.validate()?;
        let storage = self.storage.clone();
        let written = tokio::task::spawn_blocking(move || {
            storage.add_items(
                &batch.collection,
                batch.ids,
                batch.documents,
                batch.embeddings,
                batch.metadatas,
            )
        })
        .await
        .map_err(|e| SearchError::Task(e.to_string()))??;
        Ok(written)
    }
}
