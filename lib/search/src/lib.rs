//! # prodex Search
//!
//! Query resolution for the prodex product search service.
//!
//! A free-text query passes through four stages:
//!
//! ```text
//! query ──embed──▶ vector ──classify──▶ labels (≤ K)
//!                    │                     │
//!                    └──────fan out────────┘
//!                  one scoped lookup per label,
//!                  or one unscoped fallback lookup
//!                            │
//!                   merge (first writer wins)
//!                            │
//!                 rerank (one batch, compute pool)
//!                            │
//!                            ▼
//!                      ranked product ids
//! ```
//!
//! - [`SearchService`] - Orchestrates the pipeline and the insertion paths
//! - [`IntentClassifier`] - Predicts category labels from the category collection
//! - [`CandidateRetriever`] - Concurrent scoped lookups and merge
//! - [`RerankStage`] - Batched pairwise scoring off the async executor
//! - [`VectorStore`], [`Embedder`], [`Reranker`] - Injected collaborators
//!
//! ## Example
//!
//! ```rust
//! use prodex_search::{
//!     CategoryEntry, HashingEmbedder, LexicalReranker, LocalStore, ProductRecord,
//!     SearchConfig, SearchService,
//! };
//! use prodex_storage::StorageManager;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = Arc::new(LocalStore::new(Arc::new(StorageManager::new())));
//! let service = SearchService::new(
//!     SearchConfig::default(),
//!     store,
//!     Arc::new(HashingEmbedder::default()),
//!     Arc::new(LexicalReranker::default()),
//! )
//! .unwrap();
//!
//! service
//!     .insert_categories(vec![CategoryEntry::new("Laptops", "laptop")])
//!     .await
//!     .unwrap();
//! service
//!     .insert_products(vec![ProductRecord {
//!         id: "P1".to_string(),
//!         document: "Thin and light laptop".to_string(),
//!         metadata: json!({"subcategory": "Laptops"}).as_object().cloned().unwrap(),
//!     }])
//!     .await
//!     .unwrap();
//!
//! let ranked = service.search("laptop").await.unwrap();
//! assert_eq!(ranked, vec!["P1".to_string()]);
//! # });
//! # }
//! ```

pub mod config;
pub mod distance;
pub mod embedder;
pub mod error;
pub mod intent;
pub mod pool;
pub mod rerank;
pub mod retriever;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::SearchConfig;
pub use embedder::{Embedder, HashingEmbedder, DEFAULT_EMBEDDING_DIM};
pub use error::{Result, SearchError};
pub use intent::{dedup_labels, IntentClassifier};
pub use pool::ComputePool;
pub use rerank::{LexicalReranker, RerankStage, Reranker};
pub use retriever::{merge_outcomes, CandidateRetriever};
pub use service::SearchService;
pub use store::{LocalStore, VectorStore};
pub use types::{
    Candidate, CandidateSet, CategoryEntry, CollectionBatch, LookupStats, MetadataFilter,
    ProductRecord, ScopedQuery, ScopedQueryResult, SearchOutcome, TaskOutcome,
};
