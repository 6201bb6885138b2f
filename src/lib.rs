//! # prodex
//!
//! Product search service: a free-text query is embedded, matched against
//! category phrases to predict its intent, answered by one scoped similarity
//! lookup per predicted category, and finally reranked with a pairwise
//! relevance scorer.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! prodex --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use prodex::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> prodex::SearchResult<()> {
//! let store = Arc::new(LocalStore::new(Arc::new(StorageManager::new())));
//! let service = SearchService::new(
//!     SearchConfig::default(),
//!     store,
//!     Arc::new(HashingEmbedder::default()),
//!     Arc::new(LexicalReranker::default()),
//! )?;
//!
//! let ranked_ids = service.search("lightweight laptop for travel").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `prodex-core` - Vectors, points, payload filters and exact-scan collections
//! - `prodex-storage` - In-memory collection registry
//! - `prodex-search` - Intent classification, scoped retrieval, reranking
//! - `prodex-api` - REST endpoints

// Re-export core types
pub use prodex_core::{
    Collection, CollectionConfig, Distance,
    Vector, Point, ScoredPoint,
    Filter, PayloadFilter, FilterCondition,
    Error, Result,
};

// Re-export storage
pub use prodex_storage::StorageManager;

// Re-export the search pipeline
pub use prodex_search::{
    CandidateSet, CategoryEntry, Embedder, HashingEmbedder, LexicalReranker, LocalStore,
    ProductRecord, Reranker, SearchConfig, SearchError, SearchOutcome, SearchService,
    VectorStore,
};
pub use prodex_search::Result as SearchResult;

// Re-export API
pub use prodex_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Collection, CollectionConfig, Distance,
        Vector, Point,
        Error, Result,
        StorageManager,
        CategoryEntry, Embedder, HashingEmbedder, LexicalReranker, LocalStore,
        ProductRecord, Reranker, SearchConfig, SearchError, SearchService, VectorStore,
        RestApi,
    };
}
