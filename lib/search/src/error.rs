use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Reranking failed: {0}")]
    Rerank(String),

    #[error("Vector store error: {0}")]
    Store(#[from] prodex_core::Error),

    #[error("All {failed} candidate lookups failed, last error: {last_error}")]
    Retrieval { failed: usize, last_error: String },

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Compute pool error: {0}")]
    ComputePool(String),

    #[error("Task failed: {0}")]
    Task(String),
}
