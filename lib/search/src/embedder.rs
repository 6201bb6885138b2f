//! Text embedding
//!
//! The pipeline only needs a deterministic text -> vector function. Model
//! backed implementations live outside this crate and are injected as
//! `Arc<dyn Embedder>`; [`HashingEmbedder`] is a model-free stand-in.

use crate::distance::hash_text_to_vector;
use crate::{Result, SearchError};
use prodex_core::Vector;

/// Default dimension for hashed text embeddings
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to fixed-length vectors.
///
/// Methods are synchronous and may be CPU heavy; the search service calls
/// them from its compute pool, never from the async executor.
pub trait Embedder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vector>;

    /// Embed many texts in one call. Must return one vector per input, in order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    fn dimension(&self) -> usize;
}

/// Feature-hashing embedder: token and character trigram buckets,
/// L2-normalized
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(SearchError::InvalidConfig(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dim })
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dim: DEFAULT_EMBEDDING_DIM }
    }
}

impl Embedder for HashingEmbedder {
    fn encode(&self, text: &str) -> Result<Vector> {
        Ok(Vector::new(hash_text_to_vector(text, self.dim)))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
