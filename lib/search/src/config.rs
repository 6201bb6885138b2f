//! Search pipeline configuration

use crate::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PRODUCT_COLLECTION: &str = "products_v1";
pub const DEFAULT_CATEGORY_COLLECTION: &str = "categories_v1";
pub const DEFAULT_CATEGORY_FIELD: &str = "subcategory";
/// Number of category labels predicted per query (K)
pub const DEFAULT_INTENT_TOP_K: usize = 3;
/// Several indexed search strings map to one label, so the category lookup
/// asks for `top_k * factor` rows before deduplicating.
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 6;
/// Candidates fetched for each predicted category (M)
pub const DEFAULT_CANDIDATES_PER_CATEGORY: usize = 70;
/// Candidates fetched by the unscoped query when no category was predicted
pub const DEFAULT_FALLBACK_CANDIDATE_COUNT: usize = 200;
pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_COMPUTE_WORKERS: usize = 2;

/// Tunables for [`SearchService`](crate::SearchService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub product_collection: String,
    pub category_collection: String,
    /// Product metadata field matched against predicted labels
    pub category_field: String,
    pub intent_top_k: usize,
    pub oversample_factor: usize,
    pub candidates_per_category: usize,
    pub fallback_candidate_count: usize,
    /// Per-lookup timeout; `None` waits indefinitely
    pub task_timeout_ms: Option<u64>,
    /// Worker threads for embedding and reranking
    pub compute_workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            product_collection: DEFAULT_PRODUCT_COLLECTION.to_string(),
            category_collection: DEFAULT_CATEGORY_COLLECTION.to_string(),
            category_field: DEFAULT_CATEGORY_FIELD.to_string(),
            intent_top_k: DEFAULT_INTENT_TOP_K,
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            candidates_per_category: DEFAULT_CANDIDATES_PER_CATEGORY,
            fallback_candidate_count: DEFAULT_FALLBACK_CANDIDATE_COUNT,
            task_timeout_ms: Some(DEFAULT_TASK_TIMEOUT_MS),
            compute_workers: DEFAULT_COMPUTE_WORKERS,
        }
    }
}

impl SearchConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        let names = [
            ("product_collection", &self.product_collection),
            ("category_collection", &self.category_collection),
            ("category_field", &self.category_field),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(SearchError::InvalidConfig(format!("{field} must not be empty")));
            }
        }

        let counts = [
            ("intent_top_k", self.intent_top_k),
            ("oversample_factor", self.oversample_factor),
            ("candidates_per_category", self.candidates_per_category),
            ("fallback_candidate_count", self.fallback_candidate_count),
            ("compute_workers", self.compute_workers),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(SearchError::InvalidConfig(format!("{field} must be positive")));
            }
        }

        if self.task_timeout_ms == Some(0) {
            return Err(SearchError::InvalidConfig(
                "task_timeout_ms must be positive (omit it to disable the timeout)".to_string(),
            ));
        }
        Ok(())
    }
}
