//! Structured values passed between pipeline stages

use crate::{Result, SearchError};
use ahash::AHashSet;
use prodex_core::{FilterCondition, Vector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A product surfaced by a similarity query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub document: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document: document.into(),
        }
    }
}

/// Equality predicate on one metadata field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    pub field: String,
    pub value: String,
}

impl MetadataFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn to_condition(&self) -> FilterCondition {
        FilterCondition::eq(self.field.clone(), self.value.clone())
    }
}

/// One unit of retrieval work. Self-contained, so sibling queries can run
/// concurrently without sharing mutable state.
#[derive(Debug, Clone)]
pub struct ScopedQuery {
    pub collection: String,
    pub embedding: Arc<Vector>,
    pub limit: usize,
    pub filter: Option<MetadataFilter>,
}

impl ScopedQuery {
    pub fn unscoped(collection: impl Into<String>, embedding: Arc<Vector>, limit: usize) -> Self {
        Self {
            collection: collection.into(),
            embedding,
            limit,
            filter: None,
        }
    }

    pub fn scoped(
        collection: impl Into<String>,
        embedding: Arc<Vector>,
        limit: usize,
        filter: MetadataFilter,
    ) -> Self {
        Self {
            collection: collection.into(),
            embedding,
            limit,
            filter: Some(filter),
        }
    }
}

/// Hits of one [`ScopedQuery`], most similar first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopedQueryResult {
    pub hits: Vec<Candidate>,
}

impl ScopedQueryResult {
    pub fn new(hits: Vec<Candidate>) -> Self {
        Self { hits }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// How one retrieval task ended
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(ScopedQueryResult),
    /// Counts as an empty result
    TimedOut,
    Failed(SearchError),
}

/// Per-run tally of retrieval task outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LookupStats {
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
}

impl LookupStats {
    pub fn total(&self) -> usize {
        self.completed + self.timed_out + self.failed
    }
}

/// Id-unique candidates in first-seen order.
///
/// Inserting an id that is already present keeps the earlier document.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<Candidate>,
    seen: AHashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the id was already present
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if self.seen.contains(&candidate.id) {
            return false;
        }
        self.seen.insert(candidate.id.clone());
        self.entries.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn document(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.document.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|c| c.id.clone()).collect()
    }

    pub fn into_ids(self) -> Vec<String> {
        self.entries.into_iter().map(|c| c.id).collect()
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for candidate in iter {
            set.insert(candidate);
        }
        set
    }
}

impl PartialEq for CandidateSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for CandidateSet {}

/// A product to index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub document: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One search phrase for a category label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub subcategory: String,
    pub search_string: String,
}

impl CategoryEntry {
    pub fn new(subcategory: impl Into<String>, search_string: impl Into<String>) -> Self {
        Self {
            subcategory: subcategory.into(),
            search_string: search_string.into(),
        }
    }

    /// Stored id, unique per (label, phrase) pair
    pub fn id(&self) -> String {
        format!("{}_{}", self.subcategory, self.search_string)
    }
}

/// Equal-length columns for one batch write
#[derive(Debug, Clone, Default)]
pub struct CollectionBatch {
    pub collection: String,
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub embeddings: Vec<Vector>,
    pub metadatas: Option<Vec<Map<String, Value>>>,
}

impl CollectionBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let expected = self.ids.len();
        let mut columns = vec![
            ("documents", self.documents.len()),
            ("embeddings", self.embeddings.len()),
        ];
        if let Some(metadatas) = &self.metadatas {
            columns.push(("metadatas", metadatas.len()));
        }
        for (name, len) in columns {
            if len != expected {
                return Err(SearchError::InvalidBatch(format!(
                    "{name} has {len} entries, expected {expected}"
                )));
            }
        }
        check_unique_ids(&self.ids)
    }
}

/// Rejects a batch that names the same id twice
pub fn check_unique_ids(ids: &[String]) -> Result<()> {
    let mut seen = AHashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(SearchError::InvalidBatch(format!("duplicate id {id}")));
        }
    }
    Ok(())
}

/// Result of one search with per-stage detail
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub ranked_ids: Vec<String>,
    pub categories: Vec<String>,
    pub candidate_count: usize,
    pub lookups: LookupStats,
}
