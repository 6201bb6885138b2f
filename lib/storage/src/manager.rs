use prodex_core::{
    Collection, CollectionConfig, Distance, Error, FilterCondition, PayloadFilter, Point, Result,
    ScoredPoint, Vector,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Name and size of a registered collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub name: String,
    pub vector_dim: usize,
    pub points_count: usize,
}

/// Manages named collections.
///
/// The registry and every collection carry their own locks, so a shared
/// `StorageManager` can serve concurrent queries while a batch is written.
pub struct StorageManager {
    collections: Arc<RwLock<HashMap<String, Arc<Collection>>>>,
    distance: Distance,
}

impl StorageManager {
    pub fn new() -> Self {
        Self::with_distance(Distance::Cosine)
    }

    /// Collections created by this manager use `distance`
    pub fn with_distance(distance: Distance) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            distance,
        }
    }

    pub fn create_collection(&self, config: CollectionConfig) -> Result<Arc<Collection>> {
        let name = config.name.clone();
        let mut collections = self.collections.write();

        if collections.contains_key(&name) {
            return Err(Error::CollectionExists(name));
        }

        let collection = Arc::new(Collection::new(config));
        collections.insert(name.clone(), collection.clone());
        info!(collection = %name, "created collection");
        Ok(collection)
    }

    /// Return the named collection, creating it with `vector_dim` if absent
    pub fn get_or_create_collection(&self, name: &str, vector_dim: usize) -> Arc<Collection> {
        if let Some(existing) = self.get_collection(name) {
            return existing;
        }

        let mut collections = self.collections.write();
        collections
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(collection = %name, vector_dim, "created collection");
                Arc::new(Collection::new(CollectionConfig {
                    name: name.to_string(),
                    vector_dim,
                    distance: self.distance,
                }))
            })
            .clone()
    }

    #[inline]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn delete_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    #[inline]
    #[must_use]
    pub fn list_collections(&self) -> Vec<CollectionSummary> {
        let mut summaries: Vec<CollectionSummary> = self
            .collections
            .read()
            .values()
            .map(|c| CollectionSummary {
                name: c.name().to_string(),
                vector_dim: c.vector_dim(),
                points_count: c.count(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    #[inline]
    #[must_use]
    pub fn collection_exists(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Add a caller-prepared batch to a collection.
    ///
    /// The sequences must have equal length. The collection is created on
    /// first use with the dimension of the first embedding. No chunking is
    /// done here; an oversized batch is written under one lock.
    pub fn add_items(
        &self,
        collection_name: &str,
        ids: Vec<String>,
        documents: Vec<String>,
        embeddings: Vec<Vector>,
        metadatas: Option<Vec<Map<String, Value>>>,
    ) -> Result<usize> {
        let expected = ids.len();
        check_len("documents", expected, documents.len())?;
        check_len("embeddings", expected, embeddings.len())?;
        if let Some(metadatas) = &metadatas {
            check_len("metadatas", expected, metadatas.len())?;
        }
        if expected == 0 {
            return Ok(0);
        }

        let vector_dim = embeddings[0].dim();
        let collection = self.get_or_create_collection(collection_name, vector_dim);

        let mut metadatas = metadatas.map(Vec::into_iter);
        let points: Vec<Point> = ids
            .into_iter()
            .zip(documents)
            .zip(embeddings)
            .map(|((id, document), embedding)| {
                let point = Point::new(id, document, embedding);
                match metadatas.as_mut().and_then(Iterator::next) {
                    Some(payload) => point.with_payload(payload),
                    None => point,
                }
            })
            .collect();

        let written = collection.batch_upsert(points)?;
        debug!(collection = %collection_name, written, "batch added");
        Ok(written)
    }

    /// Nearest-neighbour query, optionally restricted by a payload filter
    pub fn query(
        &self,
        collection_name: &str,
        embedding: &Vector,
        limit: usize,
        filter: Option<&FilterCondition>,
    ) -> Result<Vec<ScoredPoint>> {
        let collection = self
            .get_collection(collection_name)
            .ok_or_else(|| Error::CollectionNotFound(collection_name.to_string()))?;

        match filter {
            Some(condition) => {
                let filter = PayloadFilter::new(condition.clone());
                collection.search(embedding, limit, Some(&filter))
            }
            None => collection.search(embedding, limit, None),
        }
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::BatchLengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
