use crate::{Error, Filter, Point, Result, ScoredPoint, Vector};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

/// Below this many points a scan stays on the calling thread
const PARALLEL_SCAN_THRESHOLD: usize = 4_096;

/// Configuration for a collection
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub name: String,
    pub vector_dim: usize,
    pub distance: Distance,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            vector_dim: 384,
            distance: Distance::Cosine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    Cosine,
    Euclidean,
    Dot,
}

impl FromStr for Distance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Cosine" | "cosine" => Ok(Distance::Cosine),
            "Euclidean" | "euclidean" => Ok(Distance::Euclidean),
            "Dot" | "dot" => Ok(Distance::Dot),
            other => Err(Error::InvalidConfig(format!("unknown distance: {other}"))),
        }
    }
}

impl Distance {
    /// Higher is more similar for every variant
    fn score(self, point: &Vector, query: &Vector) -> f32 {
        match self {
            Distance::Cosine => point.cosine_similarity(query),
            Distance::Dot => point.dot(query),
            Distance::Euclidean => {
                let squared: f32 = point
                    .as_slice()
                    .iter()
                    .zip(query.as_slice())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                -squared.sqrt()
            }
        }
    }
}

fn score_point<'a>(
    point: &'a Point,
    query: &Vector,
    distance: Distance,
    filter: Option<&dyn Filter>,
) -> Option<(&'a Point, f32)> {
    if filter.map(|f| f.matches(point)).unwrap_or(true) {
        Some((point, distance.score(&point.vector, query)))
    } else {
        None
    }
}

/// Higher scores first; NaN after every real score
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// A named set of points searchable by vector similarity
pub struct Collection {
    config: CollectionConfig,
    points: RwLock<HashMap<String, Point>>,
}

impl Collection {
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            points: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn vector_dim(&self) -> usize {
        self.config.vector_dim
    }

    pub fn distance(&self) -> Distance {
        self.config.distance
    }

    pub fn count(&self) -> usize {
        self.points.read().len()
    }

    fn check_dim(&self, vector: &Vector) -> Result<()> {
        if vector.dim() != self.config.vector_dim {
            return Err(Error::InvalidDimension {
                expected: self.config.vector_dim,
                actual: vector.dim(),
            });
        }
        Ok(())
    }

    /// Insert or update a point
    pub fn upsert(&self, point: Point) -> Result<()> {
        self.check_dim(&point.vector)?;
        Self::insert_versioned(&mut self.points.write(), point);
        Ok(())
    }

    /// Insert many points under a single write lock.
    ///
    /// Every vector is validated before anything is written, so a bad
    /// dimension leaves the collection untouched.
    pub fn batch_upsert(&self, points: Vec<Point>) -> Result<usize> {
        for point in &points {
            self.check_dim(&point.vector)?;
        }

        let count = points.len();
        let mut guard = self.points.write();
        guard.reserve(count);
        for point in points {
            Self::insert_versioned(&mut guard, point);
        }
        Ok(count)
    }

    fn insert_versioned(points: &mut HashMap<String, Point>, mut point: Point) {
        if let Some(previous) = points.get(&point.id) {
            point.version = previous.version + 1;
        }
        points.insert(point.id.clone(), point);
    }

    /// Get a point by ID
    pub fn get(&self, id: &str) -> Option<Point> {
        self.points.read().get(id).cloned()
    }

    /// Delete a point by ID
    pub fn delete(&self, id: &str) -> bool {
        self.points.write().remove(id).is_some()
    }

    /// Exact similarity search.
    ///
    /// The filter is applied before the limit, so a scoped query returns up to
    /// `limit` matching points rather than a post-filtered top-k. Hits come
    /// back most-similar first; equal scores are ordered by id.
    pub fn search(
        &self,
        query: &Vector,
        limit: usize,
        filter: Option<&dyn Filter>,
    ) -> Result<Vec<ScoredPoint>> {
        self.check_dim(query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let distance = self.config.distance;
        let points = self.points.read();
        let mut scored: Vec<(&Point, f32)> = if points.len() >= PARALLEL_SCAN_THRESHOLD {
            points
                .par_iter()
                .filter_map(|(_, p)| score_point(p, query, distance, filter))
                .collect()
        } else {
            points
                .values()
                .filter_map(|p| score_point(p, query, distance, filter))
                .collect()
        };

        scored.sort_by(|a, b| descending(a.1, b.1).then_with(|| a.0.id.cmp(&b.0.id)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(point, score)| ScoredPoint {
                id: point.id.clone(),
                document: point.document.clone(),
                score,
            })
            .collect())
    }

    /// Get all points
    pub fn iter(&self) -> Vec<Point> {
        self.points.read().values().cloned().collect()
    }
}
