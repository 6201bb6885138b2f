use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::vector::Vector;

/// A stored item: id, document text, embedding and optional metadata payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    /// Version number - incremented each time the id is overwritten
    #[serde(default)]
    pub version: u64,
    pub document: String,
    pub vector: Vector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

impl Point {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, document: impl Into<String>, vector: Vector) -> Self {
        Self {
            id: id.into(),
            version: 0,
            document: document.into(),
            vector,
            payload: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Look up a payload field
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|p| p.get(name))
    }
}

/// A search hit: the matched point's id and document with its similarity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPoint {
    pub id: String,
    pub document: String,
    pub score: f32,
}
