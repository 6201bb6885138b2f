//! # prodex Core
//!
//! Core data structures for the prodex search service.
//!
//! - [`Vector`] - Dense embedding vector
//! - [`Point`] - A vector with id, document text and optional metadata payload
//! - [`Collection`] - Container for points with exact similarity search
//! - [`PayloadFilter`] - Metadata equality filters used to scope queries
//!
//! ## Example
//!
//! ```rust
//! use prodex_core::{Collection, CollectionConfig, Distance, FilterCondition, PayloadFilter, Point, Vector};
//! use serde_json::json;
//!
//! let collection = Collection::new(CollectionConfig {
//!     name: "products".to_string(),
//!     vector_dim: 3,
//!     distance: Distance::Cosine,
//! });
//!
//! let metadata = json!({"subcategory": "Laptops"}).as_object().cloned().unwrap();
//! let point = Point::new("p1", "Thin laptop", Vector::new(vec![1.0, 0.0, 0.0]))
//!     .with_payload(metadata);
//! collection.upsert(point).unwrap();
//!
//! let filter = PayloadFilter::new(FilterCondition::eq("subcategory", "Laptops"));
//! let hits = collection
//!     .search(&Vector::new(vec![1.0, 0.0, 0.0]), 10, Some(&filter))
//!     .unwrap();
//! assert_eq!(hits[0].id, "p1");
//! ```

pub mod collection;
pub mod vector;
pub mod error;
pub mod point;
pub mod filter;

pub use collection::{Collection, CollectionConfig, Distance};
pub use vector::Vector;
pub use error::{Error, Result};
pub use point::{Point, ScoredPoint};
pub use filter::{Filter, PayloadFilter, FilterCondition};
