//! # prodex API
//!
//! HTTP boundary for the prodex search service.

pub mod rest;

pub use rest::{configure, RestApi};
