//! FMCG Analytics - grouped aggregation over a packaged-goods sales fact table
//!
//! This library provides:
//! - A closed allow-list of grouping/filtering dimensions
//! - A multi-valued filter composer
//! - A grouped aggregation engine with deterministic rounding and ordering
//! - Market-share, trend and summary derivations over the same engine
//! - An axum HTTP surface over a pluggable fact store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// Prometheus metrics
#[allow(missing_docs)]
pub mod metrics;

/// Filter composition, grouped aggregation and result shaping
pub mod query;

/// HTTP router, handlers and error mapping
#[allow(missing_docs)]
pub mod server;

/// Fact store abstraction and the in-memory backend
pub mod store;

// Re-export main types
pub use error::{Error, Result};
pub use query::{AggregateFunction, AggregationEngine, FilterPolicy, FilterSet};
pub use store::{FactStore, InMemoryFactStore};
pub use types::{Dimension, FactRecord, GroupValue, Metric};
