//! Query engine for grouped aggregation over the fact table
//!
//! # Architecture
//!
//! ```text
//! Request parameters
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Compose    │  FilterSet from multi-valued dimension filters
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Validate   │  GroupBy against the dimension allow-list
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Execute    │  AggregateQuery against a FactStore
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Shape      │  Null → 0.0, round half-even, order, percentages
//! └─────────────┘
//! ```

pub mod accumulator;
pub mod engine;
pub mod filter;
pub mod plan;
pub mod result;

pub use accumulator::Accumulator;
pub use engine::{AggregationEngine, DEFAULT_RAW_ROW_LIMIT};
pub use filter::{FilterPolicy, FilterSet};
pub use plan::{AggregateFunction, AggregateQuery, GroupBy};
pub use result::{apply_percentages, round2, AggregateRow, SummaryStats, DEFAULT_LABEL};
