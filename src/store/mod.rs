//! Fact store abstraction
//!
//! The aggregation engine only reads. Anything able to filter, group and
//! summarize fact rows can back it by implementing [`FactStore`].

mod memory;

pub use memory::InMemoryFactStore;

use crate::error::StoreError;
use crate::query::filter::FilterSet;
use crate::query::plan::AggregateQuery;
use crate::types::{FactRecord, GroupValue, Metric};
use async_trait::async_trait;

/// One group of an aggregation as produced by a store, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedValue {
    /// Group values in the query's group-by order
    pub key: Vec<GroupValue>,
    /// Aggregate, `None` when null
    pub value: Option<f64>,
}

/// Ungrouped statistics as produced by a store
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawSummary {
    /// Smallest value, `None` over no rows
    pub min: Option<f64>,
    /// Largest value, `None` over no rows
    pub max: Option<f64>,
    /// Sum, `None` over no rows
    pub sum: Option<f64>,
    /// Mean, `None` over no rows
    pub avg: Option<f64>,
    /// Rows summarized
    pub count: u64,
}

/// Read access to the fact table
#[async_trait]
pub trait FactStore: Send + Sync + 'static {
    /// Identifier of this backend, for logs
    fn store_id(&self) -> &str;

    /// Rows matching `filters`, ordered by id, at most `limit`
    async fn fetch_rows(
        &self,
        filters: &FilterSet,
        limit: usize,
    ) -> Result<Vec<FactRecord>, StoreError>;

    /// Execute a grouped aggregation
    ///
    /// Returns one entry per distinct group key present in the filtered rows.
    async fn aggregate(&self, query: &AggregateQuery) -> Result<Vec<GroupedValue>, StoreError>;

    /// Min/max/sum/avg/count of `metric` over the filtered rows
    async fn summarize(
        &self,
        metric: Metric,
        filters: &FilterSet,
    ) -> Result<RawSummary, StoreError>;

    /// Total number of rows held
    fn row_count(&self) -> usize;
}
