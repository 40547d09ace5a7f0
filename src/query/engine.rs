//! Grouped aggregation engine
//!
//! Validates grouping requests, hands a typed [`AggregateQuery`] to the fact
//! store and shapes what comes back: nulls become 0.0, values are rounded to
//! two decimals and rows are ordered by the group-by fields in request order.
//!
//! # Example
//!
//! ```rust
//! use fmcg_analytics::query::{AggregateFunction, AggregationEngine, FilterSet};
//! use fmcg_analytics::store::InMemoryFactStore;
//! use fmcg_analytics::types::{FactRecord, Metric};
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let store = InMemoryFactStore::with_rows(vec![
//!     FactRecord { id: 1, brand: Some("X".into()), year: Some(2020), sales_value: 100.0, ..Default::default() },
//!     FactRecord { id: 2, brand: Some("Y".into()), year: Some(2020), sales_value: 300.0, ..Default::default() },
//! ]);
//! let engine = AggregationEngine::new(Arc::new(store));
//!
//! let rows = engine
//!     .aggregate(Metric::Sales, &["brand"], &FilterSet::new(), AggregateFunction::Sum, "value")
//!     .await
//!     .unwrap();
//! assert_eq!(rows[0].value, 100.0);
//! assert_eq!(rows[1].value, 300.0);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

use crate::error::Result;
use crate::query::filter::FilterSet;
use crate::query::plan::{AggregateFunction, AggregateQuery, GroupBy};
use crate::query::result::{apply_percentages, normalize, AggregateRow, SummaryStats, DEFAULT_LABEL};
use crate::store::FactStore;
use crate::types::{FactRecord, Metric};
use std::sync::Arc;
use tracing::debug;

/// Default cap on rows returned by the raw (unaggregated) path
pub const DEFAULT_RAW_ROW_LIMIT: usize = 500;

/// Stateless query engine over a shared fact store
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn FactStore>,
    raw_row_limit: usize,
}

impl AggregationEngine {
    /// Create an engine with the default raw row limit
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self {
            store,
            raw_row_limit: DEFAULT_RAW_ROW_LIMIT,
        }
    }

    /// Override the raw row limit
    pub fn with_raw_row_limit(mut self, limit: usize) -> Self {
        self.raw_row_limit = limit;
        self
    }

    /// Grouped aggregation from client supplied group-by names
    ///
    /// Fails with `EmptyGroupBy` or `InvalidGroupBy` before touching the store.
    /// An all-filtered-out selection yields an empty result.
    pub async fn aggregate<S: AsRef<str>>(
        &self,
        metric: Metric,
        group_by: &[S],
        filters: &FilterSet,
        function: AggregateFunction,
        label: &str,
    ) -> Result<Vec<AggregateRow>> {
        let group_by = GroupBy::parse(group_by)?;
        let query = AggregateQuery::new(metric, group_by)
            .with_filters(filters.clone())
            .with_function(function);
        self.execute(&query, label).await
    }

    /// Run an already validated query and normalize the output rows
    pub async fn execute(&self, query: &AggregateQuery, label: &str) -> Result<Vec<AggregateRow>> {
        debug!(
            store = self.store.store_id(),
            query = %query,
            filters = ?query.filters.constrained_dimensions(),
            "Executing aggregation"
        );

        let mut groups = self.store.aggregate(query).await?;
        groups.sort_by(|a, b| a.key.cmp(&b.key));

        let dims = query.group_by.dimensions();
        let label: Arc<str> = Arc::from(label);

        Ok(groups
            .into_iter()
            .map(|g| AggregateRow {
                groups: dims.iter().copied().zip(g.key).collect(),
                label: label.clone(),
                value: normalize(g.value),
                percentage: None,
            })
            .collect())
    }

    /// Grouped SUM with each row's percentage of the grand total
    pub async fn market_share<S: AsRef<str>>(
        &self,
        metric: Metric,
        group_by: &[S],
        filters: &FilterSet,
    ) -> Result<Vec<AggregateRow>> {
        let mut rows = self
            .aggregate(
                metric,
                group_by,
                filters,
                AggregateFunction::Sum,
                DEFAULT_LABEL,
            )
            .await?;
        apply_percentages(&mut rows);
        Ok(rows)
    }

    /// Monthly series ordered by (year, month)
    pub async fn trend(&self, metric: Metric, filters: &FilterSet) -> Result<Vec<AggregateRow>> {
        let query = AggregateQuery::new(metric, GroupBy::year_month()).with_filters(filters.clone());
        self.execute(&query, DEFAULT_LABEL).await
    }

    /// Min/max/sum/avg/count of `metric` over the filtered rows
    pub async fn summary(&self, metric: Metric, filters: &FilterSet) -> Result<SummaryStats> {
        debug!(
            store = self.store.store_id(),
            metric = %metric,
            filters = ?filters.constrained_dimensions(),
            "Computing summary statistics"
        );

        let raw = self.store.summarize(metric, filters).await?;
        Ok(SummaryStats {
            metric,
            min: normalize(raw.min),
            max: normalize(raw.max),
            sum: normalize(raw.sum),
            avg: normalize(raw.avg),
            count: raw.count,
        })
    }

    /// Unaggregated rows, capped at the raw row limit
    pub async fn raw_rows(&self, filters: &FilterSet) -> Result<Vec<FactRecord>> {
        Ok(self.store.fetch_rows(filters, self.raw_row_limit).await?)
    }
}
