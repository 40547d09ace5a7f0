//! In-memory fact store
//!
//! Holds the whole fact table behind a read-write lock. Readers never block
//! each other; writes only happen while loading.

use super::{FactStore, GroupedValue, RawSummary};
use crate::error::StoreError;
use crate::query::accumulator::Accumulator;
use crate::query::filter::FilterSet;
use crate::query::plan::AggregateQuery;
use crate::types::{Dimension, FactRecord, GroupValue, Metric};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Fact store backed by a `Vec` in memory
#[derive(Debug, Default)]
pub struct InMemoryFactStore {
    rows: RwLock<Vec<FactRecord>>,
}

impl InMemoryFactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `rows`
    pub fn with_rows(rows: Vec<FactRecord>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Load a JSON array of fact records
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let rows: Vec<FactRecord> = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), rows = rows.len(), "Loaded fact snapshot");
        Ok(Self::with_rows(rows))
    }

    /// Append one row
    pub fn insert(&self, row: FactRecord) {
        self.rows.write().push(row);
    }

    /// Copy of every row, for offline inspection
    pub fn snapshot(&self) -> Vec<FactRecord> {
        self.rows.read().clone()
    }

    /// Number of distinct values per dimension, nulls included
    pub fn distinct_counts(&self) -> Vec<(Dimension, usize)> {
        let rows = self.rows.read();
        Dimension::ALL
            .iter()
            .map(|dim| {
                let distinct: BTreeSet<GroupValue> = rows.iter().map(|r| dim.value_of(r)).collect();
                (*dim, distinct.len())
            })
            .collect()
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    fn store_id(&self) -> &str {
        "memory"
    }

    async fn fetch_rows(
        &self,
        filters: &FilterSet,
        limit: usize,
    ) -> Result<Vec<FactRecord>, StoreError> {
        let rows = self.rows.read();
        let mut matched: Vec<&FactRecord> = rows.iter().filter(|r| filters.matches(r)).collect();
        matched.sort_by_key(|r| r.id);
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    async fn aggregate(&self, query: &AggregateQuery) -> Result<Vec<GroupedValue>, StoreError> {
        let dims = query.group_by.dimensions();
        let mut groups: BTreeMap<Vec<GroupValue>, Accumulator> = BTreeMap::new();

        {
            let rows = self.rows.read();
            for row in rows.iter().filter(|r| query.filters.matches(r)) {
                let key: Vec<GroupValue> = dims.iter().map(|d| d.value_of(row)).collect();
                groups.entry(key).or_default().push(row.metric(query.metric));
            }
        }

        Ok(groups
            .into_iter()
            .map(|(key, acc)| GroupedValue {
                key,
                value: acc.finish(query.function),
            })
            .collect())
    }

    async fn summarize(
        &self,
        metric: Metric,
        filters: &FilterSet,
    ) -> Result<RawSummary, StoreError> {
        let mut acc = Accumulator::new();
        for row in self.rows.read().iter().filter(|r| filters.matches(r)) {
            acc.push(row.metric(metric));
        }

        Ok(RawSummary {
            min: acc.min(),
            max: acc.max(),
            sum: acc.sum(),
            avg: acc.avg(),
            count: acc.count(),
        })
    }

    fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}
