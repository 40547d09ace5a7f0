//! Query result shapes and numeric normalization
//!
//! Every aggregate leaving the engine is rounded to two decimals with
//! round-half-to-even and never null.

use crate::types::{Dimension, GroupValue, Metric};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// Default output field name for aggregate values
pub const DEFAULT_LABEL: &str = "value";

/// Round to 2 decimal places, ties to even
#[inline]
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round_ties_even() / 100.0
}

/// Replace a null aggregate with 0.0 and round it
#[inline]
pub fn normalize(value: Option<f64>) -> f64 {
    round2(value.unwrap_or(0.0))
}

/// One output row of a grouped aggregation
///
/// Serializes as a flat JSON object: one field per group dimension, the
/// aggregate under `label`, then `percentage` when present.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    /// Group dimension values in group-by order
    pub groups: Vec<(Dimension, GroupValue)>,
    /// Output field name of the aggregate
    pub label: Arc<str>,
    /// Rounded aggregate
    pub value: f64,
    /// Share of the grand total, set by [`apply_percentages`]
    pub percentage: Option<f64>,
}

impl AggregateRow {
    /// Value of a group dimension in this row
    pub fn group(&self, dim: Dimension) -> Option<&GroupValue> {
        self.groups.iter().find(|(d, _)| *d == dim).map(|(_, v)| v)
    }
}

impl Serialize for AggregateRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.groups.len() + 1 + usize::from(self.percentage.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (dim, value) in &self.groups {
            map.serialize_entry(dim.as_str(), value)?;
        }
        map.serialize_entry(&*self.label, &self.value)?;
        if let Some(pct) = self.percentage {
            map.serialize_entry("percentage", &pct)?;
        }
        map.end()
    }
}

/// Annotate rows with their percentage of the grand total
///
/// A zero total is treated as 1 so that an all-zero result yields 0.0 for
/// every row instead of dividing by zero.
pub fn apply_percentages(rows: &mut [AggregateRow]) {
    let total: f64 = rows.iter().map(|r| r.value).sum();
    let total = if total == 0.0 { 1.0 } else { total };

    for row in rows.iter_mut() {
        row.percentage = Some(round2(row.value / total * 100.0));
    }
}

/// Ungrouped statistics over the filtered fact rows
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SummaryStats {
    /// Metric summarized
    pub metric: Metric,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Total
    pub sum: f64,
    /// Mean
    pub avg: f64,
    /// Rows in the selection
    pub count: u64,
}
