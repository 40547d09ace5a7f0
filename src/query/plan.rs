//! Typed aggregation queries
//!
//! A query is assembled from already validated parts (allow-listed group-by
//! dimensions, a resolved metric, a composed filter set), so the store never
//! sees a client supplied column name.

use crate::error::{Error, Result};
use crate::query::filter::FilterSet;
use crate::types::{Dimension, Metric};
use std::fmt;

/// Non-empty, allow-listed, ordered list of grouping dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy(Vec<Dimension>);

impl GroupBy {
    /// Validate client supplied field names
    ///
    /// Fails with `EmptyGroupBy` when `names` is empty, or `InvalidGroupBy`
    /// naming the first field outside the allow-list.
    pub fn parse<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dims = Vec::new();
        for name in names {
            let name = name.as_ref();
            match Dimension::parse(name) {
                Some(dim) => dims.push(dim),
                None => {
                    return Err(Error::InvalidGroupBy {
                        field: name.to_string(),
                        allowed: Dimension::allowed_names(),
                    });
                },
            }
        }
        Self::new(dims)
    }

    /// Build from typed dimensions
    ///
    /// A dimension named more than once keeps its first position only, so
    /// every output row carries each group field exactly once.
    pub fn new(dims: Vec<Dimension>) -> Result<Self> {
        if dims.is_empty() {
            return Err(Error::EmptyGroupBy);
        }
        let mut unique = Vec::with_capacity(dims.len());
        for dim in dims {
            if !unique.contains(&dim) {
                unique.push(dim);
            }
        }
        Ok(Self(unique))
    }

    /// Grouping used by the time trend view
    pub fn year_month() -> Self {
        Self(vec![Dimension::Year, Dimension::Month])
    }

    /// Grouping dimensions in request order
    pub fn dimensions(&self) -> &[Dimension] {
        &self.0
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|d| d.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Aggregation operator applied to the metric within each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregateFunction {
    /// Compensated sum
    #[default]
    Sum,
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Arithmetic mean
    Avg,
    /// Number of rows
    Count,
}

impl AggregateFunction {
    /// Parse a function name (case insensitive, `mean` is an alias of `avg`)
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "sum" => Ok(AggregateFunction::Sum),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            "avg" | "mean" => Ok(AggregateFunction::Avg),
            "count" => Ok(AggregateFunction::Count),
            _ => Err(Error::InvalidAggregateFunction(name.to_string())),
        }
    }

    /// Wire name of the function
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Count => "count",
        }
    }
}

/// A grouped aggregation ready for execution by a fact store
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    /// Measure being aggregated
    pub metric: Metric,
    /// Grouping dimensions in output order
    pub group_by: GroupBy,
    /// Row filters applied before grouping
    pub filters: FilterSet,
    /// Operator applied within each group
    pub function: AggregateFunction,
}

impl AggregateQuery {
    /// SUM of `metric` grouped by `group_by`, unfiltered
    pub fn new(metric: Metric, group_by: GroupBy) -> Self {
        Self {
            metric,
            group_by,
            filters: FilterSet::new(),
            function: AggregateFunction::Sum,
        }
    }

    /// Restrict the rows being grouped
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the aggregate function
    pub fn with_function(mut self, function: AggregateFunction) -> Self {
        self.function = function;
        self
    }
}

impl fmt::Display for AggregateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) GROUP BY {}",
            self.function.as_str(),
            self.metric.column(),
            self.group_by
        )
    }
}
