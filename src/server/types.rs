//! Request and response types for the HTTP API

use crate::error::{Error, Result};
use crate::query::{AggregateFunction, FilterPolicy, FilterSet};
use crate::types::Metric;
use serde::Serialize;

// =============================================================================
// Request Parameters
// =============================================================================

/// Query-string parameters shared by every `/fmcg` endpoint
///
/// Multi-valued parameters arrive as repeated keys (`brand=A&brand=B`), with
/// or without a `[]` suffix, so they are extracted from the raw pair list
/// rather than through a derived `Deserialize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Metric to aggregate, `sales` when absent
    pub metric: Metric,
    /// Requested group-by names, unvalidated
    pub group_by: Vec<String>,
    /// Aggregate function, `sum` when absent
    pub function: AggregateFunction,
    /// Dimension filters
    pub filters: FilterSet,
}

impl QueryParams {
    /// Parse raw query pairs
    pub fn from_pairs(pairs: &[(String, String)], policy: FilterPolicy) -> Result<Self> {
        let mut params = QueryParams::default();

        for (key, value) in pairs {
            let value = value.trim();
            match key.trim_end_matches("[]") {
                "metric" if !value.is_empty() => {
                    params.metric =
                        Metric::parse(value).ok_or_else(|| Error::InvalidMetric(value.to_string()))?;
                },
                "agg" if !value.is_empty() => {
                    params.function = AggregateFunction::parse(value)?;
                },
                "group_by" if !value.is_empty() => params.group_by.push(value.to_string()),
                _ => {},
            }
        }

        params.filters = FilterSet::from_pairs(
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            policy,
        )?;

        Ok(params)
    }

    /// The requested group-by, or `default` when none was given
    pub fn group_by_or(&self, default: &[&str]) -> Vec<String> {
        if self.group_by.is_empty() {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            self.group_by.clone()
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}
