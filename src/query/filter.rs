//! Filter composition
//!
//! Turns client supplied, possibly multi-valued dimension filters into a
//! single predicate over fact rows. Filters are conjunctive across dimensions
//! and disjunctive (`IN`) within a dimension; an empty list means no
//! constraint on that dimension.

use crate::error::{Error, Result};
use crate::types::{Dimension, FactRecord};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How to treat filter values that cannot be coerced to the dimension's type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPolicy {
    /// Reject the whole request
    #[default]
    Strict,
    /// Drop the malformed value and keep going
    Lenient,
}

/// Multi-valued filters over the filterable dimensions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Allowed brands
    pub brand: Vec<String>,
    /// Allowed years
    pub year: Vec<i32>,
    /// Allowed pack types
    pub pack_type: Vec<String>,
    /// Allowed promoted product groups
    pub ppg: Vec<String>,
    /// Allowed channels
    pub channel: Vec<String>,
}

impl FilterSet {
    /// A filter set that matches every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain brand to any of `values`
    pub fn with_brands<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brand.extend(values.into_iter().map(Into::into));
        self
    }

    /// Constrain year to any of `values`
    pub fn with_years(mut self, values: impl IntoIterator<Item = i32>) -> Self {
        self.year.extend(values);
        self
    }

    /// Constrain pack type to any of `values`
    pub fn with_pack_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pack_type.extend(values.into_iter().map(Into::into));
        self
    }

    /// Constrain PPG to any of `values`
    pub fn with_ppgs<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ppg.extend(values.into_iter().map(Into::into));
        self
    }

    /// Constrain channel to any of `values`
    pub fn with_channels<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel.extend(values.into_iter().map(Into::into));
        self
    }

    /// Build a filter set from raw query-string pairs
    ///
    /// Keys may be plain (`brand`) or bracketed (`brand[]`). Empty values and
    /// keys that are not filterable dimensions are ignored.
    pub fn from_pairs<'a, I>(pairs: I, policy: FilterPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filters = FilterSet::new();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim_end_matches("[]") {
                "brand" => filters.brand.push(value.to_string()),
                "pack_type" => filters.pack_type.push(value.to_string()),
                "ppg" => filters.ppg.push(value.to_string()),
                "channel" => filters.channel.push(value.to_string()),
                "year" => match value.parse::<i32>() {
                    Ok(year) => filters.year.push(year),
                    Err(_) => match policy {
                        FilterPolicy::Strict => {
                            return Err(Error::InvalidFilterValue {
                                dimension: "year".to_string(),
                                value: value.to_string(),
                            });
                        },
                        FilterPolicy::Lenient => {
                            warn!(value = %value, "Dropping non-numeric year filter value");
                        },
                    },
                },
                _ => {},
            }
        }

        Ok(filters)
    }

    /// True when no dimension is constrained
    pub fn is_empty(&self) -> bool {
        self.brand.is_empty()
            && self.year.is_empty()
            && self.pack_type.is_empty()
            && self.ppg.is_empty()
            && self.channel.is_empty()
    }

    /// Dimensions that carry at least one value
    pub fn constrained_dimensions(&self) -> Vec<Dimension> {
        let mut dims = Vec::new();
        if !self.year.is_empty() {
            dims.push(Dimension::Year);
        }
        if !self.pack_type.is_empty() {
            dims.push(Dimension::PackType);
        }
        if !self.ppg.is_empty() {
            dims.push(Dimension::Ppg);
        }
        if !self.channel.is_empty() {
            dims.push(Dimension::Channel);
        }
        if !self.brand.is_empty() {
            dims.push(Dimension::Brand);
        }
        dims
    }

    /// Evaluate the composed predicate against one row
    ///
    /// A null dimension never satisfies a non-empty constraint.
    pub fn matches(&self, row: &FactRecord) -> bool {
        matches_text(&self.brand, row.brand.as_deref())
            && matches_text(&self.pack_type, row.pack_type.as_deref())
            && matches_text(&self.ppg, row.ppg.as_deref())
            && matches_text(&self.channel, row.channel.as_deref())
            && (self.year.is_empty() || row.year.is_some_and(|y| self.year.contains(&y)))
    }
}

#[inline]
fn matches_text(allowed: &[String], value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.iter().any(|a| a == v))
}
