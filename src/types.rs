//! Core data types of the fact table
//!
//! # Key Types
//!
//! - **`FactRecord`**: one row of the sales fact table (dimensions, time, metrics)
//! - **`Dimension`**: the closed set of dimensions usable for grouping and filtering
//! - **`Metric`**: the numeric measures that can be aggregated
//! - **`GroupValue`**: the value a dimension takes in one row
//!
//! # Example
//!
//! ```rust
//! use fmcg_analytics::types::{Dimension, FactRecord, GroupValue};
//!
//! let row = FactRecord {
//!     brand: Some("Acme".to_string()),
//!     year: Some(2021),
//!     sales_value: 120.5,
//!     ..Default::default()
//! };
//!
//! assert_eq!(Dimension::Brand.value_of(&row), GroupValue::Text("Acme".to_string()));
//! assert_eq!(Dimension::Channel.value_of(&row), GroupValue::Null);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One observational record of sales and volume for a market/brand/time slice
///
/// Dimensions are all optional. `sales_value` and `volume` are never absent:
/// they deserialize to 0.0 when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Row identity
    #[serde(default)]
    pub id: i64,
    /// Market the observation belongs to
    #[serde(default)]
    pub market: Option<String>,
    /// Sales channel
    #[serde(default)]
    pub channel: Option<String>,
    /// Geographic region
    #[serde(default)]
    pub region: Option<String>,
    /// Product category
    #[serde(default)]
    pub category: Option<String>,
    /// Product sub-category
    #[serde(default)]
    pub sub_category: Option<String>,
    /// Brand name
    #[serde(default)]
    pub brand: Option<String>,
    /// Product variant
    #[serde(default)]
    pub variant: Option<String>,
    /// Packaging type
    #[serde(default)]
    pub pack_type: Option<String>,
    /// Promoted product group
    #[serde(default)]
    pub ppg: Option<String>,
    /// Pack size label
    #[serde(default)]
    pub pack_size: Option<String>,
    /// Calendar year
    #[serde(default)]
    pub year: Option<i32>,
    /// Month of year, 1-12
    #[serde(default)]
    pub month: Option<i32>,
    /// Week of year
    #[serde(default)]
    pub week: Option<i32>,
    /// Observation date
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Brand/category key
    #[serde(default)]
    pub br_cat_id: Option<String>,
    /// Sales value (defaults to 0.0)
    #[serde(default)]
    pub sales_value: f64,
    /// Volume (defaults to 0.0)
    #[serde(default)]
    pub volume: f64,
    /// Volume in units, when reported
    #[serde(default)]
    pub volume_units: Option<f64>,
}

impl FactRecord {
    /// Read a metric from this row
    #[inline]
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sales => self.sales_value,
            Metric::Volume => self.volume,
        }
    }
}

/// Dimensions that may be used for grouping and filtering
///
/// This is the allow-list: anything not representable here is rejected
/// before a query reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    /// `year`
    Year,
    /// `month`
    Month,
    /// `pack_type`
    PackType,
    /// `ppg`
    Ppg,
    /// `channel`
    Channel,
    /// `brand`
    Brand,
}

impl Dimension {
    /// Every allowed dimension, in allow-list order
    pub const ALL: [Dimension; 6] = [
        Dimension::Year,
        Dimension::Month,
        Dimension::PackType,
        Dimension::Ppg,
        Dimension::Channel,
        Dimension::Brand,
    ];

    /// Wire name of the dimension
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Month => "month",
            Dimension::PackType => "pack_type",
            Dimension::Ppg => "ppg",
            Dimension::Channel => "channel",
            Dimension::Brand => "brand",
        }
    }

    /// Resolve a wire name, returning `None` for anything outside the allow-list
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == name)
    }

    /// Allow-list rendered for error messages
    pub fn allowed_names() -> String {
        Self::ALL
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column accessor: the value this dimension takes in `row`
    pub fn value_of(&self, row: &FactRecord) -> GroupValue {
        match self {
            Dimension::Year => GroupValue::from(row.year),
            Dimension::Month => GroupValue::from(row.month),
            Dimension::PackType => GroupValue::from(row.pack_type.as_deref()),
            Dimension::Ppg => GroupValue::from(row.ppg.as_deref()),
            Dimension::Channel => GroupValue::from(row.channel.as_deref()),
            Dimension::Brand => GroupValue::from(row.brand.as_deref()),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric measures on a fact row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// `sales_value`
    #[default]
    Sales,
    /// `volume`
    Volume,
}

impl Metric {
    /// Resolve the client discriminator (`sales` / `volume`) or the column name
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sales" | "sales_value" => Some(Metric::Sales),
            "volume" => Some(Metric::Volume),
            _ => None,
        }
    }

    /// Name of the backing column
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Sales => "sales_value",
            Metric::Volume => "volume",
        }
    }

    /// Client-facing discriminator
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Sales => "sales",
            Metric::Volume => "volume",
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of one dimension in one row
///
/// Variant order matters: within a single dimension all concrete values share
/// a variant, so the derived `Ord` places `Null` after every value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupValue {
    /// Integer dimension value (year, month)
    Int(i64),
    /// Text dimension value
    Text(String),
    /// Dimension absent in the row
    Null,
}

impl Serialize for GroupValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GroupValue::Int(v) => serializer.serialize_i64(*v),
            GroupValue::Text(s) => serializer.serialize_str(s),
            GroupValue::Null => serializer.serialize_none(),
        }
    }
}

impl From<Option<i32>> for GroupValue {
    fn from(v: Option<i32>) -> Self {
        v.map_or(GroupValue::Null, |v| GroupValue::Int(i64::from(v)))
    }
}

impl From<Option<&str>> for GroupValue {
    fn from(v: Option<&str>) -> Self {
        match v {
            Some(s) if !s.is_empty() => GroupValue::Text(s.to_string()),
            _ => GroupValue::Null,
        }
    }
}
