//! Error types for the analytics service

use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum Error {
    /// A requested group-by field is not in the allow-list
    #[error("Invalid group_by: {field}. Allowed: [{allowed}]")]
    InvalidGroupBy {
        /// The first offending field name, as supplied by the client
        field: String,
        /// Comma separated allow-list
        allowed: String,
    },

    /// Grouping was required but no group-by fields were supplied
    #[error("group_by cannot be empty")]
    EmptyGroupBy,

    /// A filter value could not be coerced to the dimension's type
    #[error("Invalid value '{value}' for filter '{dimension}'")]
    InvalidFilterValue {
        /// Filter dimension name
        dimension: String,
        /// The rejected raw value
        value: String,
    },

    /// Unknown metric discriminator
    #[error("Invalid metric: {0}. Allowed: [sales, volume]")]
    InvalidMetric(String),

    /// Unknown aggregate function name
    #[error("Invalid aggregate function: {0}. Allowed: [sum, min, max, avg, count]")]
    InvalidAggregateFunction(String),

    /// Fact store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the client can fix this error by changing the request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidGroupBy { .. }
                | Error::EmptyGroupBy
                | Error::InvalidFilterValue { .. }
                | Error::InvalidMetric(_)
                | Error::InvalidAggregateFunction(_)
        )
    }
}

/// Fact store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot data could not be decoded
    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    /// The backing store is not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::CorruptedData(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_group_by_lists_allowed_fields() {
        let err = Error::InvalidGroupBy {
            field: "region".to_string(),
            allowed: "year, month".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("region"));
        assert!(msg.contains("Allowed: [year, month]"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_store_error_is_server_side() {
        let err: Error = StoreError::Unavailable("connection refused".to_string()).into();
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("connection refused"));
    }
}
