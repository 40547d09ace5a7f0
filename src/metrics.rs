//! Prometheus metrics for the query surface

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Total queries served, by endpoint and outcome
    pub static ref QUERIES_TOTAL: CounterVec = register_counter_vec!(
        "fmcg_queries_total",
        "Total queries served",
        &["endpoint", "status"]
    ).unwrap();

    /// Query latency
    pub static ref QUERY_DURATION: HistogramVec = register_histogram_vec!(
        "fmcg_query_duration_seconds",
        "Query latency in seconds",
        &["endpoint"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    /// Rows in the fact store
    pub static ref FACT_ROWS: Gauge = register_gauge!(
        "fmcg_fact_rows",
        "Number of rows in the fact store"
    ).unwrap();
}

/// Count one finished query
pub fn record_query(endpoint: &str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    QUERIES_TOTAL.with_label_values(&[endpoint, status]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
