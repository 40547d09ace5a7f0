//! HTTP handlers for the `/fmcg` API
//!
//! Every query endpoint is a thin parameter translation onto
//! [`AggregationEngine`](crate::query::AggregationEngine). Legacy chart
//! endpoints only pin the metric, the default group-by and the output label.

use super::types::{HealthResponse, QueryParams};
use super::{ApiError, AppState};
use crate::metrics::{gather_metrics, record_query, QUERY_DURATION};
use crate::query::{AggregateRow, SummaryStats, DEFAULT_LABEL};
use crate::types::{FactRecord, Metric};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::future::Future;
use std::sync::Arc;

type Pairs = Query<Vec<(String, String)>>;

/// Time a query, count its outcome and convert the error for the client
async fn observe<T, F>(endpoint: &'static str, fut: F) -> Result<Json<T>, ApiError>
where
    F: Future<Output = crate::Result<T>>,
{
    let timer = QUERY_DURATION.with_label_values(&[endpoint]).start_timer();
    let result = fut.await;
    timer.observe_duration();
    record_query(endpoint, result.is_ok());
    result.map(Json).map_err(ApiError::from)
}

// =============================================================================
// Health & Metrics
// =============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus metrics endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

// =============================================================================
// Query Handlers
// =============================================================================

/// Raw fact rows, capped at the configured row limit
pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<FactRecord>>, ApiError> {
    observe("rows", async {
        let params = QueryParams::from_pairs(&pairs, state.filter_policy())?;
        state.engine.raw_rows(&params.filters).await
    })
    .await
}

/// Grouped aggregation
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    observe("aggregate", async {
        let params = QueryParams::from_pairs(&pairs, state.filter_policy())?;
        state
            .engine
            .aggregate(
                params.metric,
                &params.group_by,
                &params.filters,
                params.function,
                DEFAULT_LABEL,
            )
            .await
    })
    .await
}

/// Ungrouped summary statistics
pub async fn aggregate_stats(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<SummaryStats>, ApiError> {
    observe("aggregate_stats", async {
        let params = QueryParams::from_pairs(&pairs, state.filter_policy())?;
        state.engine.summary(params.metric, &params.filters).await
    })
    .await
}

/// Monthly trend ordered by (year, month)
pub async fn trend(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    observe("trend", async {
        let params = QueryParams::from_pairs(&pairs, state.filter_policy())?;
        state.engine.trend(params.metric, &params.filters).await
    })
    .await
}

/// Grouped rows with each row's share of the total
pub async fn market_share(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    observe("market_share", async {
        let params = QueryParams::from_pairs(&pairs, state.filter_policy())?;
        state
            .engine
            .market_share(params.metric, &params.group_by, &params.filters)
            .await
    })
    .await
}

// =============================================================================
// Legacy Chart Endpoints
// =============================================================================

/// Parameters of a legacy chart endpoint
struct LegacyChart {
    endpoint: &'static str,
    /// Fixed metric, or `None` to take it from the request
    metric: Option<Metric>,
    default_group_by: &'static [&'static str],
    label: &'static str,
}

async fn legacy_chart(
    state: &AppState,
    pairs: &[(String, String)],
    chart: LegacyChart,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    observe(chart.endpoint, async {
        let params = QueryParams::from_pairs(pairs, state.filter_policy())?;
        let group_by = params.group_by_or(chart.default_group_by);
        state
            .engine
            .aggregate(
                chart.metric.unwrap_or(params.metric),
                &group_by,
                &params.filters,
                params.function,
                chart.label,
            )
            .await
    })
    .await
}

/// Sales value by year and brand
pub async fn sales_value(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    let chart = LegacyChart {
        endpoint: "sales_value",
        metric: Some(Metric::Sales),
        default_group_by: &["year", "brand"],
        label: "total_sales",
    };
    legacy_chart(&state, &pairs, chart).await
}

/// Volume by year and brand
pub async fn volume_contribution(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    let chart = LegacyChart {
        endpoint: "volume_contribution",
        metric: Some(Metric::Volume),
        default_group_by: &["year", "brand"],
        label: "total_volume",
    };
    legacy_chart(&state, &pairs, chart).await
}

/// Requested metric by brand and year
pub async fn yearly_sales(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<AggregateRow>>, ApiError> {
    let chart = LegacyChart {
        endpoint: "yearly_sales",
        metric: None,
        default_group_by: &["brand", "year"],
        label: DEFAULT_LABEL,
    };
    legacy_chart(&state, &pairs, chart).await
}
