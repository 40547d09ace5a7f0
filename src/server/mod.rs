//! HTTP surface of the analytics service
//!
//! # Endpoints
//!
//! - `GET /fmcg/` - Raw fact rows (capped)
//! - `GET /fmcg/aggregate` - Grouped aggregation
//! - `GET /fmcg/aggregate-stats` - Min/max/sum/avg/count
//! - `GET /fmcg/trend` - Monthly series
//! - `GET /fmcg/market-share` - Grouped rows with percentages
//! - `GET /fmcg/sales-value`, `/fmcg/volume-contribution`, `/fmcg/yearly-sales` - Legacy charts
//! - `GET /fmcg/health` - Health check
//! - `GET /metrics` - Prometheus metrics

pub mod handlers;
pub mod types;

use crate::config::Config;
use crate::error::Error;
use crate::query::{AggregationEngine, FilterPolicy};
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;
use types::ErrorBody;

/// Shared application state
pub struct AppState {
    /// Query engine over the loaded fact store
    pub engine: AggregationEngine,
    /// Service configuration
    pub config: Config,
}

impl AppState {
    pub fn new(engine: AggregationEngine, config: Config) -> Self {
        Self { engine, config }
    }

    pub fn filter_policy(&self) -> FilterPolicy {
        self.config.query.filter_policy
    }
}

/// Error returned by handlers
///
/// Client errors become 400 with the message in `detail`. Everything else is
/// logged and reported as a generic 500.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            error!(error = %self.0, "Query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Build CORS layer from configuration
fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if cors_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Raw rows
        .route("/fmcg", get(handlers::list_rows))
        .route("/fmcg/", get(handlers::list_rows))
        // Aggregation
        .route("/fmcg/aggregate", get(handlers::aggregate))
        .route("/fmcg/aggregate-stats", get(handlers::aggregate_stats))
        .route("/fmcg/trend", get(handlers::trend))
        .route("/fmcg/market-share", get(handlers::market_share))
        // Legacy charts
        .route("/fmcg/sales-value", get(handlers::sales_value))
        .route(
            "/fmcg/volume-contribution",
            get(handlers::volume_contribution),
        )
        .route("/fmcg/yearly-sales", get(handlers::yearly_sales))
        // Health and metrics
        .route("/fmcg/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state.clone())
        .layer(build_cors_layer(&state.config.server.cors_allowed_origins))
}
