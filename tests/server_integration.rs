//! HTTP Server Integration Tests
//!
//! Drives the real router with `tower::ServiceExt::oneshot`.
//!
//! # Test Coverage
//!
//! 1. **Health & Metrics** - GET /fmcg/health, GET /metrics
//! 2. **Raw Rows** - GET /fmcg/ with filters and the row cap
//! 3. **Aggregation** - GET /fmcg/aggregate, /fmcg/aggregate-stats, /fmcg/trend
//! 4. **Market Share** - GET /fmcg/market-share
//! 5. **Legacy Charts** - sales-value, volume-contribution, yearly-sales
//! 6. **Error Handling** - 400 `{detail}` bodies, 500 on store failure

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fmcg_analytics::{
    config::Config,
    error::StoreError,
    query::{AggregateQuery, AggregationEngine, FilterPolicy, FilterSet},
    server::{build_router, AppState},
    store::{FactStore, GroupedValue, InMemoryFactStore, RawSummary},
    types::{FactRecord, Metric},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// =============================================================================
// Fixtures
// =============================================================================

fn fact(id: i64, brand: &str, year: i32, month: i32, sales: f64, volume: f64) -> FactRecord {
    FactRecord {
        id,
        brand: Some(brand.to_string()),
        year: Some(year),
        month: Some(month),
        channel: Some(if id % 2 == 0 { "Retail" } else { "Online" }.to_string()),
        sales_value: sales,
        volume,
        ..Default::default()
    }
}

fn sample_rows() -> Vec<FactRecord> {
    vec![
        fact(1, "X", 2020, 1, 100.0, 10.0),
        fact(2, "Y", 2020, 1, 300.0, 30.0),
        fact(3, "X", 2021, 2, 50.0, 5.0),
        fact(4, "Y", 2021, 1, 150.0, 15.0),
    ]
}

fn router_with(store: Arc<dyn FactStore>, config: Config) -> Router {
    let engine = AggregationEngine::new(store).with_raw_row_limit(config.query.raw_row_limit);
    build_router(Arc::new(AppState::new(engine, config)))
}

fn create_test_router() -> Router {
    router_with(
        Arc::new(InMemoryFactStore::with_rows(sample_rows())),
        Config::default(),
    )
}

/// Store whose every query fails
struct UnavailableStore;

#[async_trait]
impl FactStore for UnavailableStore {
    fn store_id(&self) -> &str {
        "unavailable"
    }

    async fn fetch_rows(
        &self,
        _filters: &FilterSet,
        _limit: usize,
    ) -> Result<Vec<FactRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn aggregate(&self, _query: &AggregateQuery) -> Result<Vec<GroupedValue>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn summarize(
        &self,
        _metric: Metric,
        _filters: &FilterSet,
    ) -> Result<RawSummary, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn row_count(&self) -> usize {
        0
    }
}

/// Helper to make a GET request and decode the JSON body
async fn get_request(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, json)
}

// =============================================================================
// Tests: Health & Metrics
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_metrics_endpoint_counts_queries() {
    let router = create_test_router();
    let _ = get_request(&router, "/fmcg/aggregate?group_by=brand").await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("fmcg_queries_total"));
    assert!(text.contains("endpoint=\"aggregate\""));
}

// =============================================================================
// Tests: Raw Rows
// =============================================================================

#[tokio::test]
async fn test_raw_rows_filtered() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/?brand[]=X&year[]=2021").await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 3);
}

#[tokio::test]
async fn test_raw_rows_capped() {
    let rows: Vec<FactRecord> = (0..50).map(|i| fact(i, "X", 2020, 1, 1.0, 1.0)).collect();
    let mut config = Config::default();
    config.query.raw_row_limit = 10;
    let router = router_with(Arc::new(InMemoryFactStore::with_rows(rows)), config);

    let (status, json) = get_request(&router, "/fmcg/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 10);
}

// =============================================================================
// Tests: Aggregation
// =============================================================================

#[tokio::test]
async fn test_aggregate_by_brand() {
    let router = create_test_router();
    let (status, json) =
        get_request(&router, "/fmcg/aggregate?group_by[]=brand&year[]=2020").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"brand": "X", "value": 100.0},
            {"brand": "Y", "value": 300.0},
        ])
    );
}

#[tokio::test]
async fn test_aggregate_orders_by_requested_fields() {
    let router = create_test_router();
    let (status, json) =
        get_request(&router, "/fmcg/aggregate?group_by=year&group_by=brand&metric=volume").await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<(i64, String)> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["year"].as_i64().unwrap(), r["brand"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (2020, "X".to_string()),
            (2020, "Y".to_string()),
            (2021, "X".to_string()),
            (2021, "Y".to_string()),
        ]
    );
    assert_eq!(json[1]["value"], 30.0);
}

#[tokio::test]
async fn test_aggregate_with_function() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/aggregate?group_by=brand&agg=count").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["value"], 2.0);
}

#[tokio::test]
async fn test_aggregate_stats() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/aggregate-stats?brand=Y").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "metric": "sales",
            "min": 150.0,
            "max": 300.0,
            "sum": 450.0,
            "avg": 225.0,
            "count": 2,
        })
    );
}

#[tokio::test]
async fn test_trend_ordered_by_time() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/trend").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"year": 2020, "month": 1, "value": 400.0},
            {"year": 2021, "month": 1, "value": 150.0},
            {"year": 2021, "month": 2, "value": 50.0},
        ])
    );
}

#[tokio::test]
async fn test_pack_type_and_ppg_filters_grouped_by_ppg_month() {
    let mut rows = sample_rows();
    rows[0].pack_type = Some("Can".to_string());
    rows[0].ppg = Some("P2".to_string());
    rows[1].pack_type = Some("Can".to_string());
    rows[1].ppg = Some("P1".to_string());
    rows[2].pack_type = Some("Bottle".to_string());
    rows[2].ppg = Some("P2".to_string());
    let router = router_with(
        Arc::new(InMemoryFactStore::with_rows(rows)),
        Config::default(),
    );

    let (status, json) = get_request(
        &router,
        "/fmcg/aggregate?group_by[]=ppg&group_by[]=month&pack_type[]=Can&ppg=P2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([{"ppg": "P2", "month": 1, "value": 100.0}]));
}

#[tokio::test]
async fn test_repeated_group_by_collapses_to_one_key() {
    let router = create_test_router();
    let (status, json) = get_request(
        &router,
        "/fmcg/aggregate?group_by=brand&group_by=brand&year=2020",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"brand": "X", "value": 100.0},
            {"brand": "Y", "value": 300.0},
        ])
    );
    assert_eq!(json[0].as_object().unwrap().len(), 2);
}

// =============================================================================
// Tests: Market Share
// =============================================================================

#[tokio::test]
async fn test_market_share_percentages() {
    let router = create_test_router();
    let (status, json) =
        get_request(&router, "/fmcg/market-share?group_by[]=brand&year[]=2020").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"brand": "X", "value": 100.0, "percentage": 25.0},
            {"brand": "Y", "value": 300.0, "percentage": 75.0},
        ])
    );
}

#[tokio::test]
async fn test_market_share_requires_group_by() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/market-share").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "group_by cannot be empty");
}

// =============================================================================
// Tests: Legacy Charts
// =============================================================================

#[tokio::test]
async fn test_sales_value_label_and_default_grouping() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/sales-value?channel=Retail").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"year": 2020, "brand": "Y", "total_sales": 300.0},
            {"year": 2021, "brand": "Y", "total_sales": 150.0},
        ])
    );
}

#[tokio::test]
async fn test_volume_contribution_ignores_metric_param() {
    let router = create_test_router();
    let (status, json) =
        get_request(&router, "/fmcg/volume-contribution?metric=sales&group_by=brand").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"brand": "X", "total_volume": 15.0},
            {"brand": "Y", "total_volume": 45.0},
        ])
    );
}

#[tokio::test]
async fn test_yearly_sales_groups_brand_then_year() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/yearly-sales").await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], json!({"brand": "X", "year": 2020, "value": 100.0}));
    assert_eq!(rows[1], json!({"brand": "X", "year": 2021, "value": 50.0}));
}

// =============================================================================
// Tests: Error Handling
// =============================================================================

#[tokio::test]
async fn test_invalid_group_by_returns_400() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/aggregate?group_by[]=invalid_field").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("invalid_field"));
    assert!(detail.contains("year, month, pack_type, ppg, channel, brand"));
}

#[tokio::test]
async fn test_empty_group_by_returns_400() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/aggregate").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "group_by cannot be empty");
}

#[tokio::test]
async fn test_invalid_metric_returns_400() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/aggregate?group_by=brand&metric=margin").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("margin"));
}

#[tokio::test]
async fn test_non_numeric_year_strict_rejects() {
    let router = create_test_router();
    let (status, json) = get_request(&router, "/fmcg/?year=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn test_non_numeric_year_lenient_drops_value() {
    let mut config = Config::default();
    config.query.filter_policy = FilterPolicy::Lenient;
    let router = router_with(
        Arc::new(InMemoryFactStore::with_rows(sample_rows())),
        config,
    );

    let (status, json) = get_request(&router, "/fmcg/aggregate?group_by=year&year=abc&year=2021").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([{"year": 2021, "value": 200.0}]));
}

#[tokio::test]
async fn test_store_failure_returns_generic_500() {
    let router = router_with(Arc::new(UnavailableStore), Config::default());
    let (status, json) = get_request(&router, "/fmcg/aggregate?group_by=brand").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "Internal server error");
}
