//! HTTP surface driven through the router

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use beacon_risk::api::{create_router, handlers::AppState};
use beacon_risk::{BusinessMetrics, EngineConfig, LocalScorer, RiskScore, TelemetryCollector};
use common::{distressed_record, healthy_record, refused_endpoint, spawn_predictor, MockMode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn config(endpoint: &str) -> EngineConfig {
    EngineConfig {
        ml_service_url: endpoint.to_string(),
        interactive_timeout: Duration::from_secs(2),
        batch_timeout: Duration::from_secs(2),
        ..EngineConfig::default()
    }
}

fn app(endpoint: &str) -> (Router, Arc<TelemetryCollector>) {
    let telemetry = Arc::new(TelemetryCollector::new());
    let state = Arc::new(AppState::from_config(&config(endpoint), telemetry.clone()));
    (create_router(state), telemetry)
}

fn app_with_scorer(endpoint: &str, scorer: LocalScorer) -> (Router, Arc<TelemetryCollector>) {
    let telemetry = Arc::new(TelemetryCollector::new());
    let state = AppState::from_config(&config(endpoint), telemetry.clone()).with_local_scorer(scorer);
    (create_router(Arc::new(state)), telemetry)
}

fn exploding_scorer(_: &BusinessMetrics) -> RiskScore {
    panic!("scorer exploded")
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(&refused_endpoint());
    let (status, body) = send(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_predict_primary() {
    let mock = spawn_predictor(MockMode::Normal).await;
    let (app, telemetry) = app(&mock.endpoint);

    let (status, body) = send(app, "POST", "/api/risk/predict", Some(healthy_record())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 42);
    assert_eq!(body["category"], "Medium Risk");
    assert_eq!(body["riskLevel"], "Medium Risk");
    assert_eq!(body["method"], "primary");
    assert_eq!(body["factors"], json!(["x"]));
    assert_eq!(body["message"], "Risk prediction completed successfully");
    assert!(body["lastUpdated"].is_string());
    assert_eq!(telemetry.get_stats().total_assessments, 1);
}

#[tokio::test]
async fn test_predict_degrades_silently() {
    let (app, telemetry) = app(&refused_endpoint());

    let (status, body) = send(app, "POST", "/api/risk/predict", Some(distressed_record())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["method"], "fallback");
    assert_eq!(body["category"], "High Risk");
    assert_eq!(body["score"], 100);
    assert_eq!(
        body["message"],
        "Risk prediction completed using fallback calculation (ML service unavailable)"
    );
    assert_eq!(
        telemetry.get_stats().assessments_by_method["fallback"],
        1
    );
}

#[tokio::test]
async fn test_model_only_rejects_missing_fields() {
    let (app, _) = app(&refused_endpoint());

    let (status, body) = send(
        app,
        "POST",
        "/api/risk/predict-demo",
        Some(json!({"revenue": 0, "expenses": 10, "cashFlow": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["missing"], json!(["cashFlow", "employeeCount", "yearsInBusiness"]));
}

#[tokio::test]
async fn test_model_only_does_not_fall_back() {
    let (app, _) = app(&refused_endpoint());

    let (status, body) =
        send(app, "POST", "/api/risk/predict-demo", Some(distressed_record())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ML service unavailable");
    assert!(body["mlServiceError"]
        .as_str()
        .unwrap()
        .starts_with("EXT_CONNECTION_FAILED"));
}

#[tokio::test]
async fn test_model_only_success() {
    let mock = spawn_predictor(MockMode::Normal).await;
    let (app, _) = app(&mock.endpoint);

    let (status, body) =
        send(app, "POST", "/api/risk/predict-demo", Some(distressed_record())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 42);
    assert_eq!(body["method"], "primary");
}

#[tokio::test]
async fn test_batch_mixes_methods_in_order() {
    let mock = spawn_predictor(MockMode::MissingScore).await;
    let (app, telemetry) = app(&mock.endpoint);

    let records = json!({
        "records": [healthy_record(), distressed_record(), {}],
        "concurrency": 2
    });
    let (status, body) = send(app, "POST", "/api/risk/batch", Some(records)).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_requested"], 3);
    assert_eq!(data["total_processed"], 3);
    assert_eq!(data["by_method"]["emergency_fallback"], 3);

    let results = data["results"].as_array().unwrap();
    for (i, row) in results.iter().enumerate() {
        assert_eq!(row["index"], i);
        assert_eq!(row["status"], "success");
    }
    assert_eq!(results[0]["assessment"]["category"], "Low Risk");
    assert_eq!(results[1]["assessment"]["category"], "High Risk");
    assert_eq!(telemetry.get_stats().total_assessments, 3);
}

#[tokio::test]
async fn test_batch_validation() {
    let (app, _) = app(&refused_endpoint());
    let (status, body) =
        send(app.clone(), "POST", "/api/risk/batch", Some(json!({"records": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
    assert_eq!(body["error"]["message"], "No records provided");

    let too_many: Vec<Value> = (0..101).map(|_| json!({})).collect();
    let (status, _) = send(app, "POST", "/api/risk/batch", Some(json!({"records": too_many}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_fails_when_every_tier_fails() {
    let (app, telemetry) = app_with_scorer(&refused_endpoint(), exploding_scorer);

    let (status, body) = send(app, "POST", "/api/risk/predict", Some(healthy_record())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["message"], "Unable to calculate risk prediction");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("scorer exploded"));
    assert!(details.contains("EXT_CONNECTION_FAILED"));
    assert!(body.get("score").is_none());

    let stats = telemetry.get_stats();
    assert_eq!(stats.terminal_failures, 1);
    assert_eq!(stats.total_assessments, 0);
}

#[tokio::test]
async fn test_batch_reports_terminal_rows() {
    let (app, telemetry) = app_with_scorer(&refused_endpoint(), exploding_scorer);

    let records = json!({"records": [healthy_record()]});
    let (status, body) = send(app, "POST", "/api/risk/batch", Some(records)).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_requested"], 1);
    assert_eq!(data["total_processed"], 0);
    assert_eq!(data["total_failed"], 1);

    let row = &data["results"][0];
    assert_eq!(row["index"], 0);
    assert_eq!(row["status"], "error");
    assert!(row.get("assessment").is_none());
    assert!(row["error"]
        .as_str()
        .unwrap()
        .contains("ENGINE_TERMINAL_FAILURE"));
    assert_eq!(telemetry.get_stats().terminal_failures, 1);
}

#[tokio::test]
async fn test_stats_reflect_requests() {
    let (app, _) = app(&refused_endpoint());

    send(app.clone(), "POST", "/api/risk/predict", Some(healthy_record())).await;
    let (status, body) = send(app, "GET", "/api/risk/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_assessments"], 1);
    assert_eq!(body["data"]["assessments_by_method"]["fallback"], 1);
    assert_eq!(body["data"]["terminal_failures"], 0);
}
