//! Local ML predictor stand-in for integration tests

#![allow(dead_code)]

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// How the mock predictor answers
#[derive(Clone, Copy, Debug)]
pub enum MockMode {
    /// 200 with a valid Medium Risk payload
    Normal,
    /// 500 Internal Server Error
    ServerError,
    /// Valid payload after the given delay
    Slow(Duration),
    /// 200 with a payload missing risk_score
    MissingScore,
    /// 200 with a body that is not JSON
    NotJson,
}

/// Running mock predictor
pub struct MockPredictor {
    pub endpoint: String,
    /// Last request body received
    pub received: Arc<Mutex<Option<Value>>>,
}

pub async fn spawn_predictor(mode: MockMode) -> MockPredictor {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();

    let app = Router::new().route(
        "/predict",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(body);
                match mode {
                    MockMode::Normal => (StatusCode::OK, valid_body()),
                    MockMode::ServerError => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({"detail": "model not loaded"}).to_string(),
                    ),
                    MockMode::Slow(delay) => {
                        tokio::time::sleep(delay).await;
                        (StatusCode::OK, valid_body())
                    }
                    MockMode::MissingScore => (
                        StatusCode::OK,
                        json!({"risk_level": "High Risk", "factors": []}).to_string(),
                    ),
                    MockMode::NotJson => (StatusCode::OK, "<html>oops</html>".to_string()),
                }
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockPredictor {
        endpoint: format!("http://{}/predict", addr),
        received,
    }
}

/// Endpoint on a port nothing listens on
pub fn refused_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/predict", addr)
}

fn valid_body() -> String {
    json!({"risk_score": 0.42, "risk_level": "Medium Risk", "factors": ["x"]}).to_string()
}

/// Scenario A: healthy business
pub fn healthy_record() -> Value {
    json!({
        "revenue": 1_000_000,
        "expenses": 600_000,
        "cashFlow": 50_000,
        "debt": 100_000,
        "assets": 800_000,
        "employeeCount": 20,
        "yearsInBusiness": 8,
        "marketGrowth": 5,
        "competitionLevel": 4,
        "customerRetention": 85,
        "digitalPresence": 7,
        "innovationScore": 7
    })
}

/// Scenario B: distressed business
pub fn distressed_record() -> Value {
    json!({
        "revenue": 100_000,
        "expenses": 150_000,
        "cashFlow": -10_000,
        "debt": 90_000,
        "assets": 100_000,
        "employeeCount": 2,
        "yearsInBusiness": 0,
        "marketGrowth": -5,
        "competitionLevel": 9,
        "customerRetention": 30,
        "digitalPresence": 2,
        "innovationScore": 2
    })
}
