//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware};
use crate::providers::ml_service::RiskPredictor;

/// Upper bound on requests processed at once by this instance
const MAX_IN_FLIGHT_REQUESTS: usize = 512;

/// Create the API router with all routes and middleware
pub fn create_router<P: RiskPredictor + 'static>(state: Arc<AppState<P>>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let risk_routes = Router::new()
        .route("/predict", post(handlers::predict_risk::<P>))
        .route("/predict-demo", post(handlers::predict_model_only::<P>))
        .route("/batch", post(handlers::batch_assess::<P>))
        .route("/stats", get(handlers::get_stats::<P>));

    Router::new()
        .nest("/api/risk", risk_routes)
        .route("/health", get(handlers::health_check::<P>))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS))
}
