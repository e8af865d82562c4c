use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;

use super::AppState;
use crate::VERSION;

/// Create health probe routes
pub fn create_health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
        .route("/health/live", get(liveness))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub version: String,
    pub services: ServiceStates,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStates {
    pub statistical: String,
    pub hugging_face: String,
}

#[derive(Serialize)]
pub struct ProbeResponse {
    pub status: String,
    pub timestamp: String,
}

/// Service health check
/// GET /api/health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let hugging_face = if state.prediction.model_available() {
        "available"
    } else {
        "not_configured"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs(),
        version: VERSION.to_string(),
        services: ServiceStates {
            statistical: "available".to_string(),
            hugging_face: hugging_face.to_string(),
        },
    })
}

/// Readiness probe; the statistical fallback needs no warm-up, so the
/// service is ready as soon as it is serving
/// GET /api/health/ready
async fn readiness() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "ready".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Liveness probe
/// GET /api/health/live
async fn liveness() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "alive".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
