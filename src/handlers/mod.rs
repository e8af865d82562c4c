use axum::Router;
use std::time::Instant;

use crate::services::PredictionService;

pub mod health;
pub mod prediction;

/// Shared application state, read-only after startup
#[derive(Clone)]
pub struct AppState {
    pub prediction: PredictionService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(prediction: PredictionService) -> Self {
        Self {
            prediction,
            started_at: Instant::now(),
        }
    }
}

/// All API routes, mounted under /api by the server
pub fn api_router() -> Router<AppState> {
    prediction::create_prediction_routes().merge(health::create_health_routes())
}
