use axum::{
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use prediction_backend::constants;
use prediction_backend::generation::{HuggingFaceBackend, TextGeneration};
use prediction_backend::handlers::{self, AppState};
use prediction_backend::services::{ModelService, PredictionService};
use prediction_backend::VERSION;

/// Service descriptor and endpoint documentation
/// GET /
async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "AI Stock Prediction Service",
        "version": VERSION,
        "description": "AI-powered stock depletion prediction and reorder suggestion service",
        "endpoints": {
            "POST /api/predict-depletion": "Predict stock depletion timeline",
            "POST /api/suggest-reorder": "Suggest optimal reorder quantity",
            "POST /api/batch-predict": "Batch depletion prediction (up to 50 materials)",
            "GET /api/models": "List available prediction models",
            "GET /api/health": "Service health check"
        }
    }))
}

/// Build the generation backend from the environment, if configured
fn load_generation_backend() -> Option<Arc<dyn TextGeneration>> {
    let api_key = match std::env::var("HUGGINGFACE_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            warn!("Hugging Face API not configured, using fallback models");
            return None;
        }
    };

    let model = std::env::var("HUGGINGFACE_MODEL")
        .unwrap_or_else(|_| constants::DEFAULT_GENERATION_MODEL.to_string());

    match HuggingFaceBackend::new(api_key, model) {
        Ok(backend) => {
            info!("Hugging Face API configured with model: {}", backend.model());
            Some(Arc::new(backend))
        }
        Err(e) => {
            warn!("Failed to initialize generation backend, using fallback models: {e}");
            None
        }
    }
}

fn build_cors_layer(cors_origins: &str) -> CorsLayer {
    let methods = [Method::GET, Method::POST];
    let headers = [header::CONTENT_TYPE];

    if cors_origins == "*" {
        warn!("⚠️ CORS is configured with wildcard (*) - restrict CORS_ORIGINS in production");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = cors_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        warn!("⚠️ No valid CORS origins found in CORS_ORIGINS, denying cross-origin requests");
        CorsLayer::new().allow_methods(methods).allow_headers(headers)
    } else {
        info!("🔒 CORS configured for specific origins: {cors_origins}");
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment-based filtering
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "prediction_backend=info,tower_http=warn".to_string()
        } else {
            "prediction_backend=warn,tower_http=error".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&log_level))
        .init();

    info!("🚀 Starting AI Stock Prediction Service v{}", VERSION);

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Server configuration
    let host = std::env::var("SERVER_HOST")
        .unwrap_or_else(|_| constants::DEFAULT_SERVER_HOST.to_string());
    let port = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| constants::DEFAULT_SERVER_PORT.to_string())
        .parse::<u16>()
        .unwrap_or(constants::DEFAULT_SERVER_PORT);

    let cors_origins = std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    info!("Server configured to run on {}:{}", host, port);

    // Wire up the prediction engine; the generation backend is optional and
    // every prediction degrades to the deterministic models without it
    let backend = load_generation_backend();
    let model_service = Arc::new(ModelService::new(backend));
    let state = AppState::new(PredictionService::new(model_service));

    info!(
        "🤖 Hugging Face API: {}",
        if state.prediction.model_available() {
            "Configured"
        } else {
            "Not configured (using fallback models)"
        }
    );

    let app = Router::new()
        .route("/", get(index))
        .nest("/api", handlers::api_router())
        .layer(build_cors_layer(&cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&format!("{host}:{port}")).await?;

    info!("🎯 Prediction server started successfully on http://{}:{}", host, port);
    info!("🔧 API endpoints available at http://{}:{}/api/", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
