use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use super::AppState;
use crate::models::prediction::{
    BatchPredictionResult, BatchRequest, DepletionRequest, DepletionResult, PredictionError,
    ReorderRequest, ReorderResult,
};

/// Create prediction routes
pub fn create_prediction_routes() -> Router<AppState> {
    Router::new()
        .route("/predict-depletion", post(predict_depletion))
        .route("/suggest-reorder", post(suggest_reorder))
        .route("/batch-predict", post(batch_predict))
        .route("/models", get(list_models))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DepletionResponse {
    material_name: String,
    #[serde(flatten)]
    prediction: DepletionResult,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReorderResponse {
    material_name: String,
    #[serde(flatten)]
    suggestion: ReorderResult,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchResponse {
    #[serde(flatten)]
    batch: BatchPredictionResult,
    timestamp: String,
}

fn handle_prediction_error<T>(
    error: PredictionError,
) -> Result<T, (StatusCode, Json<serde_json::Value>)> {
    match error {
        PredictionError::ValidationError(msg) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Validation Error",
                "message": msg
            })),
        )),
        PredictionError::ConfigurationError(msg) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Configuration Error",
                "message": msg
            })),
        )),
        PredictionError::BatchTooLarge { count, limit } => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Validation Error",
                "message": format!("batch of {count} materials exceeds the limit of {limit}")
            })),
        )),
        PredictionError::InternalError(msg) => {
            error!("Internal prediction error: {msg}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "message": "An unexpected error occurred"
                })),
            ))
        }
    }
}

/// Predict stock depletion timeline
/// POST /api/predict-depletion
async fn predict_depletion(
    State(state): State<AppState>,
    Json(request): Json<DepletionRequest>,
) -> Result<Json<DepletionResponse>, (StatusCode, Json<serde_json::Value>)> {
    if let Err(e) = request.validate() {
        return handle_prediction_error(e);
    }

    info!("Predicting depletion for material: {}", request.material_name);

    let prediction = state.prediction.predict_stock_depletion(&request).await;

    info!(
        "Prediction completed for {}: {} days",
        request.material_name, prediction.predicted_stock_out_in_days
    );

    Ok(Json(DepletionResponse {
        material_name: request.material_name,
        prediction,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Suggest optimal reorder quantity
/// POST /api/suggest-reorder
async fn suggest_reorder(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, (StatusCode, Json<serde_json::Value>)> {
    if let Err(e) = request.validate() {
        return handle_prediction_error(e);
    }

    info!(
        "Suggesting reorder quantity for material: {}",
        request.material_name
    );

    let suggestion = match state.prediction.suggest_reorder_quantity(&request).await {
        Ok(suggestion) => suggestion,
        Err(e) => return handle_prediction_error(e),
    };

    info!(
        "Reorder suggestion completed for {}: {} units",
        request.material_name, suggestion.suggested_order_quantity
    );

    Ok(Json(ReorderResponse {
        material_name: request.material_name,
        suggestion,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Batch prediction for multiple materials
/// POST /api/batch-predict
async fn batch_predict(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, (StatusCode, Json<serde_json::Value>)> {
    let batch = match state.prediction.batch_predict(request.materials).await {
        Ok(batch) => batch,
        Err(e) => return handle_prediction_error(e),
    };

    Ok(Json(BatchResponse {
        batch,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// List available prediction models
/// GET /api/models
async fn list_models(State(state): State<AppState>) -> Json<serde_json::Value> {
    let external = state.prediction.model_available();

    Json(json!({
        "availableModels": {
            "timeSeries": {
                "primary": if external { "external_model" } else { "statistical_forecast" },
                "fallback": "statistical_forecast",
                "capabilities": ["trend_analysis", "seasonality", "variance_modeling"]
            },
            "regression": {
                "primary": if external { "external_model" } else { "economic_order_quantity" },
                "fallback": "economic_order_quantity",
                "capabilities": ["cost_optimization", "lead_time_analysis", "safety_stock_calculation"]
            }
        },
        "huggingFaceEnabled": external,
        "timestamp": Utc::now().to_rfc3339()
    }))
}
