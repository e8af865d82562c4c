use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use prediction_backend::handlers::{self, AppState};
use prediction_backend::services::{ModelService, PredictionService};

/// Router wired without a generation backend: every request exercises the
/// deterministic fallback models
fn test_app() -> Router {
    let model = Arc::new(ModelService::with_seeded_rng(None, 7));
    let state = AppState::new(PredictionService::new(model));
    Router::new()
        .nest("/api", handlers::api_router())
        .with_state(state)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn predict_depletion_returns_statistical_forecast() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/predict-depletion",
        json!({
            "materialName": "Steel Coil",
            "currentStock": 100,
            "avgDailyConsumption": 10
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["materialName"], "Steel Coil");
    assert_eq!(body["model"], "statistical_forecast");
    assert_eq!(body["confidence"], 0.85);
    let days = body["predictedStockOutInDays"].as_i64().unwrap();
    assert!((9..=11).contains(&days), "unexpected day count {days}");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn predict_depletion_depleted_stock_is_immediate() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/predict-depletion",
        json!({
            "materialName": "Steel Coil",
            "currentStock": 0,
            "avgDailyConsumption": 10
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictedStockOutInDays"], 0);
    assert_eq!(body["confidence"], 1.0);
    assert_eq!(body["model"], "immediate");
    assert_eq!(body["factors"][0], "stock_depleted");
    assert_eq!(body["recommendations"][0], "Immediate reorder required");
}

#[tokio::test]
async fn predict_depletion_rejects_negative_stock() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/predict-depletion",
        json!({
            "materialName": "Steel Coil",
            "currentStock": -5,
            "avgDailyConsumption": 10
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn predict_depletion_rejects_oversized_material_name() {
    let app = test_app();
    let (status, _) = post_json(
        &app,
        "/api/predict-depletion",
        json!({
            "materialName": "x".repeat(101),
            "currentStock": 100,
            "avgDailyConsumption": 10
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggest_reorder_uses_eoq_fallback() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/suggest-reorder",
        json!({
            "materialName": "Steel Coil",
            "avgDailyConsumption": 10,
            "leadTime": 7,
            "reorderLevel": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestedOrderQuantity"], 1351);
    assert_eq!(body["economicOrderQuantity"], 1351);
    assert_eq!(body["model"], "economic_order_quantity");
    assert_eq!(body["alternatives"]["conservative"]["quantity"], 1081);
    assert_eq!(body["alternatives"]["aggressive"]["quantity"], 1621);
    assert_eq!(body["alternatives"]["minimum"]["quantity"], 70);
    assert!(body["reasoning"]
        .as_str()
        .unwrap()
        .contains("Economic Order Quantity: 1351 units"));
    assert!(body["totalCost"]["totalCost"].is_number());
}

#[tokio::test]
async fn suggest_reorder_rejects_invalid_holding_cost_rate() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/suggest-reorder",
        json!({
            "materialName": "Steel Coil",
            "avgDailyConsumption": 10,
            "leadTime": 7,
            "reorderLevel": 100,
            "holdingCostRate": 2.0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn suggest_reorder_rejects_zero_unit_cost() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/suggest-reorder",
        json!({
            "materialName": "Steel Coil",
            "avgDailyConsumption": 10,
            "leadTime": 7,
            "reorderLevel": 100,
            "unitCost": 0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Configuration Error");
}

#[tokio::test]
async fn batch_predict_isolates_per_item_failures() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/batch-predict",
        json!({
            "materials": [
                { "materialName": "Copper Wire", "currentStock": 100, "avgDailyConsumption": 10 },
                { "materialName": "", "currentStock": 100, "avgDailyConsumption": 10 },
                { "materialName": "Aluminium Sheet", "currentStock": 50, "avgDailyConsumption": 5 }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["materialName"], "Copper Wire");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert!(results[1]["error"].is_string());
    assert_eq!(results[2]["materialName"], "Aluminium Sheet");
    assert_eq!(results[2]["success"], true);

    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["summary"]["successful"], 2);
    assert_eq!(body["summary"]["failed"], 1);
}

#[tokio::test]
async fn batch_predict_rejects_empty_materials() {
    let app = test_app();
    let (status, body) = post_json(&app, "/api/batch-predict", json!({ "materials": [] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn models_endpoint_reports_fallbacks() {
    let app = test_app();
    let (status, body) = get_json(&app, "/api/models").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["huggingFaceEnabled"], false);
    assert_eq!(body["availableModels"]["timeSeries"]["primary"], "statistical_forecast");
    assert_eq!(
        body["availableModels"]["regression"]["primary"],
        "economic_order_quantity"
    );
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = test_app();

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["huggingFace"], "not_configured");
    assert_eq!(body["services"]["statistical"], "available");

    let (status, body) = get_json(&app, "/api/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let (status, body) = get_json(&app, "/api/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}
