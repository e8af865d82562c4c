use chrono::{Datelike, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

use crate::constants;
use crate::models::prediction::{
    AlternativeOption, Alternatives, BatchPredictionItem, BatchPredictionResult, BatchSummary,
    CostBreakdown, CostComponents, DepletionRequest, DepletionResult, ModelKind, PredictionError,
    ReorderRequest, ReorderResult, TotalCost, Trend,
};
use crate::services::model::{EoqEstimate, ModelService, QuantityEstimate};

// Risk factor tags attached to depletion predictions
const FACTOR_STOCK_DEPLETED: &str = "stock_depleted";
const FACTOR_NO_CONSUMPTION: &str = "no_consumption_detected";
const FACTOR_BELOW_REORDER_LEVEL: &str = "below_reorder_level";
const FACTOR_CRITICAL_STOCK: &str = "critical_stock_level";
const FACTOR_LOW_STOCK: &str = "low_stock_level";
const FACTOR_INCREASING_TREND: &str = "increasing_demand_trend";
const FACTOR_DECREASING_TREND: &str = "decreasing_demand_trend";
const FACTOR_PEAK_SEASON: &str = "peak_season";

/// Orchestrates depletion and reorder decisions: edge cases, the model
/// adapter, factor analysis, recommendations and business-rule adjustments
#[derive(Clone)]
pub struct PredictionService {
    model: Arc<ModelService>,
}

impl PredictionService {
    pub fn new(model: Arc<ModelService>) -> Self {
        Self { model }
    }

    /// True when the text generation backend is configured
    pub fn model_available(&self) -> bool {
        self.model.available()
    }

    /// Predict days until stock-out for one material.
    ///
    /// Degrades gracefully: depleted stock and missing consumption are
    /// terminal results, not errors, and backend failures fall back to the
    /// statistical model inside the adapter.
    pub async fn predict_stock_depletion(&self, request: &DepletionRequest) -> DepletionResult {
        info!(
            "Starting stock depletion prediction for {}",
            request.material_name
        );

        if request.current_stock <= 0.0 {
            return DepletionResult {
                predicted_stock_out_in_days: 0,
                confidence: 1.0,
                model: ModelKind::Immediate,
                factors: vec![FACTOR_STOCK_DEPLETED.to_string()],
                recommendations: vec!["Immediate reorder required".to_string()],
                raw_prediction: 0,
                adjustment_applied: false,
            };
        }

        if request.avg_daily_consumption <= 0.0 {
            return DepletionResult {
                predicted_stock_out_in_days: constants::NO_CONSUMPTION_DAYS,
                confidence: 0.5,
                model: ModelKind::NoConsumption,
                factors: vec![FACTOR_NO_CONSUMPTION.to_string()],
                recommendations: vec!["Review consumption data".to_string()],
                raw_prediction: constants::NO_CONSUMPTION_DAYS,
                adjustment_applied: false,
            };
        }

        let estimate = self.model.predict_time_series(request).await;

        let factors = analyze_factors(request, Utc::now().month0());
        let recommendations = generate_recommendations(request, estimate.predicted_days);
        let adjusted = apply_business_rules(estimate.predicted_days, &factors);

        DepletionResult {
            predicted_stock_out_in_days: adjusted,
            confidence: estimate.confidence,
            model: estimate.model,
            factors,
            recommendations,
            raw_prediction: estimate.predicted_days,
            adjustment_applied: adjusted != estimate.predicted_days,
        }
    }

    /// Suggest an order quantity with cost breakdown, alternatives and a
    /// human-readable reasoning trail
    pub async fn suggest_reorder_quantity(
        &self,
        request: &ReorderRequest,
    ) -> Result<ReorderResult, PredictionError> {
        info!(
            "Starting reorder quantity suggestion for {}",
            request.material_name
        );

        let estimate = self.model.predict_reorder_quantity(request).await?;

        // The EOQ result is always computed for comparison, even when the
        // external model supplied the quantity
        let eoq = ModelService::economic_order_quantity(request)?;

        let reasoning = generate_reorder_reasoning(request, &estimate, &eoq);
        let alternatives = calculate_alternatives(request, estimate.quantity);
        let total_cost = calculate_total_cost(request, estimate.quantity);

        Ok(ReorderResult {
            suggested_order_quantity: estimate.quantity,
            reasoning,
            model: estimate.model,
            economic_order_quantity: eoq.eoq,
            total_cost,
            alternatives,
            confidence: estimate.confidence,
        })
    }

    /// Fan a batch of depletion requests out concurrently. Results stay
    /// index-aligned with the input; one material failing never aborts the
    /// siblings.
    pub async fn batch_predict(
        &self,
        materials: Vec<DepletionRequest>,
    ) -> Result<BatchPredictionResult, PredictionError> {
        if materials.is_empty() {
            return Err(PredictionError::ValidationError(
                "materials must contain at least 1 entry".to_string(),
            ));
        }
        if materials.len() > constants::MAX_BATCH_SIZE {
            return Err(PredictionError::BatchTooLarge {
                count: materials.len(),
                limit: constants::MAX_BATCH_SIZE,
            });
        }

        info!("Processing batch prediction for {} materials", materials.len());

        let handles: Vec<_> = materials
            .into_iter()
            .map(|request| {
                let service = self.clone();
                let material_name = request.material_name.clone();
                let handle = tokio::spawn(async move {
                    request.validate()?;
                    Ok::<DepletionResult, PredictionError>(
                        service.predict_stock_depletion(&request).await,
                    )
                });
                (material_name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        let (names, futures): (Vec<_>, Vec<_>) = handles.into_iter().unzip();

        for (material_name, joined) in names.into_iter().zip(join_all(futures).await) {
            let item = match joined {
                Ok(Ok(prediction)) => BatchPredictionItem {
                    material_name,
                    success: true,
                    prediction: Some(prediction),
                    error: None,
                },
                Ok(Err(e)) => {
                    error!("Batch prediction failed for {material_name}: {e}");
                    BatchPredictionItem {
                        material_name,
                        success: false,
                        prediction: None,
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => {
                    error!("Batch prediction task panicked for {material_name}: {e}");
                    BatchPredictionItem {
                        material_name,
                        success: false,
                        prediction: None,
                        error: Some("prediction task failed unexpectedly".to_string()),
                    }
                }
            };
            results.push(item);
        }

        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        let summary = BatchSummary {
            total: results.len(),
            successful,
            failed,
        };

        Ok(BatchPredictionResult { results, summary })
    }
}

/// Qualitative risk tags derived from stock level, trend and season
fn analyze_factors(request: &DepletionRequest, month0: u32) -> Vec<String> {
    let mut factors = Vec::new();

    if let Some(reorder_level) = request.reorder_level {
        if request.current_stock <= reorder_level {
            factors.push(FACTOR_BELOW_REORDER_LEVEL.to_string());
        }
    }

    let days_of_stock = request.current_stock / request.avg_daily_consumption;
    if days_of_stock <= constants::CRITICAL_STOCK_DAYS {
        factors.push(FACTOR_CRITICAL_STOCK.to_string());
    } else if days_of_stock <= constants::LOW_STOCK_DAYS {
        factors.push(FACTOR_LOW_STOCK.to_string());
    }

    match request.trend {
        Some(Trend::Increasing) => factors.push(FACTOR_INCREASING_TREND.to_string()),
        Some(Trend::Decreasing) => factors.push(FACTOR_DECREASING_TREND.to_string()),
        Some(Trend::Stable) | None => {}
    }

    if request.seasonality.unwrap_or(false) && constants::PEAK_SEASON_MONTHS.contains(&month0) {
        factors.push(FACTOR_PEAK_SEASON.to_string());
    }

    factors
}

/// Advisory texts keyed off the raw (pre-adjustment) predicted days
fn generate_recommendations(request: &DepletionRequest, predicted_days: i64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if predicted_days <= 3 {
        recommendations.push("URGENT: Place emergency order immediately".to_string());
        recommendations.push("Consider expedited shipping".to_string());
    } else if predicted_days <= 7 {
        recommendations.push("Place order within 24 hours".to_string());
        recommendations.push("Monitor consumption closely".to_string());
    } else if predicted_days <= 14 {
        recommendations.push("Schedule order placement".to_string());
        recommendations.push("Review reorder level settings".to_string());
    }

    if let Some(reorder_level) = request.reorder_level {
        if request.current_stock <= reorder_level {
            recommendations
                .push("Stock below reorder level - immediate action required".to_string());
        }
    }

    let weekly_consumption = request.avg_daily_consumption * 7.0;
    if request.current_stock < weekly_consumption {
        recommendations.push("Less than one week of stock remaining".to_string());
    }

    recommendations
}

/// Shrink the predicted horizon under risk factors. Applied cumulatively in
/// a fixed order, each step floored at one day; rounding happens once at
/// the end.
fn apply_business_rules(predicted_days: i64, factors: &[String]) -> i64 {
    let mut adjusted = predicted_days as f64;

    if factors.iter().any(|f| f == FACTOR_CRITICAL_STOCK) {
        adjusted = (adjusted - 1.0).max(1.0);
    }

    if factors.iter().any(|f| f == FACTOR_PEAK_SEASON) {
        adjusted = (adjusted * constants::PEAK_SEASON_DEPLETION_FACTOR).max(1.0);
    }

    if factors.iter().any(|f| f == FACTOR_INCREASING_TREND) {
        adjusted = (adjusted * constants::INCREASING_TREND_DEPLETION_FACTOR).max(1.0);
    }

    adjusted.round() as i64
}

fn generate_reorder_reasoning(
    request: &ReorderRequest,
    estimate: &QuantityEstimate,
    eoq: &EoqEstimate,
) -> String {
    let lead_time_demand = request.lead_time_demand().round() as i64;

    let mut reasoning = format!(
        "Suggested quantity of {} units based on:\n",
        estimate.quantity
    );
    reasoning.push_str(&format!(
        "• Lead time demand: {} units ({} days × {} daily consumption)\n",
        lead_time_demand, request.lead_time, request.avg_daily_consumption
    ));

    if request.safety_stock > 0.0 {
        reasoning.push_str(&format!("• Safety stock: {} units\n", request.safety_stock));
    }

    reasoning.push_str(&format!("• Economic Order Quantity: {} units\n", eoq.eoq));
    reasoning.push_str(&format!("• Model used: {}\n", estimate.model));

    if estimate.quantity > eoq.eoq {
        reasoning.push_str("• Quantity above EOQ to ensure service level");
    } else {
        reasoning.push_str("• Quantity optimized for cost efficiency");
    }

    reasoning
}

fn calculate_alternatives(request: &ReorderRequest, suggested_quantity: i64) -> Alternatives {
    let suggested = suggested_quantity as f64;
    let lead_time_demand = request.lead_time_demand();

    Alternatives {
        conservative: AlternativeOption {
            quantity: (suggested * 0.8).round() as i64,
            description: "Lower quantity, higher reorder frequency".to_string(),
            pros: vec![
                "Lower holding costs".to_string(),
                "Reduced obsolescence risk".to_string(),
            ],
            cons: vec![
                "Higher ordering costs".to_string(),
                "Increased stockout risk".to_string(),
            ],
        },
        aggressive: AlternativeOption {
            quantity: (suggested * 1.2).round() as i64,
            description: "Higher quantity, lower reorder frequency".to_string(),
            pros: vec![
                "Lower ordering costs".to_string(),
                "Better service level".to_string(),
            ],
            cons: vec![
                "Higher holding costs".to_string(),
                "Increased capital tie-up".to_string(),
            ],
        },
        minimum: AlternativeOption {
            quantity: lead_time_demand.round() as i64,
            description: "Minimum viable quantity (lead time demand)".to_string(),
            pros: vec![
                "Minimal investment".to_string(),
                "Quick turnover".to_string(),
            ],
            cons: vec![
                "High stockout risk".to_string(),
                "No safety buffer".to_string(),
            ],
        },
    }
}

fn calculate_total_cost(request: &ReorderRequest, quantity: i64) -> TotalCost {
    let quantity = quantity as f64;
    let annual_demand = request.avg_daily_consumption * 365.0;

    let orders_per_year = annual_demand / quantity;
    let total_ordering_cost = orders_per_year * constants::ORDERING_COST;

    let average_inventory = quantity / 2.0;
    let total_holding_cost = average_inventory * request.unit_cost * request.holding_cost_rate;

    let total_cost = total_ordering_cost + total_holding_cost;

    let ordering_share = (total_ordering_cost / total_cost * 100.0).round() as i64;
    let holding_share = (total_holding_cost / total_cost * 100.0).round() as i64;

    TotalCost {
        ordering_cost: total_ordering_cost.round() as i64,
        holding_cost: total_holding_cost.round() as i64,
        total_cost: total_cost.round() as i64,
        cost_per_unit: (total_cost / annual_demand * 100.0).round() / 100.0,
        breakdown: CostBreakdown {
            orders_per_year: (orders_per_year * 10.0).round() / 10.0,
            average_inventory: average_inventory.round() as i64,
            cost_components: CostComponents {
                ordering: format!("{ordering_share}%"),
                holding: format!("{holding_share}%"),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PredictionService {
        PredictionService::new(Arc::new(ModelService::with_seeded_rng(None, 42)))
    }

    fn depletion_request() -> DepletionRequest {
        DepletionRequest {
            material_name: "Steel Coil".to_string(),
            current_stock: 100.0,
            avg_daily_consumption: 10.0,
            historical_data: None,
            seasonality: None,
            trend: None,
            reorder_level: None,
        }
    }

    fn reorder_request() -> ReorderRequest {
        ReorderRequest {
            material_name: "Steel Coil".to_string(),
            avg_daily_consumption: 10.0,
            lead_time: 7.0,
            reorder_level: 100.0,
            safety_stock: 0.0,
            max_stock: 1000.0,
            unit_cost: 1.0,
            holding_cost_rate: 0.2,
        }
    }

    #[tokio::test]
    async fn test_depleted_stock_is_terminal() {
        let mut request = depletion_request();
        request.current_stock = 0.0;

        let result = service().predict_stock_depletion(&request).await;
        assert_eq!(result.predicted_stock_out_in_days, 0);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.model, ModelKind::Immediate);
        assert_eq!(result.factors, vec!["stock_depleted"]);
        assert_eq!(result.recommendations, vec!["Immediate reorder required"]);
    }

    #[tokio::test]
    async fn test_zero_consumption_is_terminal() {
        let mut request = depletion_request();
        request.avg_daily_consumption = 0.0;

        let result = service().predict_stock_depletion(&request).await;
        assert_eq!(result.predicted_stock_out_in_days, 999);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.model, ModelKind::NoConsumption);
        assert_eq!(result.factors, vec!["no_consumption_detected"]);
    }

    #[tokio::test]
    async fn test_statistical_path_produces_full_result() {
        let result = service().predict_stock_depletion(&depletion_request()).await;

        assert_eq!(result.model, ModelKind::StatisticalForecast);
        assert_eq!(result.confidence, 0.85);
        // 100 / 10 with noise in [0.95, 1.05]
        assert!((9..=11).contains(&result.raw_prediction));
        // 10 days of stock: low but not critical
        assert!(result.factors.iter().any(|f| f == "low_stock_level"));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r == "Schedule order placement"));
        // low_stock_level triggers no adjustment rule
        assert!(!result.adjustment_applied);
        assert_eq!(result.predicted_stock_out_in_days, result.raw_prediction);
    }

    #[test]
    fn test_factors_critical_and_below_reorder() {
        let mut request = depletion_request();
        request.current_stock = 50.0;
        request.reorder_level = Some(60.0);

        let factors = analyze_factors(&request, 2);
        assert_eq!(factors, vec!["below_reorder_level", "critical_stock_level"]);
    }

    #[test]
    fn test_factors_trend_tags() {
        let mut request = depletion_request();
        request.trend = Some(Trend::Increasing);
        assert!(analyze_factors(&request, 2)
            .iter()
            .any(|f| f == "increasing_demand_trend"));

        request.trend = Some(Trend::Decreasing);
        assert!(analyze_factors(&request, 2)
            .iter()
            .any(|f| f == "decreasing_demand_trend"));

        request.trend = Some(Trend::Stable);
        let factors = analyze_factors(&request, 2);
        assert!(!factors.iter().any(|f| f.contains("trend")));
    }

    #[test]
    fn test_factors_peak_season_months() {
        let mut request = depletion_request();
        request.seasonality = Some(true);

        for month in [5, 6, 7, 11] {
            assert!(
                analyze_factors(&request, month).iter().any(|f| f == "peak_season"),
                "month {month} should be peak"
            );
        }
        for month in [0, 2, 4, 8, 10] {
            assert!(
                !analyze_factors(&request, month).iter().any(|f| f == "peak_season"),
                "month {month} should not be peak"
            );
        }

        // Peak month without the seasonality flag is not peak
        request.seasonality = None;
        assert!(!analyze_factors(&request, 5).iter().any(|f| f == "peak_season"));
    }

    #[test]
    fn test_recommendations_urgent_thresholds() {
        let request = depletion_request();

        let urgent = generate_recommendations(&request, 2);
        assert!(urgent.contains(&"URGENT: Place emergency order immediately".to_string()));
        assert!(urgent.contains(&"Consider expedited shipping".to_string()));

        let soon = generate_recommendations(&request, 6);
        assert!(soon.contains(&"Place order within 24 hours".to_string()));

        let scheduled = generate_recommendations(&request, 12);
        assert!(scheduled.contains(&"Schedule order placement".to_string()));

        let relaxed = generate_recommendations(&request, 30);
        assert!(relaxed.is_empty());
    }

    #[test]
    fn test_recommendations_can_cooccur() {
        let mut request = depletion_request();
        request.current_stock = 30.0;
        request.reorder_level = Some(40.0);

        // 30 units at 10/day: below reorder level and under a week of stock
        let recommendations = generate_recommendations(&request, 3);
        assert!(recommendations
            .contains(&"Stock below reorder level - immediate action required".to_string()));
        assert!(recommendations.contains(&"Less than one week of stock remaining".to_string()));
        assert!(recommendations.contains(&"URGENT: Place emergency order immediately".to_string()));
    }

    #[test]
    fn test_business_rules_composition_and_order() {
        let factors = vec![
            "critical_stock_level".to_string(),
            "peak_season".to_string(),
        ];
        // 10 - 1 = 9, then 9 * 0.8 = 7.2, rounded to 7
        assert_eq!(apply_business_rules(10, &factors), 7);
    }

    #[test]
    fn test_business_rules_individual_adjustments() {
        assert_eq!(
            apply_business_rules(10, &["critical_stock_level".to_string()]),
            9
        );
        assert_eq!(apply_business_rules(10, &["peak_season".to_string()]), 8);
        assert_eq!(
            apply_business_rules(10, &["increasing_demand_trend".to_string()]),
            9
        );
        assert_eq!(apply_business_rules(10, &["low_stock_level".to_string()]), 10);
    }

    #[test]
    fn test_business_rules_floor_at_one_day() {
        let factors = vec![
            "critical_stock_level".to_string(),
            "peak_season".to_string(),
            "increasing_demand_trend".to_string(),
        ];
        assert_eq!(apply_business_rules(1, &factors), 1);
    }

    #[test]
    fn test_alternatives_quantities() {
        let alternatives = calculate_alternatives(&reorder_request(), 100);
        assert_eq!(alternatives.conservative.quantity, 80);
        assert_eq!(alternatives.aggressive.quantity, 120);
        assert_eq!(alternatives.minimum.quantity, 70);
    }

    #[test]
    fn test_total_cost_breakdown() {
        let cost = calculate_total_cost(&reorder_request(), 100);
        // annual demand 3650, 36.5 orders/year * 50 = 1825 ordering,
        // average inventory 50 * 1 * 0.2 = 10 holding
        assert_eq!(cost.ordering_cost, 1825);
        assert_eq!(cost.holding_cost, 10);
        assert_eq!(cost.total_cost, 1835);
        assert_eq!(cost.cost_per_unit, 0.5);
        assert_eq!(cost.breakdown.orders_per_year, 36.5);
        assert_eq!(cost.breakdown.average_inventory, 50);
        assert_eq!(cost.breakdown.cost_components.ordering, "99%");
        assert_eq!(cost.breakdown.cost_components.holding, "1%");
    }

    #[tokio::test]
    async fn test_suggest_reorder_without_backend_uses_eoq() {
        let result = service()
            .suggest_reorder_quantity(&reorder_request())
            .await
            .unwrap();

        assert_eq!(result.suggested_order_quantity, 1351);
        assert_eq!(result.economic_order_quantity, 1351);
        assert_eq!(result.model, ModelKind::EconomicOrderQuantity);
        assert_eq!(result.confidence, 0.9);
        assert!(result.reasoning.contains("Lead time demand: 70 units"));
        assert!(result.reasoning.contains("Economic Order Quantity: 1351 units"));
        assert!(result.reasoning.contains("Quantity optimized for cost efficiency"));
    }

    #[tokio::test]
    async fn test_reorder_reasoning_mentions_safety_stock_when_present() {
        let mut request = reorder_request();
        request.safety_stock = 25.0;

        let result = service().suggest_reorder_quantity(&request).await.unwrap();
        assert!(result.reasoning.contains("Safety stock: 25 units"));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_preserves_order() {
        let mut bad = depletion_request();
        bad.material_name = String::new();

        let materials = vec![
            DepletionRequest {
                material_name: "Copper Wire".to_string(),
                ..depletion_request()
            },
            bad,
            DepletionRequest {
                material_name: "Aluminium Sheet".to_string(),
                ..depletion_request()
            },
        ];

        let batch = service().batch_predict(materials).await.unwrap();

        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.results[0].material_name, "Copper Wire");
        assert!(batch.results[0].success);
        assert!(!batch.results[1].success);
        assert!(batch.results[1].error.is_some());
        assert_eq!(batch.results[2].material_name, "Aluminium Sheet");
        assert!(batch.results[2].success);

        assert_eq!(batch.summary.total, 3);
        assert_eq!(batch.summary.successful, 2);
        assert_eq!(batch.summary.failed, 1);
    }

    #[tokio::test]
    async fn test_batch_rejects_empty_input() {
        assert!(matches!(
            service().batch_predict(Vec::new()).await,
            Err(PredictionError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_rejects_oversized_input() {
        let materials = vec![depletion_request(); 51];
        assert!(matches!(
            service().batch_predict(materials).await,
            Err(PredictionError::BatchTooLarge { count: 51, limit: 50 })
        ));
    }
}
