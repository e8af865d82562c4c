use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Errors surfaced to callers of the prediction services
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("batch of {count} materials exceeds the limit of {limit}")]
    BatchTooLarge { count: usize, limit: usize },

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Observed consumption trend for a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Which model produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Immediate,
    NoConsumption,
    StatisticalForecast,
    ExternalModel,
    EconomicOrderQuantity,
}

impl ModelKind {
    /// Wire tag, also used in reasoning text
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Immediate => "immediate",
            ModelKind::NoConsumption => "no_consumption",
            ModelKind::StatisticalForecast => "statistical_forecast",
            ModelKind::ExternalModel => "external_model",
            ModelKind::EconomicOrderQuantity => "economic_order_quantity",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of recorded stock history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: String,
    pub stock: f64,
    pub consumption: f64,
}

/// Input for a stock depletion prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionRequest {
    pub material_name: String,
    pub current_stock: f64,
    pub avg_daily_consumption: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_data: Option<Vec<HistoricalPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<f64>,
}

impl DepletionRequest {
    pub fn validate(&self) -> Result<(), PredictionError> {
        validate_material_name(&self.material_name)?;

        if self.current_stock < 0.0 || !self.current_stock.is_finite() {
            return Err(PredictionError::ValidationError(
                "currentStock must be a non-negative number".to_string(),
            ));
        }

        if self.avg_daily_consumption < constants::MIN_DAILY_CONSUMPTION
            || !self.avg_daily_consumption.is_finite()
        {
            return Err(PredictionError::ValidationError(format!(
                "avgDailyConsumption must be at least {}",
                constants::MIN_DAILY_CONSUMPTION
            )));
        }

        if let Some(history) = &self.historical_data {
            for point in history {
                if point.stock < 0.0 || point.consumption < 0.0 {
                    return Err(PredictionError::ValidationError(
                        "historicalData entries must have non-negative stock and consumption"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Input for a reorder quantity suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub material_name: String,
    pub avg_daily_consumption: f64,
    pub lead_time: f64,
    pub reorder_level: f64,
    #[serde(default)]
    pub safety_stock: f64,
    #[serde(default = "default_max_stock")]
    pub max_stock: f64,
    #[serde(default = "default_unit_cost")]
    pub unit_cost: f64,
    #[serde(default = "default_holding_cost_rate")]
    pub holding_cost_rate: f64,
}

fn default_max_stock() -> f64 {
    constants::DEFAULT_MAX_STOCK
}

fn default_unit_cost() -> f64 {
    constants::DEFAULT_UNIT_COST
}

fn default_holding_cost_rate() -> f64 {
    constants::DEFAULT_HOLDING_COST_RATE
}

impl ReorderRequest {
    pub fn validate(&self) -> Result<(), PredictionError> {
        validate_material_name(&self.material_name)?;

        if self.avg_daily_consumption < constants::MIN_DAILY_CONSUMPTION
            || !self.avg_daily_consumption.is_finite()
        {
            return Err(PredictionError::ValidationError(format!(
                "avgDailyConsumption must be at least {}",
                constants::MIN_DAILY_CONSUMPTION
            )));
        }

        if self.lead_time < 1.0 || !self.lead_time.is_finite() {
            return Err(PredictionError::ValidationError(
                "leadTime must be at least 1 day".to_string(),
            ));
        }

        if self.reorder_level < 0.0 {
            return Err(PredictionError::ValidationError(
                "reorderLevel must be a non-negative number".to_string(),
            ));
        }

        if self.safety_stock < 0.0 {
            return Err(PredictionError::ValidationError(
                "safetyStock must be a non-negative number".to_string(),
            ));
        }

        if self.max_stock < 0.0 {
            return Err(PredictionError::ValidationError(
                "maxStock must be a non-negative number".to_string(),
            ));
        }

        if self.unit_cost < 0.0 {
            return Err(PredictionError::ValidationError(
                "unitCost must be a non-negative number".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.holding_cost_rate) {
            return Err(PredictionError::ValidationError(
                "holdingCostRate must be between 0 and 1".to_string(),
            ));
        }

        // The EOQ formula divides by unit_cost * holding_cost_rate
        if self.unit_cost * self.holding_cost_rate <= 0.0 {
            return Err(PredictionError::ConfigurationError(
                "unitCost and holdingCostRate must both be positive to compute EOQ".to_string(),
            ));
        }

        Ok(())
    }

    pub fn lead_time_demand(&self) -> f64 {
        self.avg_daily_consumption * self.lead_time
    }
}

fn validate_material_name(name: &str) -> Result<(), PredictionError> {
    if name.is_empty() || name.len() > constants::MAX_MATERIAL_NAME_LENGTH {
        return Err(PredictionError::ValidationError(format!(
            "materialName must be between 1 and {} characters",
            constants::MAX_MATERIAL_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Outcome of a stock depletion prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionResult {
    pub predicted_stock_out_in_days: i64,
    pub confidence: f64,
    pub model: ModelKind,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub raw_prediction: i64,
    pub adjustment_applied: bool,
}

/// Outcome of a reorder quantity suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResult {
    pub suggested_order_quantity: i64,
    pub reasoning: String,
    pub model: ModelKind,
    pub economic_order_quantity: i64,
    pub total_cost: TotalCost,
    pub alternatives: Alternatives,
    pub confidence: f64,
}

/// Annualized cost implications of an order quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCost {
    pub ordering_cost: i64,
    pub holding_cost: i64,
    pub total_cost: i64,
    pub cost_per_unit: f64,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub orders_per_year: f64,
    pub average_inventory: i64,
    pub cost_components: CostComponents,
}

/// Integer percentage shares of the total cost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComponents {
    pub ordering: String,
    pub holding: String,
}

/// Comparison order quantities around the suggested one
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternatives {
    pub conservative: AlternativeOption,
    pub aggressive: AlternativeOption,
    pub minimum: AlternativeOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeOption {
    pub quantity: i64,
    pub description: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// Batch prediction input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub materials: Vec<DepletionRequest>,
}

/// Per-material outcome within a batch, index-aligned with the request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPredictionItem {
    pub material_name: String,
    pub success: bool,
    #[serde(flatten)]
    pub prediction: Option<DepletionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPredictionResult {
    pub results: Vec<BatchPredictionItem>,
    pub summary: BatchSummary,
}
