use chrono::{Datelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants;
use crate::generation::{GenerationParams, TextGeneration};
use crate::models::prediction::{DepletionRequest, ModelKind, PredictionError, ReorderRequest, Trend};

/// Raw time-series estimate before business-rule adjustment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesEstimate {
    pub predicted_days: i64,
    pub confidence: f64,
    pub model: ModelKind,
}

/// Raw reorder quantity estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityEstimate {
    pub quantity: i64,
    pub confidence: f64,
    pub model: ModelKind,
}

/// Economic order quantity result with the unclamped EOQ kept for comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EoqEstimate {
    pub quantity: i64,
    pub eoq: i64,
    pub confidence: f64,
    pub model: ModelKind,
}

/// Wraps the optional text generation backend and the deterministic
/// statistical models it falls back to. One outbound call per request,
/// never more; every backend failure degrades to the fallback silently.
pub struct ModelService {
    backend: Option<Arc<dyn TextGeneration>>,
    rng: Mutex<StdRng>,
}

impl ModelService {
    pub fn new(backend: Option<Arc<dyn TextGeneration>>) -> Self {
        Self {
            backend,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for tests; the forecast noise becomes reproducible
    pub fn with_seeded_rng(backend: Option<Arc<dyn TextGeneration>>, seed: u64) -> Self {
        Self {
            backend,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// True when a text generation backend is configured
    pub fn available(&self) -> bool {
        self.backend.is_some()
    }

    /// Predict days until stock-out, preferring the generation backend and
    /// falling back to the statistical forecast on any failure
    pub async fn predict_time_series(&self, request: &DepletionRequest) -> TimeSeriesEstimate {
        if let Some(backend) = &self.backend {
            let prompt = create_depletion_prompt(
                &request.material_name,
                request.current_stock,
                request.avg_daily_consumption,
                request
                    .historical_data
                    .as_ref()
                    .is_some_and(|h| !h.is_empty()),
            );
            let params = GenerationParams {
                max_new_tokens: constants::DEPLETION_MAX_NEW_TOKENS,
                temperature: constants::DEPLETION_TEMPERATURE,
            };

            match self.generate_bounded(backend, &prompt, &params).await {
                Ok(text) => {
                    let (days, confidence) = parse_depletion_reply(
                        &text,
                        request.current_stock,
                        request.avg_daily_consumption,
                    );
                    info!(
                        "External model predicted {} days for {}",
                        days, request.material_name
                    );
                    return TimeSeriesEstimate {
                        predicted_days: days,
                        confidence,
                        model: ModelKind::ExternalModel,
                    };
                }
                Err(e) => {
                    warn!("Time series generation failed, using statistical fallback: {e}");
                }
            }
        }

        self.statistical_fallback(request)
    }

    fn statistical_fallback(&self, request: &DepletionRequest) -> TimeSeriesEstimate {
        let noise = Self::draw_noise_factor(&mut self.rng());
        Self::statistical_forecast(
            request.current_stock,
            request.avg_daily_consumption,
            request.trend,
            request.seasonality.unwrap_or(false),
            Utc::now().month0(),
            noise,
        )
    }

    /// Suggest a reorder quantity, preferring the generation backend and
    /// falling back to the EOQ optimizer on any failure
    pub async fn predict_reorder_quantity(
        &self,
        request: &ReorderRequest,
    ) -> Result<QuantityEstimate, PredictionError> {
        if let Some(backend) = &self.backend {
            let prompt = create_reorder_prompt(request);
            let params = GenerationParams {
                max_new_tokens: constants::REORDER_MAX_NEW_TOKENS,
                temperature: constants::REORDER_TEMPERATURE,
            };

            match self.generate_bounded(backend, &prompt, &params).await {
                Ok(text) => {
                    let eoq = Self::economic_order_quantity(request)?;
                    let (quantity, confidence) = parse_reorder_reply(
                        &text,
                        request.lead_time_demand(),
                        request.reorder_level * 10.0,
                        eoq.eoq as f64,
                    );
                    info!(
                        "External model suggested quantity {} for {}",
                        quantity, request.material_name
                    );
                    return Ok(QuantityEstimate {
                        quantity,
                        confidence,
                        model: ModelKind::ExternalModel,
                    });
                }
                Err(e) => {
                    warn!("Reorder generation failed, using EOQ fallback: {e}");
                }
            }
        }

        let eoq = Self::economic_order_quantity(request)?;
        Ok(QuantityEstimate {
            quantity: eoq.quantity,
            confidence: eoq.confidence,
            model: eoq.model,
        })
    }

    /// Single bounded backend call; the timeout here is the only wait the
    /// request pipeline performs on the external model
    async fn generate_bounded(
        &self,
        backend: &Arc<dyn TextGeneration>,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, crate::generation::GenerationError> {
        let timeout = Duration::from_secs(constants::GENERATION_TIMEOUT_SECS);
        match tokio::time::timeout(timeout, backend.generate(prompt, params)).await {
            Ok(result) => result,
            Err(_) => Err(crate::generation::GenerationError::Timeout(
                constants::GENERATION_TIMEOUT_SECS,
            )),
        }
    }

    fn rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bounded forecast noise in [1 - v/2, 1 + v/2] for variance v
    pub fn draw_noise_factor(rng: &mut StdRng) -> f64 {
        1.0 + (rng.gen::<f64>() - 0.5) * constants::FORECAST_NOISE_VARIANCE
    }

    /// Closed-form depletion forecast from consumption rate, trend,
    /// seasonality and a caller-supplied noise factor
    pub fn statistical_forecast(
        current_stock: f64,
        avg_daily_consumption: f64,
        trend: Option<Trend>,
        seasonality: bool,
        month0: u32,
        noise_factor: f64,
    ) -> TimeSeriesEstimate {
        let mut adjusted = avg_daily_consumption;

        match trend {
            Some(Trend::Increasing) => adjusted *= constants::TREND_INCREASING_MULTIPLIER,
            Some(Trend::Decreasing) => adjusted *= constants::TREND_DECREASING_MULTIPLIER,
            Some(Trend::Stable) | None => {}
        }

        if seasonality {
            adjusted *= seasonal_multiplier(month0);
        }

        adjusted *= noise_factor;

        let predicted_days = ((current_stock / adjusted).round() as i64).max(1);

        TimeSeriesEstimate {
            predicted_days,
            confidence: constants::STATISTICAL_CONFIDENCE,
            model: ModelKind::StatisticalForecast,
        }
    }

    /// Classic EOQ with two service-level floors: lead-time demand plus
    /// safety stock, and a one-week minimum supply
    pub fn economic_order_quantity(
        request: &ReorderRequest,
    ) -> Result<EoqEstimate, PredictionError> {
        let holding_cost_per_unit = request.unit_cost * request.holding_cost_rate;
        if holding_cost_per_unit <= 0.0 {
            return Err(PredictionError::ConfigurationError(
                "unitCost and holdingCostRate must both be positive to compute EOQ".to_string(),
            ));
        }

        let annual_demand = request.avg_daily_consumption * 365.0;
        let eoq =
            (2.0 * annual_demand * constants::ORDERING_COST / holding_cost_per_unit).sqrt();

        let lead_time_demand = request.lead_time_demand();
        let weekly_supply = request.avg_daily_consumption * 7.0;

        let quantity = eoq
            .max(lead_time_demand + request.safety_stock)
            .max(weekly_supply);

        Ok(EoqEstimate {
            quantity: (quantity.round() as i64).max(1),
            eoq: (eoq.round() as i64).max(1),
            confidence: constants::EOQ_CONFIDENCE,
            model: ModelKind::EconomicOrderQuantity,
        })
    }
}

/// Month-indexed consumption multiplier; months outside 0..12 are neutral
pub fn seasonal_multiplier(month0: u32) -> f64 {
    constants::SEASONAL_PATTERN
        .get(month0 as usize)
        .copied()
        .unwrap_or(1.0)
}

fn create_depletion_prompt(
    material_name: &str,
    current_stock: f64,
    avg_daily_consumption: f64,
    has_history: bool,
) -> String {
    format!(
        "Analyze stock depletion for {material_name}:\n\
         Current Stock: {current_stock} units\n\
         Daily Consumption: {avg_daily_consumption} units/day\n\
         Historical trend: {}\n\n\
         Based on this information, predict how many days until stock runs out. Consider:\n\
         - Current consumption rate\n\
         - Potential demand variations\n\
         - Seasonal factors\n\n\
         Prediction:",
        if has_history { "Available" } else { "Limited data" }
    )
}

fn create_reorder_prompt(request: &ReorderRequest) -> String {
    format!(
        "Optimize reorder quantity for {}:\n\
         Daily Consumption: {} units/day\n\
         Lead Time: {} days\n\
         Reorder Level: {} units\n\
         Safety Stock: {} units\n\
         Unit Cost: ${}\n\n\
         Calculate optimal order quantity considering:\n\
         - Economic order quantity principles\n\
         - Lead time demand\n\
         - Safety stock requirements\n\
         - Cost optimization\n\n\
         Recommended quantity:",
        request.material_name,
        request.avg_daily_consumption,
        request.lead_time,
        request.reorder_level,
        request.safety_stock,
        request.unit_cost,
    )
}

/// Collect every unsigned integer appearing in free text, in order
pub fn extract_integers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(value) = current.parse::<f64>() {
                numbers.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(value) = current.parse::<f64>() {
            numbers.push(value);
        }
    }

    numbers
}

/// Extract a day-count from generated prose. The first integer strictly
/// between 0 and 365 wins; otherwise the naive stock/consumption ratio.
fn parse_depletion_reply(text: &str, current_stock: f64, avg_daily_consumption: f64) -> (i64, f64) {
    let mut predicted_days = current_stock / avg_daily_consumption;

    if let Some(candidate) = extract_integers(text)
        .into_iter()
        .find(|n| *n > 0.0 && *n < constants::MAX_PLAUSIBLE_PREDICTION_DAYS)
    {
        predicted_days = candidate;
    }

    let lowered = text.to_lowercase();
    let confidence = if lowered.contains("confident") || lowered.contains("certain") {
        0.9
    } else if lowered.contains("uncertain") || lowered.contains("estimate") {
        0.6
    } else {
        0.7
    };

    ((predicted_days.round() as i64).max(1), confidence)
}

/// Extract an order quantity from generated prose. The first integer inside
/// [min_quantity, max_quantity] wins; otherwise the supplied EOQ.
fn parse_reorder_reply(
    text: &str,
    min_quantity: f64,
    max_quantity: f64,
    fallback_eoq: f64,
) -> (i64, f64) {
    let quantity = extract_integers(text)
        .into_iter()
        .find(|n| *n >= min_quantity && *n <= max_quantity)
        .unwrap_or(fallback_eoq);

    let lowered = text.to_lowercase();
    let confidence = if lowered.contains("optimal") || lowered.contains("recommended") {
        0.9
    } else if lowered.contains("estimate") || lowered.contains("approximate") {
        0.6
    } else {
        0.75
    };

    ((quantity.round() as i64).max(1), confidence)
}
