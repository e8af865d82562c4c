// Application Constants
// Centralized constants to avoid magic numbers

/// Default server configuration
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Request validation limits
pub const MAX_MATERIAL_NAME_LENGTH: usize = 100;
pub const MIN_DAILY_CONSUMPTION: f64 = 0.1;
pub const MAX_BATCH_SIZE: usize = 50;

/// Cost model defaults applied when a request omits them
pub const DEFAULT_MAX_STOCK: f64 = 1000.0;
pub const DEFAULT_UNIT_COST: f64 = 1.0;
pub const DEFAULT_HOLDING_COST_RATE: f64 = 0.2;

/// Fixed cost of placing one order, in currency units
pub const ORDERING_COST: f64 = 50.0;

/// Statistical forecast parameters
pub const TREND_INCREASING_MULTIPLIER: f64 = 1.2;
pub const TREND_DECREASING_MULTIPLIER: f64 = 0.8;
pub const FORECAST_NOISE_VARIANCE: f64 = 0.1;
pub const STATISTICAL_CONFIDENCE: f64 = 0.85;
pub const EOQ_CONFIDENCE: f64 = 0.9;

/// Monthly consumption multipliers, January through December
pub const SEASONAL_PATTERN: [f64; 12] = [
    1.1, 0.9, 1.0, 1.0, 1.1, 1.2, 1.2, 1.1, 1.0, 1.0, 1.1, 1.3,
];

/// Zero-based months treated as peak season (Jun, Jul, Aug, Dec)
pub const PEAK_SEASON_MONTHS: [u32; 4] = [5, 6, 7, 11];

/// Business rule adjustments applied to raw depletion estimates
pub const PEAK_SEASON_DEPLETION_FACTOR: f64 = 0.8;
pub const INCREASING_TREND_DEPLETION_FACTOR: f64 = 0.9;

/// Stock urgency thresholds, in days of remaining supply
pub const CRITICAL_STOCK_DAYS: f64 = 7.0;
pub const LOW_STOCK_DAYS: f64 = 14.0;

/// Sentinel depletion horizon for materials with no consumption
pub const NO_CONSUMPTION_DAYS: i64 = 999;

/// Text generation parameters per prediction kind
pub const DEPLETION_MAX_NEW_TOKENS: u32 = 100;
pub const DEPLETION_TEMPERATURE: f64 = 0.7;
pub const REORDER_MAX_NEW_TOKENS: u32 = 150;
pub const REORDER_TEMPERATURE: f64 = 0.5;

/// Upper bound for a believable model-produced depletion estimate
pub const MAX_PLAUSIBLE_PREDICTION_DAYS: f64 = 365.0;

/// Hugging Face inference defaults
pub const GENERATION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GENERATION_MODEL: &str = "microsoft/DialoGPT-medium";
