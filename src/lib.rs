// AI Stock Prediction Service
// Stateless prediction and decision engine for material stock depletion
// and reorder quantity suggestions, with an optional Hugging Face text
// generation backend and deterministic statistical fallbacks.

pub mod constants;
pub mod generation;
pub mod handlers;
pub mod models;
pub mod services;

pub use generation::{GenerationParams, HuggingFaceBackend, TextGeneration};
pub use models::prediction::{
    BatchPredictionResult, DepletionRequest, DepletionResult, ModelKind, PredictionError,
    ReorderRequest, ReorderResult, Trend,
};
pub use services::{ModelService, PredictionService};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
