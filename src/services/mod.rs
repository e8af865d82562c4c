pub mod model;
pub mod prediction;

pub use model::ModelService;
pub use prediction::PredictionService;
