/// Batcher
pub mod batcher;

/// Training
pub mod training;

/// Inference
pub mod inference;

pub use batcher::Batcher;
pub use inference::{Prediction, Predictor};
pub use training::train;

/// The unique string token that identifies this pipeline
pub static PIPELINE: &str = "text-classification";
