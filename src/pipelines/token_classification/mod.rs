/// Batcher
pub mod batcher;

/// Token Classification Training
pub mod training;

/// Token Classification Inference
pub mod inference;

pub use batcher::Batcher;
pub use inference::{Prediction, Predictor};
pub use training::train;

/// The unique string token that identifies this pipeline
pub static PIPELINE: &str = "token-classification";
