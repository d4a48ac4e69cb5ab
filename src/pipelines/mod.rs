/// Record to tensor assembly shared by both pipelines
pub mod batcher;

/// Training configuration
pub mod config;

/// Training history and states
pub mod history;

/// The trait the training loop drives
pub mod model;

/// Loss and metrics of a forward pass
pub mod output;

/// Artifact directory layout and checkpoints
pub mod artifacts;

/// The training loop
pub mod training;

/// Text Classification
pub mod text_classification;

/// Token Classification
pub mod token_classification;

pub use model::Model;
