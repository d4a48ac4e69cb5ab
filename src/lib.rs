//! # Burn Taggers
//!
//! Sentiment classification and part-of-speech tagging on `burn`: corpus readers, a frozen
//! vocabulary, padded batches with masks, embedding + encoder + projection models, a training
//! loop with early stopping, and predictors over raw text.
#![forbid(unsafe_code)]

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Token and label namespaces
pub mod vocabulary;

/// Utilities
pub mod utils;

/// CLI indexes and utilities
pub mod cli;

/// Errors
pub mod error;

pub use error::{Error, Result};
