use std::path::Path;

use burn::LearningRate;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    models::{Encoder, ModelConfig},
    vocabulary::{Vocabulary, VocabularyBuilder},
};

/// The metric that decides which epoch is best
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMetric {
    /// Lower loss is better
    #[default]
    #[serde(rename = "-loss")]
    Loss,

    /// Higher accuracy is better
    #[serde(rename = "+accuracy")]
    Accuracy,
}

impl ValidationMetric {
    /// Whether `candidate` improves on `best`
    pub fn is_better(&self, candidate: f64, best: f64) -> bool {
        match self {
            ValidationMetric::Loss => candidate < best,
            ValidationMetric::Accuracy => candidate > best,
        }
    }
}

impl std::str::FromStr for ValidationMetric {
    type Err = Error;

    fn from_str(value: &str) -> crate::Result<Self> {
        match value {
            "-loss" | "loss" => Ok(ValidationMetric::Loss),
            "+accuracy" | "accuracy" => Ok(ValidationMetric::Accuracy),
            _ => Err(Error::Config(format!("unknown validation metric {value}"))),
        }
    }
}

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct TrainingConfig {
    /// Batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// Maximum number of epochs
    #[config(default = 20)]
    pub num_epochs: usize,

    /// Non-improving epochs tolerated before stopping early; never stops early when unset
    pub patience: Option<usize>,

    /// The metric tracked for early stopping and best-model selection
    #[config(default = "ValidationMetric::Loss")]
    pub validation_metric: ValidationMetric,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Learning rate
    #[config(default = 1e-2)]
    pub learning_rate: LearningRate,

    /// Sequences longer than this are truncated
    pub max_seq_len: Option<usize>,

    /// Group records of similar length into the same batch
    #[config(default = true)]
    pub sort_by_length: bool,

    /// Shuffle the order of training batches every epoch
    #[config(default = true)]
    pub shuffle: bool,

    /// Seed for parameter initialization and shuffling
    #[config(default = 42)]
    pub seed: u64,

    /// Tokens seen fewer times than this become unknown
    #[config(default = 1)]
    pub min_count: usize,

    /// Lowercase tokens before vocabulary lookup
    #[config(default = false)]
    pub lowercase: bool,

    /// Size of each token embedding
    #[config(default = 64)]
    pub embedding_dim: usize,

    /// Size of the LSTM hidden state
    #[config(default = 64)]
    pub hidden_size: usize,

    /// The encoder variant
    #[config(default = "Encoder::Lstm")]
    pub encoder: Encoder,
}

impl TrainingConfig {
    /// Load a configuration from a `.json`, `.yaml` or `.yml` file
    ///
    /// Fields missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::resource(path, e))?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        );

        let overrides: serde_json::Value = if is_yaml {
            serde_yaml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?
        } else {
            serde_json::from_str(&text).map_err(|e| Error::Config(e.to_string()))?
        };

        let config = Self::new().merge(overrides)?;
        config.validate()?;

        Ok(config)
    }

    /// Overlay the fields of a JSON object on top of these settings
    fn merge(&self, overrides: serde_json::Value) -> crate::Result<Self> {
        let serde_json::Value::Object(overrides) = overrides else {
            return Err(Error::Config(
                "a training config must be a map of settings".to_string(),
            ));
        };

        let mut merged = serde_json::to_value(self).map_err(|e| Error::Config(e.to_string()))?;

        if let serde_json::Value::Object(fields) = &mut merged {
            fields.extend(overrides);
        }

        serde_json::from_value(merged).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values the training loop cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }

        if self.patience == Some(0) {
            return Err(Error::Config(
                "patience must be at least 1, or unset to never stop early".to_string(),
            ));
        }

        if self.max_seq_len == Some(0) {
            return Err(Error::Config("max_seq_len must be at least 1".to_string()));
        }

        Ok(())
    }

    /// The vocabulary builder for these settings
    pub fn vocabulary_builder(&self) -> VocabularyBuilder {
        VocabularyBuilder::new(self.min_count, self.lowercase)
    }

    /// The model configuration for these settings, sized to the vocabulary
    pub fn model_config(&self, vocabulary: &Vocabulary) -> ModelConfig {
        ModelConfig::for_vocabulary(vocabulary)
            .with_embedding_dim(self.embedding_dim)
            .with_hidden_size(self.hidden_size)
            .with_encoder(self.encoder)
    }
}
