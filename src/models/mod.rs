use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use crate::vocabulary::Vocabulary;

/// Sequence encoders
pub mod encoder;

/// Masked losses
pub mod loss;

/// Embedding + seq2vec encoder + projection for sentence labels
pub mod text_classification;

/// Embedding + seq2seq encoder + projection for per-token labels
pub mod token_classification;

pub use text_classification::TextClassifier;
pub use token_classification::TokenClassifier;

/// Which encoder sits between the embeddings and the projection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoder {
    /// A unidirectional LSTM. Sentences use the hidden state at the last real token; tagging
    /// uses the hidden state at every position.
    #[default]
    Lstm,

    /// No recurrence. Sentences use the masked mean of the embeddings (bag of embeddings);
    /// tagging projects each embedding on its own.
    Embeddings,
}

impl std::str::FromStr for Encoder {
    type Err = crate::Error;

    fn from_str(value: &str) -> crate::Result<Self> {
        match value {
            "lstm" => Ok(Encoder::Lstm),
            "embeddings" => Ok(Encoder::Embeddings),
            _ => Err(crate::Error::Config(format!("unknown encoder {value}"))),
        }
    }
}

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct ModelConfig {
    /// Size of the token namespace, reserved ids included
    pub vocab_size: usize,

    /// Size of the label namespace
    pub n_classes: usize,

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

impl ModelConfig {
    /// Size the namespaces from a frozen vocabulary
    pub fn for_vocabulary(vocabulary: &Vocabulary) -> Self {
        Self::new(vocabulary.tokens_len(), vocabulary.labels_len())
    }

    /// Initialize a sentence classifier with random weights
    pub fn init_text_classifier<B: Backend>(&self, device: &B::Device) -> TextClassifier<B> {
        TextClassifier::new(self, device)
    }

    /// Initialize a token classifier with random weights
    pub fn init_token_classifier<B: Backend>(&self, device: &B::Device) -> TokenClassifier<B> {
        TokenClassifier::new(self, device)
    }
}
