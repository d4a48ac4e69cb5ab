use std::{path::PathBuf, sync::Arc};

use burn::tensor::backend::Backend;
use serde::Serialize;

use crate::{
    datasets::Record,
    error::{Error, Result},
    models::TokenClassifier,
    pipelines::{
        artifacts::Artifacts,
        batcher::{self, TrainBatcher},
    },
    utils::classes::argmax,
    vocabulary::Vocabulary,
};

use super::Batcher;

/// The tag scores for every token of one sentence
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Prediction {
    /// The input tokens
    pub tokens: Vec<String>,

    /// Raw scores per token, in label id order
    pub logits: Vec<Vec<f32>>,

    /// The highest scoring tag per token
    pub labels: Vec<String>,
}

/// Runs a trained tagger on raw text
pub struct Predictor<B: Backend> {
    model: TokenClassifier<B>,
    batcher: Batcher<B>,
    vocabulary: Arc<Vocabulary>,
}

impl<B: Backend> Predictor<B> {
    /// Wrap a model and the vocabulary it was trained with
    pub fn new(model: TokenClassifier<B>, vocabulary: Arc<Vocabulary>, device: B::Device) -> Self {
        let batcher = Batcher::from_batcher(batcher::Batcher::new(vocabulary.clone(), None, device));

        Self {
            model,
            batcher,
            vocabulary,
        }
    }

    /// Load the configuration, vocabulary and best parameters from an artifact directory
    pub fn load(artifact_dir: impl Into<PathBuf>, device: &B::Device) -> Result<Self> {
        let artifacts = Artifacts::new(artifact_dir);

        let config = artifacts.load_model_config()?;
        let vocabulary = Arc::new(artifacts.load_vocabulary()?);

        log::info!("Loading weights from {}", artifacts.dir().display());

        let model =
            artifacts.load_best::<B, _>(config.init_token_classifier::<B>(device), device)?;

        Ok(Self::new(model, vocabulary, device.clone()))
    }

    /// The vocabulary the model was trained with
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Tag a whitespace tokenized sentence
    pub fn predict(&self, sentence: &str) -> Result<Prediction> {
        let record = Record::from_sentence(sentence);

        if record.is_empty() {
            return Ok(Prediction::default());
        }

        let input = self.batcher.infer(std::slice::from_ref(&record))?;
        let n_classes = self.model.n_classes;

        let scores = self
            .model
            .infer(input)
            .into_data()
            .convert::<f32>()
            .value;

        let logits: Vec<Vec<f32>> = scores
            .chunks(n_classes.max(1))
            .take(record.len())
            .map(<[f32]>::to_vec)
            .collect();

        let labels = logits
            .iter()
            .map(|scores| {
                argmax(scores)
                    .and_then(|id| self.vocabulary.label(id))
                    .map(str::to_string)
                    .ok_or_else(|| Error::Config("the model has no labels".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Prediction {
            tokens: record.tokens,
            logits,
            labels,
        })
    }
}
