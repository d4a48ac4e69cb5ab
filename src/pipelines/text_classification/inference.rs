use std::{path::PathBuf, sync::Arc};

use burn::tensor::backend::Backend;
use serde::Serialize;

use crate::{
    datasets::Record,
    error::{Error, Result},
    models::TextClassifier,
    pipelines::{
        artifacts::Artifacts,
        batcher::{self, TrainBatcher},
    },
    utils::classes::argmax,
    vocabulary::Vocabulary,
};

use super::Batcher;

/// The label scores for one sentence
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// Raw scores, in label id order
    pub logits: Vec<f32>,

    /// The highest scoring label
    pub label: String,
}

/// Runs a trained sentence classifier on raw text
pub struct Predictor<B: Backend> {
    model: TextClassifier<B>,
    batcher: Batcher<B>,
    vocabulary: Arc<Vocabulary>,
}

impl<B: Backend> Predictor<B> {
    /// Wrap a model and the vocabulary it was trained with
    pub fn new(model: TextClassifier<B>, vocabulary: Arc<Vocabulary>, device: B::Device) -> Self {
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

        let model = artifacts.load_best::<B, _>(config.init_text_classifier::<B>(device), device)?;

        Ok(Self::new(model, vocabulary, device.clone()))
    }

    /// The vocabulary the model was trained with
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Score a whitespace tokenized sentence
    pub fn predict(&self, sentence: &str) -> Result<Prediction> {
        let input = self.batcher.infer(&[Record::from_sentence(sentence)])?;

        let logits = self
            .model
            .infer(input)
            .into_data()
            .convert::<f32>()
            .value;

        let label = argmax(&logits)
            .and_then(|id| self.vocabulary.label(id))
            .ok_or_else(|| Error::Config("the model has no labels".to_string()))?
            .to_string();

        Ok(Prediction { logits, label })
    }
}
