use std::sync::Arc;

use burn::tensor::backend::AutodiffBackend;

use crate::{
    datasets::Record,
    error::Result,
    models::TokenClassifier,
    pipelines::{
        artifacts::Artifacts,
        config::TrainingConfig,
        training::{self, Fitted, Trainer},
    },
    utils::renderer::Renderer,
};

/// Define train function
pub fn train<B: AutodiffBackend, R: Renderer>(
    device: &B::Device, // Device on which to perform computation (e.g., CPU or CUDA device)
    train: &[Record],   // Training records
    valid: &[Record],   // Validation records
    config: TrainingConfig, // Experiment configuration
    artifacts: Artifacts,   // Directory to save model and config files
    renderer: R,            // Receives per-epoch progress
) -> Result<Fitted<TokenClassifier<B>>> {
    let (vocabulary, model_config) = training::prepare::<B>(&config, &artifacts, train, valid)?;

    log::info!(
        "Training a tagger with {} tags and a {:?} encoder",
        model_config.n_classes,
        model_config.encoder
    );

    let model = model_config.init_token_classifier::<B>(device);

    Trainer::new(config, artifacts, renderer).fit::<B, _>(
        model,
        Arc::new(vocabulary),
        train,
        valid,
        device,
    )
}
