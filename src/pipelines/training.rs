use std::sync::Arc;

use burn::{
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    tensor::backend::{AutodiffBackend, Backend},
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    datasets::Record,
    error::{Error, Result},
    models::ModelConfig,
    utils::renderer::Renderer,
    vocabulary::Vocabulary,
};

use super::{
    artifacts::{Artifacts, BEST, MODEL},
    batcher::{batch_indices, Batcher, TrainBatcher},
    config::{TrainingConfig, ValidationMetric},
    history::{EpochMetrics, History, TrainingState},
    model::Model,
    output::{Accuracy, MeanLoss},
};

/// What one epoch meant for early stopping
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The tracked metric reached a new best
    Improved,

    /// No improvement, but patience is not exhausted
    Stalled,

    /// Patience is exhausted
    Stop,
}

/// Tracks the best value of a metric and how long it has stalled
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    metric: ValidationMetric,
    patience: Option<usize>,
    best: Option<f64>,
    best_epoch: Option<usize>,
    stalled: usize,
}

impl EarlyStopping {
    /// Stop after `patience` epochs without improvement, or never when `None`
    pub fn new(metric: ValidationMetric, patience: Option<usize>) -> Self {
        Self {
            metric,
            patience,
            best: None,
            best_epoch: None,
            stalled: 0,
        }
    }

    /// Record the metric of a finished epoch
    pub fn observe(&mut self, epoch: usize, value: f64) -> Progress {
        let improved = match self.best {
            None => !value.is_nan(),
            Some(best) => self.metric.is_better(value, best),
        };

        if improved {
            self.best = Some(value);
            self.best_epoch = Some(epoch);
            self.stalled = 0;

            return Progress::Improved;
        }

        self.stalled += 1;

        match self.patience {
            Some(patience) if self.stalled >= patience => Progress::Stop,
            _ => Progress::Stalled,
        }
    }

    /// The epoch holding the best value so far
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

/// The result of a training run
pub struct Fitted<M> {
    /// Parameters after the last epoch
    pub model: M,

    /// Parameters of the best epoch
    pub best: M,

    /// Epoch-by-epoch metrics
    pub history: History,
}

/// Drives a model through epochs of training and validation
pub struct Trainer<R: Renderer> {
    config: TrainingConfig,
    artifacts: Artifacts,
    renderer: R,
    state: TrainingState,
}

impl<R: Renderer> Trainer<R> {
    /// Create a trainer that writes checkpoints into `artifacts`
    pub fn new(config: TrainingConfig, artifacts: Artifacts, renderer: R) -> Self {
        Self {
            config,
            artifacts,
            renderer,
            state: TrainingState::Initialized,
        }
    }

    /// The current state of the run
    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Give back the renderer
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Train until `num_epochs` or until the tracked metric stops improving
    ///
    /// After each epoch the latest parameters, the best parameters and the history are written
    /// to the artifact directory, so an interrupted run leaves the last finished epoch on disk.
    pub fn fit<B, M>(
        &mut self,
        model: M,
        vocabulary: Arc<Vocabulary>,
        train: &[Record],
        valid: &[Record],
        device: &B::Device,
    ) -> Result<Fitted<M>>
    where
        B: AutodiffBackend,
        M: Model<B> + AutodiffModule<B>,
        M::InnerModule: Model<B::InnerBackend>,
    {
        if self.state != TrainingState::Initialized {
            return Err(Error::Config(format!(
                "a trainer runs only once, this one is {:?}",
                self.state
            )));
        }

        self.config.validate()?;

        if train.is_empty() {
            return Err(Error::Config("no training records".to_string()));
        }

        let config = &self.config;

        let batcher_train = M::Batcher::from_batcher(Batcher::<B>::new(
            vocabulary.clone(),
            config.max_seq_len,
            device.clone(),
        ));
        let batcher_valid =
            <M::InnerModule as Model<B::InnerBackend>>::Batcher::from_batcher(Batcher::<
                B::InnerBackend,
            >::new(
                vocabulary,
                config.max_seq_len,
                device.clone(),
            ));

        let plan_train = batch_indices(&lengths(train), config.batch_size, config.sort_by_length);
        let plan_valid = batch_indices(&lengths(valid), config.batch_size, config.sort_by_length);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut optim = AdamWConfig::new()
            .with_epsilon(config.adam_epsilon)
            .init::<B, M>();
        let mut stopping = EarlyStopping::new(config.validation_metric, config.patience);

        let mut history = History::default();
        let mut model = model;
        let mut best = model.clone();

        self.state = TrainingState::Training;
        history.state = self.state;

        log::info!(
            "Training on {} records in {} batches, validating on {} records",
            train.len(),
            plan_train.len(),
            valid.len()
        );

        for epoch in 1..=config.num_epochs {
            let mut order = plan_train.clone();
            if config.shuffle {
                order.shuffle(&mut rng);
            }

            let mut train_loss = MeanLoss::default();
            let mut train_accuracy = Accuracy::default();

            for (i, indices) in order.iter().enumerate() {
                let batch = batcher_train.batch(&select(train, indices))?;
                let output = model.step(batch);

                let loss = output.loss_value();
                log::debug!("epoch {epoch} batch {}/{}: loss {loss:.4}", i + 1, order.len());

                let accuracy = output.accuracy();
                train_loss.push(loss, accuracy.total);
                train_accuracy += accuracy;

                let grads = output.loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);

                model = optim.step(config.learning_rate, model, grads);
            }

            let (valid_loss, valid_accuracy) = if plan_valid.is_empty() {
                (None, None)
            } else {
                let model_valid = model.valid();

                let mut loss = MeanLoss::default();
                let mut accuracy = Accuracy::default();

                for indices in &plan_valid {
                    let batch = batcher_valid.batch(&select(valid, indices))?;
                    let output = model_valid.step(batch);

                    let batch_accuracy = output.accuracy();
                    loss.push(output.loss_value(), batch_accuracy.total);
                    accuracy += batch_accuracy;
                }

                (loss.value(), Some(accuracy.value()))
            };

            let metrics = EpochMetrics::new(
                epoch,
                train_loss.value().unwrap_or(f64::NAN),
                train_accuracy.value(),
                valid_loss,
                valid_accuracy,
            );

            // Without validation data the training metric stands in
            let tracked = match config.validation_metric {
                ValidationMetric::Loss => metrics.valid_loss.unwrap_or(metrics.train_loss),
                ValidationMetric::Accuracy => {
                    metrics.valid_accuracy.unwrap_or(metrics.train_accuracy)
                }
            };

            self.renderer.render_epoch(&metrics);
            history.epochs.push(metrics);

            let progress = stopping.observe(epoch, tracked);

            if progress == Progress::Improved {
                best = model.clone();
                history.best_epoch = Some(epoch);

                self.artifacts.save_record::<B, M>(&best, BEST)?;
            }

            self.artifacts.save_record::<B, M>(&model, MODEL)?;
            self.artifacts.save_history(&history)?;

            if progress == Progress::Stop {
                log::info!(
                    "No improvement for {} epochs, stopping after epoch {epoch}",
                    epoch - stopping.best_epoch().unwrap_or(0)
                );

                self.state = TrainingState::EarlyStopped;
                break;
            }
        }

        if self.state == TrainingState::Training {
            self.state = TrainingState::Completed;
        }

        history.state = self.state;

        self.artifacts.save_record::<B, M>(&model, MODEL)?;
        self.artifacts.save_history(&history)?;
        self.renderer.render_summary(&history);

        self.state = TrainingState::Serialized;

        Ok(Fitted {
            model,
            best,
            history,
        })
    }
}

fn lengths(records: &[Record]) -> Vec<usize> {
    records.iter().map(Record::len).collect()
}

fn select(records: &[Record], indices: &[usize]) -> Vec<Record> {
    indices.iter().map(|&i| records[i].clone()).collect()
}

/// Build the vocabulary and model config for a run and write them next to the checkpoints
///
/// The vocabulary covers both training and validation records. The backend is seeded so that
/// the model initialized afterwards is reproducible.
pub fn prepare<B: Backend>(
    config: &TrainingConfig,
    artifacts: &Artifacts,
    train: &[Record],
    valid: &[Record],
) -> Result<(Vocabulary, ModelConfig)> {
    config.validate()?;

    let vocabulary = config
        .vocabulary_builder()
        .build(train.iter().chain(valid));

    if vocabulary.labels_len() == 0 {
        return Err(Error::Config("the training data has no labels".to_string()));
    }

    let model_config = config.model_config(&vocabulary);

    artifacts.save_setup(&model_config, config, &vocabulary)?;

    B::seed(config.seed);

    Ok((vocabulary, model_config))
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        datasets::{tagging::TaggingReader, Reader},
        utils::renderer::Writer,
        vocabulary::VocabularyBuilder,
    };

    type TestBackend = Autodiff<NdArray>;

    fn records(input: &str) -> Vec<Record> {
        TaggingReader::default()
            .read(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn artifacts(name: &str) -> Artifacts {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);

        Artifacts::create(dir).unwrap()
    }

    fn corpus() -> (Vec<Record>, Vec<Record>, Arc<Vocabulary>) {
        let train = records(
            "The###DET dog###NN ate###V the###DET apple###NN\nEverybody###NN read###V that###DET book###NN",
        );
        let valid = records("the###DET dog###NN read###V");
        let vocabulary = VocabularyBuilder::default().build(train.iter().chain(&valid));

        (train, valid, Arc::new(vocabulary))
    }

    #[test]
    fn test_early_stopping_halts_at_best_plus_patience() {
        let mut stopping = EarlyStopping::new(ValidationMetric::Loss, Some(3));

        let progress: Vec<_> = [1.0, 0.5, 0.6, 0.7, 0.8]
            .into_iter()
            .enumerate()
            .map(|(i, value)| stopping.observe(i + 1, value))
            .collect();

        assert_eq!(
            progress,
            vec![
                Progress::Improved,
                Progress::Improved,
                Progress::Stalled,
                Progress::Stalled,
                Progress::Stop,
            ]
        );
        assert_eq!(stopping.best_epoch(), Some(2));
    }

    #[test]
    fn test_early_stopping_resets_on_improvement() {
        let mut stopping = EarlyStopping::new(ValidationMetric::Accuracy, Some(2));

        assert_eq!(stopping.observe(1, 0.5), Progress::Improved);
        assert_eq!(stopping.observe(2, 0.5), Progress::Stalled);
        assert_eq!(stopping.observe(3, 0.6), Progress::Improved);
        assert_eq!(stopping.observe(4, 0.4), Progress::Stalled);
        assert_eq!(stopping.observe(5, 0.6), Progress::Stop);

        let mut never = EarlyStopping::new(ValidationMetric::Loss, None);
        for epoch in 1..=50 {
            assert_ne!(never.observe(epoch, 1.0), Progress::Stop);
        }
    }

    #[test]
    fn test_frozen_model_stops_after_patience() {
        let (train, valid, vocabulary) = corpus();
        let device = Default::default();

        let config = TrainingConfig::new()
            .with_batch_size(1)
            .with_num_epochs(10)
            .with_patience(Some(2))
            .with_learning_rate(0.0)
            .with_embedding_dim(4)
            .with_hidden_size(4);

        let model = config
            .model_config(&vocabulary)
            .init_token_classifier::<TestBackend>(&device);

        let artifacts = artifacts("burn_taggers_training_frozen");
        let mut trainer = Trainer::new(config, artifacts.clone(), Writer::new(Vec::new()));

        let fitted = trainer
            .fit::<TestBackend, _>(model, vocabulary, &train, &valid, &device)
            .unwrap();

        assert_eq!(fitted.history.epochs.len(), 3);
        assert_eq!(fitted.history.best_epoch, Some(1));
        assert_eq!(fitted.history.state, TrainingState::EarlyStopped);
        assert_eq!(trainer.state(), TrainingState::Serialized);

        assert_eq!(artifacts.load_history().unwrap(), fitted.history);
        assert!(artifacts.record_path::<TestBackend>(MODEL).exists());
        assert!(artifacts.record_path::<TestBackend>(BEST).exists());

        let output = String::from_utf8(trainer.into_renderer().sink).unwrap();
        assert_eq!(output.lines().filter(|l| l.starts_with("epoch")).count(), 3);
    }

    #[test]
    fn test_completes_without_patience_and_without_validation() {
        let (train, _, vocabulary) = corpus();
        let device = Default::default();

        let config = TrainingConfig::new()
            .with_batch_size(2)
            .with_num_epochs(3)
            .with_embedding_dim(4)
            .with_hidden_size(4);

        let model = ModelConfig::for_vocabulary(&vocabulary)
            .with_embedding_dim(4)
            .with_hidden_size(4)
            .init_token_classifier::<TestBackend>(&device);

        let mut trainer = Trainer::new(
            config,
            artifacts("burn_taggers_training_complete"),
            Writer::new(Vec::new()),
        );

        let fitted = trainer
            .fit::<TestBackend, _>(model.clone(), vocabulary.clone(), &train, &[], &device)
            .unwrap();

        assert_eq!(fitted.history.state, TrainingState::Completed);
        assert_eq!(fitted.history.epochs.len(), 3);
        assert!(fitted.history.epochs.iter().all(|e| e.valid_loss.is_none()));

        let err = trainer
            .fit::<TestBackend, _>(model, vocabulary, &train, &[], &device)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_empty_training_data() {
        let (_, valid, vocabulary) = corpus();
        let device = Default::default();

        let model = ModelConfig::for_vocabulary(&vocabulary)
            .with_embedding_dim(4)
            .with_hidden_size(4)
            .init_token_classifier::<TestBackend>(&device);

        let mut trainer = Trainer::new(
            TrainingConfig::new(),
            artifacts("burn_taggers_training_empty"),
            Writer::new(Vec::new()),
        );

        let err = trainer
            .fit::<TestBackend, _>(model, vocabulary, &[], &valid, &device)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(trainer.state(), TrainingState::Initialized);
    }
}
