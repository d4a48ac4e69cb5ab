use std::path::{Path, PathBuf};

use burn::{
    config::Config,
    module::Module,
    record::{CompactRecorder, FileRecorder},
    tensor::backend::Backend,
};

use crate::{
    error::{Error, Result},
    models::ModelConfig,
    vocabulary::Vocabulary,
};

use super::{config::TrainingConfig, history::History};

/// The record written after every epoch
pub static MODEL: &str = "model";

/// The record of the best epoch so far
pub static BEST: &str = "best";

/// The files a training run leaves behind
#[derive(Clone, Debug)]
pub struct Artifacts {
    dir: PathBuf,
}

impl Artifacts {
    /// Point at an existing artifact directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the artifact directory if needed
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let artifacts = Self::new(dir);

        std::fs::create_dir_all(&artifacts.dir).map_err(|e| Error::resource(&artifacts.dir, e))?;

        Ok(artifacts)
    }

    /// The artifact directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Model configuration
    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    /// Training configuration
    pub fn training_path(&self) -> PathBuf {
        self.dir.join("training.json")
    }

    /// Token and label namespaces
    pub fn vocabulary_path(&self) -> PathBuf {
        self.dir.join("vocabulary.json")
    }

    /// Epoch metrics
    pub fn history_path(&self) -> PathBuf {
        self.dir.join("history.json")
    }

    /// A parameter record, with the recorder's extension
    pub fn record_path<B: Backend>(&self, name: &str) -> PathBuf {
        self.dir.join(format!(
            "{name}.{}",
            <CompactRecorder as FileRecorder<B>>::file_extension()
        ))
    }

    /// Write everything a predictor needs besides the parameters
    pub fn save_setup(
        &self,
        model_config: &ModelConfig,
        training_config: &TrainingConfig,
        vocabulary: &Vocabulary,
    ) -> Result<()> {
        let path = self.config_path();
        model_config.save(&path).map_err(|e| Error::resource(&path, e))?;

        let path = self.training_path();
        training_config.save(&path).map_err(|e| Error::resource(&path, e))?;

        vocabulary.save(self.vocabulary_path())
    }

    /// Load the model configuration
    pub fn load_model_config(&self) -> Result<ModelConfig> {
        let path = self.config_path();

        ModelConfig::load(&path).map_err(|e| Error::resource(&path, e))
    }

    /// Load the vocabulary
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        Vocabulary::load(self.vocabulary_path())
    }

    /// Write the history, replacing any previous one atomically
    pub fn save_history(&self, history: &History) -> Result<()> {
        history.save(self.history_path())
    }

    /// Load the history
    pub fn load_history(&self) -> Result<History> {
        History::load(self.history_path())
    }

    /// Write a parameter record under `name`, replacing any previous one only once fully written
    pub fn save_record<B: Backend, M: Module<B>>(&self, model: &M, name: &str) -> Result<()> {
        let partial = self.dir.join(format!("{name}-partial"));
        let written = self.record_path::<B>(&format!("{name}-partial"));
        let path = self.record_path::<B>(name);

        model
            .clone()
            .save_file(partial, &CompactRecorder::new())
            .map_err(|e| Error::resource(&written, e))?;

        std::fs::rename(&written, &path).map_err(|e| Error::resource(&path, e))?;

        log::debug!("Saved {}", path.display());

        Ok(())
    }

    /// Load the parameter record `name` into `model`
    pub fn load_record<B: Backend, M: Module<B>>(
        &self,
        model: M,
        name: &str,
        device: &B::Device,
    ) -> Result<M> {
        let path = self.record_path::<B>(name);

        if !path.exists() {
            return Err(Error::resource(&path, "no such file"));
        }

        model
            .load_file(self.dir.join(name), &CompactRecorder::new(), device)
            .map_err(|e| Error::resource(&path, e))
    }

    /// Load the best parameters, or the latest ones if no epoch ever improved
    pub fn load_best<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let name = if self.record_path::<B>(BEST).exists() {
            BEST
        } else {
            MODEL
        };

        self.load_record::<B, M>(model, name, device)
    }
}
