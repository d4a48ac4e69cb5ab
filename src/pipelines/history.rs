use std::path::Path;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the training state machine currently stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingState {
    /// Nothing has run yet
    Initialized,

    /// Epochs are running
    Training,

    /// The validation metric stopped improving for `patience` epochs
    EarlyStopped,

    /// The maximum number of epochs ran
    Completed,

    /// Final parameters and history are on disk
    Serialized,
}

/// Metrics gathered over one epoch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct EpochMetrics {
    /// The 1-based epoch number
    pub epoch: usize,

    /// Mean training loss over batches
    pub train_loss: f64,

    /// Training accuracy over unmasked positions
    pub train_accuracy: f64,

    /// Mean validation loss, when there is validation data
    pub valid_loss: Option<f64>,

    /// Validation accuracy, when there is validation data
    pub valid_accuracy: Option<f64>,
}

/// Epoch-by-epoch metrics of a training run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// The latest state reached
    pub state: TrainingState,

    /// The epoch whose parameters were kept as the best model
    pub best_epoch: Option<usize>,

    /// One entry per completed epoch
    pub epochs: Vec<EpochMetrics>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            state: TrainingState::Initialized,
            best_epoch: None,
            epochs: Vec::new(),
        }
    }
}

impl History {
    /// Write the history as JSON, replacing any previous file only once fully written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::resource(path, e))?;

        let partial = path.with_extension("json.partial");
        std::fs::write(&partial, json).map_err(|e| Error::resource(&partial, e))?;
        std::fs::rename(&partial, path).map_err(|e| Error::resource(path, e))
    }

    /// Read a history written by [`History::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::resource(path, e))?;

        serde_json::from_str(&json).map_err(|e| Error::resource(path, e))
    }
}
