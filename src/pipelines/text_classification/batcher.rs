use burn::tensor::{backend::Backend, Int, Tensor};
use derive_new::new;

use crate::{
    datasets::Record,
    error::Result,
    pipelines::batcher::{self, Infer, TrainBatcher},
};

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Padded token ids and mask
    pub input: Infer<B>,

    /// One class id per sequence: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching sentence classification records
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// The common batcher does padding and lookups
    batcher: batcher::Batcher<B>,
}

impl<B: Backend> Batcher<B> {
    /// Collects unlabeled records into an inference batch
    pub fn infer(&self, records: &[Record]) -> Result<Infer<B>> {
        self.batcher.infer(records)
    }
}

impl<B: Backend> TrainBatcher<B, Train<B>> for Batcher<B> {
    fn from_batcher(batcher: batcher::Batcher<B>) -> Self {
        Self { batcher }
    }

    /// Collects labeled records into a training batch
    fn batch(&self, records: &[Record]) -> Result<Train<B>> {
        let input = self.batcher.infer(records)?;
        let targets = self.batcher.sequence_targets(records)?;

        Ok(Train::new(input, targets))
    }
}
