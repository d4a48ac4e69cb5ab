use burn::tensor::{backend::Backend, Int, Tensor};
use derive_new::new;

use crate::{
    datasets::Record,
    error::Result,
    pipelines::batcher::{self, Infer, TrainBatcher},
};

/// A training batch for token classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Padded token ids and mask
    pub input: Infer<B>,

    /// One class id per token, padded like the input: [batch_size, max_seq_length]
    pub targets: Tensor<B, 2, Int>,
}

/// Struct for batching tagged records
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Wrap the common batcher because token targets are padded the same way as the tokens
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

        // Pad the labels to match the token sequence length
        let [_, seq_length] = input.tokens.dims();
        let targets = self.batcher.token_targets(records, seq_length)?;

        Ok(Train::new(input, targets))
    }
}
