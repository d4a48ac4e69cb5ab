use burn::{module::Module, tensor::backend::Backend};

use super::{batcher::TrainBatcher, output::Output};

/// A model the training loop can drive
pub trait Model<B: Backend>: Module<B> {
    /// The training batch consumed by [`Model::step`]
    type Batch;

    /// Assembles training batches for this model
    type Batcher: TrainBatcher<B, Self::Batch>;

    /// Forward pass with loss, for both training and validation
    fn step(&self, batch: Self::Batch) -> Output<B>;
}
