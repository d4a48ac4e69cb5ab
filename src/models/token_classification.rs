use burn::{
    module::Module,
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    tensor::{backend::Backend, Tensor},
};

use crate::pipelines::{
    self,
    batcher::Infer,
    output::Output,
    token_classification::batcher::{Batcher, Train},
};

use super::{encoder::Seq2SeqEncoder, loss::sequence_cross_entropy, ModelConfig};

/// Embeds tokens, encodes every position and projects each onto the labels
#[derive(Module, Debug)]
pub struct TokenClassifier<B: Backend> {
    /// Token embeddings: [vocab_size, embedding_dim]
    pub embedding: Embedding<B>,

    /// Sequence to sequence encoder
    pub encoder: Seq2SeqEncoder<B>,

    /// Projection onto the label namespace
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

impl<B: Backend> TokenClassifier<B> {
    /// Initialize with random weights
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let d_encoded = Seq2SeqEncoder::<B>::output_size(config);

        Self {
            embedding: EmbeddingConfig::new(config.vocab_size, config.embedding_dim).init(device),
            encoder: Seq2SeqEncoder::new(config, device),
            output: LinearConfig::new(d_encoded, config.n_classes).init(device),
            n_classes: config.n_classes,
        }
    }

    /// Defines forward pass for inference: raw logits of shape [batch_size, seq_length, n_classes]
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 3> {
        let embedded = self.embedding.forward(input.tokens);
        let encoded = self.encoder.forward(embedded);

        self.output.forward(encoded)
    }

    /// Defines forward pass for training
    pub fn forward(&self, item: Train<B>) -> Output<B> {
        let [batch_size, seq_length] = item.targets.dims();
        let mask = item.input.mask.clone();

        let output = self.infer(item.input);
        let loss = sequence_cross_entropy(output.clone(), item.targets.clone(), mask.clone());

        Output::new(
            loss,
            output.reshape([batch_size * seq_length, self.n_classes]),
            item.targets.reshape([batch_size * seq_length]),
            mask.reshape([batch_size * seq_length]),
        )
    }
}

impl<B: Backend> pipelines::Model<B> for TokenClassifier<B> {
    type Batch = Train<B>;
    type Batcher = Batcher<B>;

    fn step(&self, batch: Train<B>) -> Output<B> {
        self.forward(batch)
    }
}
