use burn::{
    module::Module,
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    tensor::{backend::Backend, Tensor},
};

use crate::pipelines::{
    self,
    batcher::Infer,
    output::Output,
    text_classification::batcher::{Batcher, Train},
};

use super::{encoder::Seq2VecEncoder, loss::masked_cross_entropy, ModelConfig};

/// Embeds tokens, encodes each sequence into one vector and projects it onto the labels
#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    /// Token embeddings: [vocab_size, embedding_dim]
    pub embedding: Embedding<B>,

    /// Sequence to vector encoder
    pub encoder: Seq2VecEncoder<B>,

    /// Projection onto the label namespace
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

impl<B: Backend> TextClassifier<B> {
    /// Initialize with random weights
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let d_encoded = Seq2VecEncoder::<B>::output_size(config);

        Self {
            embedding: EmbeddingConfig::new(config.vocab_size, config.embedding_dim).init(device),
            encoder: Seq2VecEncoder::new(config, device),
            output: LinearConfig::new(d_encoded, config.n_classes).init(device),
            n_classes: config.n_classes,
        }
    }

    /// Defines forward pass for inference: raw logits of shape [batch_size, n_classes]
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 2> {
        let embedded = self.embedding.forward(input.tokens);
        let encoded = self.encoder.forward(embedded, input.mask);

        self.output.forward(encoded)
    }

    /// Defines forward pass for training
    pub fn forward(&self, item: Train<B>) -> Output<B> {
        let [batch_size] = item.targets.dims();

        // Rows made only of padding count towards neither loss nor accuracy
        let mask = item
            .input
            .mask
            .clone()
            .int()
            .sum_dim(1)
            .reshape([batch_size])
            .greater_elem(0);

        let output = self.infer(item.input);
        let loss = masked_cross_entropy(output.clone(), item.targets.clone(), mask.clone());

        Output::new(loss, output, item.targets, mask)
    }
}

impl<B: Backend> pipelines::Model<B> for TextClassifier<B> {
    type Batch = Train<B>;
    type Batcher = Batcher<B>;

    fn step(&self, batch: Train<B>) -> Output<B> {
        self.forward(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use burn::{backend::NdArray, tensor::ElementConversion};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        datasets::{sst::SstReader, Reader, Record},
        models::Encoder,
        pipelines::batcher::{self, TrainBatcher},
        vocabulary::VocabularyBuilder,
        Result,
    };

    type TestBackend = NdArray;

    fn fixture(encoder: Encoder) -> (TextClassifier<TestBackend>, Batcher<TestBackend>, Vec<Record>) {
        let records = SstReader::new(true, Default::default())
            .read("(3 (2 a) (4 (4 great) (2 film)))\n(0 (1 dull) (0 (2 and) (0 awful)))".as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let vocabulary = VocabularyBuilder::default().build(&records);
        let config = ModelConfig::for_vocabulary(&vocabulary)
            .with_embedding_dim(8)
            .with_hidden_size(6)
            .with_encoder(encoder);

        let device = Default::default();
        let model = config.init_text_classifier::<TestBackend>(&device);
        let batcher = Batcher::from_batcher(batcher::Batcher::new(Arc::new(vocabulary), None, device));

        (model, batcher, records)
    }

    #[test]
    fn test_shapes() {
        for encoder in [Encoder::Lstm, Encoder::Embeddings] {
            let (model, batcher, records) = fixture(encoder);

            let batch = batcher.batch(&records).unwrap();
            let output = model.forward(batch);

            assert_eq!(output.output.dims(), [records.len(), model.n_classes]);
            assert_eq!(output.loss.dims(), [1]);
            assert_eq!(output.accuracy().total, records.len());
            assert!(output.loss_value().is_finite());
        }
    }

    #[test]
    fn test_padding_rows_do_not_change_metrics() {
        for encoder in [Encoder::Lstm, Encoder::Embeddings] {
            let (model, batcher, records) = fixture(encoder);

            let mut padded = records.clone();
            padded.push(Record::new(vec![], records[0].labels.clone(), 0));

            let base = model.forward(batcher.batch(&records).unwrap());
            let with_padding = model.forward(batcher.batch(&padded).unwrap());

            assert_eq!(base.accuracy(), with_padding.accuracy());
            assert_eq!(with_padding.accuracy().total, records.len());

            let base = base.loss.into_scalar().elem::<f32>();
            let with_padding = with_padding.loss.into_scalar().elem::<f32>();
            assert!((base - with_padding).abs() < 1e-5, "{base} != {with_padding}");
        }
    }
}
