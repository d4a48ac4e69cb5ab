use burn::{
    module::Module,
    nn::{Lstm, LstmConfig},
    tensor::{backend::Backend, Bool, Tensor},
};

use super::{Encoder, ModelConfig};

fn init_lstm<B: Backend>(config: &ModelConfig, device: &B::Device) -> Option<Lstm<B>> {
    match config.encoder {
        Encoder::Lstm => Some(LstmConfig::new(config.embedding_dim, config.hidden_size, true).init(device)),
        Encoder::Embeddings => None,
    }
}

fn output_size(config: &ModelConfig) -> usize {
    match config.encoder {
        Encoder::Lstm => config.hidden_size,
        Encoder::Embeddings => config.embedding_dim,
    }
}

/// Reduces a sequence of embeddings to one vector per sequence
#[derive(Module, Debug)]
pub struct Seq2VecEncoder<B: Backend> {
    /// Present for the LSTM variant
    lstm: Option<Lstm<B>>,
}

impl<B: Backend> Seq2VecEncoder<B> {
    /// Create the encoder selected by the config
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        Self {
            lstm: init_lstm(config, device),
        }
    }

    /// Size of each encoded vector
    pub fn output_size(config: &ModelConfig) -> usize {
        output_size(config)
    }

    /// [batch_size, seq_length, d_input] -> [batch_size, d_output]
    pub fn forward(&self, embedded: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        let [batch_size, seq_length, d_input] = embedded.dims();

        match &self.lstm {
            Some(lstm) => {
                let (_, hidden_states) = lstm.forward(embedded, None);
                let [_, _, d_hidden] = hidden_states.dims();

                // Right padding never feeds back into earlier positions, so the state at the
                // last real token summarizes exactly the real tokens
                let last = mask
                    .int()
                    .sum_dim(1)
                    .sub_scalar(1)
                    .clamp_min(0)
                    .reshape([batch_size, 1, 1])
                    .repeat(2, d_hidden);

                hidden_states
                    .gather(1, last)
                    .reshape([batch_size, d_hidden])
            }
            None => {
                let weights = mask.float().reshape([batch_size, seq_length, 1]);
                let counts = weights.clone().sum_dim(1).clamp_min(1.0).repeat(2, d_input);

                embedded
                    .mul(weights.repeat(2, d_input))
                    .sum_dim(1)
                    .div(counts)
                    .reshape([batch_size, d_input])
            }
        }
    }
}

/// Maps a sequence of embeddings to one vector per position
#[derive(Module, Debug)]
pub struct Seq2SeqEncoder<B: Backend> {
    /// Present for the LSTM variant
    lstm: Option<Lstm<B>>,
}

impl<B: Backend> Seq2SeqEncoder<B> {
    /// Create the encoder selected by the config
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        Self {
            lstm: init_lstm(config, device),
        }
    }

    /// Size of each encoded vector
    pub fn output_size(config: &ModelConfig) -> usize {
        output_size(config)
    }

    /// [batch_size, seq_length, d_input] -> [batch_size, seq_length, d_output]
    pub fn forward(&self, embedded: Tensor<B, 3>) -> Tensor<B, 3> {
        match &self.lstm {
            Some(lstm) => lstm.forward(embedded, None).1,
            None => embedded,
        }
    }
}
