use burn::tensor::{backend::Backend, Bool, Data, ElementConversion, Int, Shape, Tensor};

/// Right-pad id sequences to a fixed length, truncating anything longer
pub fn pad_to<B: Backend>(
    pad_token: usize,
    tokens_list: &[Vec<usize>],
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = tokens_list.len();

    let mut values = vec![pad_token as i64; batch_size * seq_length];

    for (row, tokens) in tokens_list.iter().enumerate() {
        for (column, token) in tokens.iter().take(seq_length).enumerate() {
            values[row * seq_length + column] = *token as i64;
        }
    }

    let values: Vec<B::IntElem> = values.into_iter().map(|value| value.elem()).collect();

    Tensor::from_data(Data::new(values, Shape::new([batch_size, seq_length])), device)
}

/// A mask that is `true` for the first `length` positions of each row and `false` after
pub fn mask_to<B: Backend>(
    lengths: &[usize],
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Bool> {
    let values: Vec<bool> = lengths
        .iter()
        .flat_map(|&length| (0..seq_length).map(move |column| column < length))
        .collect();

    Tensor::from_data(Data::new(values, Shape::new([lengths.len(), seq_length])), device)
}
