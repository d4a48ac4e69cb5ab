use burn::tensor::{activation::log_softmax, backend::Backend, Bool, Int, Tensor};

/// Cross-entropy for per-token logits that ignores padding
///
/// Each record's loss is the mean over its real positions. The batch loss is the mean over
/// records that have at least one real position, so rows made only of padding change nothing.
///
/// - `logits`: [batch_size, seq_length, n_classes]
/// - `targets`: [batch_size, seq_length]
/// - `mask`: [batch_size, seq_length], `true` at real positions
pub fn sequence_cross_entropy<B: Backend>(
    logits: Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    mask: Tensor<B, 2, Bool>,
) -> Tensor<B, 1> {
    let [batch_size, seq_length, _] = logits.dims();

    let log_probs = log_softmax(logits, 2)
        .gather(2, targets.reshape([batch_size, seq_length, 1]))
        .reshape([batch_size, seq_length]);

    let weights = mask.float();
    let counts = weights.clone().sum_dim(1);

    let per_record = log_probs
        .neg()
        .mul(weights)
        .sum_dim(1)
        .div(counts.clone().clamp_min(1.0));

    let non_empty = counts.clamp_max(1.0);
    let n_records = non_empty.clone().sum().clamp_min(1.0);

    per_record.mul(non_empty).sum().div(n_records)
}

/// Cross-entropy over rows that ignores rows switched off in `mask`
///
/// The loss is the mean over counted rows, and zero when no row counts.
///
/// - `logits`: [n_rows, n_classes]
/// - `targets`: [n_rows]
/// - `mask`: [n_rows], `true` for rows that count
pub fn masked_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    mask: Tensor<B, 1, Bool>,
) -> Tensor<B, 1> {
    let [n_rows, _] = logits.dims();

    let log_probs = log_softmax(logits, 1)
        .gather(1, targets.reshape([n_rows, 1]))
        .reshape([n_rows]);

    let weights = mask.float();
    let count = weights.clone().sum().clamp_min(1.0);

    log_probs.neg().mul(weights).sum().div(count)
}
