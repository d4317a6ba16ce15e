//! Loss and accuracy on logits

use burn::tensor::{activation::log_softmax, backend::Backend, ElementConversion, Int, Tensor};

/// Categorical cross-entropy between raw logits and one-hot targets
///
/// `-Σ targets · log_softmax(logits)` per sample, averaged over the batch.
/// Returns a single-element tensor. Matches burn's `CrossEntropyLoss` on the
/// integer labels but consumes the one-hot targets of [`LeafBatch`].
///
/// [`LeafBatch`]: crate::dataset::LeafBatch
pub fn categorical_cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    (log_probs * targets).sum_dim(1).mean().neg()
}

/// Arg-max class per row of `[N, C]` logits
pub fn predicted_classes<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    let [batch_size, _] = logits.dims();
    logits.argmax(1).reshape([batch_size])
}

/// Number of rows whose arg-max matches `labels`
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    let correct: i64 = predicted_classes(logits)
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem();
    correct as usize
}
