use std::ops::AddAssign;

use burn::tensor::{backend::Backend, Bool, ElementConversion, Int, Tensor};
use derive_new::new;

/// Classification output, flattened so that each row is one prediction
///
/// For text classification a row is a sequence; for token classification a row is a token
/// position, and padding rows are switched off in `mask`.
#[derive(new)]
pub struct Output<B: Backend> {
    /// The loss.
    pub loss: Tensor<B, 1>,

    /// The logits: [n_rows, n_classes]
    pub output: Tensor<B, 2>,

    /// The targets: [n_rows]
    pub targets: Tensor<B, 1, Int>,

    /// Which rows count towards metrics: [n_rows]
    pub mask: Tensor<B, 1, Bool>,
}

impl<B: Backend> Output<B> {
    /// Accuracy over unmasked rows
    pub fn accuracy(&self) -> Accuracy {
        let [n_rows, _] = self.output.dims();

        let predicted = self.output.clone().argmax(1).reshape([n_rows]);
        let mask = self.mask.clone().int();

        let correct = predicted
            .equal(self.targets.clone())
            .int()
            .mul(mask.clone())
            .sum()
            .into_scalar()
            .elem::<i64>();

        let total = mask.sum().into_scalar().elem::<i64>();

        Accuracy::new(correct as usize, total as usize)
    }

    /// The loss as a host value
    pub fn loss_value(&self) -> f64 {
        self.loss.clone().into_scalar().elem::<f64>()
    }
}

/// Correct predictions out of counted positions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, new)]
pub struct Accuracy {
    /// Correct predictions
    pub correct: usize,

    /// Counted positions
    pub total: usize,
}

impl Accuracy {
    /// The ratio of correct predictions, or 0 when nothing was counted
    pub fn value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl AddAssign for Accuracy {
    fn add_assign(&mut self, other: Self) {
        self.correct += other.correct;
        self.total += other.total;
    }
}

/// Running mean of per-batch losses, each weighted by the rows its batch counted
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanLoss {
    sum: f64,
    count: usize,
}

impl MeanLoss {
    /// Add one batch loss averaged over `rows` counted rows
    pub fn push(&mut self, loss: f64, rows: usize) {
        self.sum += loss * rows as f64;
        self.count += rows;
    }

    /// The mean, or `None` if no row was counted
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::NdArray,
        tensor::{Data, Shape},
    };
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_accuracy_skips_masked_rows() {
        let device = Default::default();

        let output = Tensor::<TestBackend, 2>::from_data(
            Data::<f32, 2>::new(
                vec![0.9, 0.1, 0.2, 0.8, 0.7, 0.3, 0.6, 0.4],
                Shape::new([4, 2]),
            ),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            Data::<i64, 1>::new(vec![0, 1, 1, 1], Shape::new([4])),
            &device,
        );
        let mask = Tensor::<TestBackend, 1, Bool>::from_data(
            Data::new(vec![true, true, true, false], Shape::new([4])),
            &device,
        );
        let loss = Tensor::<TestBackend, 1>::from_data(
            Data::<f32, 1>::new(vec![0.5], Shape::new([1])),
            &device,
        );

        let output = Output::new(loss, output, targets, mask);

        assert_eq!(output.accuracy(), Accuracy::new(2, 3));
        assert!((output.loss_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_accumulators() {
        let mut accuracy = Accuracy::default();
        assert_eq!(accuracy.value(), 0.0);

        accuracy += Accuracy::new(1, 2);
        accuracy += Accuracy::new(2, 2);
        assert_eq!(accuracy.value(), 0.75);

        let mut loss = MeanLoss::default();
        assert_eq!(loss.value(), None);

        loss.push(1.0, 3);
        loss.push(2.0, 1);
        assert_eq!(loss.value(), Some(1.25));

        loss.push(5.0, 0);
        assert_eq!(loss.value(), Some(1.25));
    }
}
