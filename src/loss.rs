//! Losses over batched model outputs, with gradients w.r.t. the output.
use crate::error::{AttackError, Result};
use crate::AdvexFloat;
use itertools::izip;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Scalar criterion over a batched model output (samples as columns).
///
/// `Y` is the label or target type. `gradient` is the derivative of `value`
/// with respect to the output tensor; together with a model's pull-back it
/// yields input gradients for the attack drivers.
pub trait Loss<Y: ?Sized> {
    fn value(&self, output: &Array2<AdvexFloat>, target: &Y) -> Result<AdvexFloat>;

    /// Gradient of the loss with respect to `output`, shaped like `output`.
    fn gradient(&self, output: &Array2<AdvexFloat>, target: &Y) -> Result<Array2<AdvexFloat>>;
}

/// Softmax cross-entropy against class-index labels, averaged over the batch.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct CrossEntropy;

/// Column-wise softmax, shifted by the column max for stability.
fn softmax_columns(logits: &Array2<AdvexFloat>) -> Array2<AdvexFloat> {
    let mut probs = logits.to_owned();
    for mut col in probs.axis_iter_mut(Axis(1)) {
        let max = col.fold(AdvexFloat::NEG_INFINITY, |m, &v| m.max(v));
        col.mapv_inplace(|v| (v - max).exp());
        let sum = col.sum();
        col.mapv_inplace(|v| v / sum);
    }
    probs
}

fn check_labels(output: &Array2<AdvexFloat>, labels: &[usize]) -> Result<()> {
    if labels.len() != output.ncols() {
        return Err(AttackError::ShapeMismatch {
            expected: vec![output.ncols()],
            actual: vec![labels.len()],
        });
    }
    if let Some(&bad) = labels.iter().find(|&&y| y >= output.nrows()) {
        return Err(AttackError::GradientComputation {
            reason: format!("label {} out of range for {} classes", bad, output.nrows()),
        });
    }
    Ok(())
}

impl Loss<[usize]> for CrossEntropy {
    fn value(&self, output: &Array2<AdvexFloat>, labels: &[usize]) -> Result<AdvexFloat> {
        check_labels(output, labels)?;
        let probs = softmax_columns(output);
        let total: AdvexFloat = izip!(probs.axis_iter(Axis(1)), labels)
            .map(|(col, &y)| -col[y].ln())
            .sum();
        Ok(total / labels.len() as AdvexFloat)
    }

    fn gradient(&self, output: &Array2<AdvexFloat>, labels: &[usize]) -> Result<Array2<AdvexFloat>> {
        check_labels(output, labels)?;
        let mut grad = softmax_columns(output);
        for (mut col, &y) in izip!(grad.axis_iter_mut(Axis(1)), labels) {
            col[y] -= 1.0;
        }
        let n = labels.len() as AdvexFloat;
        grad.mapv_inplace(|v| v / n);
        Ok(grad)
    }
}

/// Mean squared error against a target output tensor.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct SquaredError;

fn check_target_shape(output: &Array2<AdvexFloat>, target: &Array2<AdvexFloat>) -> Result<()> {
    if output.dim() != target.dim() {
        return Err(AttackError::ShapeMismatch {
            expected: output.shape().to_vec(),
            actual: target.shape().to_vec(),
        });
    }
    Ok(())
}

impl Loss<Array2<AdvexFloat>> for SquaredError {
    fn value(&self, output: &Array2<AdvexFloat>, target: &Array2<AdvexFloat>) -> Result<AdvexFloat> {
        check_target_shape(output, target)?;
        let n = output.len() as AdvexFloat;
        Ok((output - target).mapv(|d| d * d).sum() / n)
    }

    fn gradient(
        &self,
        output: &Array2<AdvexFloat>,
        target: &Array2<AdvexFloat>,
    ) -> Result<Array2<AdvexFloat>> {
        check_target_shape(output, target)?;
        let n = output.len() as AdvexFloat;
        Ok((output - target).mapv(|d| 2.0 * d / n))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_cross_entropy_of_uniform_logits() {
        let logits = Array2::<AdvexFloat>::zeros((4, 3));
        let value = CrossEntropy.value(&logits, &[0, 1, 3]).unwrap();
        assert_abs_diff_eq!(value, (4.0_f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_cross_entropy_gradient_columns_sum_to_zero() {
        let logits = array![[2.0, -1.0], [0.5, 0.0], [-0.3, 1.7]];
        let grad = CrossEntropy.gradient(&logits, &[2, 0]).unwrap();
        for col in grad.axis_iter(ndarray::Axis(1)) {
            assert_abs_diff_eq!(col.sum(), 0.0, epsilon = 1e-12);
        }
        // the true-class entry is the only negative one
        assert!(grad[[2, 0]] < 0.0 && grad[[0, 1]] < 0.0);
    }

    #[test]
    fn test_cross_entropy_rejects_bad_labels() {
        let logits = Array2::<AdvexFloat>::zeros((2, 2));
        assert!(matches!(
            CrossEntropy.value(&logits, &[0]),
            Err(AttackError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            CrossEntropy.value(&logits, &[0, 5]),
            Err(AttackError::GradientComputation { .. })
        ));
    }

    #[test]
    fn test_squared_error_known_values() {
        let output = array![[1.0], [3.0]];
        let target = array![[0.0], [1.0]];
        assert_abs_diff_eq!(
            SquaredError.value(&output, &target).unwrap(),
            (1.0 + 4.0) / 2.0,
            epsilon = 1e-12
        );
        let grad = SquaredError.gradient(&output, &target).unwrap();
        assert_eq!(grad, array![[1.0], [2.0]]);
    }
}
