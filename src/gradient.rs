//! The seam to the external autodiff engine and Monte-Carlo gradient
//! estimation over it.
use crate::error::{AttackError, Result};
use crate::AdvexFloat;
use ndarray::{Array, Dimension};

/// A differentiable objective: scalar loss of a model's output at `x`, and
/// the gradient of that loss with respect to `x`.
///
/// `x` carries samples along its last axis; `target` is the label or attack
/// target and is never inspected by this crate. Implementations typically
/// wrap a model, a loss function, and an automatic-differentiation engine;
/// non-differentiability at the evaluation point surfaces as
/// [`AttackError::GradientComputation`] and is propagated unchanged. A model
/// with internal randomness may return a different gradient on every call,
/// which is exactly what [`estimate_gradient`] samples over.
pub trait Differentiable<D: Dimension, Y: ?Sized> {
    /// Scalar loss at `x`.
    fn loss(&self, x: &Array<AdvexFloat, D>, target: &Y) -> Result<AdvexFloat>;

    /// Gradient of the loss with respect to `x`, shaped like `x`.
    fn gradient(&self, x: &Array<AdvexFloat, D>, target: &Y) -> Result<Array<AdvexFloat, D>>;
}

/// Adapter building a [`Differentiable`] from a pair of closures, for callers
/// whose model, loss, and autodiff engine live outside this crate.
pub struct GradientFn<F, G> {
    loss_fn: F,
    grad_fn: G,
}

impl<F, G> GradientFn<F, G> {
    pub fn new(loss_fn: F, grad_fn: G) -> Self {
        Self { loss_fn, grad_fn }
    }
}

impl<D, Y, F, G> Differentiable<D, Y> for GradientFn<F, G>
where
    D: Dimension,
    Y: ?Sized,
    F: Fn(&Array<AdvexFloat, D>, &Y) -> Result<AdvexFloat>,
    G: Fn(&Array<AdvexFloat, D>, &Y) -> Result<Array<AdvexFloat, D>>,
{
    fn loss(&self, x: &Array<AdvexFloat, D>, target: &Y) -> Result<AdvexFloat> {
        (self.loss_fn)(x, target)
    }

    fn gradient(&self, x: &Array<AdvexFloat, D>, target: &Y) -> Result<Array<AdvexFloat, D>> {
        (self.grad_fn)(x, target)
    }
}

/// Monte-Carlo averaged gradient of the loss at `x_adv`.
///
/// Invokes the engine `mc_samples` times sequentially and averages the draws,
/// so a model with internal randomness is re-sampled per draw.
///
/// # Errors
/// `ShapeMismatch` if any draw is not shaped like `x_adv`; engine errors
/// propagate unchanged.
pub fn estimate_gradient<D, Y, O>(
    objective: &O,
    x_adv: &Array<AdvexFloat, D>,
    target: &Y,
    mc_samples: usize,
) -> Result<Array<AdvexFloat, D>>
where
    D: Dimension,
    Y: ?Sized,
    O: Differentiable<D, Y>,
{
    debug_assert!(mc_samples >= 1);
    let mut acc = checked(objective.gradient(x_adv, target)?, x_adv)?;
    for _ in 1..mc_samples {
        acc += &checked(objective.gradient(x_adv, target)?, x_adv)?;
    }
    if mc_samples > 1 {
        acc /= mc_samples as AdvexFloat;
    }
    Ok(acc)
}

fn checked<D: Dimension>(
    grads: Array<AdvexFloat, D>,
    x: &Array<AdvexFloat, D>,
) -> Result<Array<AdvexFloat, D>> {
    if grads.shape() != x.shape() {
        return Err(AttackError::ShapeMismatch {
            expected: x.shape().to_vec(),
            actual: grads.shape().to_vec(),
        });
    }
    Ok(grads)
}
