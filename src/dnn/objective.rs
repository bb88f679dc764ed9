use crate::dnn::DNN;
use crate::error::Result;
use crate::gradient::Differentiable;
use crate::loss::Loss;
use crate::AdvexFloat;
use ndarray::{Array2, Ix2};

/// A network and a loss bound into one differentiable objective.
///
/// Forward and backward passes are analytic, so gradients are exact; this is
/// the crate's in-tree gradient engine, used wherever an attack needs a
/// [`Differentiable`] without an external autodiff dependency.
pub struct DnnObjective<'a, L> {
    dnn: &'a DNN,
    loss: L,
}

impl<'a, L> DnnObjective<'a, L> {
    pub fn new(dnn: &'a DNN, loss: L) -> Self {
        Self { dnn, loss }
    }
}

impl<'a, L, Y> Differentiable<Ix2, Y> for DnnObjective<'a, L>
where
    L: Loss<Y>,
    Y: ?Sized,
{
    fn loss(&self, x: &Array2<AdvexFloat>, target: &Y) -> Result<AdvexFloat> {
        let output = self.dnn.forward(x);
        self.loss.value(&output, target)
    }

    fn gradient(&self, x: &Array2<AdvexFloat>, target: &Y) -> Result<Array2<AdvexFloat>> {
        let output = self.dnn.forward(x);
        let grad_output = self.loss.gradient(&output, target)?;
        Ok(self.dnn.vjp(x, &grad_output))
    }
}
