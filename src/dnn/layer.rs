use crate::AdvexFloat;
use dyn_clone::DynClone;
use ndarray::Array2;
use std::fmt::{Debug, Display};

/// A differentiable layer over batched inputs, samples as columns.
pub trait Layer: DynClone + Debug + Display {
    fn forward(&self, input: &Array2<AdvexFloat>) -> Array2<AdvexFloat>;

    /// Pull `grad_output` back through the layer evaluated at `input`
    /// (a vector-Jacobian product).
    fn vjp(&self, input: &Array2<AdvexFloat>, grad_output: &Array2<AdvexFloat>)
        -> Array2<AdvexFloat>;
}

dyn_clone::clone_trait_object!(Layer);
