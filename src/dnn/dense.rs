use crate::dnn::layer::Layer;
use crate::AdvexFloat;
use ndarray::{Array1, Array2, Axis};
use std::fmt;

/// Affine layer `W x + b` with samples as columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Dense {
    weight: Array2<AdvexFloat>,
    bias: Array1<AdvexFloat>,
}

impl Dense {
    /// # Panics
    /// If `bias` length differs from the output dimension of `weight`.
    pub fn new(weight: Array2<AdvexFloat>, bias: Array1<AdvexFloat>) -> Self {
        assert_eq!(weight.nrows(), bias.len());
        Self { weight, bias }
    }

    pub fn input_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.nrows()
    }
}

impl Layer for Dense {
    fn forward(&self, input: &Array2<AdvexFloat>) -> Array2<AdvexFloat> {
        debug_assert_eq!(input.nrows(), self.input_dim());
        self.weight.dot(input) + self.bias.view().insert_axis(Axis(1))
    }

    fn vjp(
        &self,
        _input: &Array2<AdvexFloat>,
        grad_output: &Array2<AdvexFloat>,
    ) -> Array2<AdvexFloat> {
        self.weight.t().dot(grad_output)
    }
}

impl fmt::Display for Dense {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dense {}", self.output_dim())
    }
}
