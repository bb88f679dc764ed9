use crate::dnn::layer::Layer;
use crate::AdvexFloat;
use ndarray::{Array2, Zip};
use std::fmt;

/// Elementwise rectifier. The subgradient at zero is taken as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReLU;

impl Layer for ReLU {
    fn forward(&self, input: &Array2<AdvexFloat>) -> Array2<AdvexFloat> {
        input.mapv(|x| if x.lt(&0.) { 0. } else { x })
    }

    fn vjp(
        &self,
        input: &Array2<AdvexFloat>,
        grad_output: &Array2<AdvexFloat>,
    ) -> Array2<AdvexFloat> {
        Zip::from(input)
            .and(grad_output)
            .map_collect(|&x, &g| if x > 0. { g } else { 0. })
    }
}

impl fmt::Display for ReLU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReLU")
    }
}
