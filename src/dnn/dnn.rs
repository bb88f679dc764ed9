use crate::dnn::layer::Layer;
use crate::AdvexFloat;
use itertools::Itertools;
use ndarray::Array2;
use std::fmt;

/// Sequential feed-forward network over batched inputs, samples as columns.
#[derive(Clone, Debug, Default)]
pub struct DNN {
    layers: Vec<Box<dyn Layer>>,
}

impl DNN {
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Self {
        Self { layers }
    }

    pub fn add_layer(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn forward(&self, input: &Array2<AdvexFloat>) -> Array2<AdvexFloat> {
        self.layers
            .iter()
            .fold(input.to_owned(), |x, layer| layer.forward(&x))
    }

    /// Activations entering each layer, ending with the network output.
    fn activations(&self, input: &Array2<AdvexFloat>) -> Vec<Array2<AdvexFloat>> {
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(input.to_owned());
        for layer in &self.layers {
            let next = layer.forward(acts.last().unwrap());
            acts.push(next);
        }
        acts
    }

    /// Pull `grad_output` back through the whole network evaluated at `input`,
    /// yielding the gradient with respect to the input.
    pub fn vjp(
        &self,
        input: &Array2<AdvexFloat>,
        grad_output: &Array2<AdvexFloat>,
    ) -> Array2<AdvexFloat> {
        let acts = self.activations(input);
        let mut grad = grad_output.to_owned();
        for (layer, act) in self.layers.iter().zip(acts.iter()).rev() {
            grad = layer.vjp(act, &grad);
        }
        grad
    }
}

impl fmt::Display for DNN {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DNN: {}", self.layers.iter().map(|l| l.to_string()).join(" -> "))
    }
}
