use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use super::initialization::WeightInit;

/// A fully connected (dense) layer in a Q-network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    /// Create a new dense layer with the given input size, output size and activation.
    /// Weights are drawn from `init` using `rng`; biases start at zero.
    pub fn new<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(DqnError::invalid_config(
                "layer_sizes",
                format!("layer of shape {}x{} has no units", input_size, output_size),
            ));
        }
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(output_size);
        Ok(DenseLayer { weights, biases, activation })
    }

    /// Build a layer from explicit parameters.
    pub fn from_parameters(weights: Array2<f32>, biases: Array1<f32>, activation: Activation) -> Result<Self> {
        if weights.ncols() != biases.len() {
            return Err(DqnError::dimension_mismatch(
                format!("{} biases", weights.ncols()),
                format!("{} biases", biases.len()),
            ));
        }
        Ok(DenseLayer { weights, biases, activation })
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Forward pass for a batch of row vectors.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = inputs.dot(&self.weights) + &self.biases;
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Forward pass that also returns the pre-activations needed by `backward_batch`.
    pub fn forward_cached(&self, inputs: ArrayView2<f32>) -> (Array2<f32>, Array2<f32>) {
        let pre_activation = inputs.dot(&self.weights) + &self.biases;
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        (pre_activation, outputs)
    }

    /// Compute gradients for a batch given the inputs and pre-activations recorded
    /// during the forward pass. Returns `(adjusted_error, weight_gradients, bias_gradients)`,
    /// where `adjusted_error` is the error after the activation derivative has been applied.
    pub fn backward_batch(
        &self,
        inputs: ArrayView2<f32>,
        pre_activation: ArrayView2<f32>,
        output_errors: ArrayView2<f32>,
    ) -> (Array2<f32>, Array2<f32>, Array1<f32>) {
        let activation_deriv = self.activation.derivative_batch(pre_activation);
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        (adjusted_error, weight_gradients, bias_gradients)
    }
}
