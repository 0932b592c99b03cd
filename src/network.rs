use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, WeightInit};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward action-value approximator: maps a state vector to one value per action.
///
/// Inference never mutates the network. Parameters only change through
/// [`NeuralNetwork::train_minibatch`] or by copying another network's parameters with
/// [`NeuralNetwork::copy_from`]; the copy is a deep value snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
}

impl NeuralNetwork {
    /// Create a new network with the given layer sizes and per-layer activations.
    /// `activations` must hold one entry per weight layer (`layer_sizes.len() - 1`).
    pub fn new<R: Rng>(
        layer_sizes: &[usize],
        activations: &[Activation],
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_config(
                "layer_sizes",
                "network must have at least input and output layers",
            ));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(DqnError::invalid_config(
                "activations",
                format!(
                    "expected {} activations for {} layer sizes, got {}",
                    layer_sizes.len() - 1,
                    layer_sizes.len(),
                    activations.len()
                ),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, init, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(NeuralNetwork { layers })
    }

    /// Build a network from already constructed layers, checking that adjacent shapes chain.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(DqnError::invalid_config("layers", "network needs at least one layer"));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(DqnError::dimension_mismatch(
                    format!("layer input of {}", pair[0].output_size()),
                    format!("layer input of {}", pair[1].input_size()),
                ));
            }
        }
        Ok(NeuralNetwork { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    /// Total number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    /// Action values for a single state.
    pub fn forward(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let outputs = self.forward_batch(input.insert_axis(Axis(0)))?;
        Ok(outputs.row(0).to_owned())
    }

    /// Action values for a batch of states, one state per row.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input_width(inputs.ncols())?;
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.forward_batch(current.view());
        }
        Ok(current)
    }

    /// One gradient-descent step towards `targets` under a squared-error loss.
    ///
    /// The loss is the squared error summed over output units and averaged over rows.
    /// Columns where `targets` equals the current prediction contribute no gradient.
    /// Returns the loss measured before the update. A non-finite loss is returned
    /// without touching the parameters.
    pub fn train_minibatch(
        &mut self,
        inputs: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        optimizer: &mut OptimizerWrapper,
        learning_rate: f32,
    ) -> Result<f32> {
        self.check_input_width(inputs.ncols())?;
        let batch_size = inputs.nrows();
        if batch_size == 0 {
            return Err(DqnError::EmptyBatch);
        }
        if targets.dim() != (batch_size, self.output_size()) {
            return Err(DqnError::dimension_mismatch(
                format!("targets of shape {:?}", (batch_size, self.output_size())),
                format!("targets of shape {:?}", targets.dim()),
            ));
        }

        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            let (pre_activation, outputs) = layer.forward_cached(current.view());
            layer_inputs.push(current);
            pre_activations.push(pre_activation);
            current = outputs;
        }

        let errors = &current - &targets;
        let loss = errors.mapv(|e| e * e).sum() / batch_size as f32;
        if !loss.is_finite() {
            return Ok(loss);
        }

        let mut delta = errors * (2.0 / batch_size as f32);
        optimizer.begin_step();
        for i in (0..self.layers.len()).rev() {
            let layer = &mut self.layers[i];
            let (adjusted_error, weight_gradients, bias_gradients) =
                layer.backward_batch(layer_inputs[i].view(), pre_activations[i].view(), delta.view());

            // propagate with the pre-update weights
            if i != 0 {
                delta = adjusted_error.dot(&layer.weights.t());
            }

            optimizer.update_weights(i, &mut layer.weights, &weight_gradients, learning_rate);
            optimizer.update_biases(i, &mut layer.biases, &bias_gradients, learning_rate);
        }

        Ok(loss)
    }

    /// Overwrite every parameter with the corresponding value from `other`.
    pub fn copy_from(&mut self, other: &NeuralNetwork) {
        self.layers.clone_from(&other.layers);
    }

    /// True when both networks have identical shapes and parameter values.
    pub fn same_parameters(&self, other: &NeuralNetwork) -> bool {
        self.layers == other.layers
    }

    fn check_input_width(&self, width: usize) -> Result<()> {
        if width != self.input_size() {
            return Err(DqnError::dimension_mismatch(
                format!("state of length {}", self.input_size()),
                format!("state of length {}", width),
            ));
        }
        Ok(())
    }
}
