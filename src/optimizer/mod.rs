use ndarray::{Array1, Array2, Dimension, Zip};
use serde::{Serialize, Deserialize};

/// A gradient-descent update rule applied layer by layer.
///
/// `layer` is the position of the layer in its network; stateful optimizers use it to
/// keep one set of accumulators per layer.
pub trait Optimizer {
    /// Called once per minibatch, before any layer is updated.
    fn begin_step(&mut self) {}

    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);
}

/// Serializable choice of optimizer, used by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizerKind {
    Sgd,
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
}

impl Default for OptimizerKind {
    fn default() -> Self {
        OptimizerKind::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

impl OptimizerKind {
    /// Create a fresh optimizer with empty state.
    pub fn build(&self) -> OptimizerWrapper {
        match self {
            OptimizerKind::Sgd => OptimizerWrapper::Sgd(Sgd::new()),
            OptimizerKind::Adam { beta1, beta2, epsilon } => {
                OptimizerWrapper::Adam(Adam::new(*beta1, *beta2, *epsilon))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OptimizerWrapper {
    Sgd(Sgd),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn begin_step(&mut self) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.begin_step(),
        }
    }

    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Sgd;

impl Sgd {
    pub fn new() -> Sgd {
        Sgd
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for Sgd {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with bias correction. Moment estimates are allocated lazily, one pair per layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    pub t: i32,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: Vec::new(),
            v_weights: Vec::new(),
            m_biases: Vec::new(),
            v_biases: Vec::new(),
            t: 0,
        }
    }

    fn bias_corrections(&self) -> (f32, f32) {
        let t = self.t.max(1);
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

/// Returns the accumulator for `layer`, (re)allocating it with zeros when missing or
/// when its shape no longer matches.
fn moment_slot<D: Dimension>(
    slots: &mut Vec<ndarray::Array<f32, D>>,
    layer: usize,
    dim: D,
) -> &mut ndarray::Array<f32, D> {
    while slots.len() <= layer {
        slots.push(ndarray::Array::zeros(dim.clone()));
    }
    if slots[layer].raw_dim() != dim {
        slots[layer] = ndarray::Array::zeros(dim);
    }
    &mut slots[layer]
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let (bc1, bc2) = self.bias_corrections();
        let m = moment_slot(&mut self.m_weights, layer, weights.raw_dim());
        let v = moment_slot(&mut self.v_weights, layer, weights.raw_dim());

        Zip::from(weights)
            .and(m)
            .and(v)
            .and(gradients)
            .for_each(|w, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                *w -= learning_rate * (*m / bc1) / ((*v / bc2).sqrt() + eps);
            });
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let (bc1, bc2) = self.bias_corrections();
        let m = moment_slot(&mut self.m_biases, layer, biases.raw_dim());
        let v = moment_slot(&mut self.v_biases, layer, biases.raw_dim());

        Zip::from(biases)
            .and(m)
            .and(v)
            .and(gradients)
            .for_each(|b, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                *b -= learning_rate * (*m / bc1) / ((*v / bc2).sqrt() + eps);
            });
    }
}
