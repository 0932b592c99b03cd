use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::{Normal, Uniform};
use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};

/// Weight initialization strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum WeightInit {
    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// He/Kaiming uniform initialization (for ReLU)
    #[default]
    HeUniform,

    /// He/Kaiming normal initialization (for ReLU)
    HeNormal,

    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },

    /// All zeros
    Zeros,
}

impl WeightInit {
    /// Initialize a `(fan_in, fan_out)` weight matrix, drawing from `rng`.
    pub fn initialize_weights<R: Rng>(&self, shape: (usize, usize), rng: &mut R) -> Result<Array2<f32>> {
        let (fan_in, fan_out) = shape;

        let weights = match self {
            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::HeUniform => {
                let limit = (6.0 / fan_in.max(1) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::HeNormal => {
                let std = (2.0 / fan_in.max(1) as f32).sqrt();
                let normal = Normal::new(0.0, std)
                    .map_err(|e| DqnError::invalid_config("weight_init", e.to_string()))?;
                Array2::random_using(shape, normal, rng)
            }

            WeightInit::Uniform { min, max } => {
                if !(min < max) {
                    return Err(DqnError::invalid_config(
                        "weight_init",
                        format!("uniform range [{}, {}) is empty", min, max),
                    ));
                }
                Array2::random_using(shape, Uniform::new(*min, *max), rng)
            }

            WeightInit::Zeros => Array2::zeros(shape),
        };

        Ok(weights)
    }

    /// Biases always start at zero.
    pub fn initialize_biases(&self, size: usize) -> Array1<f32> {
        Array1::zeros(size)
    }
}
