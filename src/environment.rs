//! The environment contract consumed by collection and evaluation.
//!
//! The crate never simulates anything itself; any episodic task with a fixed-length
//! state vector and a discrete action space can be plugged in by implementing
//! [`Environment`].

use ndarray::{Array1, ArrayView1};

use crate::error::{DqnError, Result};

/// Outcome of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub next_state: Array1<f32>,
    pub reward: f32,
    pub terminal: bool,
}

impl Step {
    pub fn new(next_state: Array1<f32>, reward: f32, terminal: bool) -> Self {
        Step { next_state, reward, terminal }
    }

    /// Reject steps that break the contract: non-finite reward or wrong state length.
    pub fn validate(&self, state_dim: usize) -> Result<()> {
        if !self.reward.is_finite() {
            return Err(DqnError::Environment(format!("non-finite reward {}", self.reward)));
        }
        validate_state(self.next_state.view(), state_dim)
    }
}

/// Check a state vector against the declared dimensionality.
pub fn validate_state(state: ArrayView1<f32>, state_dim: usize) -> Result<()> {
    if state.len() != state_dim {
        return Err(DqnError::dimension_mismatch(
            format!("state of length {}", state_dim),
            format!("state of length {}", state.len()),
        ));
    }
    Ok(())
}

/// An episodic task with a discrete action space `0..num_actions()`.
pub trait Environment {
    /// Length of every state vector this environment produces.
    fn state_dim(&self) -> usize;

    /// Number of valid actions.
    fn num_actions(&self) -> usize;

    /// Start a new episode and return its initial state. May be called at any time.
    fn reset(&mut self) -> Result<Array1<f32>>;

    /// Apply `action`. Must not fail for any action in `0..num_actions()`.
    fn step(&mut self, action: usize) -> Result<Step>;
}
