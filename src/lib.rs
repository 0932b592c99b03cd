//! # cartpole-dqn - Deep Q-Learning for pole balancing
//!
//! A small, self-contained DQN implementation on top of `ndarray`: a dual-network agent,
//! a bounded replay buffer and an epoch-based trainer. The environment is supplied by the
//! caller through the [`environment::Environment`] trait.
//!
//! ## Key Features
//!
//! - **Agent**: online and target Q-networks, epsilon-greedy policy, MSE TD-learning
//! - **Replay Buffer**: fixed-capacity FIFO with multi-episode collection and
//!   uniform sampling with replacement
//! - **Trainer**: epsilon schedule, periodic target sync and evaluation, configurable
//!   buffer flushing and optional early stopping
//! - **Reproducible**: every random draw comes from an explicitly seeded generator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartpole_dqn::environment::{Environment, Step};
//! use cartpole_dqn::error::Result;
//! use cartpole_dqn::trainer::{Trainer, TrainingConfig};
//! use ndarray::{array, Array1};
//!
//! struct Coin { flips: usize }
//!
//! impl Environment for Coin {
//!     fn state_dim(&self) -> usize { 1 }
//!     fn num_actions(&self) -> usize { 2 }
//!     fn reset(&mut self) -> Result<Array1<f32>> {
//!         self.flips = 0;
//!         Ok(array![0.0])
//!     }
//!     fn step(&mut self, action: usize) -> Result<Step> {
//!         self.flips += 1;
//!         Ok(Step::new(array![self.flips as f32], action as f32, self.flips == 10))
//!     }
//! }
//!
//! let config = TrainingConfig::default().num_epochs(5).seed(42);
//! let mut trainer = Trainer::new(config, Coin { flips: 0 })?;
//! let report = trainer.run()?;
//! println!("best return: {:?}", report.history.best_return());
//! # Ok::<(), cartpole_dqn::error::DqnError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, Linear, Tanh)
//! - [`agent`] - The DQN agent and the `Policy` trait
//! - [`environment`] - The environment contract
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`metrics`] - Per-epoch training history and CSV export
//! - [`network`] - Feed-forward Q-network
//! - [`optimizer`] - SGD and Adam
//! - [`replay_buffer`] - Transitions, episodes and the replay buffer
//! - [`trainer`] - Training configuration, epsilon schedule and the epoch loop

pub mod activations;
pub mod agent;
pub mod environment;
pub mod error;
pub mod layers;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
