//! # Reinforcement Learning Agent Module
//!
//! The DQN agent and the [`Policy`] seam used by experience collection.
//!
//! ## Core Concepts
//!
//! - **Online network**: the Q-network trained on every gradient step
//! - **Target network**: a value snapshot of the online network, refreshed only by
//!   [`DqnAgent::sync_target`], used to compute stable regression targets
//! - **Epsilon-greedy**: the caller passes epsilon on every action query, so the agent
//!   itself holds no exploration state
//!
//! ## Example Usage
//!
//! ```rust
//! use cartpole_dqn::agent::DqnAgentBuilder;
//! use cartpole_dqn::replay_buffer::Transition;
//! use ndarray::array;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut agent = DqnAgentBuilder::new(2, 2)
//!     .hidden_layers(&[8])
//!     .build(&mut rng)
//!     .unwrap();
//!
//! let transition = Transition {
//!     state: array![0.5, -0.5],
//!     action: 1,
//!     reward: 1.0,
//!     next_state: array![0.6, -0.4],
//!     terminal: false,
//! };
//! let loss = agent.train_step(&[&transition]).unwrap();
//! assert!(loss.is_finite());
//! agent.sync_target();
//! ```

pub mod traits;

mod dqn;
pub use dqn::{DqnAgent, DqnAgentBuilder};
pub use traits::Policy;
