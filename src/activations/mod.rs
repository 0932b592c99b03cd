//! # Activation Functions Module
//!
//! Non-linearities applied after each dense layer of a Q-network.
//!
//! ## Available Activations
//!
//! - **ReLU** (Rectified Linear Unit): `max(0, x)` - default for hidden layers
//! - **Linear**: Identity function - used for the action-value output layer
//! - **Tanh**: Hyperbolic tangent - outputs between -1 and 1
//!
//! ## Usage Example
//!
//! ```rust
//! use cartpole_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
