// Test modules for all components
pub mod common;
pub mod test_activations;
pub mod test_optimizer;
pub mod test_trainer;
