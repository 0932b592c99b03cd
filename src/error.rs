use thiserror::Error;

/// Result type for DQN operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DqnError {
    /// Sampling was requested from a buffer holding no transitions
    #[error("Buffer underflow: cannot sample {requested} transitions from an empty buffer")]
    BufferUnderflow { requested: usize },

    /// A training step was requested on an empty batch
    #[error("Empty batch: train_step needs at least one transition")]
    EmptyBatch,

    /// The loss became NaN or infinite
    #[error("Numerical divergence at epoch {epoch}, batch {batch}: loss = {loss}")]
    Divergence { epoch: usize, batch: usize, loss: f32 },

    /// Invalid configuration value
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Action index outside the action space
    #[error("Invalid action {action}: must be less than {num_actions}")]
    InvalidAction { action: usize, num_actions: usize },

    /// The environment broke its contract
    #[error("Environment error: {0}")]
    Environment(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for DqnError {
    fn from(err: std::io::Error) -> Self {
        DqnError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for DqnError {
    fn from(err: csv::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_config<S: Into<String>, T: Into<String>>(name: S, reason: T) -> Self {
        DqnError::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
