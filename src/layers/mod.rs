pub mod dense;
pub mod initialization;

pub use dense::DenseLayer;
pub use initialization::WeightInit;
