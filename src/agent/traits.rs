use ndarray::ArrayView1;
use rand::Rng;

use crate::error::Result;

/// Anything that can pick actions for experience collection.
pub trait Policy {
    /// Size of the discrete action space.
    fn num_actions(&self) -> usize;

    /// Epsilon-greedy action selection: with probability `epsilon` a uniformly random
    /// action, otherwise the policy's preferred action. Must not mutate the policy.
    fn policy<R: Rng>(&self, state: ArrayView1<f32>, epsilon: f32, rng: &mut R) -> Result<usize>;
}
