use ndarray::{array, Array1, ArrayView1};
use rand::Rng;

use crate::agent::Policy;
use crate::environment::{Environment, Step};
use crate::error::Result;

/// State is `[global step counter]`, so stored transitions carry their insertion order.
/// Episodes end every `episode_len` steps with reward 1 per step.
pub struct CountingEnv {
    pub episode_len: usize,
    pub counter: usize,
    pub in_episode: usize,
    pub resets: usize,
}

impl CountingEnv {
    pub fn new(episode_len: usize) -> Self {
        CountingEnv { episode_len, counter: 0, in_episode: 0, resets: 0 }
    }
}

impl Environment for CountingEnv {
    fn state_dim(&self) -> usize {
        1
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.resets += 1;
        self.in_episode = 0;
        Ok(array![self.counter as f32])
    }

    fn step(&mut self, _action: usize) -> Result<Step> {
        self.counter += 1;
        self.in_episode += 1;
        Ok(Step::new(array![self.counter as f32], 1.0, self.in_episode >= self.episode_len))
    }
}

/// Reward `reward` per step, `episode_len` steps per episode, fixed 2-d state.
pub struct ConstantRewardEnv {
    pub reward: f32,
    pub episode_len: usize,
    pub t: usize,
}

impl Environment for ConstantRewardEnv {
    fn state_dim(&self) -> usize {
        2
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.t = 0;
        Ok(array![0.5, -0.5])
    }

    fn step(&mut self, _action: usize) -> Result<Step> {
        self.t += 1;
        Ok(Step::new(array![0.5, -0.5], self.reward, self.t >= self.episode_len))
    }
}

/// Always picks the same action.
pub struct FixedPolicy {
    pub action: usize,
    pub num_actions: usize,
}

impl Policy for FixedPolicy {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn policy<R: Rng>(&self, _state: ArrayView1<f32>, _epsilon: f32, _rng: &mut R) -> Result<usize> {
        Ok(self.action)
    }
}
