use log::debug;
use ndarray::Array1;
use rand::Rng;
use std::collections::VecDeque;

use crate::agent::Policy;
use crate::environment::{validate_state, Environment};
use crate::error::{DqnError, Result};

/// One environment step as stored for replay.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub terminal: bool,
}

/// The transitions of one rollout, from reset to a terminal state or a step limit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Episode {
    pub transitions: Vec<Transition>,
}

impl Episode {
    pub fn total_reward(&self) -> f32 {
        self.transitions.iter().map(|t| t.reward).sum()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// True when the rollout ended on a terminal state rather than a step limit.
    pub fn is_complete(&self) -> bool {
        self.transitions.last().map_or(false, |t| t.terminal)
    }
}

/// Summary of one `collect` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectStats {
    /// Transitions inserted.
    pub transitions: usize,
    /// Episodes that reached a terminal state during collection.
    pub completed_episodes: usize,
    /// Mean return over the completed episodes, if any finished.
    pub mean_episode_return: Option<f32>,
}

/// Fixed-capacity FIFO store of transitions.
///
/// Once full, each insertion evicts the oldest stored transition. Sampling is uniform
/// **with replacement**, so a batch may be larger than the buffer and may contain the
/// same transition more than once.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_config("buffer_capacity", "must be positive"));
        }
        Ok(ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    fn add(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Run `env` for exactly `num_steps` steps, choosing actions with
    /// `agent.policy(state, epsilon)` and storing every transition.
    ///
    /// The environment is reset first and again after each terminal state, so one call
    /// may span several episodes. An episode still running when `num_steps` is reached
    /// is left unfinished.
    pub fn collect<P, E, R>(
        &mut self,
        agent: &P,
        env: &mut E,
        num_steps: usize,
        epsilon: f32,
        rng: &mut R,
    ) -> Result<CollectStats>
    where
        P: Policy,
        E: Environment,
        R: Rng,
    {
        let mut stats = CollectStats::default();
        if num_steps == 0 {
            return Ok(stats);
        }

        let state_dim = env.state_dim();
        let mut state = env.reset()?;
        validate_state(state.view(), state_dim)?;

        let mut episode_return = 0.0;
        let mut returns_sum = 0.0;

        for _ in 0..num_steps {
            let action = agent.policy(state.view(), epsilon, rng)?;
            let step = env.step(action)?;
            step.validate(state_dim)?;

            episode_return += step.reward;
            let terminal = step.terminal;
            self.add(Transition {
                state,
                action,
                reward: step.reward,
                next_state: step.next_state.clone(),
                terminal,
            });
            stats.transitions += 1;

            state = if terminal {
                stats.completed_episodes += 1;
                returns_sum += episode_return;
                episode_return = 0.0;
                let initial = env.reset()?;
                validate_state(initial.view(), state_dim)?;
                initial
            } else {
                step.next_state
            };
        }

        if stats.completed_episodes > 0 {
            stats.mean_episode_return = Some(returns_sum / stats.completed_episodes as f32);
        }
        debug!(
            "Collected {} transitions ({} episodes finished), buffer {}/{}",
            stats.transitions,
            stats.completed_episodes,
            self.buffer.len(),
            self.capacity
        );
        Ok(stats)
    }

    /// Draw `batch_size` transitions uniformly at random, with replacement.
    ///
    /// Fails with [`DqnError::BufferUnderflow`] when the buffer is empty. A `batch_size`
    /// larger than `len()` is valid and simply repeats transitions.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if self.buffer.is_empty() {
            return Err(DqnError::BufferUnderflow { requested: batch_size });
        }
        let len = self.buffer.len();
        Ok((0..batch_size)
            .map(|_| &self.buffer[rng.gen_range(0..len)])
            .collect())
    }

    /// Remove every stored transition. Capacity is unchanged and the buffer can be reused.
    pub fn flush(&mut self) {
        self.buffer.clear();
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
