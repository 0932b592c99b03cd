//! # Trainer
//!
//! The epoch loop that turns an untrained [`DqnAgent`] into a trained one:
//!
//! 1. pick epsilon from the [`EpsilonSchedule`]
//! 2. fill the replay buffer with `steps_per_epoch` transitions
//! 3. run `batches_per_epoch` gradient steps on sampled batches
//! 4. every `sync_interval` epochs copy the online network into the target network
//! 5. every `eval_interval` epochs run greedy evaluation episodes
//! 6. apply the [`FlushPolicy`] to the buffer
//!
//! Training ends after `num_epochs`, or earlier when [`EarlyStopping`] is configured and
//! enough consecutive evaluations reach its threshold. A non-finite loss aborts the run
//! with [`DqnError::Divergence`].

mod config;
mod schedule;

pub use config::{EarlyStopping, FlushPolicy, NetworkConfig, TrainingConfig};
pub use schedule::{DecayKind, EpsilonSchedule};

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{DqnAgent, DqnAgentBuilder, Policy};
use crate::environment::Environment;
use crate::error::{DqnError, Result};
use crate::metrics::{EpochRecord, TrainingHistory};
use crate::replay_buffer::ReplayBuffer;

/// Outcome of [`Trainer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub history: TrainingHistory,
    pub epochs_run: usize,
    pub stopped_early: bool,
}

/// Drives collection, learning, target syncs and evaluation for one agent.
pub struct Trainer<E: Environment> {
    config: TrainingConfig,
    schedule: EpsilonSchedule,
    agent: DqnAgent,
    buffer: ReplayBuffer,
    env: E,
    rng: StdRng,
    history: TrainingHistory,
    success_streak: usize,
}

impl<E: Environment> Trainer<E> {
    /// Validate `config` and build a fresh agent sized to `env`.
    pub fn new(config: TrainingConfig, env: E) -> Result<Self> {
        config.validate()?;
        let mut init_rng = StdRng::seed_from_u64(config.seed);
        let agent = DqnAgentBuilder::new(env.state_dim(), env.num_actions())
            .hidden_layers(&config.network.hidden_layers)
            .hidden_activation(config.network.hidden_activation)
            .weight_init(config.network.weight_init.clone())
            .optimizer(config.network.optimizer.clone())
            .gamma(config.gamma)
            .learning_rate(config.learning_rate)
            .build(&mut init_rng)?;
        let run_seed = init_rng.gen();
        Self::assemble(config, agent, env, run_seed)
    }

    /// Validate `config` and train an existing agent. The agent keeps its own gamma and
    /// learning rate.
    pub fn with_agent(config: TrainingConfig, agent: DqnAgent, env: E) -> Result<Self> {
        config.validate()?;
        if agent.state_dim() != env.state_dim() || agent.num_actions() != env.num_actions() {
            return Err(DqnError::dimension_mismatch(
                format!("agent for {} states / {} actions", env.state_dim(), env.num_actions()),
                format!("agent for {} states / {} actions", agent.state_dim(), agent.num_actions()),
            ));
        }
        let run_seed = config.seed;
        Self::assemble(config, agent, env, run_seed)
    }

    fn assemble(config: TrainingConfig, agent: DqnAgent, env: E, run_seed: u64) -> Result<Self> {
        let buffer = ReplayBuffer::new(config.buffer_capacity)?;
        Ok(Trainer {
            schedule: config.epsilon_schedule(),
            config,
            agent,
            buffer,
            env,
            rng: StdRng::seed_from_u64(run_seed),
            history: TrainingHistory::new(),
            success_streak: 0,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn into_agent(self) -> DqnAgent {
        self.agent
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Run every configured epoch, or until early stopping triggers.
    pub fn run(&mut self) -> Result<TrainingReport> {
        let mut epochs_run = 0;
        let mut stopped_early = false;

        for epoch in 1..=self.config.num_epochs {
            let record = self.run_epoch(epoch)?;
            epochs_run = epoch;
            let stop = self.should_stop(&record);
            self.history.push(record);
            if stop {
                info!("Early stopping after epoch {}", epoch);
                stopped_early = true;
                break;
            }
        }

        Ok(TrainingReport {
            history: self.history.clone(),
            epochs_run,
            stopped_early,
        })
    }

    /// One full epoch. `epoch` is 1-based and drives the epsilon schedule and the
    /// sync/evaluation intervals.
    pub fn run_epoch(&mut self, epoch: usize) -> Result<EpochRecord> {
        let epsilon = self.schedule.value(epoch);

        let stats = self.buffer.collect(
            &self.agent,
            &mut self.env,
            self.config.steps_per_epoch,
            epsilon,
            &mut self.rng,
        )?;

        let mut loss_sum = 0.0;
        for batch_index in 1..=self.config.batches_per_epoch {
            let batch = self.buffer.sample(self.config.batch_size, &mut self.rng)?;
            let loss = self.agent.train_step(&batch)?;
            if !loss.is_finite() {
                error!("Loss diverged at epoch {}, batch {}: {}", epoch, batch_index, loss);
                return Err(DqnError::Divergence { epoch, batch: batch_index, loss });
            }
            loss_sum += loss;
        }
        let mean_loss = loss_sum / self.config.batches_per_epoch as f32;

        if epoch % self.config.sync_interval == 0 {
            self.agent.sync_target();
            debug!("Synced target network at epoch {}", epoch);
        }

        let avg_return = if epoch % self.config.eval_interval == 0 {
            let result = self.agent.evaluate_capped(
                &mut self.env,
                self.config.eval_episodes,
                self.config.max_episode_steps,
            )?;
            if result.is_none() {
                warn!("Evaluation at epoch {} requested with zero episodes", epoch);
            }
            result
        } else {
            None
        };

        if self.config.flush_policy == FlushPolicy::Full {
            self.buffer.flush();
            debug!("Flushed replay buffer at epoch {}", epoch);
        }

        match avg_return {
            Some(ret) => info!(
                "Epoch {}/{}: epsilon {:.3}, loss {:.5}, avg return {:.2}",
                epoch, self.config.num_epochs, epsilon, mean_loss, ret
            ),
            None => info!(
                "Epoch {}/{}: epsilon {:.3}, loss {:.5}",
                epoch, self.config.num_epochs, epsilon, mean_loss
            ),
        }

        Ok(EpochRecord {
            epoch,
            epsilon,
            mean_loss,
            avg_return,
            transitions: stats.transitions,
            completed_episodes: stats.completed_episodes,
        })
    }

    fn should_stop(&mut self, record: &EpochRecord) -> bool {
        let (stopping, ret) = match (self.config.early_stopping, record.avg_return) {
            (Some(stopping), Some(ret)) => (stopping, ret),
            _ => return false,
        };
        if ret >= stopping.threshold {
            self.success_streak += 1;
        } else {
            self.success_streak = 0;
        }
        self.success_streak >= stopping.patience
    }
}
