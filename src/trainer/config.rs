//! Configuration of [`Trainer`](super::Trainer).
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::optimizer::OptimizerKind;
use super::schedule::{DecayKind, EpsilonSchedule};

/// What happens to the replay buffer at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlushPolicy {
    /// Empty the buffer; every epoch trains on freshly collected experience only.
    #[default]
    Full,
    /// Keep the contents; ring-buffer eviction alone bounds the buffer.
    Retain,
}

/// Stop once `patience` consecutive evaluations reach `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStopping {
    pub threshold: f32,
    pub patience: usize,
}

/// Architecture and optimizer of the Q-networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub hidden_layers: Vec<usize>,
    pub hidden_activation: Activation,
    pub weight_init: WeightInit,
    pub optimizer: OptimizerKind,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![64, 64],
            hidden_activation: Activation::Relu,
            weight_init: WeightInit::HeUniform,
            optimizer: OptimizerKind::default(),
        }
    }
}

/// Configuration of [`Trainer`](super::Trainer). Immutable once the trainer is built.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct TrainingConfig {
    /// Discount factor in the TD target.
    pub gamma: f32,

    /// Step size for online-network updates.
    pub learning_rate: f32,

    /// Maximum number of transitions retained.
    pub buffer_capacity: usize,

    /// Transitions per gradient step.
    pub batch_size: usize,

    /// Transitions collected at the start of every epoch.
    pub steps_per_epoch: usize,

    /// Gradient steps per epoch.
    pub batches_per_epoch: usize,

    /// Epochs between target-network syncs.
    pub sync_interval: usize,

    /// Epochs between evaluation passes.
    pub eval_interval: usize,

    /// Greedy episodes per evaluation pass.
    pub eval_episodes: usize,

    /// Step cap for evaluation rollouts; `None` runs each to its terminal state.
    pub max_episode_steps: Option<usize>,

    pub epsilon_start: f32,
    pub epsilon_end: f32,
    pub epsilon_decay: f32,
    pub epsilon_decay_kind: DecayKind,

    /// Total training epochs.
    pub num_epochs: usize,

    pub flush_policy: FlushPolicy,

    pub early_stopping: Option<EarlyStopping>,

    pub network: NetworkConfig,

    /// Root seed for network initialisation, exploration and batch sampling.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            learning_rate: 1e-4,
            buffer_capacity: 1280,
            batch_size: 128,
            steps_per_epoch: 1280,
            batches_per_epoch: 10,
            sync_interval: 1,
            eval_interval: 1,
            eval_episodes: 100,
            max_episode_steps: Some(200),
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.9,
            epsilon_decay_kind: DecayKind::Exponential,
            num_epochs: 20,
            flush_policy: FlushPolicy::Full,
            early_stopping: None,
            network: NetworkConfig::default(),
            seed: 0,
        }
    }
}

fn require_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(DqnError::invalid_config(name, "must be positive"));
    }
    Ok(())
}

fn require_unit_interval(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DqnError::invalid_config(name, format!("{} is outside [0, 1]", value)));
    }
    Ok(())
}

impl TrainingConfig {
    /// Sets the number of epochs.
    pub fn num_epochs(mut self, v: usize) -> Self {
        self.num_epochs = v;
        self
    }

    /// Sets the replay buffer capacity.
    pub fn buffer_capacity(mut self, v: usize) -> Self {
        self.buffer_capacity = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the transitions collected per epoch.
    pub fn steps_per_epoch(mut self, v: usize) -> Self {
        self.steps_per_epoch = v;
        self
    }

    /// Sets the gradient steps per epoch.
    pub fn batches_per_epoch(mut self, v: usize) -> Self {
        self.batches_per_epoch = v;
        self
    }

    /// Sets the interval of target syncs in epochs.
    pub fn sync_interval(mut self, v: usize) -> Self {
        self.sync_interval = v;
        self
    }

    /// Sets the interval of evaluation in epochs and the episodes per evaluation.
    pub fn evaluation(mut self, interval: usize, episodes: usize) -> Self {
        self.eval_interval = interval;
        self.eval_episodes = episodes;
        self
    }

    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets all exploration schedule parameters.
    pub fn epsilon(mut self, start: f32, end: f32, decay: f32, kind: DecayKind) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self.epsilon_decay = decay;
        self.epsilon_decay_kind = kind;
        self
    }

    pub fn flush_policy(mut self, v: FlushPolicy) -> Self {
        self.flush_policy = v;
        self
    }

    pub fn early_stopping(mut self, v: Option<EarlyStopping>) -> Self {
        self.early_stopping = v;
        self
    }

    pub fn network(mut self, v: NetworkConfig) -> Self {
        self.network = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// The exploration schedule described by the `epsilon_*` fields.
    pub fn epsilon_schedule(&self) -> EpsilonSchedule {
        EpsilonSchedule::new(
            self.epsilon_start,
            self.epsilon_end,
            self.epsilon_decay,
            self.epsilon_decay_kind,
        )
    }

    /// Reject configurations that cannot run to completion.
    pub fn validate(&self) -> Result<()> {
        require_positive("buffer_capacity", self.buffer_capacity)?;
        require_positive("batch_size", self.batch_size)?;
        require_positive("num_epochs", self.num_epochs)?;
        require_positive("steps_per_epoch", self.steps_per_epoch)?;
        require_positive("batches_per_epoch", self.batches_per_epoch)?;
        require_positive("sync_interval", self.sync_interval)?;
        require_positive("eval_interval", self.eval_interval)?;

        require_unit_interval("gamma", self.gamma)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(DqnError::invalid_config(
                "learning_rate",
                format!("{} must be positive and finite", self.learning_rate),
            ));
        }

        require_unit_interval("epsilon_start", self.epsilon_start)?;
        require_unit_interval("epsilon_end", self.epsilon_end)?;
        if self.epsilon_start < self.epsilon_end {
            return Err(DqnError::invalid_config(
                "epsilon_start",
                format!("{} is below epsilon_end {}", self.epsilon_start, self.epsilon_end),
            ));
        }
        match self.epsilon_decay_kind {
            DecayKind::Exponential => require_unit_interval("epsilon_decay", self.epsilon_decay)?,
            DecayKind::Linear => {
                if !(self.epsilon_decay.is_finite() && self.epsilon_decay >= 0.0) {
                    return Err(DqnError::invalid_config(
                        "epsilon_decay",
                        format!("{} must be a non-negative step", self.epsilon_decay),
                    ));
                }
            }
        }

        if let Some(limit) = self.max_episode_steps {
            require_positive("max_episode_steps", limit)?;
        }
        if let Some(stopping) = &self.early_stopping {
            require_positive("early_stopping.patience", stopping.patience)?;
        }
        if self.network.hidden_layers.iter().any(|&units| units == 0) {
            return Err(DqnError::invalid_config("network.hidden_layers", "layers must have units"));
        }
        Ok(())
    }

    /// Constructs [`TrainingConfig`] from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_json::from_reader(rdr)?;
        Ok(config)
    }

    /// Saves [`TrainingConfig`] as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
