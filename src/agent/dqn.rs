use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

use crate::activations::Activation;
use crate::environment::{validate_state, Environment};
use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerKind, OptimizerWrapper};
use crate::replay_buffer::{Episode, Transition};
use super::traits::Policy;

/// Deep Q-Network agent with an online network and a periodically synced target network.
///
/// The agent exclusively owns both networks and the optimizer state. Network parameters
/// change only through [`DqnAgent::train_step`] (online) and [`DqnAgent::sync_target`]
/// (target). Exploration is not agent state: every call to [`Policy::policy`] receives the
/// current epsilon.
///
/// # Example
///
/// ```rust
/// use cartpole_dqn::agent::{DqnAgentBuilder, Policy};
/// use ndarray::array;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let agent = DqnAgentBuilder::new(4, 2)
///     .hidden_layers(&[16, 16])
///     .gamma(0.9)
///     .learning_rate(1e-3)
///     .build(&mut rng)
///     .unwrap();
///
/// let state = array![0.01, -0.02, 0.03, 0.0];
/// let greedy = agent.policy(state.view(), 0.0, &mut rng).unwrap();
/// assert!(greedy < 2);
/// ```
#[derive(Debug, Clone)]
pub struct DqnAgent {
    online: NeuralNetwork,
    target: NeuralNetwork,
    optimizer: OptimizerWrapper,
    gamma: f32,
    learning_rate: f32,
    train_steps: usize,
}

/// A batch stacked into matrices for the networks.
struct StackedBatch {
    states: Array2<f32>,
    next_states: Array2<f32>,
}

impl DqnAgent {
    /// Take ownership of a pre-built network pair.
    ///
    /// Both networks must have the same shape. They are used as given: call
    /// [`DqnAgent::sync_target`] if the target should start as a copy of the online network.
    pub fn from_networks(
        online: NeuralNetwork,
        target: NeuralNetwork,
        optimizer: OptimizerWrapper,
        gamma: f32,
        learning_rate: f32,
    ) -> Result<Self> {
        let online_shape: Vec<_> = online.layers.iter().map(|l| l.weights.dim()).collect();
        let target_shape: Vec<_> = target.layers.iter().map(|l| l.weights.dim()).collect();
        if online_shape != target_shape {
            return Err(DqnError::dimension_mismatch(
                format!("target layers {:?}", online_shape),
                format!("target layers {:?}", target_shape),
            ));
        }
        validate_gamma(gamma)?;
        validate_learning_rate(learning_rate)?;

        Ok(DqnAgent {
            online,
            target,
            optimizer,
            gamma,
            learning_rate,
            train_steps: 0,
        })
    }

    pub fn state_dim(&self) -> usize {
        self.online.input_size()
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Number of gradient updates applied to the online network.
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    /// Online-network action values for `state`.
    pub fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.online.forward(state)
    }

    /// Target-network action values for `state`.
    pub fn target_q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.target.forward(state)
    }

    /// Whether the target network currently holds exactly the online parameters.
    pub fn target_in_sync(&self) -> bool {
        self.online.same_parameters(&self.target)
    }

    /// `argmax_a online(state)[a]`, ties going to the lowest action index.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.online.forward(state)?;
        Ok(argmax(q_values.view()))
    }

    /// TD targets `y = r + gamma * max_a target(s')[a]` for every transition; terminal
    /// transitions get exactly `r`.
    pub fn td_targets(&self, batch: &[&Transition]) -> Result<Array1<f32>> {
        if batch.is_empty() {
            return Err(DqnError::EmptyBatch);
        }
        let stacked = self.stack(batch)?;
        self.targets_for(batch, &stacked)
    }

    fn targets_for(&self, batch: &[&Transition], stacked: &StackedBatch) -> Result<Array1<f32>> {
        let next_q_values = self.target.forward_batch(stacked.next_states.view())?;
        Ok(batch
            .iter()
            .zip(next_q_values.rows())
            .map(|(transition, next_q)| {
                if transition.terminal {
                    transition.reward
                } else {
                    let max_next_q = next_q.iter().fold(f32::NEG_INFINITY, |max, &val| max.max(val));
                    transition.reward + self.gamma * max_next_q
                }
            })
            .collect())
    }

    fn stack(&self, batch: &[&Transition]) -> Result<StackedBatch> {
        let state_dim = self.state_dim();
        let num_actions = self.num_actions();
        let mut states = Array2::zeros((batch.len(), state_dim));
        let mut next_states = Array2::zeros((batch.len(), state_dim));

        for (i, transition) in batch.iter().enumerate() {
            validate_state(transition.state.view(), state_dim)?;
            validate_state(transition.next_state.view(), state_dim)?;
            if transition.action >= num_actions {
                return Err(DqnError::InvalidAction { action: transition.action, num_actions });
            }
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
        }

        Ok(StackedBatch { states, next_states })
    }

    /// One gradient step of the online network on the mean squared TD error of `batch`.
    ///
    /// Targets are computed from the target network and held constant, so gradients only
    /// reach the online network. Returns the loss measured before the update; a
    /// non-finite loss is returned as-is and leaves the parameters untouched.
    pub fn train_step(&mut self, batch: &[&Transition]) -> Result<f32> {
        if batch.is_empty() {
            return Err(DqnError::EmptyBatch);
        }

        let stacked = self.stack(batch)?;
        let y = self.targets_for(batch, &stacked)?;

        // Only the taken action's column differs from the prediction, so only it
        // contributes to the loss and the gradient.
        let mut targets = self.online.forward_batch(stacked.states.view())?;
        for (i, transition) in batch.iter().enumerate() {
            targets[[i, transition.action]] = y[i];
        }

        let loss = self.online.train_minibatch(
            stacked.states.view(),
            targets.view(),
            &mut self.optimizer,
            self.learning_rate,
        )?;
        if loss.is_finite() {
            self.train_steps += 1;
        }
        Ok(loss)
    }

    /// Overwrite the target network with a deep copy of the online parameters.
    pub fn sync_target(&mut self) {
        self.target.copy_from(&self.online);
    }

    /// Greedy rollout from a fresh reset, stopping at a terminal state or after
    /// `max_steps` steps when given.
    pub fn run_episode<E: Environment>(&self, env: &mut E, max_steps: Option<usize>) -> Result<Episode> {
        let state_dim = env.state_dim();
        let mut state = env.reset()?;
        validate_state(state.view(), state_dim)?;

        let mut episode = Episode::default();
        while max_steps.map_or(true, |limit| episode.len() < limit) {
            let action = self.greedy_action(state.view())?;
            let step = env.step(action)?;
            step.validate(state_dim)?;
            let terminal = step.terminal;
            episode.transitions.push(Transition {
                state,
                action,
                reward: step.reward,
                next_state: step.next_state.clone(),
                terminal,
            });
            if terminal {
                break;
            }
            state = step.next_state;
        }
        Ok(episode)
    }

    /// Mean return over `episodes` greedy rollouts that run until a terminal state.
    ///
    /// Returns `None` when `episodes` is zero.
    pub fn evaluate<E: Environment>(&self, env: &mut E, episodes: usize) -> Result<Option<f32>> {
        self.evaluate_capped(env, episodes, None)
    }

    /// Like [`DqnAgent::evaluate`], truncating each rollout at `max_steps`.
    pub fn evaluate_capped<E: Environment>(
        &self,
        env: &mut E,
        episodes: usize,
        max_steps: Option<usize>,
    ) -> Result<Option<f32>> {
        if episodes == 0 {
            return Ok(None);
        }
        let mut total_reward = 0.0;
        for _ in 0..episodes {
            total_reward += self.run_episode(env, max_steps)?.total_reward();
        }
        Ok(Some(total_reward / episodes as f32))
    }
}

impl Policy for DqnAgent {
    fn num_actions(&self) -> usize {
        self.online.output_size()
    }

    fn policy<R: Rng>(&self, state: ArrayView1<f32>, epsilon: f32, rng: &mut R) -> Result<usize> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(DqnError::invalid_config("epsilon", format!("{} is outside [0, 1]", epsilon)));
        }
        if epsilon > 0.0 && rng.gen::<f32>() < epsilon {
            validate_state(state, self.state_dim())?;
            Ok(rng.gen_range(0..self.num_actions()))
        } else {
            self.greedy_action(state)
        }
    }
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn validate_gamma(gamma: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&gamma) {
        return Err(DqnError::invalid_config("gamma", format!("{} is outside [0, 1]", gamma)));
    }
    Ok(())
}

fn validate_learning_rate(learning_rate: f32) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(DqnError::invalid_config(
            "learning_rate",
            format!("{} must be positive and finite", learning_rate),
        ));
    }
    Ok(())
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    state_dim: usize,
    num_actions: usize,
    hidden_layers: Vec<usize>,
    hidden_activation: Activation,
    weight_init: WeightInit,
    optimizer: OptimizerKind,
    gamma: f32,
    learning_rate: f32,
}

impl DqnAgentBuilder {
    /// Defaults: two hidden layers of 64 ReLU units, He-uniform init, Adam, gamma 0.9, lr 1e-4.
    pub fn new(state_dim: usize, num_actions: usize) -> Self {
        DqnAgentBuilder {
            state_dim,
            num_actions,
            hidden_layers: vec![64, 64],
            hidden_activation: Activation::Relu,
            weight_init: WeightInit::HeUniform,
            optimizer: OptimizerKind::default(),
            gamma: 0.9,
            learning_rate: 1e-4,
        }
    }

    pub fn hidden_layers(mut self, sizes: &[usize]) -> Self {
        self.hidden_layers = sizes.to_vec();
        self
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.hidden_activation = activation;
        self
    }

    pub fn weight_init(mut self, init: WeightInit) -> Self {
        self.weight_init = init;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Build the agent. The online network is initialised from `rng` and the target
    /// network starts as an exact copy of it.
    pub fn build<R: Rng>(self, rng: &mut R) -> Result<DqnAgent> {
        if self.state_dim == 0 {
            return Err(DqnError::invalid_config("state_dim", "must be positive"));
        }
        if self.num_actions == 0 {
            return Err(DqnError::invalid_config("num_actions", "must be positive"));
        }

        let mut layer_sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        layer_sizes.push(self.state_dim);
        layer_sizes.extend_from_slice(&self.hidden_layers);
        layer_sizes.push(self.num_actions);

        let mut activations = vec![self.hidden_activation; self.hidden_layers.len()];
        activations.push(Activation::Linear);

        let online = NeuralNetwork::new(&layer_sizes, &activations, &self.weight_init, rng)?;
        let target = online.clone();

        DqnAgent::from_networks(online, target, self.optimizer.build(), self.gamma, self.learning_rate)
    }
}
