//! CartPole DQN Example
//!
//! Trains a DQN agent to balance a pole on a cart and writes the per-epoch history
//! to `cartpole_history.csv`. An optional first argument names a JSON training config.
//!
//! ```text
//! RUST_LOG=info cargo run --release --example cartpole [config.json]
//! ```

use cartpole_dqn::environment::{Environment, Step};
use cartpole_dqn::error::Result;
use cartpole_dqn::trainer::{EarlyStopping, Trainer, TrainingConfig};
use log::info;
use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Classic cart-pole dynamics, episodes truncated after 200 steps.
struct CartPole {
    x: f32,          // cart position
    x_dot: f32,      // cart velocity
    theta: f32,      // pole angle (radians)
    theta_dot: f32,  // pole angular velocity
    steps: usize,
    rng: StdRng,

    // Constants
    gravity: f32,
    mass_cart: f32,
    mass_pole: f32,
    length: f32,
    force_mag: f32,
    dt: f32,
}

const MAX_STEPS: usize = 200;
const X_LIMIT: f32 = 2.4;
const THETA_LIMIT: f32 = 12.0 * std::f32::consts::PI / 180.0;

impl CartPole {
    fn new(seed: u64) -> Self {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            rng: StdRng::seed_from_u64(seed),
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length: 0.5,
            force_mag: 10.0,
            dt: 0.02,
        }
    }

    fn observe(&self) -> Array1<f32> {
        array![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Environment for CartPole {
    fn state_dim(&self) -> usize {
        4
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps = 0;
        Ok(self.observe())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        let force = if action == 1 { self.force_mag } else { -self.force_mag };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();
        let total_mass = self.mass_cart + self.mass_pole;
        let pole_mass_length = self.mass_pole * self.length;

        let temp = (force + pole_mass_length * self.theta_dot * self.theta_dot * sin_theta) / total_mass;
        let theta_acc = (self.gravity * sin_theta - cos_theta * temp)
            / (self.length * (4.0 / 3.0 - self.mass_pole * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.x += self.dt * self.x_dot;
        self.x_dot += self.dt * x_acc;
        self.theta += self.dt * self.theta_dot;
        self.theta_dot += self.dt * theta_acc;
        self.steps += 1;

        let fallen = self.x.abs() > X_LIMIT || self.theta.abs() > THETA_LIMIT;
        let terminal = fallen || self.steps >= MAX_STEPS;

        Ok(Step::new(self.observe(), 1.0, terminal))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainingConfig::load(path)?,
        None => TrainingConfig::default()
            .seed(42)
            .early_stopping(Some(EarlyStopping { threshold: 195.0, patience: 3 })),
    };

    println!("CartPole DQN Example");
    println!("===================\n");
    println!("Training for up to {} epochs (goal: average 195 steps)", config.num_epochs);

    let mut trainer = Trainer::new(config.clone(), CartPole::new(config.seed))?;
    let report = trainer.run()?;

    for (epoch, avg_return) in report.history.eval_returns() {
        println!("Epoch {:3}: avg return {:.1}", epoch, avg_return);
    }
    match report.history.best_return() {
        Some(best) => println!("\nBest average return: {:.1}", best),
        None => println!("\nNo evaluations were run"),
    }
    if report.stopped_early {
        println!("Solved after {} epochs", report.epochs_run);
    }

    report.history.save_csv("cartpole_history.csv")?;
    info!("Wrote training history to cartpole_history.csv");

    let agent = trainer.into_agent();
    let mut env = CartPole::new(config.seed.wrapping_add(1));
    let state = env.reset()?;
    println!("Q-values at a fresh start: {}", agent.q_values(state.view())?);

    Ok(())
}
