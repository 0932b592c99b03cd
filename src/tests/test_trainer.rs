use crate::error::DqnError;
use crate::optimizer::OptimizerKind;
use crate::trainer::{
    DecayKind, EarlyStopping, EpsilonSchedule, FlushPolicy, NetworkConfig, Trainer, TrainingConfig,
};
use super::common::{ConstantRewardEnv, CountingEnv};

fn small_config() -> TrainingConfig {
    TrainingConfig::default()
        .num_epochs(4)
        .buffer_capacity(32)
        .steps_per_epoch(32)
        .batch_size(8)
        .batches_per_epoch(3)
        .evaluation(2, 2)
        .max_episode_steps(Some(20))
        .learning_rate(0.001)
        .network(NetworkConfig {
            hidden_layers: vec![8],
            optimizer: OptimizerKind::Sgd,
            ..NetworkConfig::default()
        })
        .seed(3)
}

fn env() -> ConstantRewardEnv {
    ConstantRewardEnv { reward: 1.0, episode_len: 10, t: 0 }
}

#[test]
fn test_exponential_schedule() {
    let schedule = EpsilonSchedule::new(1.0, 0.05, 0.9, DecayKind::Exponential);
    assert_eq!(schedule.value(1), 1.0);
    assert!((schedule.value(2) - 0.9).abs() < 1e-6);
    assert!((schedule.value(3) - 0.81).abs() < 1e-6);
    assert_eq!(schedule.value(500), 0.05);
}

#[test]
fn test_linear_schedule() {
    let schedule = EpsilonSchedule::new(1.0, 0.1, 0.25, DecayKind::Linear);
    assert_eq!(schedule.value(1), 1.0);
    assert_eq!(schedule.value(2), 0.75);
    assert_eq!(schedule.value(4), 0.25);
    assert_eq!(schedule.value(5), 0.1);
}

#[test]
fn test_schedule_is_non_increasing() {
    for kind in [DecayKind::Exponential, DecayKind::Linear] {
        let schedule = EpsilonSchedule::new(0.8, 0.02, 0.5, kind);
        let values: Vec<f32> = (1..50).map(|e| schedule.value(e)).collect();
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert!(values.iter().all(|&v| v >= 0.02));
    }
}

#[test]
fn test_zero_decay_forces_greedy_after_first_epoch() {
    let schedule = EpsilonSchedule::new(1.0, 0.0, 0.0, DecayKind::Exponential);
    assert_eq!(schedule.value(1), 1.0);
    assert_eq!(schedule.value(2), 0.0);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let cases = vec![
        small_config().buffer_capacity(0),
        small_config().batch_size(0),
        small_config().num_epochs(0),
        small_config().epsilon(0.1, 0.5, 0.9, DecayKind::Exponential),
        small_config().gamma(1.2),
        small_config().learning_rate(-1.0),
        small_config().sync_interval(0),
    ];
    for config in cases {
        let result = Trainer::new(config, env());
        assert!(matches!(result, Err(DqnError::InvalidConfig { .. })));
    }
}

#[test]
fn test_run_completes_all_epochs() {
    let mut trainer = Trainer::new(small_config(), env()).unwrap();
    let report = trainer.run().unwrap();

    assert_eq!(report.epochs_run, 4);
    assert!(!report.stopped_early);
    assert_eq!(report.history.len(), 4);
    assert_eq!(trainer.agent().train_steps(), 4 * 3);

    // evaluation every second epoch
    let evaluated: Vec<usize> = report.history.eval_returns().iter().map(|&(e, _)| e).collect();
    assert_eq!(evaluated, vec![2, 4]);
    // constant reward 1, episodes of 10 steps
    assert_eq!(report.history.eval_returns()[0].1, 10.0);

    // full flush leaves the buffer empty between epochs
    assert!(trainer.buffer().is_empty());
    assert!(trainer.agent().target_in_sync());
}

#[test]
fn test_retain_policy_keeps_buffer() {
    let config = small_config().flush_policy(FlushPolicy::Retain);
    let mut trainer = Trainer::new(config, env()).unwrap();
    trainer.run().unwrap();
    assert_eq!(trainer.buffer().len(), 32);
}

#[test]
fn test_sync_interval_controls_target_updates() {
    let config = small_config().sync_interval(2);
    let mut trainer = Trainer::new(config, env()).unwrap();

    trainer.run_epoch(1).unwrap();
    assert!(!trainer.agent().target_in_sync());
    trainer.run_epoch(2).unwrap();
    assert!(trainer.agent().target_in_sync());
}

#[test]
fn test_same_seed_same_run() {
    let first = Trainer::new(small_config(), env()).unwrap().run().unwrap();
    let second = Trainer::new(small_config(), env()).unwrap().run().unwrap();
    assert_eq!(first.history, second.history);
}

#[test]
fn test_early_stopping() {
    let config = small_config()
        .num_epochs(10)
        .evaluation(1, 1)
        .early_stopping(Some(EarlyStopping { threshold: 10.0, patience: 2 }));
    let mut trainer = Trainer::new(config, env()).unwrap();
    let report = trainer.run().unwrap();

    // every evaluation returns exactly 10
    assert!(report.stopped_early);
    assert_eq!(report.epochs_run, 2);
}

#[test]
fn test_divergence_aborts_with_location() {
    let huge = ConstantRewardEnv { reward: f32::MAX, episode_len: 10, t: 0 };
    let mut trainer = Trainer::new(small_config(), huge).unwrap();
    let err = trainer.run().unwrap_err();
    assert!(matches!(err, DqnError::Divergence { epoch: 1, batch: 1, .. }));
    assert!(trainer.history().is_empty());
}

#[test]
fn test_environment_dimension_mismatch_is_fatal() {
    // agent sized for a 2-d state, environment produces 1-d states
    let agent = Trainer::new(small_config(), env()).unwrap().into_agent();
    let result = Trainer::with_agent(small_config(), agent.clone(), CountingEnv::new(5));
    assert!(matches!(result, Err(DqnError::DimensionMismatch { .. })));

    let mut resumed = Trainer::with_agent(small_config(), agent, env()).unwrap();
    resumed.run_epoch(1).unwrap();
    assert_eq!(resumed.agent().train_steps(), 3);
}

#[test]
fn test_zero_eval_episodes_records_nothing() {
    let config = small_config().evaluation(1, 0);
    let mut trainer = Trainer::new(config, env()).unwrap();
    let report = trainer.run().unwrap();
    assert!(report.history.eval_returns().is_empty());
}

#[test]
fn test_config_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("training.json");
    let config = small_config().early_stopping(Some(EarlyStopping { threshold: 195.0, patience: 3 }));

    config.save(&path).unwrap();
    let loaded = TrainingConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_missing_fields_take_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{ "num_epochs": 3, "gamma": 0.5 }"#).unwrap();

    let loaded = TrainingConfig::load(&path).unwrap();
    assert_eq!(loaded.num_epochs, 3);
    assert_eq!(loaded.gamma, 0.5);
    assert_eq!(loaded.buffer_capacity, TrainingConfig::default().buffer_capacity);
}
