#[cfg(test)]
mod property_tests {
    use cartpole_dqn::agent::{DqnAgentBuilder, Policy};
    use cartpole_dqn::environment::{Environment, Step};
    use cartpole_dqn::error::Result;
    use cartpole_dqn::replay_buffer::ReplayBuffer;
    use cartpole_dqn::trainer::{DecayKind, EpsilonSchedule};
    use ndarray::{array, Array1};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Emits the global step counter as its state, so buffer contents are insertion tags.
    struct Tagger {
        counter: usize,
        t: usize,
        episode_len: usize,
    }

    impl Environment for Tagger {
        fn state_dim(&self) -> usize {
            1
        }

        fn num_actions(&self) -> usize {
            3
        }

        fn reset(&mut self) -> Result<Array1<f32>> {
            self.t = 0;
            Ok(array![self.counter as f32])
        }

        fn step(&mut self, _action: usize) -> Result<Step> {
            self.counter += 1;
            self.t += 1;
            Ok(Step::new(array![self.counter as f32], 0.0, self.t >= self.episode_len))
        }
    }

    fn small_agent(seed: u64) -> cartpole_dqn::agent::DqnAgent {
        let mut rng = StdRng::seed_from_u64(seed);
        DqnAgentBuilder::new(1, 3).hidden_layers(&[4]).build(&mut rng).unwrap()
    }

    proptest! {
        #[test]
        fn test_buffer_keeps_most_recent_transitions(
            capacity in 1usize..64,
            steps in 0usize..200,
            episode_len in 1usize..20,
            seed in any::<u64>(),
        ) {
            let agent = small_agent(seed);
            let mut env = Tagger { counter: 0, t: 0, episode_len };
            let mut buffer = ReplayBuffer::new(capacity).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);

            let stats = buffer.collect(&agent, &mut env, steps, 0.5, &mut rng).unwrap();

            prop_assert_eq!(stats.transitions, steps);
            prop_assert_eq!(buffer.len(), steps.min(capacity));
            prop_assert!(buffer.len() <= buffer.capacity());

            let tags: Vec<usize> = buffer.iter().map(|t| t.next_state[0] as usize).collect();
            let expected: Vec<usize> = (steps - buffer.len() + 1..=steps).collect();
            prop_assert_eq!(tags, expected);
        }

        #[test]
        fn test_sample_returns_requested_size(
            filled in 1usize..50,
            batch_size in 1usize..300,
            seed in any::<u64>(),
        ) {
            let agent = small_agent(seed);
            let mut env = Tagger { counter: 0, t: 0, episode_len: 7 };
            let mut buffer = ReplayBuffer::new(64).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            buffer.collect(&agent, &mut env, filled, 1.0, &mut rng).unwrap();

            let sample = buffer.sample(batch_size, &mut rng).unwrap();
            prop_assert_eq!(sample.len(), batch_size);
            prop_assert!(sample.iter().all(|t| t.action < 3));
        }

        #[test]
        fn test_policy_always_in_action_space(
            state in -100.0f32..100.0,
            epsilon in 0.0f32..=1.0,
            seed in any::<u64>(),
        ) {
            let agent = small_agent(seed);
            let mut rng = StdRng::seed_from_u64(seed);
            let action = agent.policy(array![state].view(), epsilon, &mut rng).unwrap();
            prop_assert!(action < agent.num_actions());
        }

        #[test]
        fn test_schedule_stays_within_bounds(
            start in 0.0f32..=1.0,
            end_fraction in 0.0f32..=1.0,
            decay in 0.0f32..=1.0,
            epoch in 1usize..1000,
        ) {
            let end = start * end_fraction;
            for kind in [DecayKind::Exponential, DecayKind::Linear] {
                let schedule = EpsilonSchedule::new(start, end, decay, kind);
                let value = schedule.value(epoch);
                prop_assert!(value >= end && value <= start);
            }
        }
    }
}
