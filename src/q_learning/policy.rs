//! Action selection policies and the epsilon schedule

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::q_learning::q_table::QTable;

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Chooses an action for a state given the current Q-table and epsilon.
///
/// Implementations hold no learned state; epsilon is owned and decayed by
/// the training loop.
pub trait ActionPolicy: Send {
    fn select(&mut self, state: usize, q_table: &QTable, epsilon: f64) -> usize;

    /// Name used in logs and run summaries.
    fn name(&self) -> &str;

    /// Reseed the internal random number generator, if any.
    fn set_rng_seed(&mut self, _seed: u64) {}
}

/// ε-greedy action selection
///
/// With probability ε a uniformly random action is returned, otherwise the
/// greedy action of the Q-table row (first index on ties).
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    rng: StdRng,
}

impl EpsilonGreedy {
    pub fn new() -> Self {
        Self {
            rng: build_rng(None),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: build_rng(Some(seed)),
        }
    }
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPolicy for EpsilonGreedy {
    fn select(&mut self, state: usize, q_table: &QTable, epsilon: f64) -> usize {
        if self.rng.random::<f64>() < epsilon {
            // Explore
            self.rng.random_range(0..q_table.n_actions())
        } else {
            // Exploit
            q_table.argmax_action(state)
        }
    }

    fn name(&self) -> &str {
        "epsilon-greedy"
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Always exploits, ignoring epsilon.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl ActionPolicy for Greedy {
    fn select(&mut self, state: usize, q_table: &QTable, _epsilon: f64) -> usize {
        q_table.argmax_action(state)
    }

    fn name(&self) -> &str {
        "greedy"
    }
}

/// Deterministic override that always returns the same action.
///
/// Used to drive an actuator along a known trajectory, e.g. when checking a
/// new rig or pinning down convergence behaviour in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAction {
    action: usize,
}

impl FixedAction {
    pub fn new(action: usize) -> Self {
        Self { action }
    }

    pub fn action(&self) -> usize {
        self.action
    }
}

impl ActionPolicy for FixedAction {
    fn select(&mut self, _state: usize, _q_table: &QTable, _epsilon: f64) -> usize {
        self.action
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Geometrically decaying exploration rate with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    epsilon: f64,
    initial_epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
}

impl EpsilonSchedule {
    pub fn new(epsilon: f64, epsilon_decay: f64, min_epsilon: f64) -> Self {
        Self {
            epsilon,
            initial_epsilon: epsilon,
            epsilon_decay,
            min_epsilon,
        }
    }

    /// Current exploration rate
    pub fn value(&self) -> f64 {
        self.epsilon
    }

    /// Decay epsilon after an episode
    ///
    /// `epsilon = max(min_epsilon, epsilon * epsilon_decay)`
    pub fn decay(&mut self) -> f64 {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
        self.epsilon
    }

    pub fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut table = QTable::zeros(3, 5);
        table.set(1, 3, 0.7);
        let mut policy = EpsilonGreedy::with_seed(7);

        for _ in 0..500 {
            assert_eq!(policy.select(1, &table, 0.0), 3);
            assert_eq!(policy.select(0, &table, 0.0), 0);
        }
    }

    #[test]
    fn test_full_epsilon_explores_every_action() {
        let table = QTable::zeros(1, 5);
        let mut policy = EpsilonGreedy::with_seed(11);
        let mut seen = [false; 5];

        for _ in 0..1000 {
            let action = policy.select(0, &table, 1.0);
            assert!(action < 5);
            seen[action] = true;
        }

        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_seeded_policies_agree() {
        let table = QTable::zeros(4, 3);
        let mut a = EpsilonGreedy::with_seed(99);
        let mut b = EpsilonGreedy::new();
        b.set_rng_seed(99);

        for state in (0..4).cycle().take(200) {
            assert_eq!(a.select(state, &table, 0.5), b.select(state, &table, 0.5));
        }
    }

    #[test]
    fn test_greedy_and_fixed() {
        let mut table = QTable::zeros(2, 3);
        table.set(0, 2, 1.0);

        assert_eq!(Greedy.select(0, &table, 1.0), 2);
        assert_eq!(FixedAction::new(1).select(0, &table, 1.0), 1);
    }

    #[test]
    fn test_decay_never_increases_or_undershoots() {
        let mut schedule = EpsilonSchedule::new(0.2, 0.995, 0.01);
        let mut previous = schedule.value();

        for _ in 0..2000 {
            let current = schedule.decay();
            assert!(current <= previous);
            assert!(current >= 0.01);
            previous = current;
        }

        assert_eq!(schedule.value(), 0.01);
    }

    #[test]
    fn test_reset_restores_initial_epsilon() {
        let mut schedule = EpsilonSchedule::new(0.3, 0.5, 0.01);
        assert_eq!(schedule.decay(), 0.15);

        schedule.reset();
        assert_eq!(schedule.value(), 0.3);
    }
}
