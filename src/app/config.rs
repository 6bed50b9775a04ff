//! Configuration surface of the controller.

use std::{
    f64::consts::FRAC_PI_2,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    control::{ActionSpace, RewardBasis, RewardFunction, StateDiscretizer},
    q_learning::EpsilonSchedule,
};

/// Every tunable of a training run.
///
/// Defaults reproduce the physics-simulation setup: 10 states, 3 actions of
/// 0.1 rad, α = 0.2, γ = 0.9, one step per episode, 100 episodes, target 45°
/// within 0.5°.
///
/// # Examples
///
/// ```
/// use jointq::app::ControllerConfig;
///
/// let config = ControllerConfig::default()
///     .with_states(100)
///     .with_actions(5)
///     .with_learning_rate(0.3)
///     .with_target_degrees(45.0)
///     .with_seed(42);
/// config.validate()?;
/// # Ok::<(), jointq::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Initial exploration rate
    pub epsilon: f64,
    /// Floor of the exploration rate
    pub min_epsilon: f64,
    /// Multiplicative epsilon decay per episode
    pub epsilon_decay: f64,
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Number of discretized states
    pub n_states: usize,
    /// Number of discrete actions
    pub n_actions: usize,
    /// Angle change between adjacent actions (radians)
    pub step: f64,
    /// Commandable half-range (radians)
    pub angle_limit: f64,
    /// Discretization half-range (radians); `None` uses `angle_limit`
    pub state_limit: Option<f64>,
    /// Control steps per episode
    pub max_steps: usize,
    /// Episode budget
    pub num_episodes: usize,
    /// Convergence tolerance (degrees)
    pub delta_degrees: f64,
    /// Target angle (degrees)
    pub target_degrees: f64,
    /// Angle used for reward and next state
    pub reward_basis: RewardBasis,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Pause after starting the actuator (milliseconds)
    pub settle_delay_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.2,
            min_epsilon: 0.01,
            epsilon_decay: 0.995,
            alpha: 0.2,
            gamma: 0.9,
            n_states: 10,
            n_actions: 3,
            step: 0.1,
            angle_limit: FRAC_PI_2,
            state_limit: None,
            max_steps: 1,
            num_episodes: 100,
            delta_degrees: 0.5,
            target_degrees: 45.0,
            reward_basis: RewardBasis::Commanded,
            seed: None,
            settle_delay_ms: 0,
        }
    }
}

impl ControllerConfig {
    /// Physical-robot setup: 100 states over ±π, 5 actions, α = 0.3.
    pub fn robot() -> Self {
        Self {
            alpha: 0.3,
            n_states: 100,
            n_actions: 5,
            state_limit: Some(std::f64::consts::PI),
            reward_basis: RewardBasis::Measured,
            target_degrees: 0.79_f64.to_degrees(),
            ..Self::default()
        }
    }

    pub fn with_states(mut self, n_states: usize) -> Self {
        self.n_states = n_states;
        self
    }

    pub fn with_actions(mut self, n_actions: usize) -> Self {
        self.n_actions = n_actions;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_learning_rate(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_discount_factor(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_exploration(mut self, epsilon: f64, epsilon_decay: f64, min_epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self.epsilon_decay = epsilon_decay;
        self.min_epsilon = min_epsilon;
        self
    }

    pub fn with_angle_limit(mut self, angle_limit: f64) -> Self {
        self.angle_limit = angle_limit;
        self
    }

    pub fn with_state_limit(mut self, state_limit: f64) -> Self {
        self.state_limit = Some(state_limit);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_episodes(mut self, num_episodes: usize) -> Self {
        self.num_episodes = num_episodes;
        self
    }

    pub fn with_target_degrees(mut self, target_degrees: f64) -> Self {
        self.target_degrees = target_degrees;
        self
    }

    pub fn with_tolerance_degrees(mut self, delta_degrees: f64) -> Self {
        self.delta_degrees = delta_degrees;
        self
    }

    pub fn with_reward_basis(mut self, reward_basis: RewardBasis) -> Self {
        self.reward_basis = reward_basis;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn target_angle(&self) -> f64 {
        self.target_degrees.to_radians()
    }

    /// Reject any combination that would make training meaningless.
    pub fn validate(&self) -> Result<()> {
        fn finite(name: &str, value: f64) -> Result<()> {
            if value.is_finite() {
                Ok(())
            } else {
                Err(Error::config(format!("{name} must be finite, got {value}")))
            }
        }

        for (name, value) in [
            ("epsilon", self.epsilon),
            ("min_epsilon", self.min_epsilon),
            ("epsilon_decay", self.epsilon_decay),
            ("alpha", self.alpha),
            ("gamma", self.gamma),
            ("step", self.step),
            ("angle_limit", self.angle_limit),
            ("delta_degrees", self.delta_degrees),
            ("target_degrees", self.target_degrees),
        ] {
            finite(name, value)?;
        }

        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::config(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        if !(0.0..=self.epsilon).contains(&self.min_epsilon) {
            return Err(Error::config(format!(
                "min_epsilon must be in [0, epsilon], got {} with epsilon {}",
                self.min_epsilon, self.epsilon
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon_decay) {
            return Err(Error::config(format!(
                "epsilon_decay must be in [0, 1], got {}",
                self.epsilon_decay
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::config(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(Error::config(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.angle_limit <= 0.0 {
            return Err(Error::config(format!(
                "angle_limit must be positive, got {}",
                self.angle_limit
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::config("max_steps must be at least 1"));
        }
        if self.delta_degrees < 0.0 {
            return Err(Error::config(format!(
                "delta_degrees must be non-negative, got {}",
                self.delta_degrees
            )));
        }
        if self.target_angle().abs() > self.angle_limit {
            return Err(Error::config(format!(
                "target {}° lies outside the angle limit ±{:.2}°",
                self.target_degrees,
                self.angle_limit.to_degrees()
            )));
        }

        self.discretizer()?;
        self.action_space()?;
        Ok(())
    }

    pub fn discretizer(&self) -> Result<StateDiscretizer> {
        StateDiscretizer::new(self.n_states, self.state_limit.unwrap_or(self.angle_limit))
    }

    pub fn action_space(&self) -> Result<ActionSpace> {
        ActionSpace::new(self.n_actions, self.step)
    }

    pub fn reward_function(&self) -> RewardFunction {
        RewardFunction::from_degrees(self.target_degrees)
    }

    pub fn epsilon_schedule(&self) -> EpsilonSchedule {
        EpsilonSchedule::new(self.epsilon, self.epsilon_decay, self.min_epsilon)
    }

    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config file {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create config file {path:?}"),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        ControllerConfig::default().validate().unwrap();
        ControllerConfig::robot().validate().unwrap();
    }

    #[test]
    fn test_robot_discretizes_over_full_turn() {
        let config = ControllerConfig::robot();
        let discretizer = config.discretizer().unwrap();
        assert_eq!(discretizer.n_states(), 100);
        assert_eq!(discretizer.limit(), std::f64::consts::PI);
        assert_eq!(config.action_space().unwrap().n_actions(), 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            ControllerConfig::default().with_states(0),
            ControllerConfig::default().with_actions(0),
            ControllerConfig::default().with_step(0.0),
            ControllerConfig::default().with_learning_rate(0.0),
            ControllerConfig::default().with_learning_rate(1.5),
            ControllerConfig::default().with_discount_factor(-0.1),
            ControllerConfig::default().with_exploration(1.2, 0.995, 0.01),
            ControllerConfig::default().with_exploration(0.2, 0.995, 0.5),
            ControllerConfig::default().with_exploration(0.2, 1.1, 0.01),
            ControllerConfig::default().with_angle_limit(-1.0),
            ControllerConfig::default().with_max_steps(0),
            ControllerConfig::default().with_tolerance_degrees(-0.5),
            ControllerConfig::default().with_target_degrees(120.0),
            ControllerConfig::default().with_target_degrees(f64::NAN),
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfiguration { .. })),
                "expected rejection for {config:?}"
            );
        }
    }

    #[test]
    fn test_json_roundtrip_and_partial_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = ControllerConfig::default()
            .with_states(100)
            .with_actions(5)
            .with_reward_basis(RewardBasis::Measured)
            .with_seed(3);
        config.save_json(&path).unwrap();
        assert_eq!(ControllerConfig::from_json_file(&path).unwrap(), config);

        std::fs::write(&path, r#"{ "n_states": 50, "alpha": 0.3 }"#).unwrap();
        let partial = ControllerConfig::from_json_file(&path).unwrap();
        assert_eq!(partial.n_states, 50);
        assert_eq!(partial.alpha, 0.3);
        assert_eq!(partial.n_actions, 3);
    }
}
