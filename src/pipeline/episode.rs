//! One training episode: discretize, select, act, observe, update.

use log::trace;

use crate::{
    Error, Result,
    app::ControllerConfig,
    control::{ActionSpace, RewardBasis, RewardFunction, StateDiscretizer},
    ports::Actuator,
    q_learning::{ActionPolicy, QTable},
};

/// Result of a single control step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub state: usize,
    pub action: usize,
    /// Angle that was commanded, after clamping to the angle limit
    pub commanded_angle: f64,
    /// Angle the reward and next state were computed from
    pub observed_angle: f64,
    pub reward: f64,
    pub next_state: usize,
}

/// Result of a complete episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    pub total_reward: f64,
    /// Observed angle after the last step (radians)
    pub final_angle: f64,
    /// Action taken on the last step
    pub action: usize,
    pub steps: usize,
}

/// Runs episodes of `max_steps` control steps against an actuator.
///
/// The runner is immutable; all state that changes during an episode (the
/// Q-table, the policy RNG, the actuator) is passed in by the caller.
#[derive(Debug, Clone)]
pub struct EpisodeRunner {
    discretizer: StateDiscretizer,
    actions: ActionSpace,
    reward: RewardFunction,
    reward_basis: RewardBasis,
    angle_limit: f64,
    max_steps: usize,
    learning_rate: f64,
    discount_factor: f64,
}

impl EpisodeRunner {
    /// Build a runner from a validated configuration.
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            discretizer: config.discretizer()?,
            actions: config.action_space()?,
            reward: config.reward_function(),
            reward_basis: config.reward_basis,
            angle_limit: config.angle_limit,
            max_steps: config.max_steps,
            learning_rate: config.alpha,
            discount_factor: config.gamma,
        })
    }

    pub fn angle_limit(&self) -> f64 {
        self.angle_limit
    }

    /// Run one episode, updating `q_table` in place after every step.
    pub fn run(
        &self,
        actuator: &mut dyn Actuator,
        policy: &mut dyn ActionPolicy,
        q_table: &mut QTable,
        epsilon: f64,
    ) -> Result<EpisodeOutcome> {
        let mut total_reward = 0.0;
        let mut last = None;

        for step in 0..self.max_steps {
            let outcome = self.step(actuator, policy, q_table, epsilon)?;
            trace!(
                "step {step}: s={} a={} angle={:.4} r={:.4} s'={}",
                outcome.state,
                outcome.action,
                outcome.observed_angle,
                outcome.reward,
                outcome.next_state
            );
            total_reward += outcome.reward;
            last = Some(outcome);
        }

        let last = last.ok_or_else(|| Error::config("max_steps must be at least 1"))?;

        Ok(EpisodeOutcome {
            total_reward,
            final_angle: last.observed_angle,
            action: last.action,
            steps: self.max_steps,
        })
    }

    /// Run a single control step.
    pub fn step(
        &self,
        actuator: &mut dyn Actuator,
        policy: &mut dyn ActionPolicy,
        q_table: &mut QTable,
        epsilon: f64,
    ) -> Result<StepOutcome> {
        let current_angle = actuator.read_angle()?;
        let state = self.discretizer.discretize(current_angle);

        let action = self
            .actions
            .check(policy.select(state, q_table, epsilon))?;
        let commanded_angle = (current_angle + self.actions.delta(action))
            .clamp(-self.angle_limit, self.angle_limit);

        actuator.command_angle(commanded_angle)?;

        let observed_angle = match self.reward_basis {
            RewardBasis::Commanded => commanded_angle,
            RewardBasis::Measured => actuator.read_angle()?,
        };
        let reward = self.reward.reward(observed_angle);
        let next_state = self.discretizer.discretize(observed_angle);

        q_table.update(
            state,
            action,
            reward,
            next_state,
            self.learning_rate,
            self.discount_factor,
        );

        Ok(StepOutcome {
            state,
            action,
            commanded_angle,
            observed_angle,
            reward,
            next_state,
        })
    }
}
