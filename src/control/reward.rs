//! Proximity reward

use serde::{Deserialize, Serialize};

/// Scores a transition by how close the joint ended up to the target.
///
/// `reward = -|target - angle|`, always non-positive and zero only on an
/// exact match. There is no shaping beyond this term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardFunction {
    target_angle: f64,
}

impl RewardFunction {
    /// Reward toward `target_angle` (radians).
    pub fn new(target_angle: f64) -> Self {
        Self { target_angle }
    }

    pub fn from_degrees(target_degrees: f64) -> Self {
        Self::new(target_degrees.to_radians())
    }

    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    pub fn reward(&self, next_angle: f64) -> f64 {
        -(self.target_angle - next_angle).abs()
    }
}

/// Which angle the reward and next state are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardBasis {
    /// The clamped angle that was commanded.
    #[default]
    Commanded,
    /// The angle read back from the actuator after the command.
    Measured,
}

impl std::str::FromStr for RewardBasis {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commanded" => Ok(RewardBasis::Commanded),
            "measured" => Ok(RewardBasis::Measured),
            other => Err(crate::Error::config(format!(
                "unknown reward basis '{other}' (expected 'commanded' or 'measured')"
            ))),
        }
    }
}
