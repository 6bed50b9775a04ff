//! Value types shared between the training pipeline and its observers

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One row of the episode log.
///
/// Written once per completed episode and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// 1-based episode number within the run
    pub episode: usize,
    pub total_reward: f64,
    /// Final angle mapped onto `[0, 1]` across the commandable range
    pub normalized_position: f64,
    pub rad_position: f64,
    pub deg_position: f64,
    /// Action taken on the last step of the episode
    pub action: usize,
    /// Milliseconds since training started
    pub timestamp_ms: u64,
}

impl EpisodeRecord {
    pub const HEADER: [&'static str; 7] = [
        "episode",
        "total_reward",
        "normalized_position",
        "rad_position",
        "deg_position",
        "action",
        "timestamp_ms",
    ];
}

/// How a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainingOutcome {
    /// The final angle of `episode` was within tolerance of the target.
    Converged { episode: usize },
    /// The episode budget ran out without reaching the target.
    Exhausted { episodes: usize },
    /// An external stop request was honoured after `episodes` episodes.
    Stopped { episodes: usize },
}

impl TrainingOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, TrainingOutcome::Converged { .. })
    }

    pub fn episodes(&self) -> usize {
        match *self {
            TrainingOutcome::Converged { episode } => episode,
            TrainingOutcome::Exhausted { episodes } | TrainingOutcome::Stopped { episodes } => {
                episodes
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainingOutcome::Converged { .. } => "converged",
            TrainingOutcome::Exhausted { .. } => "exhausted",
            TrainingOutcome::Stopped { .. } => "stopped",
        }
    }
}

/// Summary of a finished training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub outcome: TrainingOutcome,
    pub episodes_run: usize,
    /// Final angle of the last completed episode (radians)
    pub final_angle: Option<f64>,
    pub final_epsilon: f64,
    /// Least negative episode reward seen
    pub best_total_reward: Option<f64>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
