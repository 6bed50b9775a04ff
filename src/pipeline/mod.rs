//! Training pipeline
//!
//! This module provides:
//! - [`EpisodeRunner`]: one episode of discretize, select, act, observe, update
//! - [`TrainingLoop`]: episodes until convergence, budget exhaustion or a stop request
//! - Observers recording episodes during training

pub mod episode;
pub mod observers;
pub mod training;

pub use episode::{EpisodeOutcome, EpisodeRunner, StepOutcome};
// Re-export observer implementations (adapters)
pub use observers::{
    CsvEpisodeLog, LogObserver, MetricsHandle, MetricsObserver, MetricsSummary,
    ProgressObserver, read_episode_log,
};
pub use training::{StopSignal, TrainingLoop};

pub use crate::ports::Observer;
