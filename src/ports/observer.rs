//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events, allowing
//! composable episode logging without coupling the training loop to specific
//! output formats.

use crate::{
    Error, Result,
    types::{EpisodeRecord, TrainingReport},
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once at the beginning
/// 2. `on_episode_end(record)` - after each completed episode, once the
///    Q-table for that episode has been persisted
/// 3. One of:
///    - `on_training_end(report)` - normal termination (converged,
///      exhausted or stopped)
///    - `on_training_aborted(error)` - an error ended the run
///
/// # Examples
///
/// ```
/// use jointq::{ports::Observer, types::EpisodeRecord};
///
/// struct RewardSum {
///     total: f64,
/// }
///
/// impl Observer for RewardSum {
///     fn on_episode_end(&mut self, record: &EpisodeRecord) -> jointq::Result<()> {
///         self.total += record.total_reward;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each completed episode.
    fn on_episode_end(&mut self, _record: &EpisodeRecord) -> Result<()> {
        Ok(())
    }

    /// Called when training completes without error.
    fn on_training_end(&mut self, _report: &TrainingReport) -> Result<()> {
        Ok(())
    }

    /// Called when training is aborted by `error`.
    ///
    /// Use this to flush partial output; the error itself is propagated by
    /// the training loop.
    fn on_training_aborted(&mut self, _error: &Error) -> Result<()> {
        Ok(())
    }
}
