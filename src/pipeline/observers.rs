//! Observer implementations for the training loop
//!
//! Observers allow composable data collection during training without coupling
//! the loop to specific output formats.

use std::{
    fs::File,
    io::Write,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Error, Result,
    ports::Observer,
    types::{EpisodeRecord, TrainingReport},
};

/// Append-only CSV episode log
///
/// The header is written on creation; each record is flushed as soon as it
/// is written so the log survives a crash of the training process.
pub struct CsvEpisodeLog<W: Write = File> {
    writer: csv::Writer<W>,
    last_episode: Option<usize>,
}

impl CsvEpisodeLog<File> {
    /// Create (or truncate) the log file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create episode log {path:?}"),
            source,
        })?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvEpisodeLog<W> {
    pub fn from_writer(writer: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(EpisodeRecord::HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer,
            last_episode: None,
        })
    }

    /// Recover the underlying writer, flushing buffered rows.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io {
                operation: "flush episode log".to_string(),
                source: std::io::Error::other(e.to_string()),
            })
    }
}

impl<W: Write + Send> Observer for CsvEpisodeLog<W> {
    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        if self.last_episode.is_some_and(|last| record.episode <= last) {
            return Err(Error::SerializationContext {
                operation: "append episode log".to_string(),
                message: format!(
                    "episode {} does not follow episode {}",
                    record.episode,
                    self.last_episode.unwrap_or_default()
                ),
            });
        }
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.last_episode = Some(record.episode);
        Ok(())
    }

    fn on_training_end(&mut self, _report: &TrainingReport) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn on_training_aborted(&mut self, _error: &Error) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read an episode log back into records.
pub fn read_episode_log<P: AsRef<Path>>(path: P) -> Result<Vec<EpisodeRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize()
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self { progress_bar: None }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(record.episode as u64);
            pb.set_message(format!(
                "deg: {:.2} reward: {:.4}",
                record.deg_position, record.total_reward
            ));
        }
        Ok(())
    }

    fn on_training_end(&mut self, report: &TrainingReport) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_with_message(report.outcome.label());
        }
        Ok(())
    }

    fn on_training_aborted(&mut self, _error: &Error) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            pb.abandon_with_message("aborted");
        }
        Ok(())
    }
}

/// Log observer - one `info!` line per episode
#[derive(Debug, Default)]
pub struct LogObserver {
    total_episodes: usize,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for LogObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        self.total_episodes = total_episodes;
        Ok(())
    }

    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        info!(
            "Episode {}/{} Total Reward: {:.4} NP: {:.4} rad: {:.4} deg: {:.2} action: {} time: {}ms",
            record.episode,
            self.total_episodes,
            record.total_reward,
            record.normalized_position,
            record.rad_position,
            record.deg_position,
            record.action,
            record.timestamp_ms
        );
        Ok(())
    }

    fn on_training_aborted(&mut self, error: &Error) -> Result<()> {
        error!("Training aborted: {error}");
        Ok(())
    }
}

/// Summary of the episodes seen by a [`MetricsObserver`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub mean_reward: f64,
    pub reward_std_dev: f64,
    pub best_reward: f64,
    /// Final angle of the last episode (degrees)
    pub last_degrees: f64,
    /// Mean absolute distance to target over the last ten episodes (degrees)
    pub recent_error_degrees: f64,
}

/// Metrics observer - Tracks episode records behind a shared handle
///
/// The observer is boxed into the training loop; keep a clone of the
/// [`MetricsHandle`] to read the collected records afterwards.
pub struct MetricsObserver {
    handle: MetricsHandle,
}

#[derive(Clone, Default)]
pub struct MetricsHandle {
    records: Arc<Mutex<Vec<EpisodeRecord>>>,
    target_degrees: f64,
}

impl MetricsObserver {
    /// Create a new metrics observer measuring error against `target_degrees`
    pub fn new(target_degrees: f64) -> Self {
        Self {
            handle: MetricsHandle {
                records: Arc::new(Mutex::new(Vec::new())),
                target_degrees,
            },
        }
    }

    pub fn handle(&self) -> MetricsHandle {
        self.handle.clone()
    }
}

impl MetricsHandle {
    fn lock(&self) -> MutexGuard<'_, Vec<EpisodeRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn records(&self) -> Vec<EpisodeRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn summary(&self) -> MetricsSummary {
        let records = self.lock();
        if records.is_empty() {
            return MetricsSummary::default();
        }

        let rewards: Vec<f64> = records.iter().map(|r| r.total_reward).collect();
        let recent: Vec<f64> = records
            .iter()
            .rev()
            .take(10)
            .map(|r| (r.deg_position - self.target_degrees).abs())
            .collect();

        MetricsSummary {
            episodes: records.len(),
            mean_reward: rewards.iter().mean(),
            reward_std_dev: if rewards.len() > 1 {
                rewards.iter().std_dev()
            } else {
                0.0
            },
            best_reward: Statistics::max(rewards.iter()),
            last_degrees: records.last().map_or(0.0, |r| r.deg_position),
            recent_error_degrees: recent.iter().mean(),
        }
    }
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        self.handle.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(episode: usize, reward: f64, degrees: f64) -> EpisodeRecord {
        let rad = degrees.to_radians();
        EpisodeRecord {
            episode,
            total_reward: reward,
            normalized_position: (rad + std::f64::consts::FRAC_PI_2) / std::f64::consts::PI,
            rad_position: rad,
            deg_position: degrees,
            action: 2,
            timestamp_ms: episode as u64 * 10,
        }
    }

    #[test]
    fn test_csv_log_header_and_rows() {
        let mut log = CsvEpisodeLog::from_writer(Vec::new()).unwrap();
        log.on_episode_end(&record(1, -0.5, 10.0)).unwrap();
        log.on_episode_end(&record(2, -0.25, 20.0)).unwrap();

        let bytes = log.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("episode,total_reward,normalized_position,rad_position,deg_position,action,timestamp_ms")
        );
        assert!(lines.next().unwrap().starts_with("1,-0.5,"));
        assert!(lines.next().unwrap().starts_with("2,-0.25,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_log_rejects_non_increasing_episode() {
        let mut log = CsvEpisodeLog::from_writer(Vec::new()).unwrap();
        log.on_episode_end(&record(3, -0.5, 10.0)).unwrap();
        assert!(log.on_episode_end(&record(3, -0.5, 10.0)).is_err());
    }

    #[test]
    fn test_csv_log_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut log = CsvEpisodeLog::create(&path).unwrap();
        let rows = [record(1, -0.5, 10.0), record(2, -0.1, 40.0)];
        for row in &rows {
            log.on_episode_end(row).unwrap();
        }
        drop(log);

        assert_eq!(read_episode_log(&path).unwrap(), rows);
    }

    #[test]
    fn test_metrics_summary() {
        let mut metrics = MetricsObserver::new(45.0);
        let handle = metrics.handle();

        assert_eq!(handle.summary(), MetricsSummary::default());

        metrics.on_episode_end(&record(1, -1.0, 30.0)).unwrap();
        metrics.on_episode_end(&record(2, -0.5, 40.0)).unwrap();
        metrics.on_episode_end(&record(3, 0.0, 45.0)).unwrap();

        let summary = handle.summary();
        assert_eq!(summary.episodes, 3);
        assert!((summary.mean_reward + 0.5).abs() < 1e-12);
        assert!((summary.reward_std_dev - 0.5).abs() < 1e-12);
        assert_eq!(summary.best_reward, 0.0);
        assert_eq!(summary.last_degrees, 45.0);
        assert!((summary.recent_error_degrees - 20.0 / 3.0).abs() < 1e-12);
    }
}
