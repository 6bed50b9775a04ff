//! Common test utilities for the jointq integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use jointq::{
    Result,
    pipeline::StopSignal,
    ports::Observer,
    types::{EpisodeRecord, TrainingReport},
};

/// Observer that copies every record into a shared vector.
#[derive(Clone, Default)]
pub struct Recorder {
    pub records: Arc<Mutex<Vec<EpisodeRecord>>>,
    pub finished: Arc<Mutex<Option<TrainingReport>>>,
    pub aborted: Arc<Mutex<usize>>,
}

impl Recorder {
    pub fn records(&self) -> Vec<EpisodeRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn report(&self) -> Option<TrainingReport> {
        self.finished.lock().unwrap().clone()
    }

    pub fn aborted(&self) -> usize {
        *self.aborted.lock().unwrap()
    }
}

impl Observer for Recorder {
    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn on_training_end(&mut self, report: &TrainingReport) -> Result<()> {
        *self.finished.lock().unwrap() = Some(report.clone());
        Ok(())
    }

    fn on_training_aborted(&mut self, _error: &jointq::Error) -> Result<()> {
        *self.aborted.lock().unwrap() += 1;
        Ok(())
    }
}

/// Observer that raises a stop signal once `after` episodes have completed.
pub struct StopAfter {
    pub after: usize,
    pub signal: StopSignal,
}

impl Observer for StopAfter {
    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        if record.episode >= self.after {
            self.signal.raise();
        }
        Ok(())
    }
}
