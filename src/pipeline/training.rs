//! Training loop: episodes until convergence, budget exhaustion, or a stop request

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use log::{debug, info, warn};

use super::episode::{EpisodeOutcome, EpisodeRunner};
use crate::{
    Error, Result,
    app::ControllerConfig,
    ports::{Actuator, Observer, QTableRepository},
    q_learning::{ActionPolicy, EpsilonGreedy, EpsilonSchedule, QTable, TableMetadata},
    types::{EpisodeRecord, TrainingOutcome, TrainingReport},
};

/// Cloneable flag asking a running training loop to stop.
///
/// The loop checks it only between episodes, so an episode in progress
/// always completes (and is persisted and logged) before the loop returns.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Persistence {
    repository: Box<dyn QTableRepository>,
    path: PathBuf,
}

/// Owns the Q-table and exploration schedule for one training run.
///
/// # Examples
///
/// ```
/// use jointq::{
///     adapters::{InMemoryRepository, SimulatedJoint},
///     app::ControllerConfig,
///     pipeline::TrainingLoop,
///     q_learning::QTable,
/// };
///
/// let config = ControllerConfig::default().with_episodes(20).with_seed(7);
/// let mut training = TrainingLoop::new(config, QTable::zeros(10, 3))?
///     .with_persistence(Box::new(InMemoryRepository::new()), "qtable");
///
/// let mut joint = SimulatedJoint::new("LShoulderPitch", 0.0);
/// let report = training.run(&mut joint)?;
/// assert!(report.episodes_run <= 20);
/// # Ok::<(), jointq::Error>(())
/// ```
pub struct TrainingLoop {
    config: ControllerConfig,
    runner: EpisodeRunner,
    q_table: QTable,
    schedule: EpsilonSchedule,
    policy: Box<dyn ActionPolicy>,
    persistence: Option<Persistence>,
    observers: Vec<Box<dyn Observer>>,
    stop: StopSignal,
    prior_episodes: usize,
    episodes_completed: usize,
}

impl TrainingLoop {
    /// Create a loop for `config` that trains `q_table`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidConfiguration`] if the configuration is
    /// invalid, or [`Error::ShapeMismatch`] if the table does not have the
    /// configured shape.
    pub fn new(config: ControllerConfig, q_table: QTable) -> Result<Self> {
        let runner = EpisodeRunner::from_config(&config)?;
        q_table.ensure_shape(config.n_states, config.n_actions)?;

        let policy: Box<dyn ActionPolicy> = match config.seed {
            Some(seed) => Box::new(EpsilonGreedy::with_seed(seed)),
            None => Box::new(EpsilonGreedy::new()),
        };

        Ok(Self {
            schedule: config.epsilon_schedule(),
            config,
            runner,
            q_table,
            policy,
            persistence: None,
            observers: Vec::new(),
            stop: StopSignal::new(),
            prior_episodes: 0,
            episodes_completed: 0,
        })
    }

    /// Replace the default ε-greedy policy.
    pub fn with_policy(mut self, mut policy: Box<dyn ActionPolicy>) -> Self {
        if let Some(seed) = self.config.seed {
            policy.set_rng_seed(seed);
        }
        self.policy = policy;
        self
    }

    /// Save the table to `path` through `repository` after every episode.
    pub fn with_persistence(
        mut self,
        repository: Box<dyn QTableRepository>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.persistence = Some(Persistence {
            repository,
            path: path.into(),
        });
        self
    }

    /// Add an observer to the loop
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Episodes already folded into the table by earlier runs.
    pub fn with_prior_episodes(mut self, episodes: usize) -> Self {
        self.prior_episodes = episodes;
        self
    }

    /// Handle that stops this loop when raised.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    pub fn epsilon(&self) -> f64 {
        self.schedule.value()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn persistence_path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|p| p.path.as_path())
    }

    /// Run training against `actuator`.
    ///
    /// `actuator.start()` is called once before the first episode and
    /// `actuator.stop()` once at the end, whether training succeeds or not.
    ///
    /// # Errors
    ///
    /// Any actuator, persistence or observer error aborts the run. Before
    /// the error is returned the current table is saved, observers are
    /// notified through [`Observer::on_training_aborted`] and the actuator
    /// is stopped.
    pub fn run(&mut self, actuator: &mut dyn Actuator) -> Result<TrainingReport> {
        info!(
            "Training '{}' toward {:.2}° ({} states, {} actions, up to {} episodes, policy {})",
            actuator.name(),
            self.config.target_degrees,
            self.config.n_states,
            self.config.n_actions,
            self.config.num_episodes,
            self.policy.name()
        );

        let result = match self.run_started(actuator) {
            Ok(report) => self.finish(report),
            Err(err) => {
                warn!("Training aborted: {err}");
                if let Err(save_err) = self.persist() {
                    warn!("Failed to save Q-table after abort: {save_err}");
                }
                for observer in &mut self.observers {
                    if let Err(obs_err) = observer.on_training_aborted(&err) {
                        warn!("Observer failed while aborting: {obs_err}");
                    }
                }
                Err(err)
            }
        };

        if let Err(err) = actuator.stop() {
            warn!("Failed to stop actuator '{}': {err}", actuator.name());
        }
        result
    }

    fn finish(&mut self, report: TrainingReport) -> Result<TrainingReport> {
        for observer in &mut self.observers {
            observer.on_training_end(&report)?;
        }
        info!(
            "Training {} after {} episode(s)",
            report.outcome.label(),
            report.episodes_run
        );
        Ok(report)
    }

    fn run_started(&mut self, actuator: &mut dyn Actuator) -> Result<TrainingReport> {
        for observer in &mut self.observers {
            observer.on_training_start(self.config.num_episodes)?;
        }

        actuator.start()?;
        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            debug!("Waiting {settle:?} for the actuator to settle");
            thread::sleep(settle);
        }

        let started = Instant::now();
        let mut outcome = TrainingOutcome::Exhausted {
            episodes: self.config.num_episodes,
        };
        let mut final_angle = None;
        let mut best_total_reward: Option<f64> = None;
        let mut episodes_run = 0;

        for episode in 1..=self.config.num_episodes {
            if self.stop.is_raised() {
                info!("Stop requested; ending before episode {episode}");
                outcome = TrainingOutcome::Stopped {
                    episodes: episode - 1,
                };
                break;
            }

            let result = self.runner.run(
                actuator,
                self.policy.as_mut(),
                &mut self.q_table,
                self.schedule.value(),
            )?;
            episodes_run = episode;
            self.episodes_completed += 1;

            self.schedule.decay();
            self.persist()?;

            let record = self.record(episode, &result, started);
            for observer in &mut self.observers {
                observer.on_episode_end(&record)?;
            }
            debug!(
                "Episode {episode}: reward {:.4}, {:.2}°, epsilon {:.4}",
                record.total_reward,
                record.deg_position,
                self.schedule.value()
            );

            final_angle = Some(result.final_angle);
            best_total_reward = Some(
                best_total_reward.map_or(result.total_reward, |best| best.max(result.total_reward)),
            );

            if self.reached_target(result.final_angle) {
                info!(
                    "Target angle of {:.2}° reached in episode {episode}",
                    self.config.target_degrees
                );
                outcome = TrainingOutcome::Converged { episode };
                break;
            }
        }

        Ok(TrainingReport {
            outcome,
            episodes_run,
            final_angle,
            final_epsilon: self.schedule.value(),
            best_total_reward,
            elapsed: started.elapsed(),
        })
    }

    fn reached_target(&self, angle: f64) -> bool {
        (angle.to_degrees() - self.config.target_degrees).abs() <= self.config.delta_degrees
    }

    fn record(
        &self,
        episode: usize,
        result: &EpisodeOutcome,
        started: Instant,
    ) -> EpisodeRecord {
        let limit = self.runner.angle_limit();
        EpisodeRecord {
            episode,
            total_reward: result.total_reward,
            normalized_position: (result.final_angle + limit) / (2.0 * limit),
            rad_position: result.final_angle,
            deg_position: result.final_angle.to_degrees(),
            action: result.action,
            timestamp_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn metadata(&self) -> TableMetadata {
        TableMetadata {
            episodes_trained: Some(self.prior_episodes + self.episodes_completed),
            epsilon: Some(self.schedule.value()),
            target_degrees: Some(self.config.target_degrees),
            saved_at: None,
        }
        .stamped()
    }

    fn persist(&self) -> Result<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        persistence
            .repository
            .save(&self.q_table, &self.metadata(), &persistence.path)
            .map_err(|err| match err {
                Error::Io { operation, source } => Error::Io {
                    operation: format!("save Q-table ({operation})"),
                    source,
                },
                other => other,
            })
    }
}
