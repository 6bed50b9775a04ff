//! Dependency injection container for the controller.
//!
//! The container owns the persistence dependency and wires Q-tables,
//! configuration and repositories into training loops.

use std::{path::Path, sync::Arc};

use log::info;

use super::config::ControllerConfig;
use crate::{
    Result,
    adapters::repository_for_path,
    pipeline::TrainingLoop,
    ports::{LoadedTable, QTableRepository, load_or_init},
    q_learning::QTable,
};

type SharedRepository = Arc<dyn QTableRepository + Sync>;

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use jointq::{adapters::SimulatedJoint, app::{App, ControllerConfig}};
/// use std::path::Path;
///
/// let app = App::new();
/// let mut training = app.create_training(
///     ControllerConfig::default(),
///     Some(Path::new("qtable.msgpack")),
/// )?;
/// training.run(&mut SimulatedJoint::new("LShoulderPitch", 0.0))?;
/// # Ok::<(), jointq::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use jointq::app::App;
/// use jointq::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Repository used for every path; `None` picks one from the file extension
    repository: Option<SharedRepository>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults.
    ///
    /// Repositories are chosen per path by [`repository_for_path`].
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Repository responsible for `path`.
    pub fn repository_for(&self, path: &Path) -> SharedRepository {
        match &self.repository {
            Some(repository) => Arc::clone(repository),
            None => Arc::from(repository_for_path(path)),
        }
    }

    /// Load the table at `path` for `config`, or a zero table if there is
    /// none or it has a different shape.
    pub fn load_table(&self, config: &ControllerConfig, path: &Path) -> Result<LoadedTable> {
        let repository = self.repository_for(path);
        load_or_init(repository.as_ref(), path, config.n_states, config.n_actions)
    }

    /// Build a training loop for `config`.
    ///
    /// With a `qtable_path` the stored table is resumed (see
    /// [`App::load_table`]) and saved back after every episode. The
    /// container's default seed applies when `config` has none.
    pub fn create_training(
        &self,
        mut config: ControllerConfig,
        qtable_path: Option<&Path>,
    ) -> Result<TrainingLoop> {
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }
        config.validate()?;

        let Some(path) = qtable_path else {
            let table = QTable::zeros(config.n_states, config.n_actions);
            return TrainingLoop::new(config, table);
        };

        let loaded = self.load_table(&config, path)?;
        let prior_episodes = loaded
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.episodes_trained)
            .unwrap_or(0);
        if prior_episodes > 0 {
            info!("Resuming a table trained for {prior_episodes} episode(s)");
        }

        Ok(TrainingLoop::new(config, loaded.table)?
            .with_persistence(Box::new(self.repository_for(path)), path)
            .with_prior_episodes(prior_episodes))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// Primarily used for testing to inject in-memory repositories and control
/// randomness.
pub struct AppBuilder {
    repository: Option<SharedRepository>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    /// Create a new app builder.
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    /// Use `repo` for every path.
    pub fn with_repository<R: QTableRepository + Sync + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for every training loop created by this app.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    pub fn build(self) -> App {
        App {
            repository: self.repository,
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
