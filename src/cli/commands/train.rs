//! Train command - Train a joint toward a target angle on a simulated backend

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    adapters::{
        HoldPolicy, JointBusActuator, SimulatedJoint, SimulatedJointBus, SimulationConfig,
        simulated::HUMANOID_JOINTS,
    },
    app::{App, ControllerConfig},
    cli::output::{format_angle, format_option, print_kv, print_section},
    control::RewardBasis,
    pipeline::{
        CsvEpisodeLog, LogObserver, MetricsObserver, MetricsSummary, ProgressObserver, StopSignal,
    },
    ports::Actuator,
    q_learning::FixedAction,
    types::TrainingReport,
};

/// Starting point before the config file and flag overrides are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Physics-simulation setup (10 states, 3 actions)
    Sim,
    /// Physical-robot setup (100 states over ±π, 5 actions)
    Robot,
}

/// Simulated actuator driven by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// A single joint
    Joint,
    /// A full humanoid body driven through its joint bus
    Humanoid,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    report: TrainingReport,
    metrics: MetricsSummary,
    config: ControllerConfig,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    backend: String,
    joint: String,
    hold: Option<String>,
    policy: String,
    qtable: Option<PathBuf>,
    log: Option<PathBuf>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a joint toward a target angle", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Base parameter set
    #[arg(long, value_enum, default_value = "sim")]
    pub preset: Preset,

    /// JSON configuration file; replaces the preset
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long, short = 'e')]
    pub episodes: Option<usize>,

    /// Control steps per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Number of discretized states
    #[arg(long)]
    pub states: Option<usize>,

    /// Number of discrete actions
    #[arg(long)]
    pub actions: Option<usize>,

    /// Angle change between adjacent actions (radians)
    #[arg(long)]
    pub step: Option<f64>,

    /// Learning rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Initial exploration rate
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Multiplicative exploration decay per episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Exploration floor
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Target angle in degrees
    #[arg(long, short = 't')]
    pub target: Option<f64>,

    /// Convergence tolerance in degrees
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Angle used for the reward (commanded or measured)
    #[arg(long)]
    pub reward_basis: Option<String>,

    /// Q-table file, resumed if present and saved after every episode
    /// (`.txt`/`.tsv` for text, anything else for MessagePack)
    #[arg(long, short = 'q')]
    pub qtable: Option<PathBuf>,

    /// CSV episode log
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Always take this action instead of learning a policy
    #[arg(long)]
    pub fixed_action: Option<usize>,

    /// Show progress bar instead of per-episode log lines
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Simulated backend
    #[arg(long, value_enum, default_value = "joint")]
    pub backend: Backend,

    /// Name of the controlled joint
    #[arg(long, default_value = "LShoulderPitch")]
    pub joint: String,

    /// What the humanoid backend does with the other joints
    /// (hold-others or controlled-only)
    #[arg(long, default_value = "hold-others")]
    pub hold: String,

    /// Fraction of the remaining distance the simulated joint covers per command
    #[arg(long, default_value_t = 1.0)]
    pub tracking_gain: f64,

    /// Starting angle of the simulated joints in degrees
    #[arg(long, default_value_t = 0.0)]
    pub initial_degrees: f64,
}

impl TrainArgs {
    /// Assemble the controller configuration from preset, file and flags.
    pub fn controller_config(&self) -> Result<ControllerConfig> {
        let mut config = match &self.config {
            Some(path) => ControllerConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => match self.preset {
                Preset::Sim => ControllerConfig::default(),
                Preset::Robot => ControllerConfig::robot(),
            },
        };

        if let Some(value) = self.episodes {
            config.num_episodes = value;
        }
        if let Some(value) = self.max_steps {
            config.max_steps = value;
        }
        if let Some(value) = self.states {
            config.n_states = value;
        }
        if let Some(value) = self.actions {
            config.n_actions = value;
        }
        if let Some(value) = self.step {
            config.step = value;
        }
        if let Some(value) = self.alpha {
            config.alpha = value;
        }
        if let Some(value) = self.gamma {
            config.gamma = value;
        }
        if let Some(value) = self.epsilon {
            config.epsilon = value;
        }
        if let Some(value) = self.epsilon_decay {
            config.epsilon_decay = value;
        }
        if let Some(value) = self.min_epsilon {
            config.min_epsilon = value;
        }
        if let Some(value) = self.target {
            config.target_degrees = value;
        }
        if let Some(value) = self.tolerance {
            config.delta_degrees = value;
        }
        if let Some(raw) = &self.reward_basis {
            config.reward_basis = raw.parse::<RewardBasis>()?;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        config.validate().context("Invalid controller configuration")?;
        Ok(config)
    }

    fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            tracking_gain: self.tracking_gain,
            initial_angle: self.initial_degrees.to_radians(),
        }
    }

    fn build_actuator(&self) -> Result<Box<dyn Actuator>> {
        let simulation = self.simulation_config();
        match self.backend {
            Backend::Joint => Ok(Box::new(SimulatedJoint::from_config(
                self.joint.clone(),
                &simulation,
            )?)),
            Backend::Humanoid => {
                let index = HUMANOID_JOINTS
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(&self.joint))
                    .ok_or_else(|| {
                        anyhow!(
                            "Unknown joint '{}' (expected one of: {})",
                            self.joint,
                            HUMANOID_JOINTS.join(", ")
                        )
                    })?;
                let hold = self.hold.parse::<HoldPolicy>()?;
                let bus = SimulatedJointBus::humanoid(&simulation)?;
                Ok(Box::new(JointBusActuator::new(bus, index, hold)?))
            }
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    execute_until(args, StopSignal::new())
}

/// Run the command, stopping cleanly between episodes once `stop` is raised.
pub fn execute_until(args: TrainArgs, stop: StopSignal) -> Result<()> {
    let config = args.controller_config()?;

    if let Some(action) = args.fixed_action.filter(|&a| a >= config.n_actions) {
        bail!(
            "--fixed-action {action} is out of range for {} actions",
            config.n_actions
        );
    }

    let summary_target = args.summary.as_ref().map(|raw| {
        let sanitized = sanitize_summary_path(raw);
        let normalized = sanitized != *raw;
        (sanitized, normalized)
    });

    let mut actuator = args.build_actuator()?;

    let app = App::new();
    let mut training = app
        .create_training(config.clone(), args.qtable.as_deref())
        .context("Failed to prepare training")?
        .with_stop_signal(stop);

    if let Some(action) = args.fixed_action {
        training = training.with_policy(Box::new(FixedAction::new(action)));
    }

    let metrics = MetricsObserver::new(config.target_degrees);
    let metrics_handle = metrics.handle();
    training = training.with_observer(Box::new(metrics));

    if let Some(path) = &args.log {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let log = CsvEpisodeLog::create(path)
            .with_context(|| format!("Failed to create episode log {}", path.display()))?;
        training = training.with_observer(Box::new(log));
    }

    if args.progress {
        training = training.with_observer(Box::new(ProgressObserver::new()));
    } else {
        training = training.with_observer(Box::new(LogObserver::new()));
    }

    print_section("Q-Learning Joint Training");
    print_kv("Joint", &args.joint);
    print_kv("Target", &format!("{:.2}°", config.target_degrees));
    print_kv("Tolerance", &format!("{:.2}°", config.delta_degrees));
    print_kv("Shape", &format!("{} x {}", config.n_states, config.n_actions));
    print_kv("Episodes", &config.num_episodes.to_string());

    let report = training.run(actuator.as_mut()).context("Training failed")?;
    let metrics = metrics_handle.summary();

    print_section("Training Complete");
    print_kv("Outcome", report.outcome.label());
    print_kv("Episodes run", &report.episodes_run.to_string());
    print_kv(
        "Final angle",
        &format_option(report.final_angle.map(format_angle)),
    );
    print_kv("Final epsilon", &format!("{:.4}", report.final_epsilon));
    print_kv(
        "Best reward",
        &format_option(report.best_total_reward.map(|r| format!("{r:.4}"))),
    );
    print_kv("Mean reward", &format!("{:.4}", metrics.mean_reward));
    if let Some(path) = &args.qtable {
        print_kv("Q-table", &path.display().to_string());
    }

    if let Some((summary_path, normalized)) = summary_target {
        if normalized {
            println!(
                "\n⚠️  Normalizing summary path to {}",
                summary_path.display()
            );
        }

        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let policy = match args.fixed_action {
            Some(action) => format!("fixed({action})"),
            None => "epsilon_greedy".to_string(),
        };
        let hold = matches!(args.backend, Backend::Humanoid).then(|| args.hold.clone());

        let summary = TrainingSummaryFile {
            report,
            metrics,
            config,
            metadata: SummaryMetadata {
                backend: format!("{:?}", args.backend).to_ascii_lowercase(),
                joint: args.joint.clone(),
                hold,
                policy,
                qtable: args.qtable.clone(),
                log: args.log.clone(),
            },
        };

        let file = File::create(&summary_path)
            .with_context(|| format!("Failed to create summary {}", summary_path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_summary_path() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/run")),
            PathBuf::from("out/run.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/run.JSON")),
            PathBuf::from("out/run.JSON")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/")),
            PathBuf::from("out/training_summary.json")
        );
    }

    #[test]
    fn test_flags_override_preset() {
        let args = TrainArgs::parse_from([
            "train",
            "--preset",
            "robot",
            "--episodes",
            "7",
            "--target",
            "30",
            "--reward-basis",
            "commanded",
        ]);
        let config = args.controller_config().unwrap();
        assert_eq!(config.n_states, 100);
        assert_eq!(config.num_episodes, 7);
        assert_eq!(config.target_degrees, 30.0);
        assert_eq!(config.reward_basis, RewardBasis::Commanded);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = TrainArgs::parse_from(["train", "--alpha", "0"]);
        assert!(args.controller_config().is_err());

        let args = TrainArgs::parse_from(["train", "--reward-basis", "sideways"]);
        assert!(args.controller_config().is_err());
    }

    #[test]
    fn test_unknown_humanoid_joint() {
        let args = TrainArgs::parse_from(["train", "--backend", "humanoid", "--joint", "Tail"]);
        assert!(args.build_actuator().is_err());
    }
}
