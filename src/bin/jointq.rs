//! jointq CLI - Train and inspect tabular Q-learning joint controllers
//!
//! This CLI provides a unified interface for:
//! - Training a joint toward a target angle on a simulated backend
//! - Inspecting saved Q-tables
//!
//! Library logging goes through `env_logger`; set `RUST_LOG` to change the
//! default `info` level. Ctrl-C ends training after the current episode.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jointq::pipeline::StopSignal;
use log::warn;

#[derive(Parser)]
#[command(name = "jointq")]
#[command(version, about = "Tabular Q-learning controller for a single joint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a joint toward a target angle
    Train(Box<jointq::cli::commands::train::TrainArgs>),

    /// Show the contents of a saved Q-table
    Inspect(jointq::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => {
            let stop = StopSignal::new();
            let handler_stop = stop.clone();
            ctrlc::set_handler(move || {
                warn!("Interrupt received; stopping after the current episode");
                handler_stop.raise();
            })
            .context("Failed to install interrupt handler")?;
            jointq::cli::commands::train::execute_until(*args, stop)
        }
        Commands::Inspect(args) => jointq::cli::commands::inspect::execute(args),
    }
}
