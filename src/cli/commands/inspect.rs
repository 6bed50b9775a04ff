//! Inspect command - Show the shape, metadata and greedy policy of a saved Q-table

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::App,
    cli::output::{format_option, print_kv, print_section, print_subsection},
    control::StateDiscretizer,
    ports::QTableRepository,
    q_learning::QTable,
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a saved Q-table")]
pub struct InspectArgs {
    /// Q-table file (`.txt`/`.tsv` for text, anything else for MessagePack)
    pub qtable: PathBuf,

    /// Discretization half-range in degrees, used to label the states
    #[arg(long, default_value_t = 90.0)]
    pub limit_degrees: f64,

    /// Also list states that were never updated
    #[arg(long, default_value_t = false)]
    pub all: bool,

    /// Print every Q-value of this state
    #[arg(long)]
    pub state: Option<usize>,
}

/// One line of the policy listing
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRow {
    pub state: usize,
    /// Lower edge of the state's bin (degrees)
    pub from_degrees: f64,
    pub action: usize,
    pub value: f64,
}

/// Greedy action for each listed state.
pub fn policy_rows(table: &QTable, discretizer: &StateDiscretizer, all: bool) -> Vec<PolicyRow> {
    let states = if all {
        (0..table.n_states()).collect()
    } else {
        table.visited_states()
    };

    states
        .into_iter()
        .map(|state| {
            let action = table.argmax_action(state);
            PolicyRow {
                state,
                from_degrees: discretizer.bin_start(state).to_degrees(),
                action,
                value: table.get(state, action),
            }
        })
        .collect()
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let app = App::new();
    let saved = app
        .repository_for(&args.qtable)
        .load(&args.qtable)
        .with_context(|| format!("Failed to load Q-table {}", args.qtable.display()))?;
    let table = saved.to_table()?;
    let discretizer = StateDiscretizer::new(table.n_states(), args.limit_degrees.to_radians())
        .context("Invalid --limit-degrees")?;

    print_section(&format!("Q-Table {}", args.qtable.display()));
    print_kv("Format version", &saved.version.to_string());
    print_kv("Shape", &format!("{} x {}", table.n_states(), table.n_actions()));
    print_kv(
        "Visited states",
        &format!("{}/{}", table.visited_states().len(), table.n_states()),
    );
    print_kv(
        "Episodes trained",
        &format_option(saved.metadata.episodes_trained),
    );
    print_kv(
        "Epsilon",
        &format_option(saved.metadata.epsilon.map(|e| format!("{e:.4}"))),
    );
    print_kv(
        "Target",
        &format_option(saved.metadata.target_degrees.map(|t| format!("{t:.2}°"))),
    );
    print_kv("Saved at", &format_option(saved.metadata.saved_at.as_deref()));

    let rows = policy_rows(&table, &discretizer, args.all);
    print_subsection("Greedy policy");
    if rows.is_empty() {
        println!("  (no state has been updated yet)");
    }
    for row in rows {
        println!(
            "  state {:>4}  from {:>8.2}°  action {:>2}  Q = {:.4}",
            row.state, row.from_degrees, row.action, row.value
        );
    }

    if let Some(state) = args.state {
        let row = table.checked_row(state)?;
        print_subsection(&format!(
            "State {state} (from {:.2}°)",
            discretizer.bin_start(state).to_degrees()
        ));
        for (action, value) in row.iter().enumerate() {
            print_kv(&format!("action {action}"), &format!("{value:.6}"));
        }
    }

    Ok(())
}
