//! Tabular Q-learning
//!
//! This module holds the learned state of the controller and the rules that
//! read and write it:
//!
//! - [`QTable`]: dense `(n_states, n_actions)` value table with the
//!   off-policy TD update
//! - [`ActionPolicy`]: action selection given a table and an exploration
//!   rate ([`EpsilonGreedy`], [`Greedy`], [`FixedAction`])
//! - [`EpsilonSchedule`]: per-episode geometric decay of the exploration rate
//! - [`SavedQTable`]: versioned on-disk envelope
//!
//! ## Update rule
//!
//! | Term | Meaning |
//! |------|---------|
//! | α | learning rate, weight of the new estimate |
//! | γ | discount factor on the best next-state value |
//! | target | `r + γ·max_a' Q(s',a')` |
//!
//! `Q(s,a) ← (1-α)·Q(s,a) + α·target`
//!
//! ## Usage Example
//!
//! ```
//! use jointq::q_learning::{ActionPolicy, EpsilonGreedy, EpsilonSchedule, QTable};
//!
//! let mut table = QTable::zeros(10, 3);
//! let mut policy = EpsilonGreedy::with_seed(42);
//! let mut schedule = EpsilonSchedule::new(0.2, 0.995, 0.01);
//!
//! let action = policy.select(5, &table, schedule.value());
//! table.update(5, action, -0.3, 6, 0.2, 0.9);
//! schedule.decay();
//! ```

pub mod policy;
pub mod q_table;
pub mod serialization;

// Public re-exports
pub use policy::{ActionPolicy, EpsilonGreedy, EpsilonSchedule, FixedAction, Greedy};
pub use q_table::QTable;
pub use serialization::{SavedQTable, TableMetadata};
