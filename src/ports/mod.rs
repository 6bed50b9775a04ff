//! Ports (trait boundaries) for external dependencies.
//!
//! This module defines the interfaces between the learning core and
//! infrastructure. Following hexagonal architecture, these traits are owned
//! by the core and implemented by adapters.

pub mod actuator;
pub mod observer;
pub mod repository;

pub use actuator::{Actuator, JointBus};
pub use observer::Observer;
pub use repository::{LoadedTable, QTableRepository, load_or_init};
