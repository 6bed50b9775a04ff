//! Adapters implementing domain ports.
//!
//! This module contains infrastructure implementations of the traits defined
//! in the ports module. Following hexagonal architecture, adapters depend on
//! domain ports, not the other way around.

pub mod in_memory_repository;
pub mod joint_bus_actuator;
pub mod msgpack_repository;
pub mod simulated;
pub mod text_repository;

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

pub use in_memory_repository::InMemoryRepository;
pub use joint_bus_actuator::{HoldPolicy, JointBusActuator};
pub use msgpack_repository::MsgPackRepository;
pub use simulated::{SimulatedJoint, SimulatedJointBus, SimulationConfig};
pub use text_repository::TextRepository;

use crate::ports::QTableRepository;

/// Pick a file repository from the extension of `path`.
///
/// `.txt` and `.tsv` use [`TextRepository`]; anything else uses
/// [`MsgPackRepository`].
pub fn repository_for_path(path: &Path) -> Box<dyn QTableRepository + Sync> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("txt") | Some("tsv") => Box::new(TextRepository::new()),
        _ => Box::new(MsgPackRepository::new()),
    }
}

/// Sibling file a save is written to before being renamed onto `path`.
pub(crate) fn scratch_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
