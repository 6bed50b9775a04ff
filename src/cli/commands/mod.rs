//! Subcommands of the `jointq` binary

pub mod inspect;
pub mod train;
