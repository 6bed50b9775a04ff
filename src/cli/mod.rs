//! CLI infrastructure for the joint controller
//!
//! This module provides the command-line interface for training a joint
//! against a simulated backend and inspecting saved Q-tables.

pub mod commands;
pub mod output;
