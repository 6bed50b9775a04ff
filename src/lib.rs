//! Tabular Q-learning controller for a single actuator joint
//!
//! This crate provides:
//! - Angle discretization, discrete angle-delta actions and distance reward
//! - A dense Q-table with the one-step Q-learning update and ε-greedy
//!   exploration with multiplicative decay
//! - A training loop that persists the table after every episode and stops
//!   on convergence, budget exhaustion or an external request
//! - Actuator ports with simulated single-joint and humanoid-bus backends
//! - MessagePack and text Q-table repositories and a CSV episode log

pub mod adapters;
pub mod app;
pub mod cli;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod types;

pub use error::{Error, Result};
