//! Linear discretization of a joint angle into a finite state index

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maps a continuous joint angle to a bucket in `[0, n_states)`.
///
/// The half-range `limit` is split into `n_states` equal-width bins covering
/// `[-limit, +limit]`. Bin boundaries round down; anything outside the range
/// (floating-point drift, a joint pushed past its soft limit) clamps to the
/// nearest extreme bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateDiscretizer {
    n_states: usize,
    limit: f64,
}

impl StateDiscretizer {
    /// Create a discretizer over `[-limit, +limit]` with `n_states` bins.
    pub fn new(n_states: usize, limit: f64) -> Result<Self> {
        if n_states == 0 {
            return Err(Error::config("n_states must be at least 1"));
        }
        if !limit.is_finite() || limit <= 0.0 {
            return Err(Error::config(format!(
                "discretization limit must be positive and finite, got {limit}"
            )));
        }
        Ok(Self { n_states, limit })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Discretize `angle` (radians) into a state index.
    ///
    /// NaN maps to state 0.
    pub fn discretize(&self, angle: f64) -> usize {
        let scaled = (angle + self.limit) / (2.0 * self.limit) * self.n_states as f64;
        if scaled.is_nan() || scaled <= 0.0 {
            return 0;
        }
        // `as` saturates for +inf and huge values
        (scaled.floor() as usize).min(self.n_states - 1)
    }

    /// Lower edge (radians) of the bin for `state`.
    pub fn bin_start(&self, state: usize) -> f64 {
        let width = 2.0 * self.limit / self.n_states as f64;
        -self.limit + width * state.min(self.n_states - 1) as f64
    }
}
