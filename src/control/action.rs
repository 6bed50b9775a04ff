//! Discrete action set of signed angle adjustments

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Set of `n_actions` angular adjustments spaced `step` radians apart.
///
/// Action `a` moves the joint by `(a - (n_actions - 1) / 2) * step`. With an
/// odd count the middle action is "hold"; with an even count there is no
/// zero action and the set is offset by half a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionSpace {
    n_actions: usize,
    step: f64,
}

impl ActionSpace {
    pub fn new(n_actions: usize, step: f64) -> Result<Self> {
        if n_actions == 0 {
            return Err(Error::config("n_actions must be at least 1"));
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::config(format!(
                "action step must be positive and finite, got {step}"
            )));
        }
        Ok(Self { n_actions, step })
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Signed angular delta (radians) for `action`.
    pub fn delta(&self, action: usize) -> f64 {
        let center = (self.n_actions as f64 - 1.0) / 2.0;
        (action as f64 - center) * self.step
    }

    /// Index of the action with the largest positive delta.
    pub fn largest_increase(&self) -> usize {
        self.n_actions - 1
    }

    /// Index of the zero-delta action, if the set has one.
    pub fn hold(&self) -> Option<usize> {
        (self.n_actions % 2 == 1).then_some(self.n_actions / 2)
    }

    pub fn check(&self, action: usize) -> Result<usize> {
        if action < self.n_actions {
            Ok(action)
        } else {
            Err(Error::InvalidAction {
                action,
                n_actions: self.n_actions,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_actions() {
        let space = ActionSpace::new(3, 0.1).unwrap();
        assert!((space.delta(0) + 0.1).abs() < 1e-12);
        assert_eq!(space.delta(1), 0.0);
        assert!((space.delta(2) - 0.1).abs() < 1e-12);
        assert_eq!(space.hold(), Some(1));
    }

    #[test]
    fn test_five_actions_symmetric() {
        let space = ActionSpace::new(5, 0.1).unwrap();
        for a in 0..5 {
            assert!((space.delta(a) + space.delta(4 - a)).abs() < 1e-12);
        }
        assert!((space.delta(4) - 0.2).abs() < 1e-12);
        assert_eq!(space.largest_increase(), 4);
    }

    #[test]
    fn test_even_count_has_no_hold() {
        let space = ActionSpace::new(4, 0.2).unwrap();
        assert_eq!(space.hold(), None);
        assert!((space.delta(0) + 0.3).abs() < 1e-12);
        assert!((space.delta(3) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_check_rejects_out_of_range() {
        let space = ActionSpace::new(3, 0.1).unwrap();
        assert_eq!(space.check(2).unwrap(), 2);
        assert!(matches!(
            space.check(3),
            Err(Error::InvalidAction {
                action: 3,
                n_actions: 3
            })
        ));
    }
}
