//! Dense Q-table for temporal difference learning

use crate::{Error, Result};

/// Q-table mapping (state, action) pairs to Q-values
///
/// Values are stored row-major in a single `Vec<f64>` of exactly
/// `n_states * n_actions` entries. Unseen tables start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

impl QTable {
    /// Create a zero-initialized table
    pub fn zeros(n_states: usize, n_actions: usize) -> Self {
        Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        }
    }

    /// Build a table from row-major values, validating the shape and entries.
    pub fn from_values(n_states: usize, n_actions: usize, values: Vec<f64>) -> Result<Self> {
        if n_states == 0 || n_actions == 0 {
            return Err(Error::config(format!(
                "Q-table dimensions must be non-zero, got ({n_states}, {n_actions})"
            )));
        }
        if values.len() != n_states * n_actions {
            return Err(Error::SerializationContext {
                operation: "build Q-table".to_string(),
                message: format!(
                    "expected {} values for shape ({n_states}, {n_actions}), got {}",
                    n_states * n_actions,
                    values.len()
                ),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::SerializationContext {
                operation: "build Q-table".to_string(),
                message: format!(
                    "non-finite value at state {}, action {}",
                    index / n_actions,
                    index % n_actions
                ),
            });
        }
        Ok(Self {
            n_states,
            n_actions,
            values,
        })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_states, self.n_actions)
    }

    /// Fail with [`Error::ShapeMismatch`] unless the table has the given shape.
    pub fn ensure_shape(&self, n_states: usize, n_actions: usize) -> Result<()> {
        if self.shape() == (n_states, n_actions) {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                expected_states: n_states,
                expected_actions: n_actions,
                found_states: self.n_states,
                found_actions: self.n_actions,
            })
        }
    }

    /// Row-major view of every value
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// All Q-values for `state`
    ///
    /// Panics if `state` is out of range.
    pub fn row(&self, state: usize) -> &[f64] {
        let start = state * self.n_actions;
        &self.values[start..start + self.n_actions]
    }

    /// All Q-values for `state`, or [`Error::InvalidState`] if out of range
    pub fn checked_row(&self, state: usize) -> Result<&[f64]> {
        if state >= self.n_states {
            return Err(Error::InvalidState {
                state,
                n_states: self.n_states,
            });
        }
        Ok(self.row(state))
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.row(state)[action]
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        let index = state * self.n_actions + action;
        self.values[index] = value;
    }

    /// Maximum Q-value in a state
    pub fn max_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action for a state
    ///
    /// Ties resolve to the lowest action index, so an all-zero row picks
    /// action 0.
    pub fn argmax_action(&self, state: usize) -> usize {
        let row = self.row(state);
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        best
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← (1-α)·Q(s,a) + α·(r + γ·max_a' Q(s',a'))
    pub fn update(
        &mut self,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
        learning_rate: f64,
        discount_factor: f64,
    ) {
        let current_q = self.get(state, action);
        let td_target = reward + discount_factor * self.max_value(next_state);
        let new_q = (1.0 - learning_rate) * current_q + learning_rate * td_target;
        self.set(state, action, new_q);
    }

    /// Greedy action for every state
    pub fn greedy_policy(&self) -> Vec<usize> {
        (0..self.n_states).map(|s| self.argmax_action(s)).collect()
    }

    /// States with at least one non-zero Q-value
    pub fn visited_states(&self) -> Vec<usize> {
        (0..self.n_states)
            .filter(|&s| self.row(s).iter().any(|&v| v != 0.0))
            .collect()
    }

    /// Reset all Q-values to zero
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qtable_initialization() {
        let qtable = QTable::zeros(10, 3);
        assert_eq!(qtable.shape(), (10, 3));
        assert_eq!(qtable.values().len(), 30);
        assert!(qtable.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_qtable_set_get() {
        let mut qtable = QTable::zeros(10, 3);
        qtable.set(4, 2, 1.5);
        assert_eq!(qtable.get(4, 2), 1.5);
        assert_eq!(qtable.get(4, 1), 0.0);
        assert_eq!(qtable.row(4), &[0.0, 0.0, 1.5]);
    }

    #[test]
    fn test_max_value_and_argmax() {
        let mut qtable = QTable::zeros(2, 3);
        qtable.set(0, 0, -0.5);
        qtable.set(0, 1, -0.1);
        qtable.set(0, 2, -0.8);

        assert_eq!(qtable.max_value(0), -0.1);
        assert_eq!(qtable.argmax_action(0), 1);
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        let mut qtable = QTable::zeros(2, 5);
        assert_eq!(qtable.argmax_action(0), 0);

        qtable.set(1, 1, 0.4);
        qtable.set(1, 3, 0.4);
        assert_eq!(qtable.argmax_action(1), 1);
    }

    #[test]
    fn test_update_rule() {
        let mut qtable = QTable::zeros(3, 2);
        qtable.set(0, 1, 1.0);
        qtable.set(2, 0, 0.5);
        qtable.set(2, 1, 2.0);

        qtable.update(0, 1, -0.3, 2, 0.2, 0.9);

        // (1 - 0.2) * 1.0 + 0.2 * (-0.3 + 0.9 * 2.0) = 0.8 + 0.3 = 1.1
        assert!((qtable.get(0, 1) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_update_with_unit_learning_rate_replaces_value() {
        let mut qtable = QTable::zeros(3, 2);
        qtable.set(0, 0, 42.0);
        qtable.set(1, 0, -1.0);
        qtable.set(1, 1, -0.25);

        qtable.update(0, 0, -0.5, 1, 1.0, 0.9);

        assert_eq!(qtable.get(0, 0), -0.5 + 0.9 * -0.25);
    }

    #[test]
    fn test_update_self_transition_uses_old_row() {
        let mut qtable = QTable::zeros(1, 2);
        qtable.set(0, 0, 1.0);
        qtable.update(0, 1, 0.0, 0, 0.5, 1.0);
        assert!((qtable.get(0, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_values_validates() {
        assert!(QTable::from_values(2, 2, vec![0.0; 4]).is_ok());
        assert!(QTable::from_values(2, 2, vec![0.0; 3]).is_err());
        assert!(QTable::from_values(0, 2, vec![]).is_err());
        assert!(QTable::from_values(1, 2, vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_ensure_shape() {
        let qtable = QTable::zeros(50, 5);
        assert!(qtable.ensure_shape(50, 5).is_ok());
        assert!(matches!(
            qtable.ensure_shape(100, 5),
            Err(Error::ShapeMismatch {
                expected_states: 100,
                found_states: 50,
                ..
            })
        ));
    }

    #[test]
    fn test_checked_row() {
        let mut table = QTable::zeros(4, 2);
        table.set(3, 1, 0.5);
        assert_eq!(table.checked_row(3).unwrap(), &[0.0, 0.5]);
        assert!(matches!(
            table.checked_row(4),
            Err(Error::InvalidState {
                state: 4,
                n_states: 4
            })
        ));
    }

    #[test]
    fn test_visited_states_and_policy() {
        let mut qtable = QTable::zeros(4, 3);
        qtable.set(1, 2, -0.1);
        qtable.set(3, 0, 0.2);

        assert_eq!(qtable.visited_states(), vec![1, 3]);
        assert_eq!(qtable.greedy_policy(), vec![0, 0, 0, 0]);

        qtable.reset();
        assert!(qtable.visited_states().is_empty());
    }
}
