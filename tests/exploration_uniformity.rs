//! Statistical checks of ε-greedy action selection

use jointq::q_learning::{ActionPolicy, EpsilonGreedy, QTable};
use statrs::distribution::{ChiSquared, ContinuousCDF};

const SAMPLES: usize = 20_000;

fn counts(policy: &mut EpsilonGreedy, table: &QTable, state: usize, epsilon: f64) -> Vec<usize> {
    let mut counts = vec![0usize; table.n_actions()];
    for _ in 0..SAMPLES {
        counts[policy.select(state, table, epsilon)] += 1;
    }
    counts
}

fn chi_squared_p_value(observed: &[usize], expected: &[f64]) -> f64 {
    let statistic: f64 = observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| (o as f64 - e).powi(2) / e)
        .sum();
    let dof = (observed.len() - 1) as f64;
    1.0 - ChiSquared::new(dof).unwrap().cdf(statistic)
}

#[test]
fn test_full_exploration_is_uniform() {
    let mut table = QTable::zeros(10, 5);
    // A strongly preferred action must not bias pure exploration.
    table.set(3, 4, 10.0);

    let mut policy = EpsilonGreedy::with_seed(17);
    let observed = counts(&mut policy, &table, 3, 1.0);
    let expected = vec![SAMPLES as f64 / 5.0; 5];

    let p = chi_squared_p_value(&observed, &expected);
    assert!(p > 0.001, "counts {observed:?} look non-uniform (p = {p})");
}

#[test]
fn test_partial_exploration_mixes_greedy_and_uniform() {
    let epsilon = 0.3;
    let mut table = QTable::zeros(10, 5);
    table.set(6, 1, 2.0);

    let mut policy = EpsilonGreedy::with_seed(99);
    let observed = counts(&mut policy, &table, 6, epsilon);

    // Greedy mass (1 - ε) lands on action 1; ε is spread over all five.
    let uniform = epsilon * SAMPLES as f64 / 5.0;
    let expected: Vec<f64> = (0..5)
        .map(|a| {
            if a == 1 {
                (1.0 - epsilon) * SAMPLES as f64 + uniform
            } else {
                uniform
            }
        })
        .collect();

    let p = chi_squared_p_value(&observed, &expected);
    assert!(p > 0.001, "counts {observed:?} deviate from {expected:?} (p = {p})");
}

#[test]
fn test_no_exploration_is_greedy() {
    let mut table = QTable::zeros(10, 3);
    table.set(2, 0, -1.0);
    table.set(2, 1, -0.5);
    table.set(2, 2, -2.0);

    let mut policy = EpsilonGreedy::with_seed(5);
    let observed = counts(&mut policy, &table, 2, 0.0);
    assert_eq!(observed, vec![0, SAMPLES, 0]);
}
