//! Probability-simplex helpers: normalisation, validation and divergence.

use crate::math::stable::{log_sum_exp, safe_ln};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tolerance when checking that a row sums to one.
pub const DEFAULT_SUM_TOLERANCE: f64 = 1e-6;

/// Why a vector failed to be a probability distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimplexViolation {
    /// The vector has no entries.
    Empty,
    /// An entry is NaN or infinite.
    NonFinite { index: usize, value: f64 },
    /// An entry is below zero.
    Negative { index: usize, value: f64 },
    /// The entries do not sum to one within tolerance.
    NotNormalized { sum: f64 },
}

impl fmt::Display for SimplexViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimplexViolation::Empty => write!(f, "distribution is empty"),
            SimplexViolation::NonFinite { index, value } => {
                write!(f, "entry {} is not finite ({})", index, value)
            }
            SimplexViolation::Negative { index, value } => {
                write!(f, "entry {} is negative ({})", index, value)
            }
            SimplexViolation::NotNormalized { sum } => {
                write!(f, "entries sum to {}, expected 1.0", sum)
            }
        }
    }
}

/// Check that `row` is a probability vector: finite, non-negative, sums to 1.
pub fn check_stochastic(row: &[f64], tolerance: f64) -> Result<(), SimplexViolation> {
    if row.is_empty() {
        return Err(SimplexViolation::Empty);
    }
    for (index, &value) in row.iter().enumerate() {
        if !value.is_finite() {
            return Err(SimplexViolation::NonFinite { index, value });
        }
        if value < 0.0 {
            return Err(SimplexViolation::Negative { index, value });
        }
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(SimplexViolation::NotNormalized { sum });
    }
    Ok(())
}

/// Divide `row` by its sum in place.
///
/// Returns the sum. A row summing to zero (or to a non-finite value) is left
/// untouched so the caller can decide on a fallback.
pub fn normalize(row: &mut [f64]) -> f64 {
    let sum: f64 = row.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for v in row.iter_mut() {
            *v /= sum;
        }
    }
    sum
}

/// Subtract log_sum_exp(row) from every entry in place.
///
/// Returns the log normaliser. An all -inf row is left untouched and
/// NEG_INFINITY is returned.
pub fn log_normalize(row: &mut [f64]) -> f64 {
    let lse = log_sum_exp(row);
    if lse.is_finite() {
        for v in row.iter_mut() {
            *v -= lse;
        }
    }
    lse
}

/// A uniform distribution over `n` outcomes.
pub fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

/// Kullback-Leibler divergence KL(p || q) in nats.
///
/// Terms with `p[i] == 0` contribute nothing; `q[i] == 0` where `p[i] > 0`
/// makes the divergence infinite.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q.iter())
        .filter(|(&pi, _)| pi > 0.0)
        .map(|(&pi, &qi)| pi * (pi.ln() - safe_ln(qi)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_accepts_valid_row() {
        assert!(check_stochastic(&[0.25, 0.75], DEFAULT_SUM_TOLERANCE).is_ok());
    }

    #[test]
    fn check_rejects_negative_entry() {
        let err = check_stochastic(&[1.2, -0.2], DEFAULT_SUM_TOLERANCE).unwrap_err();
        assert_eq!(
            err,
            SimplexViolation::Negative {
                index: 1,
                value: -0.2
            }
        );
    }

    #[test]
    fn check_rejects_bad_sum_and_empty() {
        assert!(matches!(
            check_stochastic(&[0.2, 0.2], DEFAULT_SUM_TOLERANCE),
            Err(SimplexViolation::NotNormalized { .. })
        ));
        assert_eq!(
            check_stochastic(&[], DEFAULT_SUM_TOLERANCE),
            Err(SimplexViolation::Empty)
        );
        assert!(matches!(
            check_stochastic(&[f64::NAN, 1.0], DEFAULT_SUM_TOLERANCE),
            Err(SimplexViolation::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn normalize_scales_to_one() {
        let mut row = [1.0, 3.0];
        let sum = normalize(&mut row);
        assert_eq!(sum, 4.0);
        assert_eq!(row, [0.25, 0.75]);
    }

    #[test]
    fn normalize_leaves_zero_row() {
        let mut row = [0.0, 0.0];
        assert_eq!(normalize(&mut row), 0.0);
        assert_eq!(row, [0.0, 0.0]);
    }

    #[test]
    fn log_normalize_matches_linear() {
        let mut row = [1.0f64.ln(), 3.0f64.ln()];
        log_normalize(&mut row);
        assert!((row[0].exp() - 0.25).abs() < 1e-12);
        assert!((row[1].exp() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn kl_of_identical_is_zero() {
        let p = [0.1, 0.4, 0.5];
        assert!(kl_divergence(&p, &p).abs() < 1e-15);
        assert!(kl_divergence(&p, &[0.5, 0.5, 0.0]).is_infinite());
    }

    #[test]
    fn uniform_sums_to_one() {
        let u = uniform(3);
        assert!(check_stochastic(&u, 1e-12).is_ok());
        assert!(uniform(0).is_empty());
    }
}
