//! Probability representations shared by every recursion.
//!
//! The forward-backward pass, the Viterbi decoder and the transition-count
//! accumulation are written once against [`ProbabilitySpace`]. Two
//! implementations exist:
//!
//! - [`Scaled`]: values are plain probabilities. Each forward row is divided
//!   by its sum and the log of that sum is kept, so the true log-likelihood is
//!   the sum of the per-step log scales.
//! - [`LogSpace`]: values are log-probabilities. Products become sums and
//!   marginals become log-sum-exp; no per-step bookkeeping is needed.
//!
//! Given the same model and sequence both must agree on the log-likelihood
//! (within floating-point tolerance) and on every decoded path.

use hmm_math::{log_normalize, log_sum_exp, normalize, safe_ln};

/// Arithmetic contract satisfied by both representations.
pub trait ProbabilitySpace {
    /// Short name used in logs.
    const NAME: &'static str;

    /// Additive identity (an impossible event).
    fn zero() -> f64;

    /// Map a probability into this representation.
    fn from_prob(p: f64) -> f64;

    /// Map a value back to a probability.
    fn to_prob(v: f64) -> f64;

    /// Map a value to a log-probability.
    fn to_log(v: f64) -> f64;

    /// Product of two probabilities.
    fn combine(a: f64, b: f64) -> f64;

    /// Sum of probabilities.
    fn marginalize(terms: &[f64]) -> f64;

    /// Convert a row of log-probabilities in place.
    ///
    /// Returns a log offset that was factored out of the row and must be added
    /// back to any log-likelihood computed from it.
    fn from_log_row(row: &mut [f64]) -> f64;

    /// Per-step stabilisation of a forward or Viterbi row.
    ///
    /// Returns the log of the factor removed from the row (0 when nothing was
    /// removed, -inf when the row holds no mass).
    fn rescale(row: &mut [f64]) -> f64;

    /// Apply a factor previously returned by [`ProbabilitySpace::rescale`]
    /// to another row.
    fn unscale(row: &mut [f64], log_factor: f64);

    /// Make the row a distribution. Returns the log of the removed total
    /// (-inf when the row holds no mass, in which case it is left untouched).
    fn normalize(row: &mut [f64]) -> f64;
}

/// Plain probabilities with per-step normalisation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scaled;

/// Log-probabilities with log-sum-exp marginalisation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpace;

impl ProbabilitySpace for Scaled {
    const NAME: &'static str = "scaling";

    fn zero() -> f64 {
        0.0
    }

    fn from_prob(p: f64) -> f64 {
        p
    }

    fn to_prob(v: f64) -> f64 {
        v
    }

    fn to_log(v: f64) -> f64 {
        safe_ln(v)
    }

    fn combine(a: f64, b: f64) -> f64 {
        a * b
    }

    fn marginalize(terms: &[f64]) -> f64 {
        terms.iter().sum()
    }

    fn from_log_row(row: &mut [f64]) -> f64 {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let offset = if max.is_finite() { max } else { 0.0 };
        for v in row.iter_mut() {
            *v = (*v - offset).exp();
        }
        offset
    }

    fn rescale(row: &mut [f64]) -> f64 {
        Self::normalize(row)
    }

    fn unscale(row: &mut [f64], log_factor: f64) {
        if log_factor.is_finite() {
            let factor = log_factor.exp();
            for v in row.iter_mut() {
                *v /= factor;
            }
        }
    }

    fn normalize(row: &mut [f64]) -> f64 {
        let sum = normalize(row);
        if sum > 0.0 && sum.is_finite() {
            sum.ln()
        } else {
            f64::NEG_INFINITY
        }
    }
}

impl ProbabilitySpace for LogSpace {
    const NAME: &'static str = "log";

    fn zero() -> f64 {
        f64::NEG_INFINITY
    }

    fn from_prob(p: f64) -> f64 {
        safe_ln(p)
    }

    fn to_prob(v: f64) -> f64 {
        v.exp()
    }

    fn to_log(v: f64) -> f64 {
        v
    }

    fn combine(a: f64, b: f64) -> f64 {
        a + b
    }

    fn marginalize(terms: &[f64]) -> f64 {
        log_sum_exp(terms)
    }

    fn from_log_row(_row: &mut [f64]) -> f64 {
        0.0
    }

    fn rescale(_row: &mut [f64]) -> f64 {
        0.0
    }

    fn unscale(_row: &mut [f64], _log_factor: f64) {}

    fn normalize(row: &mut [f64]) -> f64 {
        log_normalize(row)
    }
}
