//! Property-based tests for hmm-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use proptest::prelude::*;
use hmm_math::{argmax, check_stochastic, kl_divergence, log_normalize, log_sum_exp, normalize};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Helper to check approximate equality.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

fn positive_row() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1e-6..10.0f64, 1..12)
}

// ============================================================================
// log_sum_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// log_sum_exp is commutative: order doesn't matter.
    #[test]
    fn log_sum_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_sum_exp(&[a, b]);
        let ba = log_sum_exp(&[b, a]);
        prop_assert!(approx_eq(ab, ba, TOL), "lse([{},{}])={} != lse([{},{}])={}", a, b, ab, b, a, ba);
    }

    /// Grouping terms does not change the result.
    #[test]
    fn log_sum_exp_associative(a in -50.0..50.0f64, b in -50.0..50.0f64, c in -50.0..50.0f64) {
        let direct = log_sum_exp(&[a, b, c]);
        let grouped = log_sum_exp(&[log_sum_exp(&[a, b]), c]);
        prop_assert!(approx_eq(direct, grouped, TOL), "direct={} grouped={}", direct, grouped);
    }

    /// Very negative terms (long-sequence log probabilities) stay finite.
    #[test]
    fn log_sum_exp_no_underflow(a in -5000.0..-700.0f64, b in -5000.0..-700.0f64) {
        let result = log_sum_exp(&[a, b]);
        prop_assert!(result.is_finite(), "lse([{},{}]) = {}", a, b, result);
        prop_assert!(result >= a.max(b) - TOL);
        prop_assert!(result <= a.max(b) + 2.0f64.ln() + TOL);
    }

    /// Linear and log normalisation agree.
    #[test]
    fn normalize_matches_log_normalize(row in positive_row()) {
        let mut linear = row.clone();
        normalize(&mut linear);
        let mut logs: Vec<f64> = row.iter().map(|v| v.ln()).collect();
        log_normalize(&mut logs);
        for (p, lp) in linear.iter().zip(logs.iter()) {
            prop_assert!(approx_eq(*p, lp.exp(), 1e-9), "{} vs {}", p, lp.exp());
        }
        prop_assert!(check_stochastic(&linear, 1e-9).is_ok());
    }

    /// KL divergence is non-negative.
    #[test]
    fn kl_non_negative(p in positive_row(), shift in 0.0..1.0f64) {
        let mut p = p;
        normalize(&mut p);
        let mut q: Vec<f64> = p.iter().map(|v| v + shift).collect();
        normalize(&mut q);
        prop_assert!(kl_divergence(&p, &q) >= -1e-12);
    }

    /// argmax returns an index holding the maximum value.
    #[test]
    fn argmax_points_at_maximum(row in prop::collection::vec(-100.0..100.0f64, 1..20)) {
        let idx = argmax(&row);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(row[idx], max);
        prop_assert!(row[..idx].iter().all(|v| *v < max));
    }
}
