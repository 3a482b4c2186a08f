//! Numerically stable primitives for log-domain recursions.
//!
//! Forward, backward and Viterbi recursions over long sequences multiply
//! thousands of probabilities. These helpers keep that arithmetic in the log
//! domain without losing precision when terms differ by hundreds of nats.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Natural log that maps an exact zero to NEG_INFINITY.
///
/// Negative and NaN inputs yield NaN.
pub fn safe_ln(p: f64) -> f64 {
    if p == 0.0 {
        f64::NEG_INFINITY
    } else if p > 0.0 {
        p.ln()
    } else {
        f64::NAN
    }
}

/// Index and value of the maximum element.
///
/// Ties resolve to the lowest index. NaN entries never win. Returns `None`
/// for an empty slice; an all -inf (or all NaN) slice yields index 0.
pub fn max_with_index(values: &[f64]) -> Option<(usize, f64)> {
    let first = *values.first()?;
    let mut best_idx = 0;
    let mut best = if first.is_nan() { f64::NEG_INFINITY } else { first };
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > best {
            best = v;
            best_idx = i;
        }
    }
    Some((best_idx, best))
}

/// Lowest index of the maximum element, 0 for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    max_with_index(values).map(|(i, _)| i).unwrap_or(0)
}
