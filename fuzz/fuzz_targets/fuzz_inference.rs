//! Fuzz target for the scaled and log-space recursions.
//!
//! Builds a small model from raw weights (zeros allowed) and checks that
//! both implementations agree and never produce NaN.

#![no_main]

use arbitrary::Arbitrary;
use hmm_common::Implementation;
use hmm_core::inference::{forward_backward, viterbi, CategoricalHmm};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    n_states: u8,
    n_symbols: u8,
    weights: Vec<u8>,
    observations: Vec<u8>,
}

fn rows(weights: &mut impl Iterator<Item = u8>, n_rows: usize, width: usize) -> Vec<Vec<f64>> {
    (0..n_rows)
        .map(|_| {
            let mut row: Vec<f64> = (0..width)
                .map(|_| f64::from(weights.next().unwrap_or(1)))
                .collect();
            let total: f64 = row.iter().sum();
            if total == 0.0 {
                row = vec![1.0 / width as f64; width];
            } else {
                row.iter_mut().for_each(|v| *v /= total);
            }
            row
        })
        .collect()
}

fuzz_target!(|input: Input| {
    let n = usize::from(input.n_states % 4) + 1;
    let m = usize::from(input.n_symbols % 4) + 1;
    let mut weights = input.weights.into_iter().cycle().take(n + n * n + n * m);
    let start = rows(&mut weights, 1, n).remove(0);
    let trans = rows(&mut weights, n, n);
    let emission = rows(&mut weights, n, m);
    let obs: Vec<usize> = input
        .observations
        .iter()
        .take(256)
        .map(|&s| usize::from(s) % m)
        .collect();
    if obs.is_empty() {
        return;
    }

    let Ok(model) = CategoricalHmm::categorical(start, trans, emission, Implementation::Log) else {
        return;
    };
    let log = forward_backward(&model, &obs).expect("validated inputs");
    let scaled = forward_backward(&model.clone().with_implementation(Implementation::Scaling), &obs)
        .expect("validated inputs");
    assert!(!log.log_likelihood.is_nan() && !scaled.log_likelihood.is_nan());
    assert_eq!(log.is_degenerate(), scaled.is_degenerate());
    assert!(log.posteriors.iter().flatten().all(|p| p.is_finite()));

    let path = viterbi(&model, &obs).expect("validated inputs");
    assert!(!path.log_probability.is_nan());
    if log.is_degenerate() {
        assert_eq!(path.log_probability, f64::NEG_INFINITY);
    } else {
        let slack = 1e-6 * log.log_likelihood.abs().max(1.0);
        assert!(path.log_probability <= log.log_likelihood + slack);
    }
});
