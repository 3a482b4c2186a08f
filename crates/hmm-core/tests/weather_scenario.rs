//! The two-state weather model (Rainy/Sunny emitting walk/shop/clean),
//! checked end to end under both arithmetic implementations.

use hmm_core::inference::{forward_backward, map_decode, viterbi, CategoricalHmm};
use hmm_core::{DecodeAlgorithm, Implementation};

const RAINY: usize = 0;
const SUNNY: usize = 1;
const WALK: usize = 0;
const SHOP: usize = 1;
const CLEAN: usize = 2;

fn weather(implementation: Implementation) -> CategoricalHmm {
    CategoricalHmm::categorical(
        vec![0.6, 0.4],
        vec![vec![0.7, 0.3], vec![0.4, 0.6]],
        vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
        implementation,
    )
    .expect("weather model is valid")
}

/// Posteriors worked out by hand from alpha = [.06 .24], [.0552 .0486],
/// [.02904 .004572] and beta = [.1298 .1076], [.38 .26], [1 1].
fn expected_posteriors() -> Vec<[f64; 2]> {
    let total = 0.033612;
    vec![
        [0.06 * 0.1298 / total, 0.24 * 0.1076 / total],
        [0.0552 * 0.38 / total, 0.0486 * 0.26 / total],
        [0.02904 / total, 0.004572 / total],
    ]
}

#[test]
fn likelihood_matches_hand_computation() {
    for implementation in Implementation::ALL {
        let model = weather(implementation);
        let pass = forward_backward(&model, &[WALK, SHOP, CLEAN]).unwrap();
        assert!(
            (pass.log_likelihood - 0.033612f64.ln()).abs() < 1e-9,
            "{implementation}: {}",
            pass.log_likelihood
        );
        assert!(!pass.is_degenerate());
    }
}

#[test]
fn posteriors_match_hand_computation() {
    for implementation in Implementation::ALL {
        let model = weather(implementation);
        let pass = forward_backward(&model, &[WALK, SHOP, CLEAN]).unwrap();
        for (row, expected) in pass.posteriors.iter().zip(expected_posteriors()) {
            assert!((row[RAINY] - expected[RAINY]).abs() < 1e-9, "{implementation}: {row:?}");
            assert!((row[SUNNY] - expected[SUNNY]).abs() < 1e-9, "{implementation}: {row:?}");
        }
    }
}

#[test]
fn viterbi_picks_sunny_then_rain() {
    for implementation in Implementation::ALL {
        let model = weather(implementation);
        let path = viterbi(&model, &[WALK, SHOP, CLEAN]).unwrap();
        assert_eq!(path.states, vec![SUNNY, RAINY, RAINY]);
        assert!((path.log_probability - 0.01344f64.ln()).abs() < 1e-9);
    }
}

#[test]
fn map_decoding_agrees_with_posteriors() {
    for implementation in Implementation::ALL {
        let model = weather(implementation);
        let path = map_decode(&model, &[WALK, SHOP, CLEAN]).unwrap();
        assert_eq!(path.states, vec![SUNNY, RAINY, RAINY]);
        assert!((path.log_likelihood - 0.033612f64.ln()).abs() < 1e-9);
    }
}

#[test]
fn batch_entry_points_concatenate_results() {
    let model = weather(Implementation::Log);
    let batch: Vec<&[usize]> = vec![&[WALK, SHOP, CLEAN], &[CLEAN]];

    let score = model.score(&batch).unwrap();
    let clean_alone = 0.6 * 0.5 + 0.4 * 0.1;
    assert!((score - (0.033612f64.ln() + f64::ln(clean_alone))).abs() < 1e-9);

    let decoded = model.decode(&batch, DecodeAlgorithm::Viterbi).unwrap();
    assert_eq!(decoded.states, vec![SUNNY, RAINY, RAINY, RAINY]);
    assert!(decoded.diagnostics.is_empty());

    let proba = model.predict_proba(&batch).unwrap();
    assert_eq!(proba.len(), 4);
    assert!((proba[3][RAINY] - 0.3 / clean_alone).abs() < 1e-9);
}
