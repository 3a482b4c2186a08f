//! Validation happens before any recursion runs.

use hmm_core::inference::{
    forward_backward, split_sequences, symbols_from_f64, symbols_from_i64, viterbi, CategoricalHmm,
};
use hmm_core::{DecodeAlgorithm, Diagnostic, Error, ErrorKind, Implementation};

fn model() -> CategoricalHmm {
    CategoricalHmm::categorical(
        vec![0.5, 0.5],
        vec![vec![0.9, 0.1], vec![0.2, 0.8]],
        vec![vec![0.7, 0.3], vec![0.4, 0.6]],
        Implementation::Scaling,
    )
    .unwrap()
}

#[test]
fn malformed_parameters_are_invalid_distributions() {
    let cases = [
        (vec![0.5, 0.6], vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![vec![1.0], vec![1.0]]),
        (vec![0.5, 0.5], vec![vec![1.0, 0.0]], vec![vec![1.0], vec![1.0]]),
        (vec![0.5, 0.5], vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![vec![1.0]]),
        (vec![0.5, 0.5], vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![vec![1.0], vec![0.5, 0.5]]),
        (vec![f64::NAN, 1.0], vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![vec![1.0], vec![1.0]]),
    ];
    for (start, trans, emission) in cases {
        let err = CategoricalHmm::categorical(start, trans, emission, Implementation::Log).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDistribution, "{err}");
    }
}

#[test]
fn empty_sequence_is_rejected() {
    let model = model();
    assert!(matches!(forward_backward(&model, &[]), Err(Error::EmptySequence)));
    assert!(matches!(viterbi(&model, &[]), Err(Error::EmptySequence)));
    assert!(matches!(model.score(&[]), Err(Error::EmptySequence)));
}

#[test]
fn out_of_range_symbol_names_its_position() {
    let model = model();
    let err = forward_backward(&model, &[0, 1, 2]).unwrap_err();
    assert!(matches!(
        err,
        Error::SymbolOutOfRange {
            position: 2,
            symbol: 2,
            n_symbols: 2
        }
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidObservation);
}

#[test]
fn one_bad_sequence_fails_the_whole_batch() {
    let model = model();
    let batch: Vec<&[usize]> = vec![&[0, 1], &[5]];
    let err = model.decode(&batch, DecodeAlgorithm::Map).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidObservation);
}

#[test]
fn raw_symbols_must_be_non_negative_integers() {
    assert!(matches!(
        symbols_from_f64(&[0.0, 1.0, 2.5]),
        Err(Error::NonIntegralSymbol { position: 2, .. })
    ));
    assert!(matches!(
        symbols_from_f64(&[0.0, -1.0]),
        Err(Error::NegativeSymbol { position: 1, .. })
    ));
    assert!(matches!(
        symbols_from_i64(&[3, -2]),
        Err(Error::NegativeSymbol { position: 1, .. })
    ));
    assert_eq!(symbols_from_f64(&[0.0, 3.0]).unwrap(), vec![0, 3]);
}

#[test]
fn lengths_must_cover_the_input() {
    let x = [0usize, 1, 1, 0];
    assert!(matches!(split_sequences(&x, Some(&[3][..])), Err(Error::InvalidLengths(_))));
    assert!(matches!(split_sequences(&x, Some(&[4, 0][..])), Err(Error::InvalidLengths(_))));
    assert_eq!(split_sequences(&x, Some(&[1, 3][..])).unwrap().len(), 2);
}

#[test]
fn impossible_sequence_is_a_diagnostic_not_an_error() {
    let model = CategoricalHmm::categorical(
        vec![1.0, 0.0],
        vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        Implementation::Log,
    )
    .unwrap();
    let batch: Vec<&[usize]> = vec![&[0, 0], &[0, 1]];
    let scored = model.score_samples(&batch).unwrap();
    assert_eq!(scored.log_likelihood, f64::NEG_INFINITY);
    assert_eq!(scored.diagnostics, vec![Diagnostic::ZeroLikelihood { sequence: 1 }]);
    assert!(scored.posteriors[2..].iter().flatten().all(|p| *p == 0.0));
}
