//! Categorical (discrete symbol) emissions.
//!
//! `emissionprob[i][k]` is the probability of emitting symbol `k` while in
//! state `i`. The number of symbols is the row width and is fixed once the
//! model exists: either pre-set by the caller or derived from the first
//! training data (see [`resolve_n_symbols`]).

use crate::inference::emission::{EmissionModel, SampleEmission, TrainableEmission};
use hmm_common::{EmptyStatePolicy, Error, Result};
use hmm_math::{check_stochastic, normalize, uniform, DEFAULT_SUM_TOLERANCE};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Categorical emission matrix, one distribution over symbols per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Categorical {
    emissionprob: Vec<Vec<f64>>,
}

/// Expected emission counts, `counts[i][k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalStats {
    pub counts: Vec<Vec<f64>>,
}

impl Categorical {
    /// Build from a row-stochastic matrix, validating shape and rows.
    pub fn new(emissionprob: Vec<Vec<f64>>) -> Result<Self> {
        let model = Self { emissionprob };
        model.validate()?;
        Ok(model)
    }

    pub(crate) fn from_rows_unchecked(emissionprob: Vec<Vec<f64>>) -> Self {
        Self { emissionprob }
    }

    /// Every state emits every symbol with equal probability.
    pub fn uniform(n_states: usize, n_symbols: usize) -> Self {
        Self {
            emissionprob: vec![uniform(n_symbols); n_states],
        }
    }

    /// Random rows drawn uniformly from [0, 1) and normalised.
    pub fn random<R: Rng + ?Sized>(n_states: usize, n_symbols: usize, rng: &mut R) -> Self {
        let emissionprob = (0..n_states)
            .map(|_| {
                let mut row: Vec<f64> = (0..n_symbols).map(|_| rng.random::<f64>()).collect();
                if normalize(&mut row) <= 0.0 {
                    row = uniform(n_symbols);
                }
                row
            })
            .collect();
        Self { emissionprob }
    }

    /// Number of distinct symbols.
    pub fn n_symbols(&self) -> usize {
        self.emissionprob.first().map(Vec::len).unwrap_or(0)
    }

    /// Full emission distribution of one state.
    pub fn row(&self, state: usize) -> &[f64] {
        &self.emissionprob[state]
    }

    pub fn emissionprob(&self) -> &[Vec<f64>] {
        &self.emissionprob
    }

    pub fn into_inner(self) -> Vec<Vec<f64>> {
        self.emissionprob
    }
}

impl EmissionModel for Categorical {
    type Symbol = usize;

    fn n_states(&self) -> usize {
        self.emissionprob.len()
    }

    fn probability(&self, state: usize, symbol: &usize) -> f64 {
        self.emissionprob[state][*symbol]
    }

    fn validate(&self) -> Result<()> {
        let n_symbols = self.n_symbols();
        if self.emissionprob.is_empty() || n_symbols == 0 {
            return Err(Error::shape(
                "emissionprob",
                "at least one state and one symbol",
                format!("{} x {}", self.emissionprob.len(), n_symbols),
            ));
        }
        for (i, row) in self.emissionprob.iter().enumerate() {
            if row.len() != n_symbols {
                return Err(Error::shape(
                    format!("emissionprob[{}]", i),
                    format!("{} symbols", n_symbols),
                    format!("{} symbols", row.len()),
                ));
            }
            check_stochastic(row, DEFAULT_SUM_TOLERANCE)
                .map_err(|v| Error::distribution(format!("emissionprob[{}]", i), v))?;
        }
        Ok(())
    }

    fn check_observations(&self, observations: &[usize]) -> Result<()> {
        if observations.is_empty() {
            return Err(Error::EmptySequence);
        }
        let n_symbols = self.n_symbols();
        match observations.iter().position(|&s| s >= n_symbols) {
            Some(position) => Err(Error::SymbolOutOfRange {
                position,
                symbol: observations[position],
                n_symbols,
            }),
            None => Ok(()),
        }
    }
}

impl TrainableEmission for Categorical {
    type Stats = CategoricalStats;

    fn empty_stats(&self) -> CategoricalStats {
        CategoricalStats {
            counts: vec![vec![0.0; self.n_symbols()]; self.n_states()],
        }
    }

    fn accumulate(
        &self,
        stats: &mut CategoricalStats,
        observations: &[usize],
        posteriors: &[Vec<f64>],
    ) {
        for (&symbol, gamma) in observations.iter().zip(posteriors) {
            for (counts, &weight) in stats.counts.iter_mut().zip(gamma) {
                counts[symbol] += weight;
            }
        }
    }

    fn merge_stats(into: &mut CategoricalStats, other: &CategoricalStats) {
        for (row, other_row) in into.counts.iter_mut().zip(&other.counts) {
            for (a, b) in row.iter_mut().zip(other_row) {
                *a += b;
            }
        }
    }

    fn reestimate(&mut self, stats: &CategoricalStats, policy: EmptyStatePolicy) -> Vec<usize> {
        let mut unreached = Vec::new();
        let n_symbols = self.n_symbols();
        for (state, (row, counts)) in self
            .emissionprob
            .iter_mut()
            .zip(&stats.counts)
            .enumerate()
        {
            let mut estimate = counts.clone();
            if normalize(&mut estimate) > 0.0 {
                *row = estimate;
            } else {
                unreached.push(state);
                if policy == EmptyStatePolicy::Uniform {
                    *row = uniform(n_symbols);
                }
            }
        }
        unreached
    }
}

impl SampleEmission for Categorical {
    fn sample<R: Rng + ?Sized>(&self, state: usize, rng: &mut R) -> usize {
        sample_index(&self.emissionprob[state], rng)
    }
}

/// Draw an index from a discrete distribution by inverting its CDF.
pub(crate) fn sample_index<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> usize {
    let u: f64 = rng.random();
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    // Rounding can leave the CDF a hair below 1; fall back to the last
    // outcome with mass.
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// Largest supported symbol cardinality. Symbols must lie below it.
pub const MAX_N_SYMBOLS: usize = 1 << 24;

fn too_large(position: usize, value: f64) -> Error {
    Error::SymbolTooLarge {
        position,
        value,
        limit: MAX_N_SYMBOLS,
    }
}

/// Convert raw numeric observations to symbol indices.
///
/// Rejects NaN, infinite, negative and non-integral values, and values at or
/// above [`MAX_N_SYMBOLS`].
pub fn symbols_from_f64(values: &[f64]) -> Result<Vec<usize>> {
    values
        .iter()
        .enumerate()
        .map(|(position, &value)| {
            if !value.is_finite() || value.fract() != 0.0 {
                Err(Error::NonIntegralSymbol { position, value })
            } else if value < 0.0 {
                Err(Error::NegativeSymbol { position, value })
            } else if value >= MAX_N_SYMBOLS as f64 {
                Err(too_large(position, value))
            } else {
                Ok(value as usize)
            }
        })
        .collect()
}

/// Convert signed integer observations to symbol indices, rejecting negatives
/// and values at or above [`MAX_N_SYMBOLS`].
pub fn symbols_from_i64(values: &[i64]) -> Result<Vec<usize>> {
    values
        .iter()
        .enumerate()
        .map(|(position, &value)| {
            let symbol = usize::try_from(value).map_err(|_| Error::NegativeSymbol {
                position,
                value: value as f64,
            })?;
            if symbol >= MAX_N_SYMBOLS {
                return Err(too_large(position, value as f64));
            }
            Ok(symbol)
        })
        .collect()
}

/// Number of symbols implied by the data: one more than the largest index.
///
/// Positions in errors count across the whole batch.
pub fn infer_n_symbols<'a, I>(sequences: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a [usize]>,
{
    let mut max: Option<usize> = None;
    let mut offset = 0usize;
    for seq in sequences {
        if seq.is_empty() {
            return Err(Error::EmptySequence);
        }
        if let Some(i) = seq.iter().position(|&s| s >= MAX_N_SYMBOLS) {
            return Err(too_large(offset + i, seq[i] as f64));
        }
        max = max.max(seq.iter().copied().max());
        offset += seq.len();
    }
    max.and_then(|m| m.checked_add(1)).ok_or(Error::EmptySequence)
}

/// Settle the symbol cardinality before training.
///
/// A pre-set value wins, and any symbol outside `[0, preset)` is rejected.
/// Without a preset the cardinality is derived from the data.
pub fn resolve_n_symbols(preset: Option<usize>, sequences: &[&[usize]]) -> Result<usize> {
    let observed = infer_n_symbols(sequences.iter().copied())?;
    match preset {
        Some(n_symbols) if observed > n_symbols => {
            let (position, symbol) = sequences
                .iter()
                .flat_map(|s| s.iter())
                .copied()
                .enumerate()
                .find(|(_, s)| *s >= n_symbols)
                .unwrap_or((0, observed - 1));
            Err(Error::SymbolOutOfRange {
                position,
                symbol,
                n_symbols,
            })
        }
        Some(n_symbols) => Ok(n_symbols),
        None => Ok(observed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmm_common::ErrorKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn weather() -> Categorical {
        Categorical::new(vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]]).unwrap()
    }

    #[test]
    fn lookup_and_row_access() {
        let e = weather();
        assert_eq!(e.n_states(), 2);
        assert_eq!(e.n_symbols(), 3);
        assert_eq!(e.probability(1, &0), 0.6);
        assert_eq!(e.row(0), &[0.1, 0.4, 0.5]);
        assert!((e.log_probability(0, &2) - 0.5f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn rejects_ragged_and_unnormalized_rows() {
        let err = Categorical::new(vec![vec![0.5, 0.5], vec![1.0]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDistribution);
        let err = Categorical::new(vec![vec![0.5, 0.6]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDistribution);
        let err = Categorical::new(vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDistribution);
    }

    #[test]
    fn out_of_range_symbol_is_rejected() {
        let err = weather().check_observations(&[0, 1, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::SymbolOutOfRange {
                position: 2,
                symbol: 3,
                n_symbols: 3
            }
        ));
        assert!(matches!(weather().check_observations(&[]), Err(Error::EmptySequence)));
    }

    #[test]
    fn float_conversion_rejects_fractions_and_negatives() {
        assert_eq!(symbols_from_f64(&[0.0, 2.0, 1.0]).unwrap(), vec![0, 2, 1]);
        assert!(matches!(
            symbols_from_f64(&[0.0, 2.5]),
            Err(Error::NonIntegralSymbol { position: 1, .. })
        ));
        assert!(matches!(
            symbols_from_f64(&[-2.0]),
            Err(Error::NegativeSymbol { position: 0, .. })
        ));
        assert!(symbols_from_f64(&[f64::NAN]).is_err());
    }

    #[test]
    fn integer_conversion_rejects_negatives() {
        assert_eq!(symbols_from_i64(&[0, 0, 2, 1, 3]).unwrap(), vec![0, 0, 2, 1, 3]);
        let err = symbols_from_i64(&[0, -2, 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidObservation);
    }

    #[test]
    fn n_symbols_from_data_or_preset() {
        let a: &[usize] = &[0, 0, 2, 1, 3, 1, 1];
        let b: &[usize] = &[0, 0, 1, 3, 1];
        assert_eq!(resolve_n_symbols(None, &[a, b]).unwrap(), 4);
        assert_eq!(resolve_n_symbols(Some(6), &[a, b]).unwrap(), 6);
        let err = resolve_n_symbols(Some(3), &[a, b]).unwrap_err();
        assert!(matches!(err, Error::SymbolOutOfRange { position: 4, symbol: 3, .. }));
    }

    #[test]
    fn oversized_symbols_are_rejected_before_allocation() {
        let huge: &[usize] = &[0, usize::MAX];
        assert!(matches!(
            infer_n_symbols([huge]),
            Err(Error::SymbolTooLarge { position: 1, .. })
        ));
        let a: &[usize] = &[0, 1];
        let b: &[usize] = &[2, MAX_N_SYMBOLS];
        let err = resolve_n_symbols(None, &[a, b]).unwrap_err();
        assert!(matches!(err, Error::SymbolTooLarge { position: 3, .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidObservation);
        let top: &[usize] = &[MAX_N_SYMBOLS - 1];
        assert_eq!(infer_n_symbols([top]).unwrap(), MAX_N_SYMBOLS);

        for value in [1e20, 1e12, MAX_N_SYMBOLS as f64] {
            assert!(matches!(
                symbols_from_f64(&[1.0, value]),
                Err(Error::SymbolTooLarge { position: 1, .. })
            ));
        }
        assert!(matches!(
            symbols_from_i64(&[MAX_N_SYMBOLS as i64]),
            Err(Error::SymbolTooLarge { position: 0, .. })
        ));
    }

    #[test]
    fn accumulate_and_reestimate() {
        let mut e = weather();
        let mut stats = e.empty_stats();
        e.accumulate(&mut stats, &[0, 2], &[vec![1.0, 0.0], vec![0.25, 0.75]]);
        assert_eq!(stats.counts[0], vec![1.0, 0.0, 0.25]);
        let unreached = e.reestimate(&stats, EmptyStatePolicy::KeepPrevious);
        assert!(unreached.is_empty());
        assert!((e.row(0)[0] - 0.8).abs() < 1e-12);
        assert!((e.row(1)[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unreached_state_follows_policy() {
        let stats = CategoricalStats {
            counts: vec![vec![2.0, 1.0, 1.0], vec![0.0, 0.0, 0.0]],
        };

        let mut keep = weather();
        assert_eq!(keep.reestimate(&stats, EmptyStatePolicy::KeepPrevious), vec![1]);
        assert_eq!(keep.row(1), &[0.6, 0.3, 0.1]);

        let mut reset = weather();
        assert_eq!(reset.reestimate(&stats, EmptyStatePolicy::Uniform), vec![1]);
        assert!(reset.row(1).iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-15));
    }

    #[test]
    fn sampling_follows_row() {
        let e = Categorical::new(vec![vec![0.0, 1.0, 0.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(e.sample(0, &mut rng), 1);
        }
    }

    #[test]
    fn random_rows_are_stochastic() {
        let mut rng = StdRng::seed_from_u64(1);
        let e = Categorical::random(3, 5, &mut rng);
        assert!(e.validate().is_ok());
        assert_eq!(e.n_symbols(), 5);
    }
}
