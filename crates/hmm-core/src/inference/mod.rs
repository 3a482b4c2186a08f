//! Inference and learning engine for discrete hidden Markov models.
//!
//! Every batch entry point takes a slice of sequences (see
//! [`split_sequences`] for concatenated input), validates the model and all
//! observations first, then runs. Impossible sequences do not fail: they
//! produce `-inf` log-likelihoods plus a [`Diagnostic::ZeroLikelihood`].

pub mod baum_welch;
pub mod categorical;
pub mod emission;
pub mod forward_backward;
pub mod init;
pub mod map;
pub mod model;
pub mod sampling;
pub mod sequences;
pub mod space;
pub mod viterbi;

pub use baum_welch::SufficientStats;
pub use categorical::{
    infer_n_symbols, resolve_n_symbols, symbols_from_f64, symbols_from_i64, Categorical,
    CategoricalStats, MAX_N_SYMBOLS,
};
pub use emission::{EmissionModel, SampleEmission, TrainableEmission};
pub use forward_backward::{forward_backward, ForwardBackward};
pub use init::seeded_rng;
pub use map::{map_decode, map_states, MapPath};
pub use model::{CategoricalHmm, Hmm};
pub use sampling::Sample;
pub use sequences::{lengths_of, split_sequences};
pub use space::{LogSpace, ProbabilitySpace, Scaled};
pub use viterbi::{viterbi, ViterbiPath};

use crate::logging::event_names;
use hmm_common::{DecodeAlgorithm, Diagnostic, Result};
use serde::Serialize;
use tracing::warn;

/// Log-likelihood and posteriors of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored {
    /// Sum over sequences.
    pub log_likelihood: f64,
    /// Posterior rows of all sequences, concatenated in order.
    pub posteriors: Vec<Vec<f64>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decoded state sequence of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoded {
    /// Viterbi: summed best-path log-probabilities.
    /// MAP: summed sequence log-likelihoods.
    pub log_probability: f64,
    /// States of all sequences, concatenated in order.
    pub states: Vec<usize>,
    pub algorithm: DecodeAlgorithm,
    pub diagnostics: Vec<Diagnostic>,
}

fn zero_likelihood(sequence: usize) -> Diagnostic {
    warn!(
        event = event_names::ZERO_LIKELIHOOD,
        sequence, "sequence has zero probability under the model"
    );
    Diagnostic::ZeroLikelihood { sequence }
}

impl<E: EmissionModel> Hmm<E> {
    pub(crate) fn check_batch(&self, sequences: &[&[E::Symbol]]) -> Result<()> {
        if sequences.is_empty() {
            return Err(hmm_common::Error::EmptySequence);
        }
        self.validate()?;
        for seq in sequences {
            self.emission().check_observations(seq)?;
        }
        Ok(())
    }

    /// Total log-likelihood of the batch.
    pub fn score(&self, sequences: &[&[E::Symbol]]) -> Result<f64> {
        self.check_batch(sequences)?;
        let mut total = 0.0;
        for (index, seq) in sequences.iter().enumerate() {
            let pass = forward_backward::dispatch(self, seq);
            if pass.is_degenerate() {
                zero_likelihood(index);
            }
            total += pass.log_likelihood;
        }
        Ok(total)
    }

    /// Total log-likelihood plus per-step posteriors.
    pub fn score_samples(&self, sequences: &[&[E::Symbol]]) -> Result<Scored> {
        self.check_batch(sequences)?;
        let mut scored = Scored {
            log_likelihood: 0.0,
            posteriors: Vec::new(),
            diagnostics: Vec::new(),
        };
        for (index, seq) in sequences.iter().enumerate() {
            let pass = forward_backward::dispatch(self, seq);
            if pass.is_degenerate() {
                scored.diagnostics.push(zero_likelihood(index));
            }
            scored.log_likelihood += pass.log_likelihood;
            scored.posteriors.extend(pass.posteriors);
        }
        Ok(scored)
    }

    /// Most likely states under the chosen decoder.
    pub fn decode(&self, sequences: &[&[E::Symbol]], algorithm: DecodeAlgorithm) -> Result<Decoded> {
        self.check_batch(sequences)?;
        let mut decoded = Decoded {
            log_probability: 0.0,
            states: Vec::new(),
            algorithm,
            diagnostics: Vec::new(),
        };
        for (index, seq) in sequences.iter().enumerate() {
            let (log_probability, states) = match algorithm {
                DecodeAlgorithm::Viterbi => {
                    let path = viterbi::dispatch(self, seq);
                    (path.log_probability, path.states)
                }
                DecodeAlgorithm::Map => {
                    let path = map::from_pass(&forward_backward::dispatch(self, seq));
                    (path.log_likelihood, path.states)
                }
            };
            if log_probability == f64::NEG_INFINITY {
                decoded.diagnostics.push(zero_likelihood(index));
            }
            decoded.log_probability += log_probability;
            decoded.states.extend(states);
        }
        Ok(decoded)
    }

    /// MAP state of every step.
    pub fn predict(&self, sequences: &[&[E::Symbol]]) -> Result<Vec<usize>> {
        Ok(self.decode(sequences, DecodeAlgorithm::Map)?.states)
    }

    /// Posterior state distribution of every step.
    pub fn predict_proba(&self, sequences: &[&[E::Symbol]]) -> Result<Vec<Vec<f64>>> {
        Ok(self.score_samples(sequences)?.posteriors)
    }
}
