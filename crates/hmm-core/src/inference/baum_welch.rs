//! Baum-Welch expected-count accumulation and the M-step.
//!
//! One EM iteration is:
//!
//! 1. `let mut stats = model.new_stats();`
//! 2. `model.accumulate(&mut stats, seq)?` for every sequence in the batch
//! 3. `model.reestimate(stats, params, policy)`
//!
//! Statistics from independent accumulators can be combined with
//! [`SufficientStats::merge`] before step 3, so per-sequence work can be
//! fanned out and reduced by the caller. `reestimate` takes the statistics by
//! value; they cannot be reused for a second update.

use crate::inference::emission::TrainableEmission;
use crate::inference::forward_backward::{self, ForwardBackward};
use crate::inference::model::Hmm;
use crate::inference::space::{LogSpace, ProbabilitySpace, Scaled};
use crate::logging::event_names;
use hmm_common::{Diagnostic, EmptyStatePolicy, Implementation, ParamSet, Parameter, Result};
use hmm_math::{normalize, uniform};
use tracing::{debug, warn};

/// Pooled expected counts for one EM iteration.
#[derive(Debug, Clone)]
pub struct SufficientStats<E: TrainableEmission> {
    /// Sequences that contributed counts.
    pub n_sequences: usize,
    /// Sequences seen, including impossible ones that were skipped.
    pub n_seen: usize,
    /// Expected initial-state counts.
    pub start: Vec<f64>,
    /// Expected transition counts, `trans[i][j]` for i -> j.
    pub trans: Vec<Vec<f64>>,
    pub emission: E::Stats,
    /// Sum of log-likelihoods of every sequence seen; -inf once any of them
    /// is impossible.
    pub log_likelihood: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl<E: TrainableEmission> SufficientStats<E> {
    fn zeroed(n_states: usize, emission: E::Stats) -> Self {
        Self {
            n_sequences: 0,
            n_seen: 0,
            start: vec![0.0; n_states],
            trans: vec![vec![0.0; n_states]; n_states],
            emission,
            log_likelihood: 0.0,
            diagnostics: Vec::new(),
        }
    }

    /// Fold another accumulator into this one.
    ///
    /// Counts and log-likelihoods are summed. Sequence indices in `other`'s
    /// diagnostics are shifted so they follow this accumulator's sequences.
    pub fn merge(&mut self, other: &Self) {
        for (a, b) in self.start.iter_mut().zip(&other.start) {
            *a += b;
        }
        for (row, other_row) in self.trans.iter_mut().zip(&other.trans) {
            for (a, b) in row.iter_mut().zip(other_row) {
                *a += b;
            }
        }
        E::merge_stats(&mut self.emission, &other.emission);

        let offset = self.n_seen;
        self.diagnostics
            .extend(other.diagnostics.iter().map(|diag| match diag {
                Diagnostic::ZeroLikelihood { sequence } => Diagnostic::ZeroLikelihood {
                    sequence: sequence + offset,
                },
                other => other.clone(),
            }));
        self.n_sequences += other.n_sequences;
        self.n_seen += other.n_seen;
        self.log_likelihood += other.log_likelihood;
    }
}

/// Add expected transition counts (xi) for one sequence.
///
/// Each step's n x n matrix `alpha[t][i] * a_ij * b_j(o_{t+1}) * beta[t+1][j]`
/// is normalised as a whole, which removes both the scaling factors and
/// P(O) regardless of representation.
fn accumulate_transitions<P: ProbabilitySpace>(
    transmat: &[Vec<f64>],
    pass: &ForwardBackward,
    counts: &mut [Vec<f64>],
) {
    let n = transmat.len();
    let trans: Vec<Vec<f64>> = transmat
        .iter()
        .map(|row| row.iter().map(|&p| P::from_prob(p)).collect())
        .collect();
    let frames = &pass.frames.values;
    let mut xi = vec![P::zero(); n * n];

    for t in 0..pass.len().saturating_sub(1) {
        for i in 0..n {
            for j in 0..n {
                xi[i * n + j] = P::combine(
                    P::combine(P::combine(pass.alpha[t][i], trans[i][j]), frames[t + 1][j]),
                    pass.beta[t + 1][j],
                );
            }
        }
        if P::normalize(&mut xi) == f64::NEG_INFINITY {
            continue;
        }
        for (k, &v) in xi.iter().enumerate() {
            counts[k / n][k % n] += P::to_prob(v);
        }
    }
}

impl<E: TrainableEmission> Hmm<E> {
    /// Empty statistics shaped for this model.
    pub fn new_stats(&self) -> SufficientStats<E> {
        SufficientStats::zeroed(self.n_states(), self.emission().empty_stats())
    }

    /// E-step for one sequence. Returns its log-likelihood.
    ///
    /// An impossible sequence (log-likelihood -inf) contributes no counts; it
    /// is recorded as a [`Diagnostic::ZeroLikelihood`] instead. Its -inf still
    /// enters the batch log-likelihood.
    pub fn accumulate(
        &self,
        stats: &mut SufficientStats<E>,
        observations: &[E::Symbol],
    ) -> Result<f64> {
        self.check_inputs(observations)?;
        let index = stats.n_seen;
        stats.n_seen += 1;

        let pass = forward_backward::dispatch(self, observations);
        if pass.is_degenerate() {
            warn!(
                event = event_names::ZERO_LIKELIHOOD,
                sequence = index,
                "sequence has zero probability under the model; skipped"
            );
            stats
                .diagnostics
                .push(Diagnostic::ZeroLikelihood { sequence: index });
            stats.log_likelihood += pass.log_likelihood;
            return Ok(pass.log_likelihood);
        }

        for (count, &p) in stats.start.iter_mut().zip(&pass.posteriors[0]) {
            *count += p;
        }
        match pass.implementation {
            Implementation::Scaling => {
                accumulate_transitions::<Scaled>(self.transmat(), &pass, &mut stats.trans)
            }
            Implementation::Log => {
                accumulate_transitions::<LogSpace>(self.transmat(), &pass, &mut stats.trans)
            }
        }
        self.emission()
            .accumulate(&mut stats.emission, observations, &pass.posteriors);

        stats.n_sequences += 1;
        stats.log_likelihood += pass.log_likelihood;
        Ok(pass.log_likelihood)
    }

    /// M-step: replace the selected parameters with their maximum-likelihood
    /// estimates from `stats`.
    ///
    /// States without expected counts keep their previous row or get a
    /// uniform one, depending on `policy`, and are reported as
    /// [`Diagnostic::UnreachedState`].
    pub fn reestimate(
        &mut self,
        stats: SufficientStats<E>,
        params: ParamSet,
        policy: EmptyStatePolicy,
    ) -> Vec<Diagnostic> {
        let n = self.n_states();
        let mut diagnostics = Vec::new();

        if params.startprob {
            if stats.n_sequences > 0 {
                let total = stats.n_sequences as f64;
                let mut estimate: Vec<f64> = stats.start.iter().map(|c| c / total).collect();
                normalize(&mut estimate);
                *self.startprob_mut() = estimate;
            } else {
                if policy == EmptyStatePolicy::Uniform {
                    *self.startprob_mut() = uniform(n);
                }
                diagnostics.extend((0..n).map(|state| Diagnostic::UnreachedState {
                    state,
                    parameter: Parameter::Startprob,
                }));
            }
        }

        if params.transmat {
            let transmat = self.transmat_mut();
            for (state, (row, counts)) in transmat.iter_mut().zip(&stats.trans).enumerate() {
                let mut estimate = counts.clone();
                if normalize(&mut estimate) > 0.0 {
                    *row = estimate;
                } else {
                    if policy == EmptyStatePolicy::Uniform {
                        *row = uniform(n);
                    }
                    diagnostics.push(Diagnostic::UnreachedState {
                        state,
                        parameter: Parameter::Transmat,
                    });
                }
            }
        }

        if params.emission {
            let unreached = self.emission_mut().reestimate(&stats.emission, policy);
            diagnostics.extend(unreached.into_iter().map(|state| Diagnostic::UnreachedState {
                state,
                parameter: Parameter::Emission,
            }));
        }

        for diag in &diagnostics {
            if let Diagnostic::UnreachedState { state, parameter } = diag {
                warn!(
                    event = event_names::UNREACHED_STATE,
                    state = *state,
                    parameter = %parameter,
                    policy = ?policy,
                    "state has no expected counts; row not re-estimated"
                );
            }
        }
        debug!(
            n_sequences = stats.n_sequences,
            params = %params,
            unreached = diagnostics.len(),
            "re-estimated parameters"
        );
        diagnostics
    }
}
