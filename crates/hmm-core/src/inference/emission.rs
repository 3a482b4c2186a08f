//! Emission model capabilities.
//!
//! The recursions only ever ask "how likely is this observation under state
//! i", so any emission family that answers that question can reuse the same
//! forward-backward and decoder code. Training and sampling are separate,
//! optional capabilities.

use hmm_common::{EmptyStatePolicy, Result};
use hmm_math::safe_ln;
use rand::Rng;
use std::fmt::Debug;

/// Per-state observation likelihoods.
pub trait EmissionModel {
    /// A single observation.
    type Symbol: Clone + Debug;

    /// Number of hidden states the model has rows for.
    fn n_states(&self) -> usize;

    /// P(symbol | state).
    fn probability(&self, state: usize, symbol: &Self::Symbol) -> f64;

    /// log P(symbol | state).
    fn log_probability(&self, state: usize, symbol: &Self::Symbol) -> f64 {
        safe_ln(self.probability(state, symbol))
    }

    /// Fill `out[i]` with log P(symbol | state i) for every state.
    fn log_frame(&self, symbol: &Self::Symbol, out: &mut [f64]) {
        for (state, slot) in out.iter_mut().enumerate() {
            *slot = self.log_probability(state, symbol);
        }
    }

    /// Check that the emission parameters are well-formed distributions.
    fn validate(&self) -> Result<()>;

    /// Check that every observation is admissible under this model.
    fn check_observations(&self, observations: &[Self::Symbol]) -> Result<()>;
}

/// Emission models that can be re-estimated from posterior state weights.
pub trait TrainableEmission: EmissionModel {
    /// Expected sufficient statistics, pooled across sequences.
    type Stats: Clone + Debug;

    /// Zeroed statistics matching this model's shape.
    fn empty_stats(&self) -> Self::Stats;

    /// Add the contribution of one sequence given its posteriors
    /// (`posteriors[t][i]` = P(state i at t | sequence)).
    fn accumulate(
        &self,
        stats: &mut Self::Stats,
        observations: &[Self::Symbol],
        posteriors: &[Vec<f64>],
    );

    /// Fold `other` into `into`. Must be commutative and associative.
    fn merge_stats(into: &mut Self::Stats, other: &Self::Stats);

    /// Replace the parameters with the maximum-likelihood estimate.
    ///
    /// Returns the states whose counts were all zero; their rows follow
    /// `policy` instead of being re-estimated.
    fn reestimate(&mut self, stats: &Self::Stats, policy: EmptyStatePolicy) -> Vec<usize>;
}

/// Emission models that can draw observations.
pub trait SampleEmission: EmissionModel {
    fn sample<R: Rng + ?Sized>(&self, state: usize, rng: &mut R) -> Self::Symbol;
}
