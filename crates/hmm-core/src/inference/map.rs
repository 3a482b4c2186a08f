//! Posterior (MAP) decoding.
//!
//! Each step takes the state with the largest posterior on its own, so the
//! resulting sequence can contain transitions that `transmat` forbids. That
//! is expected: it maximises the number of correctly labelled steps, not the
//! probability of the whole path.

use crate::inference::emission::EmissionModel;
use crate::inference::forward_backward::{self, ForwardBackward};
use crate::inference::model::Hmm;
use hmm_common::Result;
use hmm_math::argmax;

/// MAP states and the total sequence log-likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPath {
    /// log P(observations), not a per-step or per-path quantity.
    pub log_likelihood: f64,
    pub states: Vec<usize>,
}

/// Lowest-index argmax of every posterior row.
pub fn map_states(posteriors: &[Vec<f64>]) -> Vec<usize> {
    posteriors.iter().map(|row| argmax(row)).collect()
}

pub(crate) fn from_pass(pass: &ForwardBackward) -> MapPath {
    MapPath {
        log_likelihood: pass.log_likelihood,
        states: map_states(&pass.posteriors),
    }
}

pub fn map_decode<E: EmissionModel>(model: &Hmm<E>, observations: &[E::Symbol]) -> Result<MapPath> {
    let pass = forward_backward::forward_backward(model, observations)?;
    Ok(from_pass(&pass))
}
