//! Synthetic sequence generation.

use crate::inference::categorical::sample_index;
use crate::inference::emission::SampleEmission;
use crate::inference::model::Hmm;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A sampled state path and the observations it emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<S> {
    pub observations: Vec<S>,
    pub states: Vec<usize>,
}

impl<E: SampleEmission> Hmm<E> {
    /// Draw `n` steps: a state path from `startprob`/`transmat` and one
    /// emission per step.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Sample<E::Symbol> {
        let mut states = Vec::with_capacity(n);
        let mut observations = Vec::with_capacity(n);
        let mut state = 0;
        for t in 0..n {
            state = if t == 0 {
                sample_index(self.startprob(), rng)
            } else {
                sample_index(&self.transmat()[state], rng)
            };
            states.push(state);
            observations.push(self.emission().sample(state, rng));
        }
        Sample {
            observations,
            states,
        }
    }
}
