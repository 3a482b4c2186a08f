//! Parameter initialisation for categorical models.
//!
//! `s` and `t` start uniform; `e` starts as random normalised rows so that
//! states are distinguishable from the first E-step.

use crate::inference::categorical::{resolve_n_symbols, Categorical, MAX_N_SYMBOLS};
use crate::inference::model::CategoricalHmm;
use hmm_common::{Error, Implementation, ParamSet, Result};
use hmm_math::uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator, or one seeded from the OS when `seed` is absent.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

impl CategoricalHmm {
    /// A fresh model with every parameter initialised.
    pub fn initial<R: Rng + ?Sized>(
        n_states: usize,
        n_symbols: usize,
        implementation: Implementation,
        rng: &mut R,
    ) -> Result<Self> {
        if n_states == 0 || n_symbols == 0 {
            return Err(Error::shape(
                "model",
                "at least one state and one symbol",
                format!("{} states, {} symbols", n_states, n_symbols),
            ));
        }
        if n_symbols > MAX_N_SYMBOLS {
            return Err(Error::shape(
                "emissionprob",
                format!("at most {} symbols", MAX_N_SYMBOLS),
                format!("{} symbols", n_symbols),
            ));
        }
        Self::categorical(
            uniform(n_states),
            vec![uniform(n_states); n_states],
            Categorical::random(n_states, n_symbols, rng).into_inner(),
            implementation,
        )
    }

    /// Re-initialise the parameters selected by `params`, keeping the others.
    pub fn init_params<R: Rng + ?Sized>(&mut self, params: ParamSet, rng: &mut R) {
        let n = self.n_states();
        if params.startprob {
            *self.startprob_mut() = uniform(n);
        }
        if params.transmat {
            *self.transmat_mut() = vec![uniform(n); n];
        }
        if params.emission {
            let n_symbols = self.n_symbols();
            *self.emission_mut() = Categorical::random(n, n_symbols, rng);
        }
    }

    /// Check training data against the model's symbol cardinality.
    ///
    /// The cardinality is fixed once the model exists; any symbol at or above
    /// it is rejected.
    pub fn check_n_symbols(&self, sequences: &[&[usize]]) -> Result<usize> {
        resolve_n_symbols(Some(self.n_symbols()), sequences)
    }
}
