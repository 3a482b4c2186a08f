//! Model parameters and their validation.

use crate::inference::categorical::Categorical;
use crate::inference::emission::EmissionModel;
use hmm_common::{Error, Implementation, Result};
use hmm_math::{check_stochastic, DEFAULT_SUM_TOLERANCE};
use serde::{Deserialize, Serialize};

/// A hidden Markov model: initial distribution, transition matrix and an
/// emission model, plus the arithmetic used to run it.
///
/// Constructors and setters validate, so every model a caller can observe
/// holds normalised rows. Each inference entry point re-validates cheaply
/// before running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hmm<E> {
    startprob: Vec<f64>,
    transmat: Vec<Vec<f64>>,
    emission: E,
    #[serde(default)]
    implementation: Implementation,
}

/// An HMM over discrete symbols.
pub type CategoricalHmm = Hmm<Categorical>;

impl<E: EmissionModel> Hmm<E> {
    pub fn new(
        startprob: Vec<f64>,
        transmat: Vec<Vec<f64>>,
        emission: E,
        implementation: Implementation,
    ) -> Result<Self> {
        let model = Self {
            startprob,
            transmat,
            emission,
            implementation,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn n_states(&self) -> usize {
        self.startprob.len()
    }

    pub fn startprob(&self) -> &[f64] {
        &self.startprob
    }

    pub fn transmat(&self) -> &[Vec<f64>] {
        &self.transmat
    }

    pub fn emission(&self) -> &E {
        &self.emission
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation
    }

    pub fn set_implementation(&mut self, implementation: Implementation) {
        self.implementation = implementation;
    }

    /// Same parameters, different arithmetic.
    pub fn with_implementation(mut self, implementation: Implementation) -> Self {
        self.implementation = implementation;
        self
    }

    pub fn set_startprob(&mut self, startprob: Vec<f64>) -> Result<()> {
        let previous = std::mem::replace(&mut self.startprob, startprob);
        if let Err(err) = self.validate() {
            self.startprob = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_transmat(&mut self, transmat: Vec<Vec<f64>>) -> Result<()> {
        let previous = std::mem::replace(&mut self.transmat, transmat);
        if let Err(err) = self.validate() {
            self.transmat = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_emission(&mut self, emission: E) -> Result<()> {
        validate_shapes(&self.startprob, &self.transmat, &emission)?;
        emission.validate()?;
        self.emission = emission;
        Ok(())
    }

    pub(crate) fn emission_mut(&mut self) -> &mut E {
        &mut self.emission
    }

    pub(crate) fn startprob_mut(&mut self) -> &mut Vec<f64> {
        &mut self.startprob
    }

    pub(crate) fn transmat_mut(&mut self) -> &mut Vec<Vec<f64>> {
        &mut self.transmat
    }

    /// Check shapes and normalisation of every parameter.
    pub fn validate(&self) -> Result<()> {
        validate_shapes(&self.startprob, &self.transmat, &self.emission)?;
        check_stochastic(&self.startprob, DEFAULT_SUM_TOLERANCE)
            .map_err(|v| Error::distribution("startprob", v))?;
        for (i, row) in self.transmat.iter().enumerate() {
            check_stochastic(row, DEFAULT_SUM_TOLERANCE)
                .map_err(|v| Error::distribution(format!("transmat[{}]", i), v))?;
        }
        self.emission.validate()
    }

    /// Validate the model and an observation sequence together.
    pub(crate) fn check_inputs(&self, observations: &[E::Symbol]) -> Result<()> {
        self.validate()?;
        self.emission.check_observations(observations)
    }
}

fn validate_shapes<E: EmissionModel>(
    startprob: &[f64],
    transmat: &[Vec<f64>],
    emission: &E,
) -> Result<()> {
    let n = startprob.len();
    if n == 0 {
        return Err(Error::shape("startprob", "at least 1 state", "0 states"));
    }
    if transmat.len() != n {
        return Err(Error::shape(
            "transmat",
            format!("{} rows", n),
            format!("{} rows", transmat.len()),
        ));
    }
    if let Some((i, row)) = transmat.iter().enumerate().find(|(_, row)| row.len() != n) {
        return Err(Error::shape(
            format!("transmat[{}]", i),
            format!("{} columns", n),
            format!("{} columns", row.len()),
        ));
    }
    if emission.n_states() != n {
        return Err(Error::shape(
            "emission",
            format!("{} rows", n),
            format!("{} rows", emission.n_states()),
        ));
    }
    Ok(())
}

impl CategoricalHmm {
    /// Build a categorical model directly from the three matrices.
    pub fn categorical(
        startprob: Vec<f64>,
        transmat: Vec<Vec<f64>>,
        emissionprob: Vec<Vec<f64>>,
        implementation: Implementation,
    ) -> Result<Self> {
        let model = Self {
            startprob,
            transmat,
            emission: Categorical::from_rows_unchecked(emissionprob),
            implementation,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn n_symbols(&self) -> usize {
        self.emission.n_symbols()
    }

    pub fn emissionprob(&self) -> &[Vec<f64>] {
        self.emission.emissionprob()
    }
}
