//! Warning-level signals attached to otherwise complete results.
//!
//! These describe degenerate but well-defined outcomes. The engine returns
//! them next to its result and also emits a `tracing` warning, so they are
//! never silently dropped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model parameter named in a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Startprob,
    Transmat,
    Emission,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Startprob => write!(f, "startprob"),
            Parameter::Transmat => write!(f, "transmat"),
            Parameter::Emission => write!(f, "emission"),
        }
    }
}

/// A non-fatal numerical condition detected during inference or training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Every state path has zero probability; log-likelihood is -inf.
    ZeroLikelihood {
        /// Index of the sequence within its batch.
        sequence: usize,
    },
    /// A state received zero expected counts, so its row was not re-estimated.
    UnreachedState { state: usize, parameter: Parameter },
    /// The log-likelihood went down between two EM iterations.
    ConvergenceRegression {
        iteration: usize,
        previous: f64,
        current: f64,
    },
}

impl Diagnostic {
    /// Short stable identifier for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Diagnostic::ZeroLikelihood { .. } => "zero_likelihood",
            Diagnostic::UnreachedState { .. } => "unreached_state",
            Diagnostic::ConvergenceRegression { .. } => "convergence_regression",
        }
    }

    /// Diagnostics that indicate an implementation defect rather than
    /// degenerate data.
    pub fn is_defect(&self) -> bool {
        matches!(self, Diagnostic::ConvergenceRegression { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ZeroLikelihood { sequence } => {
                write!(f, "sequence {} is impossible under the model", sequence)
            }
            Diagnostic::UnreachedState { state, parameter } => {
                write!(f, "state {} has no expected counts for {}", state, parameter)
            }
            Diagnostic::ConvergenceRegression {
                iteration,
                previous,
                current,
            } => write!(
                f,
                "log-likelihood decreased at iteration {}: {} -> {}",
                iteration, previous, current
            ),
        }
    }
}
