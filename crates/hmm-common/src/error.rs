//! Error types for the HMM engine.
//!
//! Every fallible operation returns [`Error`]. Variants carry:
//! - Stable error codes for machine parsing
//! - A category for grouping related errors
//! - A coarse [`ErrorKind`] matching the two fatal validation failures
//!   (bad distribution, bad observation) plus the ambient config and I/O kinds
//!
//! Validation errors are raised before any recursion starts, so a returned
//! error never comes with partial results. Degenerate numerical outcomes
//! (zero likelihood, unreached states) are not errors; see
//! [`crate::diagnostics`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for HMM operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model parameter errors (startprob, transmat, emission).
    Model,
    /// Observation sequence errors.
    Observation,
    /// Fit configuration errors.
    Config,
    /// EM training errors.
    Training,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Observation => write!(f, "observation"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Training => write!(f, "training"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Coarse error kind used by callers that only branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A stochastic vector or matrix is malformed.
    InvalidDistribution,
    /// An observation sequence is empty or holds an invalid symbol.
    InvalidObservation,
    /// Configuration could not be used.
    Config,
    /// Training detected a violated invariant.
    Training,
    /// Reading or writing data failed.
    Io,
}

/// Unified error type for the HMM engine.
#[derive(Error, Debug)]
pub enum Error {
    // Distribution errors (10-19)
    #[error("invalid distribution for {name}: {reason}")]
    InvalidDistribution { name: String, reason: String },

    #[error("shape mismatch for {name}: expected {expected}, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    // Observation errors (20-29)
    #[error("observation sequence is empty")]
    EmptySequence,

    #[error("symbol {symbol} at position {position} is out of range (n_symbols = {n_symbols})")]
    SymbolOutOfRange {
        position: usize,
        symbol: usize,
        n_symbols: usize,
    },

    #[error("symbol at position {position} is not an integer: {value}")]
    NonIntegralSymbol { position: usize, value: f64 },

    #[error("symbol at position {position} is negative: {value}")]
    NegativeSymbol { position: usize, value: f64 },

    #[error("invalid sequence lengths: {0}")]
    InvalidLengths(String),

    #[error("symbol at position {position} is {value}, above the supported maximum {limit}")]
    SymbolTooLarge {
        position: usize,
        value: f64,
        limit: usize,
    },

    // Configuration errors (30-39)
    #[error("configuration error: {0}")]
    Config(String),

    // Training errors (40-49)
    #[error("log-likelihood decreased at iteration {iteration}: {previous} -> {current}")]
    ConvergenceRegression {
        iteration: usize,
        previous: f64,
        current: f64,
    },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl Error {
    /// Convenience constructor for [`Error::InvalidDistribution`].
    pub fn distribution(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::InvalidDistribution {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for [`Error::ShapeMismatch`].
    pub fn shape(
        name: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Error::ShapeMismatch {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Model parameter errors
    /// - 20-29: Observation errors
    /// - 30-39: Configuration errors
    /// - 40-49: Training errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidDistribution { .. } => 10,
            Error::ShapeMismatch { .. } => 11,
            Error::EmptySequence => 20,
            Error::SymbolOutOfRange { .. } => 21,
            Error::NonIntegralSymbol { .. } => 22,
            Error::NegativeSymbol { .. } => 23,
            Error::InvalidLengths(_) => 24,
            Error::SymbolTooLarge { .. } => 25,
            Error::Config(_) => 30,
            Error::ConvergenceRegression { .. } => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::VersionMismatch { .. } => 62,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidDistribution { .. } | Error::ShapeMismatch { .. } => {
                ErrorCategory::Model
            }
            Error::EmptySequence
            | Error::SymbolOutOfRange { .. }
            | Error::NonIntegralSymbol { .. }
            | Error::NegativeSymbol { .. }
            | Error::InvalidLengths(_)
            | Error::SymbolTooLarge { .. } => ErrorCategory::Observation,
            Error::Config(_) => ErrorCategory::Config,
            Error::ConvergenceRegression { .. } => ErrorCategory::Training,
            Error::Io(_) | Error::Json(_) | Error::VersionMismatch { .. } => ErrorCategory::Io,
        }
    }

    /// Returns the coarse failure kind.
    ///
    /// A shape mismatch in model parameters (e.g. an emission matrix with the
    /// wrong number of rows) is reported as an invalid distribution.
    pub fn kind(&self) -> ErrorKind {
        match self.category() {
            ErrorCategory::Model => ErrorKind::InvalidDistribution,
            ErrorCategory::Observation => ErrorKind::InvalidObservation,
            ErrorCategory::Config => ErrorKind::Config,
            ErrorCategory::Training => ErrorKind::Training,
            ErrorCategory::Io => ErrorKind::Io,
        }
    }
}
