//! Discrete hidden Markov model engine.
//!
//! This library provides:
//! - Forward-backward, Viterbi and MAP inference in scaled or log arithmetic
//! - Baum-Welch accumulation, re-estimation and the EM driver
//! - Sampling and random initialisation of categorical models
//! - Model and observation file formats, with JSON schemas
//! - Exit codes and structured logging for the `hmm` binary
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod model_file;
pub mod observations;
pub mod schema;
pub mod training;

pub use hmm_common::{
    DecodeAlgorithm, Diagnostic, EmptyStatePolicy, Error, ErrorKind, Implementation, ParamSet,
    Result,
};
pub use inference::{CategoricalHmm, Decoded, Hmm, Scored};
pub use training::{FitReport, Trainer};
