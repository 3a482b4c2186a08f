//! Shared vocabulary for the HMM workspace.
//!
//! This crate provides foundational types used by every other crate:
//! - The unified error type with stable codes
//! - Warning-level diagnostics for degenerate numerical outcomes
//! - Small enums naming engine options (arithmetic, decoder, parameter set)

pub mod diagnostics;
pub mod error;
pub mod options;

pub use diagnostics::{Diagnostic, Parameter};
pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use options::{DecodeAlgorithm, EmptyStatePolicy, Implementation, ParamSet};

/// Schema version for model and configuration files.
pub const SCHEMA_VERSION: &str = "1.0.0";
