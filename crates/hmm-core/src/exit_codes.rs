//! Exit codes for the `hmm` CLI.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/input errors (recoverable by fixing the input)
//! - 20-29: Internal errors (bugs, should be reported)

use hmm_common::{Error, ErrorCategory};

/// Exit codes for `hmm` operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success with no diagnostics.
    Clean = 0,

    /// Result produced but degenerate (diagnostics attached).
    Degenerate = 1,

    /// Invalid arguments.
    ArgsError = 10,

    /// Model parameters failed validation.
    InvalidModel = 11,

    /// Observations failed validation.
    InvalidObservations = 12,

    /// Configuration could not be loaded or is invalid.
    ConfigError = 13,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-1 are outcomes, not failures.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Degenerate => "OK_DEGENERATE",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InvalidModel => "ERR_MODEL",
            ExitCode::InvalidObservations => "ERR_OBSERVATIONS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for an engine error.
    pub fn for_error(err: &Error) -> ExitCode {
        match err.category() {
            ErrorCategory::Model => ExitCode::InvalidModel,
            ErrorCategory::Observation => ExitCode::InvalidObservations,
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Training => ExitCode::InternalError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
