//! Configuration validation errors and semantic validation.

use crate::fit::FitConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 30,
            ValidationError::ParseError(_) => 31,
            ValidationError::InvalidValue { .. } => 32,
            ValidationError::VersionMismatch { .. } => 33,
            ValidationError::UnknownPreset(_) => 34,
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for hmm_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::VersionMismatch { expected, actual } => {
                hmm_common::Error::VersionMismatch { expected, actual }
            }
            other => hmm_common::Error::Config(other.to_string()),
        }
    }
}

/// Validate a fit configuration semantically.
pub fn validate_fit_config(config: &FitConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.n_iter == 0 {
        return Err(ValidationError::invalid("n_iter", "must be at least 1"));
    }

    if !config.tol.is_finite() || config.tol < 0.0 {
        return Err(ValidationError::invalid(
            "tol",
            format!("must be a finite non-negative number, got {}", config.tol),
        ));
    }

    if !config.regression_tolerance.is_finite() || config.regression_tolerance < 0.0 {
        return Err(ValidationError::invalid(
            "regression_tolerance",
            format!(
                "must be a finite non-negative number, got {}",
                config.regression_tolerance
            ),
        ));
    }

    if config.params.is_empty() {
        return Err(ValidationError::invalid(
            "params",
            "at least one of s, t, e must be re-estimated",
        ));
    }

    if config.n_symbols == Some(0) {
        return Err(ValidationError::invalid("n_symbols", "must be at least 1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmm_common::ParamSet;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_fit_config(&FitConfig::default()).is_ok());
    }

    #[test]
    fn rejects_zero_iterations() {
        let config = FitConfig {
            n_iter: 0,
            ..Default::default()
        };
        let err = validate_fit_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "n_iter"));
        assert_eq!(err.code(), 32);
    }

    #[test]
    fn rejects_negative_tol_and_empty_params() {
        let config = FitConfig {
            tol: -1.0,
            ..Default::default()
        };
        assert!(validate_fit_config(&config).is_err());

        let config = FitConfig {
            params: ParamSet::NONE,
            ..Default::default()
        };
        assert!(validate_fit_config(&config).is_err());
    }

    #[test]
    fn rejects_version_mismatch() {
        let config = FitConfig {
            schema_version: "0.1.0".to_string(),
            ..Default::default()
        };
        let err: hmm_common::Error = validate_fit_config(&config).unwrap_err().into();
        assert!(matches!(err, hmm_common::Error::VersionMismatch { .. }));
    }
}
