//! Fit configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`FitConfig`] consumed by the EM driver
//! - Named presets for common training regimes
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation

pub mod fit;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use fit::FitConfig;
pub use preset::{get_preset, PresetName};
pub use resolve::{resolve_fit_config, ConfigPaths, ResolvedFitConfig};
pub use validate::{validate_fit_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = hmm_common::SCHEMA_VERSION;
