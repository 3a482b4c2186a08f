//! Configuration presets for common training regimes.
//!
//! Provides pre-built configurations for:
//! - Default: short run with a loose tolerance
//! - Quick: a handful of iterations for smoke tests
//! - Thorough: long run to a tight tolerance
//! - Reproducible: seeded initialisation with regressions treated as failures

use crate::fit::FitConfig;
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Default,
    Quick,
    Thorough,
    Reproducible,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Default,
        PresetName::Quick,
        PresetName::Thorough,
        PresetName::Reproducible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Quick => "quick",
            PresetName::Thorough => "thorough",
            PresetName::Reproducible => "reproducible",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" => Some(PresetName::Default),
            "quick" | "smoke" => Some(PresetName::Quick),
            "thorough" | "full" => Some(PresetName::Thorough),
            "reproducible" | "repro" | "seeded" => Some(PresetName::Reproducible),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => "10 iterations, stop when the gain drops below 1e-2",
            PresetName::Quick => "5 iterations for smoke tests",
            PresetName::Thorough => "up to 500 iterations, stop when the gain drops below 1e-6",
            PresetName::Reproducible => "seeded initialisation, fail on likelihood regressions",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| ValidationError::UnknownPreset(s.to_string()))
    }
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> FitConfig {
    match name {
        PresetName::Default => FitConfig::default(),
        PresetName::Quick => FitConfig {
            n_iter: 5,
            ..Default::default()
        },
        PresetName::Thorough => FitConfig {
            n_iter: 500,
            tol: 1e-6,
            ..Default::default()
        },
        PresetName::Reproducible => FitConfig {
            seed: Some(0),
            strict: true,
            ..Default::default()
        },
    }
}
