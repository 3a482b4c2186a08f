//! EM driver configuration.

use hmm_common::{EmptyStatePolicy, Implementation, ParamSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_n_iter() -> usize {
    10
}

fn default_tol() -> f64 {
    1e-2
}

fn default_regression_tolerance() -> f64 {
    1e-8
}

/// Parameters controlling one Baum-Welch training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FitConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Maximum number of EM iterations.
    #[serde(default = "default_n_iter")]
    pub n_iter: usize,

    /// Stop once the log-likelihood gain between iterations drops below this.
    #[serde(default = "default_tol")]
    pub tol: f64,

    /// Arithmetic used by the recursions.
    #[serde(default)]
    pub implementation: Implementation,

    /// Parameters re-estimated by the M-step.
    #[serde(default)]
    #[schemars(with = "String")]
    pub params: ParamSet,

    /// Parameters initialised before the first iteration.
    #[serde(default)]
    #[schemars(with = "String")]
    pub init_params: ParamSet,

    /// Symbol cardinality; derived from the training data when absent.
    #[serde(default)]
    pub n_symbols: Option<usize>,

    /// Seed for random initialisation.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fallback for states with zero expected counts.
    #[serde(default)]
    pub empty_state_policy: EmptyStatePolicy,

    /// Largest log-likelihood decrease tolerated before it is reported.
    #[serde(default = "default_regression_tolerance")]
    pub regression_tolerance: f64,

    /// Fail the fit instead of warning when the log-likelihood decreases.
    #[serde(default)]
    pub strict: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            n_iter: default_n_iter(),
            tol: default_tol(),
            implementation: Implementation::default(),
            params: ParamSet::ALL,
            init_params: ParamSet::ALL,
            n_symbols: None,
            seed: None,
            empty_state_policy: EmptyStatePolicy::default(),
            regression_tolerance: default_regression_tolerance(),
            strict: false,
        }
    }
}

impl FitConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
