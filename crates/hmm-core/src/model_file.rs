//! Versioned JSON model files.

use crate::inference::model::CategoricalHmm;
use hmm_common::{Error, Implementation, Result, SCHEMA_VERSION};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// On-disk form of a categorical HMM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub implementation: Implementation,
    /// Initial state distribution, length n_states.
    pub startprob: Vec<f64>,
    /// Row-stochastic n_states x n_states transition matrix.
    pub transmat: Vec<Vec<f64>>,
    /// Row-stochastic n_states x n_symbols emission matrix.
    pub emissionprob: Vec<Vec<f64>>,
}

impl ModelFile {
    pub fn from_model(model: &CategoricalHmm) -> Self {
        Self {
            schema_version: default_schema_version(),
            implementation: model.implementation(),
            startprob: model.startprob().to_vec(),
            transmat: model.transmat().to_vec(),
            emissionprob: model.emissionprob().to_vec(),
        }
    }

    /// Check the version and build a validated model.
    pub fn into_model(self) -> Result<CategoricalHmm> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::VersionMismatch {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version,
            });
        }
        CategoricalHmm::categorical(
            self.startprob,
            self.transmat,
            self.emissionprob,
            self.implementation,
        )
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read and validate a model file.
pub fn load_model(path: &Path) -> Result<CategoricalHmm> {
    let content = std::fs::read_to_string(path)?;
    ModelFile::from_json_str(&content)?.into_model()
}

/// Write a model as pretty JSON.
pub fn save_model(model: &CategoricalHmm, path: &Path) -> Result<()> {
    let json = ModelFile::from_model(model).to_json_string()?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}
