//! JSON Schema generation for file formats read by `hmm`.
//!
//! ```bash
//! hmm schema --list
//! hmm schema ModelFile
//! hmm schema --all
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::model_file::ModelFile;
pub use crate::observations::ObservationInput;
pub use hmm_common::Diagnostic;
pub use hmm_config::FitConfig;

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ModelFile", "Categorical HMM parameters"),
        ("FitConfig", "Baum-Welch training configuration"),
        ("ObservationInput", "Observation sequences"),
        ("Diagnostic", "Non-fatal numerical condition"),
    ]
}

/// Generate JSON Schema for a type by name, or None if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "ModelFile" => schema_for!(ModelFile),
        "FitConfig" => schema_for!(FitConfig),
        "ObservationInput" => schema_for!(ObservationInput),
        "Diagnostic" => schema_for!(Diagnostic),
        _ => return None,
    };
    Some(schema.to_value())
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|schema| (name.to_string(), schema)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_schema_generates() {
        let all = generate_all_schemas();
        assert_eq!(all.len(), available_schemas().len());
        assert!(generate_schema("Nope").is_none());
    }

    #[test]
    fn model_schema_names_the_matrices() {
        let schema = generate_schema("ModelFile").unwrap();
        let props = schema["properties"].as_object().unwrap();
        for key in ["startprob", "transmat", "emissionprob", "implementation"] {
            assert!(props.contains_key(key), "{key}");
        }
    }
}
