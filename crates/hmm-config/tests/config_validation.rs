//! File-backed tests for fit config loading and validation.

use hmm_common::{EmptyStatePolicy, Implementation};
use hmm_config::resolve::{load_fit_config, ConfigSource};
use hmm_config::{resolve_fit_config, PresetName, ValidationError};
use std::fs;
use tempfile::TempDir;

#[test]
fn loads_toml_file_with_hash() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.toml");
    fs::write(
        &path,
        "n_iter = 25\ntol = 0.001\nimplementation = \"scaling\"\nempty_state_policy = \"uniform\"\n",
    )
    .unwrap();

    let resolved = resolve_fit_config(Some(&path), Some(PresetName::Quick)).unwrap();
    assert_eq!(resolved.source, ConfigSource::CliArgument);
    assert_eq!(resolved.config.n_iter, 25);
    assert_eq!(resolved.config.implementation, Implementation::Scaling);
    assert_eq!(resolved.config.empty_state_policy, EmptyStatePolicy::Uniform);
    assert_eq!(resolved.hash.as_deref().map(str::len), Some(64));
}

#[test]
fn loads_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.json");
    fs::write(&path, r#"{"n_iter": 3, "params": "e", "seed": 11}"#).unwrap();

    let (config, _hash) = load_fit_config(&path).unwrap();
    assert_eq!(config.n_iter, 3);
    assert!(config.params.emission && !config.params.transmat);
    assert_eq!(config.seed, Some(11));
}

#[test]
fn rejects_semantically_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.toml");
    fs::write(&path, "n_iter = 0\n").unwrap();

    let err = resolve_fit_config(Some(&path), None).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidValue { .. }), "{err}");
}

#[test]
fn rejects_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.toml");
    fs::write(&path, "n_iter = \"many\"\n").unwrap();

    let err = resolve_fit_config(Some(&path), None).unwrap_err();
    assert!(matches!(err, ValidationError::ParseError(_)), "{err}");
    assert_eq!(err.code(), 31);
}
