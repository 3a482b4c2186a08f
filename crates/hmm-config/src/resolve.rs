//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI path → CLI preset → environment variable → XDG path → defaults.

use crate::fit::FitConfig;
use crate::preset::{get_preset, PresetName};
use crate::validate::{validate_fit_config, ValidationError, ValidationResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Where a configuration was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Named preset selected on the command line.
    Preset(PresetName),

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Preset(name) => write!(f, "preset {}", name),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable naming a fit config file.
pub const ENV_FIT_CONFIG: &str = "HMM_FIT_CONFIG";

/// Standard config file name inside the XDG directory.
const FIT_CONFIG_FILENAME: &str = "fit.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "hmm";

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to the fit config (None if not found).
    pub fit: Option<PathBuf>,

    /// Source of the fit config (for diagnostics).
    pub source: ConfigSource,
}

/// A validated fit configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedFitConfig {
    pub config: FitConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// SHA-256 of the file content (None for presets and defaults).
    pub hash: Option<String>,
}

/// Find the fit config file without the CLI layer (env, then XDG).
pub fn discover_config_path() -> ConfigPaths {
    if let Ok(env_path) = std::env::var(ENV_FIT_CONFIG) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigPaths {
                fit: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(xdg_config) = dirs::config_dir() {
        let path = xdg_config.join(APP_NAME).join(FIT_CONFIG_FILENAME);
        if path.exists() {
            return ConfigPaths {
                fit: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    ConfigPaths::default()
}

/// Resolve, load and validate the fit configuration.
///
/// An explicit path that cannot be read is an error rather than a silent
/// fallback to defaults.
pub fn resolve_fit_config(
    cli_path: Option<&Path>,
    preset: Option<PresetName>,
) -> ValidationResult<ResolvedFitConfig> {
    let resolved = if let Some(path) = cli_path {
        let (config, hash) = load_fit_config(path)?;
        ResolvedFitConfig {
            config,
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
            hash: Some(hash),
        }
    } else if let Some(name) = preset {
        ResolvedFitConfig {
            config: get_preset(name),
            path: None,
            source: ConfigSource::Preset(name),
            hash: None,
        }
    } else {
        let discovered = discover_config_path();
        match discovered.fit {
            Some(path) => {
                let (config, hash) = load_fit_config(&path)?;
                ResolvedFitConfig {
                    config,
                    path: Some(path),
                    source: discovered.source,
                    hash: Some(hash),
                }
            }
            None => ResolvedFitConfig {
                config: FitConfig::default(),
                path: None,
                source: ConfigSource::BuiltinDefault,
                hash: None,
            },
        }
    };

    validate_fit_config(&resolved.config)?;
    Ok(resolved)
}

/// Load a fit config file (JSON when the extension is `.json`, TOML otherwise).
///
/// Returns the parsed config and the SHA-256 of the raw content.
pub fn load_fit_config(path: &Path) -> ValidationResult<(FitConfig, String)> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content)
            .map_err(|e| ValidationError::ParseError(format!("{}: {}", path.display(), e)))?
    } else {
        FitConfig::from_toml_str(&content)
            .map_err(|e| ValidationError::ParseError(format!("{}: {}", path.display(), e)))?
    };

    Ok((config, content_hash(&content)))
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
