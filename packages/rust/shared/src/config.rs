//! Application configuration for certnorm.
//!
//! User config lives at `~/.certnorm/certnorm.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CertnormError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "certnorm.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".certnorm";

// ---------------------------------------------------------------------------
// Config structs (matching certnorm.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Token dictionary location.
    #[serde(default)]
    pub tokens: TokensConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Year assumed for month/day dates. Unset means "current year".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_year: Option<i32>,

    /// Pretty-print JSON output.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            base_year: None,
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

/// `[tokens]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokensConfig {
    /// External token dictionary. Replaces the built-in one entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.certnorm/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CertnormError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.certnorm/certnorm.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CertnormError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CertnormError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CertnormError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CertnormError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CertnormError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("pretty = true"));
        assert!(!toml_str.contains("base_year"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert!(parsed.defaults.pretty);
        assert_eq!(parsed.defaults.base_year, None);
        assert_eq!(parsed.tokens.path, None);
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[defaults]
base_year = 2025
pretty = false

[tokens]
path = "/etc/certnorm/tokens.toml"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.base_year, Some(2025));
        assert!(!config.defaults.pretty);
        assert_eq!(config.tokens.path.as_deref(), Some("/etc/certnorm/tokens.toml"));
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse empty");
        assert!(config.defaults.pretty);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/certnorm.toml")).unwrap_err();
        assert!(matches!(err, CertnormError::Io { .. }));
    }
}
