//! Host configuration for ExtHost
//!
//! Configuration is read from `~/.exthost/config.json`. Every field is
//! optional: a missing file or a partial file falls back to defaults, so a
//! freshly installed host runs with no setup. CLI flags override file
//! values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExtHostError, Result};

/// Host configuration, stored as `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for extension archives.
    /// Defaults to `"extensions"` relative to the working directory.
    pub extensions_dir: String,

    /// Seconds between periodic update passes in `run` mode.
    pub update_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions_dir: crate::extensions::DEFAULT_DIRECTORY.to_string(),
            update_interval_secs: 30,
        }
    }
}

impl Config {
    /// The ExtHost home directory (`~/.exthost`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".exthost")
    }

    /// Default config file location (`~/.exthost/config.json`).
    pub fn default_path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults; a present file must parse and
    /// validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.extensions_dir.trim().is_empty() {
            return Err(ExtHostError::Config(
                "extensions_dir must not be empty".to_string(),
            ));
        }
        if self.update_interval_secs == 0 {
            return Err(ExtHostError::Config(
                "update_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured extensions directory as a path.
    pub fn extensions_dir(&self) -> PathBuf {
        PathBuf::from(&self.extensions_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.extensions_dir, "extensions");
        assert_eq!(config.update_interval_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(Some(&tmp.path().join("absent.json"))).unwrap();
        assert_eq!(config.extensions_dir, "extensions");
    }

    #[test]
    fn test_load_partial_file_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"extensions_dir": "/srv/extensions"}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.extensions_dir, "/srv/extensions");
        assert_eq!(config.update_interval_secs, 30);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"update_interval_secs": 0}"#).unwrap();

        let result = Config::load(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ broken").unwrap();

        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(ExtHostError::Json(_))));
    }

    #[test]
    fn test_validate_empty_dir_rejected() {
        let config = Config {
            extensions_dir: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
