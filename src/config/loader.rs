//! Configuration loading from disk.
//!
//! First run writes a complete default file (including a freshly
//! generated pepper) before the gateway starts serving. Later runs
//! reload that file; files from an older schema version are
//! default-filled and rewritten so behavior stays deterministic.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::schema::{DispatchConfig, CONFIG_VERSION};
use crate::config::validation::{validate_config, ValidationError};

// Serializes config writes so racing first runs cannot interleave.
static SAVE_LOCK: Mutex<()> = Mutex::new(());

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of [`load_or_create`].
#[derive(Debug)]
pub struct LoadedConfig {
    /// The validated configuration.
    pub config: DispatchConfig,

    /// True when no file existed and a default one was written.
    pub created: bool,

    /// True when an existing file was default-filled and rewritten.
    pub migrated: bool,
}

/// Load the configuration at `path`, writing a default file if none
/// exists yet.
pub fn load_or_create(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let _guard = SAVE_LOCK.lock().expect("config save lock poisoned");

    if !path.exists() {
        let config = DispatchConfig::default();
        validate_config(&config).map_err(ConfigError::Validation)?;
        persist_unlocked(path, &config)?;
        info!(path = %path.display(), "Wrote default configuration");
        return Ok(LoadedConfig {
            config,
            created: true,
            migrated: false,
        });
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    // A file that never carried a pepper gets one generated by the
    // default fill; it must be written back or every restart would mint
    // a new pepper and orphan all stored hash records.
    let had_pepper = value
        .pointer("/password/hash_pepper")
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    let stored_version = value
        .pointer("/version")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut config: DispatchConfig =
        serde_json::from_value(value).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let migrated = stored_version < u64::from(CONFIG_VERSION) || !had_pepper;
    if stored_version <= u64::from(CONFIG_VERSION) {
        config.version = CONFIG_VERSION;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    if migrated {
        persist_unlocked(path, &config)?;
        info!(path = %path.display(), from_version = stored_version, "Migrated configuration file");
    }

    Ok(LoadedConfig {
        config,
        created: false,
        migrated,
    })
}

/// Write a configuration to disk as pretty-printed JSON.
pub fn persist(path: &Path, config: &DispatchConfig) -> Result<(), ConfigError> {
    let _guard = SAVE_LOCK.lock().expect("config save lock poisoned");
    persist_unlocked(path, config)
}

fn persist_unlocked(path: &Path, config: &DispatchConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let mut body = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    body.push('\n');
    fs::write(path, body).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");

        let loaded = load_or_create(&path).unwrap();
        assert!(loaded.created);
        assert!(!loaded.migrated);
        assert!(path.exists());
        assert_eq!(loaded.config.servers[0].server_name, "sorapointa_01");
    }

    #[test]
    fn second_load_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");

        let first = load_or_create(&path).unwrap();
        let second = load_or_create(&path).unwrap();
        assert!(!second.created);
        assert!(!second.migrated);
        assert_eq!(
            first.config.password.hash_pepper,
            second.config.password.hash_pepper
        );
    }

    #[test]
    fn missing_pepper_is_generated_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");
        fs::write(&path, r#"{"version": 1, "password": {"iterations": 3}}"#).unwrap();

        let loaded = load_or_create(&path).unwrap();
        assert!(loaded.migrated);
        assert!(!loaded.config.password.hash_pepper.is_empty());
        assert_eq!(loaded.config.password.iterations, 3);

        let reloaded = load_or_create(&path).unwrap();
        assert!(!reloaded.migrated);
        assert_eq!(
            loaded.config.password.hash_pepper,
            reloaded.config.password.hash_pepper
        );
    }

    #[test]
    fn older_version_is_migrated_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");

        let mut config = DispatchConfig::default();
        config.version = 0;
        config.port = 8443;
        persist(&path, &config).unwrap();

        let loaded = load_or_create(&path).unwrap();
        assert!(loaded.migrated);
        assert_eq!(loaded.config.version, CONFIG_VERSION);
        assert_eq!(loaded.config.port, 8443);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": 1"));
    }

    #[test]
    fn invalid_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");
        fs::write(&path, r#"{"version": 0, "servers": []}"#).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let result = load_or_create(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn unparseable_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.json");
        fs::write(&path, "{ not json").unwrap();

        let result = load_or_create(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
