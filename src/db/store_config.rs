//! Store configuration file support.
//!
//! This module provides utilities for reading store configuration from
//! TOML configuration files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::factory::StoreType;
use super::repository::StoreError;

/// Store configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub store: StoreSettings,
    #[serde(default)]
    pub json: JsonSettings,
}

/// Store type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(rename = "type")]
    pub store_type: String,
}

/// JSON-document backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

impl StoreConfig {
    /// Load store configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(StoreConfig)` if successful
    /// * `Err(StoreError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::configuration(format!("Failed to read config file: {}", e))
        })?;

        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            StoreError::configuration(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Load store configuration from the default location.
    ///
    /// Searches for `store.toml` in the current directory and the parent
    /// directory.
    ///
    /// # Returns
    /// * `Ok(StoreConfig)` if found and parsed successfully
    /// * `Err(StoreError)` if no config file found or parse error
    pub fn from_default_location() -> Result<Self, StoreError> {
        let search_paths = vec![
            PathBuf::from("store.toml"),
            PathBuf::from("./store.toml"),
            PathBuf::from("../store.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(StoreError::configuration(
            "No store.toml found in standard locations",
        ))
    }

    /// Parse the configured store type.
    pub fn store_type(&self) -> Result<StoreType, String> {
        StoreType::from_str(&self.store.store_type)
    }

    /// Build the JSON backend configuration from the file settings.
    #[cfg(feature = "json-repo")]
    pub fn to_json_config(&self) -> super::repositories::JsonStoreConfig {
        super::repositories::JsonStoreConfig::new(&self.json.data_dir)
            .with_lock_timeout(std::time::Duration::from_millis(self.json.lock_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: StoreConfig = toml::from_str(
            r#"
            [store]
            type = "json"

            [json]
            data_dir = "/var/lib/sps"
            lock_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.store_type().unwrap(), StoreType::Json);
        assert_eq!(config.json.data_dir, "/var/lib/sps");
        assert_eq!(config.json.lock_timeout_ms, 250);
    }

    #[test]
    fn test_json_section_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            [store]
            type = "local"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_type().unwrap(), StoreType::Local);
        assert_eq!(config.json.data_dir, "data");
        assert_eq!(config.json.lock_timeout_ms, 5000);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let result = StoreConfig::from_file("/definitely/not/here/store.toml");
        assert!(matches!(result, Err(StoreError::Configuration { .. })));
    }
}
