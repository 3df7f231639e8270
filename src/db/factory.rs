//! Store factory for dependency injection.
//!
//! This module provides utilities for creating and configuring statistics
//! store instances based on runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "json-repo")]
use super::repositories::JsonStore;
use super::repositories::LocalStore;
use super::repository::{FullStore, StoreError, StoreResult};
use super::store_config::StoreConfig;
// Real config with the json-repo feature, stub otherwise (see db/mod.rs).
use super::JsonStoreConfig;

/// Store type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// Durable JSON-document backend
    Json,
    /// In-memory local store
    Local,
}

impl FromStr for StoreType {
    type Err = String;

    /// Parse store type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("json", "local")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "file" => Ok(Self::Json),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown store type: {}", s)),
        }
    }
}

impl StoreType {
    /// Get store type from environment.
    ///
    /// Reads the `STORE_TYPE` environment variable. Defaults to Json when a
    /// data directory is configured via `SPS_DATA_DIR`, otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("STORE_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("SPS_DATA_DIR").is_ok() {
            Self::Json
        } else {
            Self::Local
        }
    }
}

/// Factory for creating statistics store instances.
///
/// # Example
/// ```ignore
/// use sps_rust::db::{StoreFactory, StoreType};
///
/// let local = StoreFactory::create_local();
/// let durable = StoreFactory::from_env()?;
/// ```
pub struct StoreFactory;

impl StoreFactory {
    /// Create a store instance based on type.
    ///
    /// # Arguments
    /// * `store_type` - Type of store to create
    /// * `json_config` - JSON backend configuration (required for Json)
    ///
    /// # Returns
    /// * `Ok(Arc<dyn FullStore>)` - Boxed store instance
    /// * `Err(StoreError)` - If creation fails
    pub fn create(
        store_type: StoreType,
        json_config: Option<&JsonStoreConfig>,
    ) -> StoreResult<Arc<dyn FullStore>> {
        match store_type {
            StoreType::Json => {
                #[cfg(feature = "json-repo")]
                {
                    let config = json_config.ok_or_else(|| {
                        StoreError::configuration("Json store requires JsonStoreConfig")
                    })?;
                    let store = Self::create_json(config.clone())?;
                    Ok(store as Arc<dyn FullStore>)
                }
                #[cfg(not(feature = "json-repo"))]
                {
                    let _ = json_config;
                    Err(StoreError::configuration(
                        "Json store feature not enabled",
                    ))
                }
            }
            StoreType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a durable JSON-document store.
    ///
    /// # Arguments
    /// * `config` - JSON backend configuration
    #[cfg(feature = "json-repo")]
    pub fn create_json(config: JsonStoreConfig) -> StoreResult<Arc<JsonStore>> {
        let store = JsonStore::open(config)?;
        Ok(Arc::new(store))
    }

    /// Create an in-memory local store.
    pub fn create_local() -> Arc<dyn FullStore> {
        Arc::new(LocalStore::new())
    }

    /// Create a store from environment configuration.
    ///
    /// Reads `STORE_TYPE` to select the backend; the Json backend reads its
    /// data directory from `SPS_DATA_DIR` and its lock bound from
    /// `SPS_LOCK_TIMEOUT_MS`.
    pub fn from_env() -> StoreResult<Arc<dyn FullStore>> {
        match StoreType::from_env() {
            StoreType::Json => {
                #[cfg(feature = "json-repo")]
                {
                    let data_dir = std::env::var("SPS_DATA_DIR")
                        .unwrap_or_else(|_| "data".to_string());
                    let mut config = JsonStoreConfig::new(data_dir);
                    if let Some(ms) = std::env::var("SPS_LOCK_TIMEOUT_MS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                    {
                        config = config
                            .with_lock_timeout(std::time::Duration::from_millis(ms));
                    }
                    let store = Self::create_json(config)?;
                    Ok(store as Arc<dyn FullStore>)
                }
                #[cfg(not(feature = "json-repo"))]
                {
                    Err(StoreError::configuration(
                        "Json store feature not enabled",
                    ))
                }
            }
            StoreType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a store from a TOML configuration file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the store.toml configuration file
    pub fn from_config_file<P: AsRef<Path>>(config_path: P) -> StoreResult<Arc<dyn FullStore>> {
        let config = StoreConfig::from_file(config_path)?;
        Self::from_store_config(&config)
    }

    /// Create a store from the default configuration file location.
    ///
    /// Searches for `store.toml` in standard locations.
    pub fn from_default_config() -> StoreResult<Arc<dyn FullStore>> {
        let config = StoreConfig::from_default_location()?;
        Self::from_store_config(&config)
    }

    fn from_store_config(config: &StoreConfig) -> StoreResult<Arc<dyn FullStore>> {
        let store_type = config
            .store_type()
            .map_err(|e| StoreError::configuration(format!("Invalid store type: {}", e)))?;

        match store_type {
            StoreType::Json => {
                #[cfg(feature = "json-repo")]
                {
                    let store = Self::create_json(config.to_json_config())?;
                    Ok(store as Arc<dyn FullStore>)
                }
                #[cfg(not(feature = "json-repo"))]
                {
                    Err(StoreError::configuration(
                        "Json store feature not enabled",
                    ))
                }
            }
            StoreType::Local => Ok(Self::create_local()),
        }
    }
}

/// Builder for configuring store creation.
///
/// Provides a fluent API for configuring and creating store instances.
///
/// # Example
/// ```ignore
/// use sps_rust::db::{StoreBuilder, StoreType};
///
/// let store = StoreBuilder::new()
///     .store_type(StoreType::Local)
///     .build()?;
/// ```
pub struct StoreBuilder {
    store_type: StoreType,
    #[cfg(feature = "json-repo")]
    json_config: Option<JsonStoreConfig>,
}

impl StoreBuilder {
    /// Create a new store builder with defaults taken from the environment.
    pub fn new() -> Self {
        Self {
            store_type: StoreType::from_env(),
            #[cfg(feature = "json-repo")]
            json_config: None,
        }
    }

    /// Set the store type.
    pub fn store_type(mut self, store_type: StoreType) -> Self {
        self.store_type = store_type;
        self
    }

    /// Set the JSON backend configuration.
    #[cfg(feature = "json-repo")]
    pub fn json_config(mut self, config: JsonStoreConfig) -> Self {
        self.json_config = Some(config);
        self
    }

    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the store.toml configuration file
    pub fn from_config_file<P: AsRef<Path>>(mut self, config_path: P) -> Result<Self, StoreError> {
        let store_config = StoreConfig::from_file(config_path)?;

        self.store_type = store_config
            .store_type()
            .map_err(|e| StoreError::configuration(format!("Invalid store type: {}", e)))?;

        if self.store_type == StoreType::Json {
            #[cfg(feature = "json-repo")]
            {
                self.json_config = Some(store_config.to_json_config());
            }
            #[cfg(not(feature = "json-repo"))]
            {
                return Err(StoreError::configuration(
                    "Json store feature not enabled",
                ));
            }
        }

        Ok(self)
    }

    /// Build the store instance.
    pub fn build(self) -> StoreResult<Arc<dyn FullStore>> {
        #[cfg(feature = "json-repo")]
        let json_config = self.json_config.as_ref();
        #[cfg(not(feature = "json-repo"))]
        let json_config: Option<&JsonStoreConfig> = None;

        StoreFactory::create(self.store_type, json_config)
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
