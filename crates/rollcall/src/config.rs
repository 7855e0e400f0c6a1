//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::FlowKind;
use crate::session::FlowConfig;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "rollcall.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, sections split by `__`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Session timing and policy.
    pub session: SessionConfig,
    /// Simulated collaborators.
    pub simulation: SimulationConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/rollcall.db`
    pub database_path: Option<PathBuf>,
}

/// Session timing and policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long to wait for a location fix.
    pub location_timeout_ms: u64,
    /// How long to wait for the recorder.
    pub submit_timeout_ms: u64,
    /// Auto-dismiss delay for office confirmations. 0 waits for the user.
    pub office_auto_dismiss_ms: u64,
    /// Auto-dismiss delay for meeting confirmations. 0 waits for the user.
    pub meeting_auto_dismiss_ms: u64,
    /// Fail instead of recording without a location.
    pub location_required: bool,
}

/// Settings for the simulated location provider and recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Latitude reported by the simulated provider.
    pub latitude: f64,
    /// Longitude reported by the simulated provider.
    pub longitude: f64,
    /// Delay before the simulated fix arrives.
    pub location_delay_ms: u64,
    /// Delay before the simulated recorder answers.
    pub submit_delay_ms: u64,
    /// Whether location permission is granted.
    pub location_permission: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            location_timeout_ms: 10_000,
            submit_timeout_ms: 15_000,
            office_auto_dismiss_ms: 2_000,
            meeting_auto_dismiss_ms: 0, // Meeting confirmations wait for the user
            location_required: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latitude: 37.7749,
            longitude: -122.4194,
            location_delay_ms: 1_000,
            submit_delay_ms: 1_500,
            location_permission: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ROLLCALL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.session.location_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "location_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.session.submit_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "submit_timeout_ms must be greater than 0".to_string(),
            });
        }

        if !(-90.0..=90.0).contains(&self.simulation.latitude) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "latitude ({}) must be between -90 and 90",
                    self.simulation.latitude
                ),
            });
        }

        if !(-180.0..=180.0).contains(&self.simulation.longitude) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "longitude ({}) must be between -180 and 180",
                    self.simulation.longitude
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Build the session flow configuration for `kind`.
    #[must_use]
    pub fn flow(&self, kind: FlowKind) -> FlowConfig {
        let auto_dismiss_ms = if kind.is_meeting() {
            self.session.meeting_auto_dismiss_ms
        } else {
            self.session.office_auto_dismiss_ms
        };
        let auto_dismiss = (auto_dismiss_ms > 0).then(|| Duration::from_millis(auto_dismiss_ms));

        FlowConfig::for_kind(kind)
            .with_auto_dismiss(auto_dismiss)
            .with_location_required(self.session.location_required)
    }
}
