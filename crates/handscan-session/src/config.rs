//! Session configuration.
//!
//! Every field has a default taken from [`handscan_core::constants`], so a
//! partial JSON document (or none at all) yields a usable configuration.
//! Sources are layered with the `config` crate: JSON file first, then
//! `HANDSCAN_*` environment variables.
//!
//! ```
//! use handscan_session::SessionConfig;
//!
//! let config = SessionConfig::from_json_str(r#"{ "tag_page_size": 8 }"#).unwrap();
//! assert_eq!(config.tag_page_size, 8);
//! assert_eq!(config.max_power, 270);
//! ```

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use handscan_core::constants::{
    DEFAULT_ANTENNA_INDEX, DEFAULT_FAULT_CAPACITY, DEFAULT_NOTIFICATION_CAPACITY,
    DEFAULT_TAG_PAGE_SIZE, MAX_POWER,
};
use handscan_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix of environment variables that override configuration fields.
pub const ENV_PREFIX: &str = "HANDSCAN";

/// Tunables for a reader session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tags fetched from the driver per read notification.
    pub tag_page_size: usize,

    /// Capacity of the outward notification channel.
    ///
    /// When a consumer falls behind by more than this many notifications the
    /// oldest ones are discarded for that consumer.
    pub notification_capacity: usize,

    /// Capacity of the internal fault-reporting channel.
    pub fault_capacity: usize,

    /// Highest transmit power index accepted by `set_power`.
    pub max_power: u16,

    /// Antenna whose RF configuration receives power changes.
    pub antenna_index: u16,

    /// Ask the reader to keep the scan mode across power cycles.
    pub persist_scan_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tag_page_size: DEFAULT_TAG_PAGE_SIZE,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            fault_capacity: DEFAULT_FAULT_CAPACITY,
            max_power: MAX_POWER,
            antenna_index: DEFAULT_ANTENNA_INDEX,
            persist_scan_mode: true,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if the document is malformed or fails
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(json, FileFormat::Json)))
    }

    /// Load configuration from an optional JSON file, then `HANDSCAN_*`
    /// environment variables (for example `HANDSCAN_TAG_PAGE_SIZE=4`).
    ///
    /// Environment values override the file; unset fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if the file is missing or malformed, a value
    /// has the wrong type, or the result fails [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading session configuration");
            builder = builder.add_source(File::from(path).format(FileFormat::Json));
        }
        Self::from_builder(builder.add_source(env.try_parsing(true)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: Self = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| Error::Settings(e.to_string()))?;
        config.validate()?;
        debug!(?config, "Session configuration loaded");
        Ok(config)
    }

    /// Check that all values are usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if a page size or channel capacity is zero, or
    /// the antenna index is zero (antennas are numbered from 1).
    pub fn validate(&self) -> Result<()> {
        if self.tag_page_size == 0 {
            return Err(Error::Settings("tag_page_size must be at least 1".into()));
        }
        if self.notification_capacity == 0 {
            return Err(Error::Settings(
                "notification_capacity must be at least 1".into(),
            ));
        }
        if self.fault_capacity == 0 {
            return Err(Error::Settings("fault_capacity must be at least 1".into()));
        }
        if self.antenna_index == 0 {
            return Err(Error::Settings("antenna_index starts at 1".into()));
        }
        Ok(())
    }

    /// Pretty-printed JSON form, suitable as a starting config file.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Settings(e.to_string()))
    }
}
