//! Configuration schema and loading.
//!
//! The configuration file is optional. A missing file yields defaults;
//! a present but invalid file is an error.

mod general;
mod paths;
mod session;

#[cfg(test)]
mod tests;

pub use general::{GeneralConfig, LogFormat, LogLevel};
pub use paths::ConfigPaths;
pub use session::SessionConfig;

use std::{fs, io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ClientError, Result};

/// Main configuration structure for the client.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Media session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the file cannot be read and
    /// `ClientError::TomlParse` if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ClientError::TomlParse { details, .. } => ClientError::toml_parse(details, Some(path)),
            other => other,
        })?;
        config.session.unattended_budget()?;
        Ok(config)
    }

    /// Load the configuration from `path`, or defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], except for a missing file.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        match Self::load(path) {
            Err(ClientError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                Ok(Config::default())
            }
            other => other,
        }
    }

    /// Load from the default location under the user's config directory.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load_or_default`], plus a failure to locate the
    /// config directory.
    pub fn load_user() -> Result<Config> {
        let path = ConfigPaths::main_config()?;
        Self::load_or_default(&path)
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::TomlParse` on syntax errors or unknown values.
    pub fn from_toml(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| ClientError::toml_parse(e, None))
    }
}
