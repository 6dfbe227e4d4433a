use std::{
    env, fs,
    io::{Error, ErrorKind},
    path::PathBuf,
};

const APP_NAME: &str = "umms-client";
const CONFIG_FILE: &str = "config.toml";

/// Locations of the configuration file and the log directory
///
/// The configuration lives under the XDG config home; logs go to
/// `$HOME/.umms-client/logs`.
pub struct ConfigPaths;

impl ConfigPaths {
    /// Directory holding `config.toml`
    ///
    /// `$XDG_CONFIG_HOME/umms-client`, or `$HOME/.config/umms-client`
    /// when the XDG variable is unset.
    ///
    /// # Errors
    /// Returns `NotFound` if neither variable is set
    pub fn config_dir() -> Result<PathBuf, Error> {
        let base = match env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home()?.join(".config"),
        };
        Ok(base.join(APP_NAME))
    }

    /// Path of the user's configuration file. It may not exist.
    ///
    /// # Errors
    /// Same as [`ConfigPaths::config_dir`]
    pub fn main_config() -> Result<PathBuf, Error> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Directory for rolling log files, created on first use.
    ///
    /// # Errors
    /// Returns an error if `HOME` is unset or the directory cannot be created
    pub fn log_dir() -> Result<PathBuf, Error> {
        let dir = home()?.join(format!(".{APP_NAME}")).join("logs");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn home() -> Result<PathBuf, Error> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))
}
