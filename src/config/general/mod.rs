mod log_level;

pub use log_level::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};

/// General configuration settings for the client.
///
/// Contains settings that affect the application as a whole rather than
/// the media session, such as logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneralConfig {
    /// Logging level for the application.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Layout of console log output.
    #[serde(default)]
    pub log_format: LogFormat,
}
