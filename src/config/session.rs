use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    ClientError, Result,
    services::umms::{BusKind, ProtocolVersion},
};

/// Media session configuration
///
/// The service name and object paths are fixed by the service and are
/// deliberately not configurable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Bus the service is registered on.
    pub bus: BusKind,

    /// Protocol revision spoken by the service.
    pub protocol: ProtocolVersion,

    /// Execution budget, in seconds, for players requested with `u`.
    pub unattended_budget_secs: f64,

    /// Whether an attended player is requested before the first prompt.
    pub request_on_start: bool,

    /// URI used when the user enters an empty URI.
    pub default_uri: String,

    /// Recording destination used when the user enters an empty location.
    pub record_location: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::System,
            protocol: ProtocolVersion::Extended,
            unattended_budget_secs: 5.0,
            request_on_start: true,
            default_uri: "file:///root/720p.m4v".to_string(),
            record_location: "/tmp/record.ts".to_string(),
        }
    }
}

impl SessionConfig {
    /// The unattended budget as a duration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the budget is negative or not finite.
    pub fn unattended_budget(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.unattended_budget_secs).map_err(|_| {
            ClientError::Config(format!(
                "session.unattended_budget_secs must be a non-negative number, got {}",
                self.unattended_budget_secs
            ))
        })
    }
}
