use std::{fmt, io, path::Path, result};

use thiserror::Error;

use crate::{cli::CliError, services::umms::BusError};

/// Top-level errors of the client application.
///
/// Covers everything that can fail before or around the command loop:
/// configuration, logging setup and reaching the media service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration value rejected
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParse {
        /// File path, or "string" for in-memory input
        location: String,
        /// Parse error details
        details: String,
    },

    /// The media service could not be reached at startup
    #[error("cannot reach the media service: {0}")]
    ServiceUnavailable(#[from] BusError),

    /// The command loop stopped on an I/O failure
    #[error(transparent)]
    Cli(#[from] CliError),

    /// Logging could not be initialized
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// A specialized `Result` type for client operations.
pub type Result<T> = result::Result<T, ClientError>;

impl ClientError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        ClientError::TomlParse {
            location,
            details: error.to_string(),
        }
    }
}
