//! Interactive test client for the UMMS media-player service.
//!
//! The client talks to the service over D-Bus: it requests player objects
//! from the object manager, drives them through a numbered command table,
//! and prints the notifications they emit while the user types.
//!
//! - [`services::umms`] holds the bus adapter, the session manager and the
//!   notification listeners
//! - [`cli`] holds the method registry, the command dispatcher and output
//!   formatting
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use umms_client::services::umms::{
//!     BusKind, DbusPlayerBus, PlayerCall, PlayerRequest, ProtocolVersion, SessionManager,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let version = ProtocolVersion::Extended;
//! let bus = DbusPlayerBus::connect(BusKind::System, version).await?;
//! let session = SessionManager::new(Arc::new(bus), version);
//!
//! session.request_player(PlayerRequest::Attended).await?;
//! session.call(&PlayerCall::SetUri("file:///root/720p.m4v".into())).await?;
//! session.call(&PlayerCall::Play).await?;
//! # Ok(())
//! # }
//! ```

/// Interactive command loop.
pub mod cli;

/// Configuration schema and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Clients of remote services.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{ClientError, Result};
