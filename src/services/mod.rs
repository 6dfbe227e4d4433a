/// Building blocks shared by services
pub mod common;
/// Client side of the UMMS media-player service
pub mod umms;

pub use umms::{DbusPlayerBus, PlayerBus, SessionError, SessionManager};
