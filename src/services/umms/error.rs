use super::{PlayerPath, ProtocolVersion};

/// Failure reported by the bus adapter.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BusError {
    /// The bus or the service could not be reached
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The addressed object no longer exists
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// The service answered the call with an error
    #[error("{name}: {message}")]
    Rejected {
        /// D-Bus error name
        name: String,
        /// Error message sent by the service
        message: String,
    },

    /// A reply or signal body did not have the expected shape
    #[error("malformed message: {0}")]
    Decode(String),
}

const UNREACHABLE_ERRORS: [&str; 5] = [
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.freedesktop.DBus.Error.NameHasNoOwner",
    "org.freedesktop.DBus.Error.NoReply",
    "org.freedesktop.DBus.Error.Disconnected",
    "org.freedesktop.DBus.Error.NoServer",
];

const UNKNOWN_OBJECT_ERRORS: [&str; 3] = [
    "org.freedesktop.DBus.Error.UnknownObject",
    "org.freedesktop.DBus.Error.UnknownMethod",
    "org.freedesktop.DBus.Error.UnknownInterface",
];

impl From<zbus::Error> for BusError {
    fn from(error: zbus::Error) -> Self {
        match error {
            zbus::Error::MethodError(name, message, _) => {
                let name = name.to_string();
                let message = message.unwrap_or_default();
                if UNREACHABLE_ERRORS.contains(&name.as_str()) {
                    Self::Unreachable(message)
                } else if UNKNOWN_OBJECT_ERRORS.contains(&name.as_str()) {
                    Self::UnknownObject(message)
                } else {
                    Self::Rejected { name, message }
                }
            }
            zbus::Error::FDO(fdo) => match *fdo {
                zbus::fdo::Error::ServiceUnknown(msg)
                | zbus::fdo::Error::NameHasNoOwner(msg)
                | zbus::fdo::Error::NoReply(msg)
                | zbus::fdo::Error::Disconnected(msg)
                | zbus::fdo::Error::NoServer(msg) => Self::Unreachable(msg),
                zbus::fdo::Error::UnknownObject(msg)
                | zbus::fdo::Error::UnknownMethod(msg)
                | zbus::fdo::Error::UnknownInterface(msg) => Self::UnknownObject(msg),
                other => Self::Rejected {
                    name: "org.freedesktop.DBus.Error".to_string(),
                    message: other.to_string(),
                },
            },
            zbus::Error::InputOutput(e) => Self::Unreachable(e.to_string()),
            zbus::Error::Address(e) => Self::Unreachable(e),
            zbus::Error::Handshake(e) => Self::Unreachable(e),
            zbus::Error::Variant(e) => Self::Decode(e.to_string()),
            zbus::Error::InvalidReply => Self::Decode("invalid reply".to_string()),
            other => Self::Rejected {
                name: "zbus".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// A wire value that maps to nothing in the active protocol revision.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Player state ordinal outside the revision's state table
    #[error("unrecognized player state ordinal {raw} for protocol '{version}'")]
    PlayerState {
        /// Ordinal received
        raw: i32,
        /// Revision used for decoding
        version: ProtocolVersion,
    },

    /// Signal body did not have any of the expected shapes
    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// Errors surfaced by the session manager.
///
/// Every remote failure is converted into one of these before it reaches
/// the command dispatcher.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The bus or the media service cannot be reached
    #[error("media service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service declined to hand out a player
    #[error("service declined to create a player: {0}")]
    ResourceExhausted(String),

    /// The handle is stale or was already removed
    #[error("player {path} is no longer valid: {reason}")]
    InvalidHandle {
        /// Object path of the stale player
        path: PlayerPath,
        /// What the service reported
        reason: String,
    },

    /// A new player could not be subscribed to and was released again
    ///
    /// An attended player without a listener would miss its liveness pings
    /// and be reclaimed by the service.
    #[error("cannot receive notifications from {path}, player released: {reason}")]
    SubscriptionFailed {
        /// Object path of the released player
        path: PlayerPath,
        /// Why the subscription failed
        reason: String,
    },

    /// The operation needs a player but none is current
    #[error("no active player; request one first ('r' or 'u')")]
    NoActiveSession,

    /// The service rejected a call on a valid player
    #[error("{method} failed: {reason}")]
    CallFailed {
        /// Remote method name
        method: &'static str,
        /// What the service reported
        reason: String,
    },

    /// The reply carried a value the protocol does not define
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
