use std::fmt;

use super::{
    DecodeError, MetadataEntry, PlayerPath, PlayerState, ProtocolVersion, TargetInfo,
    error_domain_name,
};

/// Notification names the service may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Engine finished loading the URI
    Initialized,
    /// Playback state changed
    PlayerStateChanged,
    /// End of stream reached
    Eof,
    /// Buffering started
    Buffering,
    /// Buffering completed
    Buffered,
    /// Seek completed
    Seeked,
    /// Playback stopped
    Stopped,
    /// Engine error
    Error,
    /// Engine needs a drawable surface
    RequestWindow,
    /// Video target configured
    TargetReady,
    /// Player suspended by the service
    Suspended,
    /// Player restored after suspension
    Restored,
    /// Service could not allocate a resource
    NoResource,
    /// Liveness ping for attended players
    NeedReply,
    /// Playing-content metadata changed
    MetadataUpdated,
    /// Recording started
    RecordStart,
    /// Recording stopped
    RecordStop,
}

impl SignalKind {
    /// D-Bus member name.
    pub fn member(self) -> &'static str {
        match self {
            Self::Initialized => "Initialized",
            Self::PlayerStateChanged => "PlayerStateChanged",
            Self::Eof => "Eof",
            Self::Buffering => "Buffering",
            Self::Buffered => "Buffered",
            Self::Seeked => "Seeked",
            Self::Stopped => "Stopped",
            Self::Error => "Error",
            Self::RequestWindow => "RequestWindow",
            Self::TargetReady => "TargetReady",
            Self::Suspended => "Suspended",
            Self::Restored => "Restored",
            Self::NoResource => "NoResource",
            Self::NeedReply => "NeedReply",
            Self::MetadataUpdated => "MetadataUpdated",
            Self::RecordStart => "RecordStart",
            Self::RecordStop => "RecordStop",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.member())
    }
}

/// Raw body of `PlayerStateChanged`, before ordinals are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePayload {
    /// Only the new state was sent.
    New(i32),
    /// Both the previous and the new state were sent.
    Transition {
        /// Previous state ordinal
        old: i32,
        /// New state ordinal
        new: i32,
    },
}

/// A notification as delivered by the bus adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerSignal {
    /// Engine initialized
    Initialized,
    /// State changed, raw ordinals
    StateChanged(StatePayload),
    /// End of stream
    Eof,
    /// Buffering began
    Buffering,
    /// Buffering complete
    Buffered,
    /// Seek complete
    Seeked,
    /// Playback stopped
    Stopped,
    /// Engine error
    Error {
        /// Error domain
        domain: u32,
        /// Engine message
        message: String,
    },
    /// Surface requested
    RequestWindow,
    /// Target ready with geometry
    TargetReady(TargetInfo),
    /// Suspended
    Suspended,
    /// Restored
    Restored,
    /// Resource allocation failed
    NoResource,
    /// Liveness ping
    NeedReply,
    /// Metadata list updated
    MetadataUpdated(Vec<MetadataEntry>),
    /// Recording started
    RecordStart,
    /// Recording stopped
    RecordStop,
    /// A notification whose body could not be read
    Unreadable {
        /// Signal that carried the body
        kind: SignalKind,
        /// Why reading failed
        reason: String,
    },
}

impl PlayerSignal {
    /// The signal this notification was delivered as.
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Initialized => SignalKind::Initialized,
            Self::StateChanged(_) => SignalKind::PlayerStateChanged,
            Self::Eof => SignalKind::Eof,
            Self::Buffering => SignalKind::Buffering,
            Self::Buffered => SignalKind::Buffered,
            Self::Seeked => SignalKind::Seeked,
            Self::Stopped => SignalKind::Stopped,
            Self::Error { .. } => SignalKind::Error,
            Self::RequestWindow => SignalKind::RequestWindow,
            Self::TargetReady(_) => SignalKind::TargetReady,
            Self::Suspended => SignalKind::Suspended,
            Self::Restored => SignalKind::Restored,
            Self::NoResource => SignalKind::NoResource,
            Self::NeedReply => SignalKind::NeedReply,
            Self::MetadataUpdated(_) => SignalKind::MetadataUpdated,
            Self::RecordStart => SignalKind::RecordStart,
            Self::RecordStop => SignalKind::RecordStop,
            Self::Unreadable { kind, .. } => *kind,
        }
    }
}

/// Where a notification came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    /// A player object.
    Player(PlayerPath),
    /// The service-wide metadata viewer.
    Service,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(path) => write!(f, "{path}"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// Decoded notification, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A notification without payload, or with a payload rendered verbatim.
    Notice {
        /// Origin of the notification
        source: EventSource,
        /// The notification
        signal: PlayerSignal,
    },
    /// Player state transition with symbolic names.
    StateChanged {
        /// Origin player
        source: EventSource,
        /// Previous state, when the protocol sends it
        old: Option<PlayerState>,
        /// New state
        new: PlayerState,
    },
    /// A liveness ping was acknowledged.
    LivenessAcknowledged(PlayerPath),
    /// A liveness acknowledgement failed.
    LivenessFailed {
        /// Player that was pinged
        path: PlayerPath,
        /// Why the reply failed
        reason: String,
    },
    /// A notification carried a value the protocol does not define.
    Undecodable {
        /// Origin of the notification
        source: EventSource,
        /// Signal that failed
        kind: SignalKind,
        /// Decoding failure
        error: DecodeError,
    },
}

impl PlayerEvent {
    /// Resolve a raw notification under `version`.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` when a state ordinal is not defined by `version`
    /// or the notification body could not be read.
    pub fn decode(
        source: EventSource,
        signal: PlayerSignal,
        version: ProtocolVersion,
    ) -> Result<Self, DecodeError> {
        match signal {
            PlayerSignal::StateChanged(StatePayload::New(raw)) => Ok(Self::StateChanged {
                source,
                old: None,
                new: PlayerState::from_ordinal(version, raw)?,
            }),
            PlayerSignal::StateChanged(StatePayload::Transition { old, new }) => {
                Ok(Self::StateChanged {
                    source,
                    old: Some(PlayerState::from_ordinal(version, old)?),
                    new: PlayerState::from_ordinal(version, new)?,
                })
            }
            PlayerSignal::Unreadable { reason, .. } => Err(DecodeError::Payload(reason)),
            signal => Ok(Self::Notice { source, signal }),
        }
    }
}

impl fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateChanged {
                source,
                old: Some(old),
                new,
            } => write!(f, "[{source}] State changed from '{old}' to '{new}'"),
            Self::StateChanged {
                source,
                old: None,
                new,
            } => write!(f, "[{source}] State changed to '{new}'"),
            Self::LivenessAcknowledged(path) => write!(f, "[{path}] Replied to liveness ping"),
            Self::LivenessFailed { path, reason } => {
                write!(f, "[{path}] Liveness reply failed: {reason}")
            }
            Self::Undecodable {
                source,
                kind,
                error,
            } => write!(f, "[{source}] Could not decode {kind}: {error}"),
            Self::Notice { source, signal } => {
                write!(f, "[{source}] ")?;
                render_signal(f, signal)
            }
        }
    }
}

fn render_signal(f: &mut fmt::Formatter<'_>, signal: &PlayerSignal) -> fmt::Result {
    match signal {
        PlayerSignal::Initialized => write!(f, "MediaPlayer initialized"),
        PlayerSignal::Eof => write!(f, "EOF...."),
        PlayerSignal::Buffering => write!(f, "Begin buffering"),
        PlayerSignal::Buffered => write!(f, "Buffering completed"),
        PlayerSignal::Seeked => write!(f, "Seeking completed"),
        PlayerSignal::Stopped => write!(f, "Player stopped"),
        PlayerSignal::Error { domain, message } => match error_domain_name(*domain) {
            Some(name) => write!(f, "Error Domain:'{name}', msg='{message}'"),
            None => write!(f, "Error Domain:'{domain}', msg='{message}'"),
        },
        PlayerSignal::RequestWindow => write!(f, "Player engine request a X window"),
        PlayerSignal::TargetReady(info) => {
            write!(f, "Target ready")?;
            if let Some(rect) = &info.rectangle {
                write!(f, ", rectangle='{rect}'")?;
            }
            if let Some(plane) = info.plane_id {
                write!(f, ", plane-id={plane}")?;
            }
            Ok(())
        }
        PlayerSignal::Suspended => write!(f, "Player suspended"),
        PlayerSignal::Restored => write!(f, "Player restored"),
        PlayerSignal::NoResource => write!(f, "No resource available for the player"),
        PlayerSignal::NeedReply => write!(f, "Liveness ping received"),
        PlayerSignal::MetadataUpdated(entries) => {
            write!(f, "Metadata updated ({} entries)", entries.len())?;
            for entry in entries {
                write!(
                    f,
                    "\n    URI='{}', Title='{}', Artist='{}'",
                    entry.uri, entry.title, entry.artist
                )?;
            }
            Ok(())
        }
        PlayerSignal::RecordStart => write!(f, "Received RecordStart signal"),
        PlayerSignal::RecordStop => write!(f, "Received RecordStop signal"),
        PlayerSignal::StateChanged(payload) => write!(f, "Unresolved state change {payload:?}"),
        PlayerSignal::Unreadable { kind, reason } => write!(f, "Unreadable {kind}: {reason}"),
    }
}
