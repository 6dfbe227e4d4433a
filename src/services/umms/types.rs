use std::{collections::HashMap, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use zbus::zvariant::Value;

use super::{DecodeError, SignalKind};

/// Object path of a remote player, as handed out by the object manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerPath(String);

impl PlayerPath {
    /// Wrap an object path returned by the service.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The raw object path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Revision of the player protocol spoken by the service.
///
/// Each revision fixes the command table, the shape of the
/// `PlayerStateChanged` payload, and the ordinal order of player states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// Clients that address the object manager through numbered commands.
    Legacy,
    /// Player-only command table, session handled through shortcuts.
    Standard,
    /// Adds target selection, track selection, recording and stream introspection.
    #[default]
    Extended,
}

/// Shape of the `PlayerStateChanged` signal body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePayloadShape {
    /// A single `i32` carrying the new state.
    NewOnly,
    /// Two `i32`s carrying the old and the new state.
    OldAndNew,
}

const STATE_ORDER_ORIGINAL: [PlayerState; 4] = [
    PlayerState::Null,
    PlayerState::Paused,
    PlayerState::Playing,
    PlayerState::Stopped,
];

const STATE_ORDER_REVISED: [PlayerState; 4] = [
    PlayerState::Null,
    PlayerState::Stopped,
    PlayerState::Paused,
    PlayerState::Playing,
];

const BASE_SIGNALS: [SignalKind; 9] = [
    SignalKind::Initialized,
    SignalKind::Eof,
    SignalKind::Buffering,
    SignalKind::Buffered,
    SignalKind::RequestWindow,
    SignalKind::Seeked,
    SignalKind::Stopped,
    SignalKind::Error,
    SignalKind::PlayerStateChanged,
];

const EXTENDED_SIGNALS: [SignalKind; 6] = [
    SignalKind::TargetReady,
    SignalKind::Suspended,
    SignalKind::Restored,
    SignalKind::NoResource,
    SignalKind::RecordStart,
    SignalKind::RecordStop,
];

impl ProtocolVersion {
    /// How this revision encodes `PlayerStateChanged`.
    pub fn state_payload(self) -> StatePayloadShape {
        match self {
            Self::Legacy | Self::Standard => StatePayloadShape::NewOnly,
            Self::Extended => StatePayloadShape::OldAndNew,
        }
    }

    /// Player states indexed by their wire ordinal.
    pub fn state_order(self) -> &'static [PlayerState] {
        match self {
            Self::Legacy | Self::Standard => &STATE_ORDER_ORIGINAL,
            Self::Extended => &STATE_ORDER_REVISED,
        }
    }

    /// Signals a player handle subscribes to under this revision.
    ///
    /// Attended handles additionally listen for the liveness ping.
    pub fn player_signals(self, attended: bool) -> Vec<SignalKind> {
        let mut signals = BASE_SIGNALS.to_vec();
        if self == Self::Extended {
            signals.extend_from_slice(&EXTENDED_SIGNALS);
        }
        if attended {
            signals.push(SignalKind::NeedReply);
        }
        signals
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Standard => write!(f, "standard"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

/// Playback state of a remote player.
///
/// Compared by name only; the wire ordinal depends on [`ProtocolVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// No media loaded.
    Null,
    /// Media loaded, not rolling.
    Stopped,
    /// Playback paused.
    Paused,
    /// Playback rolling.
    Playing,
}

impl PlayerState {
    /// Decode a wire ordinal using the state order of `version`.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the ordinal is outside the table.
    pub fn from_ordinal(version: ProtocolVersion, raw: i32) -> Result<Self, DecodeError> {
        usize::try_from(raw)
            .ok()
            .and_then(|index| version.state_order().get(index).copied())
            .ok_or(DecodeError::PlayerState { raw, version })
    }

    /// Symbolic name as the service documents it.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "PlayerStateNull",
            Self::Stopped => "PlayerStateStopped",
            Self::Paused => "PlayerStatePaused",
            Self::Playing => "PlayerStatePlaying",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lease under which a player handle was granted.
#[derive(Debug, Clone, PartialEq)]
pub enum Lease {
    /// The client must acknowledge every `NeedReply` ping.
    Attended,
    /// The player runs for a bounded time without acknowledgement.
    Unattended {
        /// Execution budget granted by the service.
        budget: Duration,
        /// Continuation token returned with the handle.
        token: String,
    },
}

/// Client-side reference to a remote player object.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHandle {
    path: PlayerPath,
    lease: Lease,
}

impl PlayerHandle {
    /// Handle for an attended player.
    pub fn attended(path: PlayerPath) -> Self {
        Self {
            path,
            lease: Lease::Attended,
        }
    }

    /// Handle for an unattended player with its budget and continuation token.
    pub fn unattended(path: PlayerPath, budget: Duration, token: String) -> Self {
        Self {
            path,
            lease: Lease::Unattended { budget, token },
        }
    }

    /// Object path of the player.
    pub fn path(&self) -> &PlayerPath {
        &self.path
    }

    /// Lease details.
    pub fn lease(&self) -> &Lease {
        &self.lease
    }

    /// Whether the service expects liveness acknowledgements for this handle.
    pub fn is_attended(&self) -> bool {
        matches!(self.lease, Lease::Attended)
    }
}

impl fmt::Display for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lease {
            Lease::Attended => write!(f, "{} (attended)", self.path),
            Lease::Unattended { budget, .. } => {
                write!(f, "{} (unattended, {:.1}s)", self.path, budget.as_secs_f64())
            }
        }
    }
}

/// Destination rectangle for video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl FromStr for Rectangle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,w,h but got '{s}'"));
        }

        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("'{part}' is not a non-negative integer"))?;
        }

        Ok(Self {
            x: values[0],
            y: values[1],
            width: values[2],
            height: values[3],
        })
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Where decoded video is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetDescriptor {
    /// Render into an X window.
    XWindow {
        /// X window id.
        window_id: f64,
    },
    /// Hand decoded frames back to the client.
    DataCopy,
    /// Stream decoded data over a socket.
    Socket,
    /// Render on a reserved hardware plane.
    ReservedPlane {
        /// Region of the plane to draw into.
        rectangle: Rectangle,
        /// Hardware plane id.
        plane_id: i32,
    },
}

impl TargetDescriptor {
    /// Wire value of the target type.
    pub fn type_id(&self) -> i32 {
        match self {
            Self::XWindow { .. } => 0,
            Self::DataCopy => 1,
            Self::Socket => 2,
            Self::ReservedPlane { .. } => 3,
        }
    }

    /// Parameter map sent alongside the target type.
    pub fn params(&self) -> HashMap<&'static str, Value<'static>> {
        let mut params = HashMap::new();
        match self {
            Self::XWindow { window_id } => {
                params.insert("window-id", Value::from(*window_id));
            }
            Self::ReservedPlane {
                rectangle,
                plane_id,
            } => {
                params.insert("rectangle", Value::from(rectangle.to_string()));
                params.insert("plane-id", Value::from(*plane_id));
            }
            Self::DataCopy | Self::Socket => {}
        }
        params
    }
}

impl FromStr for TargetDescriptor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let kind = words.next().ok_or("target type missing")?.to_lowercase();

        let target = match kind.as_str() {
            "xwindow" => {
                let id = words.next().ok_or("xwindow needs a window id")?;
                let window_id = id
                    .parse::<f64>()
                    .map_err(|_| format!("'{id}' is not a window id"))?;
                Self::XWindow { window_id }
            }
            "datacopy" => Self::DataCopy,
            "socket" => Self::Socket,
            "plane" => {
                let rect = words.next().ok_or("plane needs a rectangle")?;
                let id = words.next().ok_or("plane needs a plane id")?;
                let rectangle = rect.parse()?;
                let plane_id = id
                    .parse::<i32>()
                    .map_err(|_| format!("'{id}' is not a plane id"))?;
                Self::ReservedPlane {
                    rectangle,
                    plane_id,
                }
            }
            other => return Err(format!("unknown target type '{other}'")),
        };

        if let Some(extra) = words.next() {
            return Err(format!("unexpected trailing input '{extra}'"));
        }

        Ok(target)
    }
}

/// Video scaling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Leave output geometry untouched.
    NoScale,
    /// Fill the target regardless of aspect ratio.
    Fill,
    /// Respect the source aspect ratio.
    KeepAspectRatio,
    /// Fill the target keeping aspect ratio; edges may be cropped.
    FillKeepAspectRatio,
}

impl ScaleMode {
    /// Wire value.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::NoScale => 0,
            Self::Fill => 1,
            Self::KeepAspectRatio => 2,
            Self::FillKeepAspectRatio => 3,
        }
    }

    /// Decode a wire value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::NoScale),
            1 => Some(Self::Fill),
            2 => Some(Self::KeepAspectRatio),
            3 => Some(Self::FillKeepAspectRatio),
            _ => None,
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScale => write!(f, "ScaleModeNoScale"),
            Self::Fill => write!(f, "ScaleModeFill"),
            Self::KeepAspectRatio => write!(f, "ScaleModeKeepAspectRatio"),
            Self::FillKeepAspectRatio => write!(f, "ScaleModeFillKeepAspectRatio"),
        }
    }
}

/// Unit of a buffer depth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFormat {
    /// Depth expressed in time.
    ByTime,
    /// Depth expressed in bytes.
    ByBytes,
}

impl BufferFormat {
    /// Wire value.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::ByTime => 0,
            Self::ByBytes => 1,
        }
    }

    /// Decode a wire value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::ByTime),
            1 => Some(Self::ByBytes),
            _ => None,
        }
    }
}

/// One entry of the playing-content metadata list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataEntry {
    /// Content URI.
    pub uri: String,
    /// Content title.
    pub title: String,
    /// Content artist.
    pub artist: String,
}

/// Program association table entry of a transport stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    /// Program number.
    pub program_number: u32,
    /// PID carrying the program map.
    pub pid: u32,
}

/// Elementary stream listed in a program map table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// Stream PID.
    pub pid: u32,
    /// MPEG stream type.
    pub stream_type: u32,
}

/// Program map table of the current program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramMap {
    /// Program number.
    pub program_number: u32,
    /// PID carrying the PCR.
    pub pcr_pid: u32,
    /// Elementary streams of the program.
    pub streams: Vec<StreamInfo>,
}

/// Geometry reported with `TargetReady`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetInfo {
    /// Rectangle the engine draws into, as `x,y,w,h`.
    pub rectangle: Option<String>,
    /// Hardware plane in use.
    pub plane_id: Option<i32>,
}

/// Error domain carried by the `Error` signal.
pub fn error_domain_name(domain: u32) -> Option<&'static str> {
    match domain {
        0 => Some("ErrorTypeEngine"),
        _ => None,
    }
}
