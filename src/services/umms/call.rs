use std::fmt::Write;

use super::{
    BufferFormat, DecodeError, MetadataEntry, PatEntry, PlayerState, ProgramMap,
    ProtocolVersion, Rectangle, ScaleMode, TargetDescriptor,
};

/// A method invocation on a player object.
///
/// One variant per remote operation, carrying its arguments in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    /// Load a URI
    SetUri(String),
    /// Select where video is rendered
    SetTarget(TargetDescriptor),
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Stop playback
    Stop,
    /// Seek to an absolute position in milliseconds
    SetPosition(i64),
    /// Current position in milliseconds
    GetPosition,
    /// Set playback rate
    SetPlaybackRate(f64),
    /// Current playback rate
    GetPlaybackRate,
    /// Set volume in [0, 100]
    SetVolume(i32),
    /// Current volume
    GetVolume,
    /// Render into an X window
    SetWindowId(f64),
    /// Set video output rectangle
    SetVideoSize(Rectangle),
    /// Current video size
    GetVideoSize,
    /// Buffered duration
    GetBufferedTime,
    /// Buffered bytes
    GetBufferedBytes,
    /// Media duration
    GetMediaSizeTime,
    /// Media size in bytes
    GetMediaSizeBytes,
    /// Whether the media has video
    HasVideo,
    /// Whether the media has audio
    HasAudio,
    /// Whether the media is streamed
    IsStreaming,
    /// Whether the media is seekable
    IsSeekable,
    /// Whether fullscreen is supported
    SupportFullscreen,
    /// Current player state
    GetPlayerState,
    /// Release engine resources, keep the player
    Suspend,
    /// Re-acquire resources after suspend
    Restore,
    /// Current video track
    GetCurrentVideo,
    /// Select video track
    SetCurrentVideo(i32),
    /// Number of video tracks
    GetVideoNum,
    /// Current audio track
    GetCurrentAudio,
    /// Select audio track
    SetCurrentAudio(i32),
    /// Number of audio tracks
    GetAudioNum,
    /// Current subtitle track
    GetCurrentSubtitle,
    /// Select subtitle track
    SetCurrentSubtitle(i32),
    /// Number of subtitle tracks
    GetSubtitleNum,
    /// Load external subtitles
    SetSubtitleUri(String),
    /// Mute or unmute
    SetMute(bool),
    /// Whether muted
    IsMute,
    /// Set scaling policy
    SetScaleMode(ScaleMode),
    /// Current scaling policy
    GetScaleMode,
    /// Set buffer depth
    SetBufferDepth(BufferFormat, i64),
    /// Buffer depth in the given unit
    GetBufferDepth(BufferFormat),
    /// URI currently loaded
    GetCurrentUri,
    /// Title of the current media
    GetTitle,
    /// Artist of the current media
    GetArtist,
    /// Protocol of the current URI
    GetProtocolName,
    /// Transport stream program association table
    GetPat,
    /// Transport stream program map table
    GetPmt,
    /// Data channel associated with the stream
    GetAssociatedDataChannel,
    /// Start or stop recording into a location
    Record {
        /// Whether to record
        enable: bool,
        /// Destination file
        location: String,
    },
}

impl PlayerCall {
    /// Remote method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetUri(_) => "SetUri",
            Self::SetTarget(_) => "SetTarget",
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Stop => "Stop",
            Self::SetPosition(_) => "SetPosition",
            Self::GetPosition => "GetPosition",
            Self::SetPlaybackRate(_) => "SetPlaybackRate",
            Self::GetPlaybackRate => "GetPlaybackRate",
            Self::SetVolume(_) => "SetVolume",
            Self::GetVolume => "GetVolume",
            Self::SetWindowId(_) => "SetWindowId",
            Self::SetVideoSize(_) => "SetVideoSize",
            Self::GetVideoSize => "GetVideoSize",
            Self::GetBufferedTime => "GetBufferedTime",
            Self::GetBufferedBytes => "GetBufferedBytes",
            Self::GetMediaSizeTime => "GetMediaSizeTime",
            Self::GetMediaSizeBytes => "GetMediaSizeBytes",
            Self::HasVideo => "HasVideo",
            Self::HasAudio => "HasAudio",
            Self::IsStreaming => "IsStreaming",
            Self::IsSeekable => "IsSeekable",
            Self::SupportFullscreen => "SupportFullscreen",
            Self::GetPlayerState => "GetPlayerState",
            Self::Suspend => "Suspend",
            Self::Restore => "Restore",
            Self::GetCurrentVideo => "GetCurrentVideo",
            Self::SetCurrentVideo(_) => "SetCurrentVideo",
            Self::GetVideoNum => "GetVideoNum",
            Self::GetCurrentAudio => "GetCurrentAudio",
            Self::SetCurrentAudio(_) => "SetCurrentAudio",
            Self::GetAudioNum => "GetAudioNum",
            Self::GetCurrentSubtitle => "GetCurrentSubtitle",
            Self::SetCurrentSubtitle(_) => "SetCurrentSubtitle",
            Self::GetSubtitleNum => "GetSubtitleNum",
            Self::SetSubtitleUri(_) => "SetSubtitleUri",
            Self::SetMute(_) => "SetMute",
            Self::IsMute => "IsMute",
            Self::SetScaleMode(_) => "SetScaleMode",
            Self::GetScaleMode => "GetScaleMode",
            Self::SetBufferDepth(..) => "SetBufferDepth",
            Self::GetBufferDepth(_) => "GetBufferDepth",
            Self::GetCurrentUri => "GetCurrentUri",
            Self::GetTitle => "GetTitle",
            Self::GetArtist => "GetArtist",
            Self::GetProtocolName => "GetProtocolName",
            Self::GetPat => "GetPat",
            Self::GetPmt => "GetPmt",
            Self::GetAssociatedDataChannel => "GetAssociatedDataChannel",
            Self::Record { .. } => "Record",
        }
    }
}

/// Value returned by a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    /// No return value
    Unit,
    /// Time in milliseconds
    Millis(i64),
    /// Size in bytes
    Bytes(i64),
    /// Plain integer
    Integer(i64),
    /// Floating point value
    Number(f64),
    /// Boolean
    Flag(bool),
    /// Width and height
    Size {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Raw player state ordinal
    State(i32),
    /// Raw scale mode value
    Scale(i32),
    /// Text
    Text(String),
    /// Program association table
    Pat(Vec<PatEntry>),
    /// Program map table
    Pmt(ProgramMap),
    /// Host and port of a data channel
    DataChannel {
        /// Host address
        ip: String,
        /// Port
        port: i32,
    },
    /// Playing-content metadata list
    Metadata(Vec<MetadataEntry>),
    /// Names, e.g. video outputs or modes
    Names(Vec<String>),
    /// Raw audio output state, 0 off and 1 on
    OutputState(i32),
}

impl CallOutput {
    /// Render for display; `None` when there is nothing to show.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if a state ordinal is not defined by `version`.
    pub fn render(&self, version: ProtocolVersion) -> Result<Option<String>, DecodeError> {
        let text = match self {
            Self::Unit => return Ok(None),
            Self::Millis(ms) => format!("'{ms}' ms"),
            Self::Bytes(bytes) => format!("{bytes} bytes"),
            Self::Integer(value) => value.to_string(),
            Self::Number(value) => format!("'{value}'"),
            Self::Flag(flag) => flag.to_string(),
            Self::Size { width, height } => format!("width={width}, height={height}"),
            Self::State(raw) => format!("'{}'", PlayerState::from_ordinal(version, *raw)?),
            Self::Scale(raw) => match ScaleMode::from_raw(*raw) {
                Some(mode) => mode.to_string(),
                None => format!("unknown scale mode {raw}"),
            },
            Self::Text(text) => format!("'{text}'"),
            Self::Pat(entries) => {
                let mut out = format!("{} programs", entries.len());
                for entry in entries {
                    let _ = write!(
                        out,
                        "\n    program-number={}, pid={}",
                        entry.program_number, entry.pid
                    );
                }
                out
            }
            Self::Pmt(map) => {
                let mut out = format!(
                    "program-number={}, pcr-pid={}, {} streams",
                    map.program_number,
                    map.pcr_pid,
                    map.streams.len()
                );
                for stream in &map.streams {
                    let _ = write!(
                        out,
                        "\n    pid={}, stream-type={}",
                        stream.pid, stream.stream_type
                    );
                }
                out
            }
            Self::DataChannel { ip, port } => format!("{ip}:{port}"),
            Self::Metadata(entries) => {
                let mut out = format!("{} entries", entries.len());
                for entry in entries {
                    let _ = write!(
                        out,
                        "\n    URI='{}', Title='{}', Artist='{}'",
                        entry.uri, entry.title, entry.artist
                    );
                }
                out
            }
            Self::Names(names) if names.is_empty() => "none".to_string(),
            Self::Names(names) => names
                .iter()
                .map(|name| format!("'{name}'"))
                .collect::<Vec<_>>()
                .join(", "),
            Self::OutputState(0) => "off".to_string(),
            Self::OutputState(1) => "on".to_string(),
            Self::OutputState(raw) => format!("unknown output state {raw}"),
        };
        Ok(Some(text))
    }
}
