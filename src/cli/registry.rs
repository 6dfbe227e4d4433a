use crate::services::umms::{AudioCall, OutputCall, PlayerCall, ProtocolVersion, VideoCall};

use super::types::{
    Action, ArgSpec, ArgType, Category, CliError, Command, MethodDescriptor, Shortcut,
};

/// Versioned table of numbered methods.
///
/// Ids are positions in the table for the active [`ProtocolVersion`].
/// Each revision's mapping is fixed on its own: the same id may name
/// different methods in different revisions (`1` is `Play` in the standard
/// table and `SetTarget` in the extended one). Letter shortcuts are shared
/// by all revisions.
pub struct MethodRegistry {
    version: ProtocolVersion,
    methods: Vec<MethodDescriptor>,
}

impl MethodRegistry {
    /// Build the table for a protocol revision.
    pub fn new(version: ProtocolVersion) -> Self {
        let entries: &[&Entry] = match version {
            ProtocolVersion::Legacy => &LEGACY,
            ProtocolVersion::Standard => &STANDARD,
            ProtocolVersion::Extended => &EXTENDED,
        };

        let methods = entries
            .iter()
            .enumerate()
            .map(|(id, entry)| MethodDescriptor {
                id,
                name: entry.name,
                args: entry.args,
                category: entry.category,
                action: entry.action,
            })
            .collect();

        Self { version, methods }
    }

    /// Revision this table belongs to.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Resolve one input token.
    ///
    /// All-letter tokens are shortcuts, all-digit tokens are method ids.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCommand` for unknown letters or ids outside the
    /// table, and `MalformedCommand` for anything else.
    pub fn lookup(&self, token: &str) -> Result<Command, CliError> {
        if !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic()) {
            return Shortcut::from_token(token)
                .map(Command::Shortcut)
                .ok_or_else(|| CliError::UnsupportedCommand(token.to_string()));
        }

        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            return token
                .parse::<usize>()
                .ok()
                .and_then(|id| self.get(id))
                .map(|method| Command::Method(*method))
                .ok_or_else(|| CliError::UnsupportedCommand(token.to_string()));
        }

        Err(CliError::MalformedCommand(token.to_string()))
    }

    /// Method at a given id.
    pub fn get(&self, id: usize) -> Option<&MethodDescriptor> {
        self.methods.get(id)
    }

    /// All methods in id order.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// `(id, name)` pairs for the help listing.
    pub fn list(&self) -> Vec<(usize, &'static str)> {
        self.methods.iter().map(|m| (m.id, m.name)).collect()
    }
}

struct Entry {
    name: &'static str,
    args: &'static [ArgSpec],
    category: Category,
    action: Action,
}

const fn arg(name: &'static str, value_type: ArgType, prompt: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        value_type,
        prompt,
    }
}

const URI: ArgSpec = arg("uri", ArgType::Uri, "URI (empty for default)");
const BUDGET: ArgSpec = arg("budget", ArgType::Seconds, "Execution budget in seconds");
const INDEX: ArgSpec = arg("index", ArgType::Index, "Track index");

const REQUEST_MEDIA_PLAYER: Entry = Entry {
    name: "RequestMediaPlayer",
    args: &[],
    category: Category::Session,
    action: Action::RequestAttended,
};

const REQUEST_MEDIA_PLAYER_UNATTENDED: Entry = Entry {
    name: "RequestMediaPlayerUnattended",
    args: &[BUDGET],
    category: Category::Session,
    action: Action::RequestUnattended,
};

const REMOVE_MEDIA_PLAYER: Entry = Entry {
    name: "RemoveMediaPlayer",
    args: &[],
    category: Category::Session,
    action: Action::RemoveCurrent,
};

const SET_URI: Entry = Entry {
    name: "SetUri",
    args: &[URI],
    category: Category::Control,
    action: Action::Player(|a| Ok(PlayerCall::SetUri(a.text("uri")?))),
};

const SET_TARGET: Entry = Entry {
    name: "SetTarget",
    args: &[arg(
        "target",
        ArgType::Target,
        "Target (xwindow <id> | datacopy | socket | plane <x,y,w,h> <plane-id>)",
    )],
    category: Category::Target,
    action: Action::Player(|a| Ok(PlayerCall::SetTarget(a.target("target")?))),
};

const PLAY: Entry = Entry {
    name: "Play",
    args: &[],
    category: Category::Control,
    action: Action::Player(|_| Ok(PlayerCall::Play)),
};

const PAUSE: Entry = Entry {
    name: "Pause",
    args: &[],
    category: Category::Control,
    action: Action::Player(|_| Ok(PlayerCall::Pause)),
};

const STOP: Entry = Entry {
    name: "Stop",
    args: &[],
    category: Category::Control,
    action: Action::Player(|_| Ok(PlayerCall::Stop)),
};

const SET_POSITION: Entry = Entry {
    name: "SetPosition",
    args: &[arg("position", ArgType::SeekSeconds, "Seek to (seconds)")],
    category: Category::Control,
    action: Action::Player(|a| Ok(PlayerCall::SetPosition(a.millis("position")?))),
};

const GET_POSITION: Entry = Entry {
    name: "GetPosition",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetPosition)),
};

const SET_PLAYBACK_RATE: Entry = Entry {
    name: "SetPlaybackRate",
    args: &[arg("rate", ArgType::Number, "Playback rate")],
    category: Category::Control,
    action: Action::Player(|a| Ok(PlayerCall::SetPlaybackRate(a.number("rate")?))),
};

const GET_PLAYBACK_RATE: Entry = Entry {
    name: "GetPlaybackRate",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetPlaybackRate)),
};

const SET_VOLUME: Entry = Entry {
    name: "SetVolume",
    args: &[arg("volume", ArgType::Volume, "Volume (0-100)")],
    category: Category::Audio,
    action: Action::Player(|a| Ok(PlayerCall::SetVolume(a.int32("volume")?))),
};

const GET_VOLUME: Entry = Entry {
    name: "GetVolume",
    args: &[],
    category: Category::Audio,
    action: Action::Player(|_| Ok(PlayerCall::GetVolume)),
};

const SET_WINDOW_ID: Entry = Entry {
    name: "SetWindowId",
    args: &[arg("window-id", ArgType::WindowId, "X window id")],
    category: Category::Target,
    action: Action::Player(|a| Ok(PlayerCall::SetWindowId(a.number("window-id")?))),
};

const SET_VIDEO_SIZE: Entry = Entry {
    name: "SetVideoSize",
    args: &[arg("rectangle", ArgType::Rectangle, "Rectangle (x,y,w,h)")],
    category: Category::Target,
    action: Action::Player(|a| Ok(PlayerCall::SetVideoSize(a.rectangle("rectangle")?))),
};

const GET_VIDEO_SIZE: Entry = Entry {
    name: "GetVideoSize",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetVideoSize)),
};

const GET_BUFFERED_TIME: Entry = Entry {
    name: "GetBufferedTime",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetBufferedTime)),
};

const GET_BUFFERED_BYTES: Entry = Entry {
    name: "GetBufferedBytes",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetBufferedBytes)),
};

const GET_MEDIA_SIZE_TIME: Entry = Entry {
    name: "GetMediaSizeTime",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetMediaSizeTime)),
};

const GET_MEDIA_SIZE_BYTES: Entry = Entry {
    name: "GetMediaSizeBytes",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetMediaSizeBytes)),
};

const HAS_VIDEO: Entry = Entry {
    name: "HasVideo",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::HasVideo)),
};

const HAS_AUDIO: Entry = Entry {
    name: "HasAudio",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::HasAudio)),
};

const IS_STREAMING: Entry = Entry {
    name: "IsStreaming",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::IsStreaming)),
};

const IS_SEEKABLE: Entry = Entry {
    name: "IsSeekable",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::IsSeekable)),
};

const SUPPORT_FULLSCREEN: Entry = Entry {
    name: "SupportFullscreen",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::SupportFullscreen)),
};

const GET_PLAYER_STATE: Entry = Entry {
    name: "GetPlayerState",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetPlayerState)),
};

const SUSPEND: Entry = Entry {
    name: "Suspend",
    args: &[],
    category: Category::Control,
    action: Action::Player(|_| Ok(PlayerCall::Suspend)),
};

const RESTORE: Entry = Entry {
    name: "Restore",
    args: &[],
    category: Category::Control,
    action: Action::Player(|_| Ok(PlayerCall::Restore)),
};

const GET_CURRENT_VIDEO: Entry = Entry {
    name: "GetCurrentVideo",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetCurrentVideo)),
};

const SET_CURRENT_VIDEO: Entry = Entry {
    name: "SetCurrentVideo",
    args: &[INDEX],
    category: Category::Control,
    action: Action::Player(|a| Ok(PlayerCall::SetCurrentVideo(a.int32("index")?))),
};

const GET_VIDEO_NUM: Entry = Entry {
    name: "GetVideoNum",
    args: &[],
    category: Category::Query,
    action: Action::Player(|_| Ok(PlayerCall::GetVideoNum)),
};

const GET_CURRENT_AUDIO: Entry = Entry {
    name: "GetCurrentAudio",
    args: &[],
    category: Category::Audio,
    action: Action::Player(|_| Ok(PlayerCall::GetCurrentAudio)),
};

const SET_CURRENT_AUDIO: Entry = Entry {
    name: "SetCurrentAudio",
    args: &[INDEX],
    category: Category::Audio,
    action: Action::Player(|a| Ok(PlayerCall::SetCurrentAudio(a.int32("index")?))),
};

const GET_AUDIO_NUM: Entry = Entry {
    name: "GetAudioNum",
    args: &[],
    category: Category::Audio,
    action: Action::Player(|_| Ok(PlayerCall::GetAudioNum)),
};

const GET_CURRENT_SUBTITLE: Entry = Entry {
    name: "GetCurrentSubtitle",
    args: &[],
    category: Category::Subtitle,
    action: Action::Player(|_| Ok(PlayerCall::GetCurrentSubtitle)),
};

const SET_CURRENT_SUBTITLE: Entry = Entry {
    name: "SetCurrentSubtitle",
    args: &[INDEX],
    category: Category::Subtitle,
    action: Action::Player(|a| Ok(PlayerCall::SetCurrentSubtitle(a.int32("index")?))),
};

const GET_SUBTITLE_NUM: Entry = Entry {
    name: "GetSubtitleNum",
    args: &[],
    category: Category::Subtitle,
    action: Action::Player(|_| Ok(PlayerCall::GetSubtitleNum)),
};

const SET_SUBTITLE_URI: Entry = Entry {
    name: "SetSubtitleUri",
    args: &[arg("subtitle-uri", ArgType::Text, "Subtitle URI")],
    category: Category::Subtitle,
    action: Action::Player(|a| Ok(PlayerCall::SetSubtitleUri(a.text("subtitle-uri")?))),
};

const SET_MUTE: Entry = Entry {
    name: "SetMute",
    args: &[arg("mute", ArgType::Flag, "Mute? (1/0)")],
    category: Category::Audio,
    action: Action::Player(|a| Ok(PlayerCall::SetMute(a.flag("mute")?))),
};

const IS_MUTE: Entry = Entry {
    name: "IsMute",
    args: &[],
    category: Category::Audio,
    action: Action::Player(|_| Ok(PlayerCall::IsMute)),
};

const SET_SCALE_MODE: Entry = Entry {
    name: "SetScaleMode",
    args: &[arg(
        "scale-mode",
        ArgType::ScaleMode,
        "Scale mode (0 no-scale, 1 fill, 2 keep-aspect, 3 fill-keep-aspect)",
    )],
    category: Category::Target,
    action: Action::Player(|a| Ok(PlayerCall::SetScaleMode(a.scale("scale-mode")?))),
};

const GET_SCALE_MODE: Entry = Entry {
    name: "GetScaleMode",
    args: &[],
    category: Category::Target,
    action: Action::Player(|_| Ok(PlayerCall::GetScaleMode)),
};

const BUFFER_FORMAT: ArgSpec = arg("format", ArgType::BufferFormat, "Format (0 time, 1 bytes)");

const SET_BUFFER_DEPTH: Entry = Entry {
    name: "SetBufferDepth",
    args: &[BUFFER_FORMAT, arg("depth", ArgType::Integer, "Depth")],
    category: Category::Control,
    action: Action::Player(|a| {
        let format = a.format("format")?;
        Ok(PlayerCall::SetBufferDepth(format, a.integer("depth")?))
    }),
};

const GET_BUFFER_DEPTH: Entry = Entry {
    name: "GetBufferDepth",
    args: &[BUFFER_FORMAT],
    category: Category::Query,
    action: Action::Player(|a| Ok(PlayerCall::GetBufferDepth(a.format("format")?))),
};

const GET_CURRENT_URI: Entry = Entry {
    name: "GetCurrentUri",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetCurrentUri)),
};

const GET_TITLE: Entry = Entry {
    name: "GetTitle",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetTitle)),
};

const GET_ARTIST: Entry = Entry {
    name: "GetArtist",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetArtist)),
};

const GET_PROTOCOL_NAME: Entry = Entry {
    name: "GetProtocolName",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetProtocolName)),
};

const GET_PAT: Entry = Entry {
    name: "GetPat",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetPat)),
};

const GET_PMT: Entry = Entry {
    name: "GetPmt",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetPmt)),
};

const GET_ASSOCIATED_DATA_CHANNEL: Entry = Entry {
    name: "GetAssociatedDataChannel",
    args: &[],
    category: Category::Metadata,
    action: Action::Player(|_| Ok(PlayerCall::GetAssociatedDataChannel)),
};

const RECORD: Entry = Entry {
    name: "Record",
    args: &[
        arg("record", ArgType::Flag, "Record? (1/0)"),
        arg("location", ArgType::Location, "Location (empty for default)"),
    ],
    category: Category::Recording,
    action: Action::Player(|a| {
        let enable = a.flag("record")?;
        Ok(PlayerCall::Record {
            enable,
            location: a.text("location")?,
        })
    }),
};

const GET_PLAYING_CONTENT_METADATA: Entry = Entry {
    name: "GetPlayingContentMetadata",
    args: &[],
    category: Category::Metadata,
    action: Action::PlayingContentMetadata,
};

const AUDIO_OUTPUT: ArgSpec = arg(
    "output",
    ArgType::AudioOutput,
    "Audio output (0:hdmi, 1:spdif, 2:i2s0, 3:i2s1)",
);
const VIDEO_OUTPUT: ArgSpec = arg("output", ArgType::Text, "Video output name");

const AUDIO_SET_VOLUME: Entry = Entry {
    name: "AudioManager.SetVolume",
    args: &[AUDIO_OUTPUT, arg("volume", ArgType::Volume, "Volume (0-100)")],
    category: Category::Outputs,
    action: Action::Output(|a| {
        Ok(OutputCall::Audio(AudioCall::SetVolume {
            output: a.audio_output("output")?,
            volume: a.int32("volume")?,
        }))
    }),
};

const AUDIO_GET_VOLUME: Entry = Entry {
    name: "AudioManager.GetVolume",
    args: &[AUDIO_OUTPUT],
    category: Category::Outputs,
    action: Action::Output(|a| {
        Ok(OutputCall::Audio(AudioCall::GetVolume(a.audio_output("output")?)))
    }),
};

const AUDIO_SET_STATE: Entry = Entry {
    name: "AudioManager.SetState",
    args: &[AUDIO_OUTPUT, arg("on", ArgType::Flag, "On? (1/0)")],
    category: Category::Outputs,
    action: Action::Output(|a| {
        Ok(OutputCall::Audio(AudioCall::SetState {
            output: a.audio_output("output")?,
            on: a.flag("on")?,
        }))
    }),
};

const AUDIO_GET_STATE: Entry = Entry {
    name: "AudioManager.GetState",
    args: &[AUDIO_OUTPUT],
    category: Category::Outputs,
    action: Action::Output(|a| {
        Ok(OutputCall::Audio(AudioCall::GetState(a.audio_output("output")?)))
    }),
};

const GET_VALID_VIDEO_OUTPUT: Entry = Entry {
    name: "VideoOutput.GetValidVideoOutput",
    args: &[],
    category: Category::Outputs,
    action: Action::Output(|_| Ok(OutputCall::Video(VideoCall::GetValidVideoOutput))),
};

const GET_VALID_MODE: Entry = Entry {
    name: "VideoOutput.GetValidMode",
    args: &[VIDEO_OUTPUT],
    category: Category::Outputs,
    action: Action::Output(|a| Ok(OutputCall::Video(VideoCall::GetValidMode(a.text("output")?)))),
};

const SET_MODE: Entry = Entry {
    name: "VideoOutput.SetMode",
    args: &[VIDEO_OUTPUT, arg("mode", ArgType::Text, "Mode name")],
    category: Category::Outputs,
    action: Action::Output(|a| {
        Ok(OutputCall::Video(VideoCall::SetMode {
            output: a.text("output")?,
            mode: a.text("mode")?,
        }))
    }),
};

const GET_MODE: Entry = Entry {
    name: "VideoOutput.GetMode",
    args: &[VIDEO_OUTPUT],
    category: Category::Outputs,
    action: Action::Output(|a| Ok(OutputCall::Video(VideoCall::GetMode(a.text("output")?)))),
};

const REQUEST_SCHEDULED_RECORDER: Entry = Entry {
    name: "RequestScheduledRecorder",
    args: &[
        arg("start", ArgType::Seconds, "Start after (seconds)"),
        arg("duration", ArgType::Seconds, "Record for (seconds)"),
        URI,
        arg("location", ArgType::Location, "Location (empty for default)"),
    ],
    category: Category::Recording,
    action: Action::ScheduleRecorder,
};

const STANDARD: [&Entry; 23] = [
    &SET_URI,
    &PLAY,
    &PAUSE,
    &STOP,
    &SET_POSITION,
    &GET_POSITION,
    &SET_PLAYBACK_RATE,
    &GET_PLAYBACK_RATE,
    &SET_VOLUME,
    &GET_VOLUME,
    &SET_WINDOW_ID,
    &SET_VIDEO_SIZE,
    &GET_VIDEO_SIZE,
    &GET_BUFFERED_TIME,
    &GET_BUFFERED_BYTES,
    &GET_MEDIA_SIZE_TIME,
    &GET_MEDIA_SIZE_BYTES,
    &HAS_VIDEO,
    &HAS_AUDIO,
    &IS_STREAMING,
    &IS_SEEKABLE,
    &SUPPORT_FULLSCREEN,
    &GET_PLAYER_STATE,
];

const LEGACY: [&Entry; 26] = [
    &REQUEST_MEDIA_PLAYER,
    &REQUEST_MEDIA_PLAYER_UNATTENDED,
    &REMOVE_MEDIA_PLAYER,
    &SET_URI,
    &PLAY,
    &PAUSE,
    &STOP,
    &SET_POSITION,
    &GET_POSITION,
    &SET_PLAYBACK_RATE,
    &GET_PLAYBACK_RATE,
    &SET_VOLUME,
    &GET_VOLUME,
    &SET_WINDOW_ID,
    &SET_VIDEO_SIZE,
    &GET_VIDEO_SIZE,
    &GET_BUFFERED_TIME,
    &GET_BUFFERED_BYTES,
    &GET_MEDIA_SIZE_TIME,
    &GET_MEDIA_SIZE_BYTES,
    &HAS_VIDEO,
    &HAS_AUDIO,
    &IS_STREAMING,
    &IS_SEEKABLE,
    &SUPPORT_FULLSCREEN,
    &GET_PLAYER_STATE,
];

const EXTENDED: [&Entry; 60] = [
    &SET_URI,
    &SET_TARGET,
    &PLAY,
    &PAUSE,
    &STOP,
    &SET_POSITION,
    &GET_POSITION,
    &SET_PLAYBACK_RATE,
    &GET_PLAYBACK_RATE,
    &SET_VOLUME,
    &GET_VOLUME,
    &SET_WINDOW_ID,
    &SET_VIDEO_SIZE,
    &GET_VIDEO_SIZE,
    &GET_BUFFERED_TIME,
    &GET_BUFFERED_BYTES,
    &GET_MEDIA_SIZE_TIME,
    &GET_MEDIA_SIZE_BYTES,
    &HAS_VIDEO,
    &HAS_AUDIO,
    &IS_STREAMING,
    &IS_SEEKABLE,
    &SUPPORT_FULLSCREEN,
    &GET_PLAYER_STATE,
    &SUSPEND,
    &RESTORE,
    &GET_CURRENT_VIDEO,
    &SET_CURRENT_VIDEO,
    &GET_VIDEO_NUM,
    &GET_CURRENT_AUDIO,
    &SET_CURRENT_AUDIO,
    &GET_AUDIO_NUM,
    &GET_CURRENT_SUBTITLE,
    &SET_CURRENT_SUBTITLE,
    &GET_SUBTITLE_NUM,
    &SET_SUBTITLE_URI,
    &SET_MUTE,
    &IS_MUTE,
    &SET_SCALE_MODE,
    &GET_SCALE_MODE,
    &SET_BUFFER_DEPTH,
    &GET_BUFFER_DEPTH,
    &GET_CURRENT_URI,
    &GET_TITLE,
    &GET_ARTIST,
    &GET_PROTOCOL_NAME,
    &GET_PAT,
    &GET_PMT,
    &GET_ASSOCIATED_DATA_CHANNEL,
    &RECORD,
    &GET_PLAYING_CONTENT_METADATA,
    &REQUEST_SCHEDULED_RECORDER,
    &AUDIO_SET_VOLUME,
    &AUDIO_GET_VOLUME,
    &AUDIO_SET_STATE,
    &AUDIO_GET_STATE,
    &GET_VALID_VIDEO_OUTPUT,
    &GET_VALID_MODE,
    &SET_MODE,
    &GET_MODE,
];
