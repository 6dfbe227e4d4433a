use std::{collections::VecDeque, time::Duration};

use thiserror::Error;

use crate::services::umms::{
    AudioOutput, BufferFormat, OutputCall, PlayerCall, Rectangle, ScaleMode, SessionError,
    TargetDescriptor,
};

/// Errors that can occur while dispatching an interactive command.
///
/// None of these end the command loop. The dispatcher reports them and
/// reads the next line; only the input stream closing terminates it.
#[derive(Error, Debug)]
pub enum CliError {
    /// The token is neither all letters nor all digits.
    ///
    /// Reported together with the full command table.
    #[error("Malformed command: '{0}'")]
    MalformedCommand(String),

    /// The token is well formed but names no shortcut or method id.
    ///
    /// Reported together with the full command table.
    #[error("Unsupported command: '{0}'")]
    UnsupportedCommand(String),

    /// An argument could not be parsed, even after a second attempt.
    ///
    /// The command is aborted without contacting the service.
    #[error("Invalid {name}: {reason}")]
    InvalidArgument {
        /// Name of the argument being collected
        name: &'static str,
        /// Why the input was rejected
        reason: String,
    },

    /// The session manager reported a failure.
    ///
    /// Remote failures have already been converted at the session boundary.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Grouping of methods for the help table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Player lifecycle on the object manager
    Session,
    /// Playback control
    Control,
    /// Read-only queries
    Query,
    /// Video output selection and geometry
    Target,
    /// Audio tracks and mute
    Audio,
    /// Subtitle tracks
    Subtitle,
    /// Content and stream metadata
    Metadata,
    /// Recording
    Recording,
    /// Service-wide audio and video outputs
    Outputs,
}

/// Type classification for command arguments.
///
/// Each variant knows how to parse one line of user input into an
/// [`ArgValue`]. Parsing never panics; failures come back as a message
/// suitable for re-prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// Media URI; empty input selects the configured default.
    Uri,
    /// Free text, may be empty.
    Text,
    /// Recording destination; empty input selects the configured default.
    Location,
    /// Seek position in seconds, sent as milliseconds.
    SeekSeconds,
    /// Duration in seconds.
    Seconds,
    /// Floating point number.
    Number,
    /// Volume in the range 0 to 100.
    Volume,
    /// X window id.
    WindowId,
    /// Rectangle written as `x,y,w,h`.
    Rectangle,
    /// Render target, e.g. `xwindow 12` or `plane 0,0,720,576 4`.
    Target,
    /// Track index.
    Index,
    /// Integer value.
    Integer,
    /// Boolean written as `0/1`, `true/false` or `yes/no`.
    Flag,
    /// Scale mode by number.
    ScaleMode,
    /// Buffer depth unit by number.
    BufferFormat,
    /// Audio output by number or name (`hdmi`, `spdif`, `i2s0`, `i2s1`).
    AudioOutput,
}

/// Fallbacks for arguments that accept empty input.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDefaults {
    /// URI used when the user just presses enter
    pub uri: String,
    /// Recording location used when the user just presses enter
    pub record_location: String,
}

/// A successfully parsed argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Text, URI or path
    Text(String),
    /// Milliseconds
    Millis(i64),
    /// Wall-clock duration
    Duration(Duration),
    /// Floating point number
    Number(f64),
    /// Integer
    Integer(i64),
    /// Rectangle
    Rectangle(Rectangle),
    /// Render target
    Target(TargetDescriptor),
    /// Boolean
    Flag(bool),
    /// Scale mode
    Scale(ScaleMode),
    /// Buffer depth unit
    Format(BufferFormat),
    /// Audio output
    Output(AudioOutput),
}

impl ArgType {
    /// Parse one line of input.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the input was rejected.
    pub fn parse(self, input: &str, defaults: &ArgDefaults) -> Result<ArgValue, String> {
        let input = input.trim();

        match self {
            Self::Uri => Ok(ArgValue::Text(or_default(input, &defaults.uri))),
            Self::Location => Ok(ArgValue::Text(or_default(input, &defaults.record_location))),
            Self::Text => Ok(ArgValue::Text(input.to_string())),
            Self::SeekSeconds => {
                let secs = parse_number::<i64>(input, "a whole number of seconds")?;
                secs.checked_mul(1000)
                    .map(ArgValue::Millis)
                    .ok_or_else(|| format!("{secs} seconds is out of range"))
            }
            Self::Seconds => {
                let secs = parse_number::<f64>(input, "a number of seconds")?;
                Duration::try_from_secs_f64(secs)
                    .map(ArgValue::Duration)
                    .map_err(|_| format!("'{input}' is not a valid duration"))
            }
            Self::Number => parse_number::<f64>(input, "a number").map(ArgValue::Number),
            Self::Volume => {
                let volume = parse_number::<i64>(input, "a volume")?;
                if !(0..=100).contains(&volume) {
                    return Err(format!("volume must be between 0 and 100, got {volume}"));
                }
                Ok(ArgValue::Integer(volume))
            }
            Self::WindowId => parse_number::<f64>(input, "a window id").map(ArgValue::Number),
            Self::Rectangle => input.parse().map(ArgValue::Rectangle),
            Self::Target => input.parse().map(ArgValue::Target),
            Self::Index => {
                let index = parse_number::<i64>(input, "a track index")?;
                if i32::try_from(index).is_err() || index < 0 {
                    return Err(format!("track index {index} is out of range"));
                }
                Ok(ArgValue::Integer(index))
            }
            Self::Integer => parse_number::<i64>(input, "an integer").map(ArgValue::Integer),
            Self::Flag => parse_flag(input).map(ArgValue::Flag),
            Self::ScaleMode => {
                let raw = parse_number::<i32>(input, "a scale mode")?;
                ScaleMode::from_raw(raw)
                    .map(ArgValue::Scale)
                    .ok_or_else(|| format!("scale mode must be 0 to 3, got {raw}"))
            }
            Self::BufferFormat => {
                let raw = parse_number::<i32>(input, "a buffer format")?;
                BufferFormat::from_raw(raw)
                    .map(ArgValue::Format)
                    .ok_or_else(|| format!("buffer format must be 0 or 1, got {raw}"))
            }
            Self::AudioOutput => AudioOutput::from_input(input)
                .map(ArgValue::Output)
                .ok_or_else(|| format!("'{input}' is not hdmi, spdif, i2s0 or i2s1 (0 to 3)")),
        }
    }
}

fn or_default(input: &str, default: &str) -> String {
    if input.is_empty() {
        default.to_string()
    } else {
        input.to_string()
    }
}

fn parse_number<T: std::str::FromStr>(input: &str, what: &str) -> Result<T, String> {
    input
        .parse()
        .map_err(|_| format!("'{input}' is not {what}"))
}

fn parse_flag(input: &str) -> Result<bool, String> {
    match input.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(format!("'{input}' is not a yes/no value")),
    }
}

/// Name, type and prompt of one command argument.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// Argument name, used in error messages.
    pub name: &'static str,

    /// How the input is parsed.
    pub value_type: ArgType,

    /// Text shown before reading the value.
    pub prompt: &'static str,
}

/// Parsed arguments of one command, consumed in declaration order.
#[derive(Debug, Default)]
pub struct ArgValues(VecDeque<ArgValue>);

impl ArgValues {
    /// Wrap values collected from the user.
    pub fn new(values: Vec<ArgValue>) -> Self {
        Self(values.into())
    }

    fn next(&mut self, name: &'static str) -> Result<ArgValue, CliError> {
        self.0.pop_front().ok_or(CliError::InvalidArgument {
            name,
            reason: "missing".to_string(),
        })
    }

    fn mismatch(name: &'static str, value: &ArgValue) -> CliError {
        CliError::InvalidArgument {
            name,
            reason: format!("unexpected value {value:?}"),
        }
    }

    /// Next value as text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn text(&mut self, name: &'static str) -> Result<String, CliError> {
        match self.next(name)? {
            ArgValue::Text(text) => Ok(text),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn millis(&mut self, name: &'static str) -> Result<i64, CliError> {
        match self.next(name)? {
            ArgValue::Millis(ms) => Ok(ms),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a duration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn duration(&mut self, name: &'static str) -> Result<Duration, CliError> {
        match self.next(name)? {
            ArgValue::Duration(duration) => Ok(duration),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a floating point number.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn number(&mut self, name: &'static str) -> Result<f64, CliError> {
        match self.next(name)? {
            ArgValue::Number(value) => Ok(value),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn integer(&mut self, name: &'static str) -> Result<i64, CliError> {
        match self.next(name)? {
            ArgValue::Integer(value) => Ok(value),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left, it has another type or
    /// does not fit.
    pub fn int32(&mut self, name: &'static str) -> Result<i32, CliError> {
        let value = self.integer(name)?;
        i32::try_from(value).map_err(|_| CliError::InvalidArgument {
            name,
            reason: format!("{value} is out of range"),
        })
    }

    /// Next value as a rectangle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn rectangle(&mut self, name: &'static str) -> Result<Rectangle, CliError> {
        match self.next(name)? {
            ArgValue::Rectangle(rect) => Ok(rect),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a render target.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn target(&mut self, name: &'static str) -> Result<TargetDescriptor, CliError> {
        match self.next(name)? {
            ArgValue::Target(target) => Ok(target),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a boolean.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn flag(&mut self, name: &'static str) -> Result<bool, CliError> {
        match self.next(name)? {
            ArgValue::Flag(flag) => Ok(flag),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a scale mode.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn scale(&mut self, name: &'static str) -> Result<ScaleMode, CliError> {
        match self.next(name)? {
            ArgValue::Scale(mode) => Ok(mode),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as an audio output.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn audio_output(&mut self, name: &'static str) -> Result<AudioOutput, CliError> {
        match self.next(name)? {
            ArgValue::Output(output) => Ok(output),
            other => Err(Self::mismatch(name, &other)),
        }
    }

    /// Next value as a buffer depth unit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no value is left or it has another type.
    pub fn format(&mut self, name: &'static str) -> Result<BufferFormat, CliError> {
        match self.next(name)? {
            ArgValue::Format(format) => Ok(format),
            other => Err(Self::mismatch(name, &other)),
        }
    }
}

/// Builds a player call from collected arguments.
pub type CallBuilder = fn(&mut ArgValues) -> Result<PlayerCall, CliError>;

/// Builds an output object call from collected arguments.
pub type OutputBuilder = fn(&mut ArgValues) -> Result<OutputCall, CliError>;

/// What a method does once its arguments are collected.
#[derive(Clone, Copy)]
pub enum Action {
    /// Request an attended player.
    RequestAttended,
    /// Request an unattended player; uses a duration argument if declared,
    /// otherwise the configured budget.
    RequestUnattended,
    /// Remove the current player.
    RemoveCurrent,
    /// Query the service-wide metadata viewer.
    PlayingContentMetadata,
    /// Request a scheduled recorder.
    ScheduleRecorder,
    /// Invoke a method on the current player.
    Player(CallBuilder),
    /// Invoke a method on the audio manager or the video output object.
    Output(OutputBuilder),
}

impl Action {
    /// Whether the action needs a current player.
    pub fn needs_player(&self) -> bool {
        matches!(self, Self::Player(_))
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestAttended => write!(f, "RequestAttended"),
            Self::RequestUnattended => write!(f, "RequestUnattended"),
            Self::RemoveCurrent => write!(f, "RemoveCurrent"),
            Self::PlayingContentMetadata => write!(f, "PlayingContentMetadata"),
            Self::ScheduleRecorder => write!(f, "ScheduleRecorder"),
            Self::Player(_) => write!(f, "Player"),
            Self::Output(_) => write!(f, "Output"),
        }
    }
}

/// Complete metadata for one numbered method.
///
/// The single source of truth for a table entry: its name, how to collect
/// its arguments, and what to do with them.
#[derive(Debug, Clone, Copy)]
pub struct MethodDescriptor {
    /// Position in the active table.
    pub id: usize,

    /// Remote operation name, shown in the help table.
    pub name: &'static str,

    /// Arguments collected interactively, in order.
    pub args: &'static [ArgSpec],

    /// Help-table grouping.
    pub category: Category,

    /// What to do once arguments are collected.
    pub action: Action,
}

/// Single-letter commands available in every protocol revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Leave the command loop
    Quit,
    /// Print the command table
    Help,
    /// Request an attended player
    RequestAttended,
    /// Request an unattended player with the configured budget
    RequestUnattended,
    /// Remove the current player
    RemoveCurrent,
}

impl Shortcut {
    /// All shortcuts, in help-table order.
    pub const ALL: [Self; 5] = [
        Self::Quit,
        Self::Help,
        Self::RequestAttended,
        Self::RequestUnattended,
        Self::RemoveCurrent,
    ];

    /// Resolve a letter token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "q" => Some(Self::Quit),
            "h" => Some(Self::Help),
            "r" => Some(Self::RequestAttended),
            "u" => Some(Self::RequestUnattended),
            "d" => Some(Self::RemoveCurrent),
            _ => None,
        }
    }

    /// Letter typed by the user.
    pub fn letter(self) -> char {
        match self {
            Self::Quit => 'q',
            Self::Help => 'h',
            Self::RequestAttended => 'r',
            Self::RequestUnattended => 'u',
            Self::RemoveCurrent => 'd',
        }
    }

    /// Help-table description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::Help => "show this table",
            Self::RequestAttended => "request an attended player",
            Self::RequestUnattended => "request an unattended player",
            Self::RemoveCurrent => "remove the current player",
        }
    }
}

/// A resolved input token.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// A letter shortcut
    Shortcut(Shortcut),
    /// A numbered method
    Method(MethodDescriptor),
}
