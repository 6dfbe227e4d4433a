use std::fmt;

/// Physical audio output addressed by the audio manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOutput {
    /// HDMI audio
    Hdmi,
    /// S/PDIF
    Spdif,
    /// First I2S port
    I2s0,
    /// Second I2S port
    I2s1,
}

impl AudioOutput {
    /// Wire value.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Hdmi => 0,
            Self::Spdif => 1,
            Self::I2s0 => 2,
            Self::I2s1 => 3,
        }
    }

    /// Decode a wire value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Hdmi),
            1 => Some(Self::Spdif),
            2 => Some(Self::I2s0),
            3 => Some(Self::I2s1),
            _ => None,
        }
    }

    /// Resolve a number or a name such as `hdmi`.
    pub fn from_input(input: &str) -> Option<Self> {
        if let Ok(raw) = input.parse::<i32>() {
            return Self::from_raw(raw);
        }
        match input.to_lowercase().as_str() {
            "hdmi" => Some(Self::Hdmi),
            "spdif" => Some(Self::Spdif),
            "i2s0" => Some(Self::I2s0),
            "i2s1" => Some(Self::I2s1),
            _ => None,
        }
    }
}

impl fmt::Display for AudioOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hdmi => write!(f, "hdmi"),
            Self::Spdif => write!(f, "spdif"),
            Self::I2s0 => write!(f, "i2s0"),
            Self::I2s1 => write!(f, "i2s1"),
        }
    }
}

/// A method on one of the service-wide output objects.
///
/// Unlike [`PlayerCall`](super::PlayerCall) these need no player handle.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputCall {
    /// Method on the audio manager
    Audio(AudioCall),
    /// Method on the video output object
    Video(VideoCall),
}

impl OutputCall {
    /// Remote method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Audio(call) => call.method(),
            Self::Video(call) => call.method(),
        }
    }
}

/// Audio manager methods, one per output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    /// Set the volume (0-100) of an output
    SetVolume {
        /// Output to change
        output: AudioOutput,
        /// New volume
        volume: i32,
    },
    /// Volume of an output
    GetVolume(AudioOutput),
    /// Switch an output on or off
    SetState {
        /// Output to change
        output: AudioOutput,
        /// Whether it should be on
        on: bool,
    },
    /// Whether an output is on
    GetState(AudioOutput),
}

impl AudioCall {
    /// Remote method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetVolume { .. } => "SetVolume",
            Self::GetVolume(_) => "GetVolume",
            Self::SetState { .. } => "SetState",
            Self::GetState(_) => "GetState",
        }
    }
}

/// Video output methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCall {
    /// Names of the connected outputs
    GetValidVideoOutput,
    /// Modes supported by an output
    GetValidMode(String),
    /// Switch an output to a mode
    SetMode {
        /// Output name, as listed by `GetValidVideoOutput`
        output: String,
        /// Mode name, as listed by `GetValidMode`
        mode: String,
    },
    /// Current mode of an output
    GetMode(String),
}

impl VideoCall {
    /// Remote method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetValidVideoOutput => "GetValidVideoOutput",
            Self::GetValidMode(_) => "GetValidMode",
            Self::SetMode { .. } => "SetMode",
            Self::GetMode(_) => "GetMode",
        }
    }
}
