#![allow(missing_docs)]

use std::collections::HashMap;
use zbus::{
    Result, proxy,
    zvariant::{OwnedValue, Value},
};

/// Player factory of the media service.
///
/// Hands out player objects and removes them again.
#[proxy(
    interface = "com.meego.UMMS.ObjectManager.iface",
    default_service = "com.meego.UMMS",
    default_path = "/com/meego/UMMS/ObjectManager"
)]
pub trait ObjectManager {
    /// Create an attended player; returns its object path
    fn request_media_player(&self) -> Result<String>;

    /// Create a player that runs for `time_to_execution` seconds without liveness replies
    fn request_media_player_unattended(&self, time_to_execution: f64) -> Result<(String, String)>;

    /// Create a recorder that starts after `start` seconds and records for `duration` seconds
    fn request_scheduled_recorder(
        &self,
        start: f64,
        duration: f64,
        uri: &str,
        location: &str,
    ) -> Result<(String, String)>;

    /// Destroy a player
    fn remove_media_player(&self, object_path: &str) -> Result<()>;
}

/// Player object interface.
///
/// Object paths are handed out by the object manager, so there is no default path.
#[proxy(interface = "com.meego.UMMS.MediaPlayer", default_service = "com.meego.UMMS")]
pub trait MediaPlayer {
    fn set_uri(&self, uri: &str) -> Result<()>;

    fn set_target(&self, target_type: i32, params: HashMap<&str, Value<'_>>) -> Result<()>;

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    /// Seek to `pos` milliseconds
    fn set_position(&self, pos: i64) -> Result<()>;

    /// Position in milliseconds
    fn get_position(&self) -> Result<i64>;

    fn set_playback_rate(&self, rate: f64) -> Result<()>;

    fn get_playback_rate(&self) -> Result<f64>;

    fn set_volume(&self, volume: i32) -> Result<()>;

    fn get_volume(&self) -> Result<i32>;

    fn set_window_id(&self, window_id: f64) -> Result<()>;

    fn set_video_size(&self, x: u32, y: u32, w: u32, h: u32) -> Result<()>;

    fn get_video_size(&self) -> Result<(u32, u32)>;

    fn get_buffered_time(&self) -> Result<i64>;

    fn get_buffered_bytes(&self) -> Result<i64>;

    fn get_media_size_time(&self) -> Result<i64>;

    fn get_media_size_bytes(&self) -> Result<i64>;

    fn has_video(&self) -> Result<bool>;

    fn has_audio(&self) -> Result<bool>;

    fn is_streaming(&self) -> Result<bool>;

    fn is_seekable(&self) -> Result<bool>;

    fn support_fullscreen(&self) -> Result<bool>;

    fn get_player_state(&self) -> Result<i32>;

    /// Liveness acknowledgement for attended players
    fn reply(&self) -> Result<()>;

    fn suspend(&self) -> Result<()>;

    fn restore(&self) -> Result<()>;

    fn get_current_video(&self) -> Result<i32>;

    fn set_current_video(&self, index: i32) -> Result<()>;

    fn get_video_num(&self) -> Result<i32>;

    fn get_current_audio(&self) -> Result<i32>;

    fn set_current_audio(&self, index: i32) -> Result<()>;

    fn get_audio_num(&self) -> Result<i32>;

    fn get_current_subtitle(&self) -> Result<i32>;

    fn set_current_subtitle(&self, index: i32) -> Result<()>;

    fn get_subtitle_num(&self) -> Result<i32>;

    fn set_subtitle_uri(&self, uri: &str) -> Result<()>;

    fn set_mute(&self, mute: i32) -> Result<()>;

    fn is_mute(&self) -> Result<i32>;

    fn set_scale_mode(&self, mode: i32) -> Result<()>;

    fn get_scale_mode(&self) -> Result<i32>;

    fn set_buffer_depth(&self, format: i32, value: i64) -> Result<()>;

    fn get_buffer_depth(&self, format: i32) -> Result<i64>;

    fn get_current_uri(&self) -> Result<String>;

    fn get_title(&self) -> Result<String>;

    fn get_artist(&self) -> Result<String>;

    fn get_protocol_name(&self) -> Result<String>;

    /// Program association table, one map per program
    fn get_pat(&self) -> Result<Vec<HashMap<String, OwnedValue>>>;

    /// Program number, PCR pid and one map per elementary stream
    fn get_pmt(&self) -> Result<(u32, u32, Vec<HashMap<String, OwnedValue>>)>;

    fn get_associated_data_channel(&self) -> Result<(String, i32)>;

    fn record(&self, to_record: bool, location: &str) -> Result<()>;
}

/// Service-wide view of what is currently playing.
#[proxy(
    interface = "com.meego.UMMS.PlayingContentMetadataViewer",
    default_service = "com.meego.UMMS",
    default_path = "/com/meego/UMMS/PlayingContentMetadataViewer"
)]
pub trait PlayingContentMetadataViewer {
    /// One map with `URI`, `Title` and `Artist` per playing item
    fn get_playing_content_metadata(&self) -> Result<Vec<HashMap<String, OwnedValue>>>;
}

/// Per-output audio volume and power.
///
/// Outputs are addressed by their wire number (0 hdmi, 1 spdif, 2 i2s0, 3 i2s1).
#[proxy(
    interface = "com.meego.UMMS.AudioManger",
    default_service = "com.meego.UMMS",
    default_path = "/com/meego/UMMS/AudioManager"
)]
pub trait AudioManager {
    fn set_volume(&self, output_type: i32, volume: i32) -> Result<()>;

    fn get_volume(&self, output_type: i32) -> Result<i32>;

    /// `state` is 0 for off, 1 for on
    fn set_state(&self, output_type: i32, state: i32) -> Result<()>;

    fn get_state(&self, output_type: i32) -> Result<i32>;
}

/// Display outputs and their modes.
#[proxy(
    interface = "com.meego.UMMS.VideoOutput",
    default_service = "com.meego.UMMS",
    default_path = "/com/meego/UMMS/VideoOutput"
)]
pub trait VideoOutput {
    fn get_valid_video_output(&self) -> Result<Vec<String>>;

    fn get_valid_mode(&self, output_name: &str) -> Result<Vec<String>>;

    fn set_mode(&self, output_name: &str, mode: &str) -> Result<()>;

    fn get_mode(&self, output_name: &str) -> Result<String>;
}
