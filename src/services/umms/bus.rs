use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::{
    BusError, CallOutput, MetadataEntry, OutputCall, PlayerCall, PlayerPath, PlayerSignal,
    SignalKind,
};

/// Well-known bus name of the media service.
pub const SERVICE_NAME: &str = "com.meego.UMMS";

/// Object path of the player factory.
pub const OBJECT_MANAGER_PATH: &str = "/com/meego/UMMS/ObjectManager";

/// Interface of the player factory.
pub const OBJECT_MANAGER_INTERFACE: &str = "com.meego.UMMS.ObjectManager.iface";

/// Interface implemented by every player object.
pub const MEDIA_PLAYER_INTERFACE: &str = "com.meego.UMMS.MediaPlayer";

/// Object path of the playing-content metadata viewer.
pub const METADATA_VIEWER_PATH: &str = "/com/meego/UMMS/PlayingContentMetadataViewer";

/// Interface of the playing-content metadata viewer.
pub const METADATA_VIEWER_INTERFACE: &str = "com.meego.UMMS.PlayingContentMetadataViewer";

/// Object path of the audio output manager.
pub const AUDIO_MANAGER_PATH: &str = "/com/meego/UMMS/AudioManager";

/// Interface of the audio output manager, spelled as the service registers it.
pub const AUDIO_MANAGER_INTERFACE: &str = "com.meego.UMMS.AudioManger";

/// Object path of the video output controller.
pub const VIDEO_OUTPUT_PATH: &str = "/com/meego/UMMS/VideoOutput";

/// Interface of the video output controller.
pub const VIDEO_OUTPUT_INTERFACE: &str = "com.meego.UMMS.VideoOutput";

/// Stream of notifications from one subscription.
pub type SignalStream = Pin<Box<dyn Stream<Item = PlayerSignal> + Send>>;

/// Channel to the media service.
///
/// Abstracts the bus transport: method calls on the object manager and on
/// player objects, and signal subscriptions. Implementations share one
/// connection between the command loop and the notification loop.
#[async_trait]
pub trait PlayerBus: Send + Sync {
    /// Ask the object manager for an attended player.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn request_player(&self) -> Result<PlayerPath, BusError>;

    /// Ask the object manager for an unattended player.
    ///
    /// Returns the continuation token and the player path.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn request_player_unattended(
        &self,
        budget_secs: f64,
    ) -> Result<(String, PlayerPath), BusError>;

    /// Ask the object manager for a recorder that starts and stops on its own.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn request_scheduled_recorder(
        &self,
        start_secs: f64,
        duration_secs: f64,
        uri: &str,
        location: &str,
    ) -> Result<(String, PlayerPath), BusError>;

    /// Destroy a player on the service side.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn remove_player(&self, player: &PlayerPath) -> Result<(), BusError>;

    /// Invoke a method on a player object.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn call(&self, player: &PlayerPath, call: &PlayerCall) -> Result<CallOutput, BusError>;

    /// Acknowledge a liveness ping.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn reply(&self, player: &PlayerPath) -> Result<(), BusError>;

    /// Fetch the playing-content metadata list from the metadata viewer.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn playing_content_metadata(&self) -> Result<Vec<MetadataEntry>, BusError>;

    /// Invoke a method on the audio manager or the video output object.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the call fails.
    async fn output_call(&self, call: &OutputCall) -> Result<CallOutput, BusError>;

    /// Subscribe to the given signals of a player object.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if a match rule cannot be installed.
    async fn subscribe(
        &self,
        player: &PlayerPath,
        signals: &[SignalKind],
    ) -> Result<SignalStream, BusError>;

    /// Subscribe to service-wide signals (metadata updates).
    ///
    /// # Errors
    ///
    /// Returns `BusError` if a match rule cannot be installed.
    async fn subscribe_service(&self) -> Result<SignalStream, BusError>;
}
