use std::collections::HashMap;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use zbus::{
    Connection, Message,
    message::Body,
    fdo::DBusProxy,
    names::BusName,
    proxy::CacheProperties,
    zvariant::OwnedValue,
};

use super::{
    AudioCall, AudioManagerProxy, BusError, CallOutput, MediaPlayerProxy, MetadataEntry,
    ObjectManagerProxy, OutputCall, PatEntry, PlayerBus, PlayerCall, PlayerPath, PlayerSignal,
    PlayingContentMetadataViewerProxy, ProgramMap, ProtocolVersion, SERVICE_NAME, SignalKind,
    SignalStream, StatePayload, StatePayloadShape, StreamInfo, TargetInfo, VideoCall,
    VideoOutputProxy,
};

/// Which message bus the service lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// The system bus
    #[default]
    System,
    /// The user's session bus
    Session,
}

/// [`PlayerBus`] over D-Bus.
///
/// Holds one connection shared by method calls and signal subscriptions,
/// and caches one proxy per player object.
pub struct DbusPlayerBus {
    connection: Connection,
    manager: ObjectManagerProxy<'static>,
    players: RwLock<HashMap<PlayerPath, MediaPlayerProxy<'static>>>,
    version: ProtocolVersion,
}

impl DbusPlayerBus {
    /// Connect to the bus and check that the media service is reachable.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Unreachable` if the bus cannot be opened or the
    /// service name is neither owned nor activatable.
    #[instrument]
    pub async fn connect(kind: BusKind, version: ProtocolVersion) -> Result<Self, BusError> {
        let connection = match kind {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(|e| BusError::Unreachable(format!("cannot open {kind:?} bus: {e}")))?;

        Self::ensure_service(&connection).await?;

        let manager = ObjectManagerProxy::builder(&connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        debug!("Connected to {SERVICE_NAME} on the {kind:?} bus");

        Ok(Self {
            connection,
            manager,
            players: RwLock::new(HashMap::new()),
            version,
        })
    }

    async fn ensure_service(connection: &Connection) -> Result<(), BusError> {
        let dbus = DBusProxy::new(connection).await?;
        let name = BusName::try_from(SERVICE_NAME)
            .map_err(|e| BusError::Unreachable(format!("invalid service name: {e}")))?;

        if dbus.name_has_owner(name).await.map_err(zbus::Error::from)? {
            return Ok(());
        }

        let activatable = dbus
            .list_activatable_names()
            .await
            .map_err(zbus::Error::from)?;
        if activatable.iter().any(|n| n.as_str() == SERVICE_NAME) {
            return Ok(());
        }

        Err(BusError::Unreachable(format!(
            "{SERVICE_NAME} is not running and cannot be activated"
        )))
    }

    async fn player_proxy(
        &self,
        player: &PlayerPath,
    ) -> Result<MediaPlayerProxy<'static>, BusError> {
        if let Some(proxy) = self.players.read().await.get(player) {
            return Ok(proxy.clone());
        }

        let proxy = MediaPlayerProxy::builder(&self.connection)
            .path(player.as_str().to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        self.players
            .write()
            .await
            .insert(player.clone(), proxy.clone());

        Ok(proxy)
    }

    async fn forget_player(&self, player: &PlayerPath) {
        self.players.write().await.remove(player);
    }
}

#[async_trait]
impl PlayerBus for DbusPlayerBus {
    async fn request_player(&self) -> Result<PlayerPath, BusError> {
        let path = self.manager.request_media_player().await?;
        Ok(PlayerPath::new(path))
    }

    async fn request_player_unattended(
        &self,
        budget_secs: f64,
    ) -> Result<(String, PlayerPath), BusError> {
        let (token, path) = self
            .manager
            .request_media_player_unattended(budget_secs)
            .await?;
        Ok((token, PlayerPath::new(path)))
    }

    async fn request_scheduled_recorder(
        &self,
        start_secs: f64,
        duration_secs: f64,
        uri: &str,
        location: &str,
    ) -> Result<(String, PlayerPath), BusError> {
        let (token, path) = self
            .manager
            .request_scheduled_recorder(start_secs, duration_secs, uri, location)
            .await?;
        Ok((token, PlayerPath::new(path)))
    }

    async fn remove_player(&self, player: &PlayerPath) -> Result<(), BusError> {
        let result = self.manager.remove_media_player(player.as_str()).await;
        self.forget_player(player).await;
        result.map_err(BusError::from)
    }

    async fn call(&self, player: &PlayerPath, call: &PlayerCall) -> Result<CallOutput, BusError> {
        let proxy = self.player_proxy(player).await?;
        invoke(&proxy, call).await
    }

    async fn reply(&self, player: &PlayerPath) -> Result<(), BusError> {
        let proxy = self.player_proxy(player).await?;
        proxy.reply().await?;
        Ok(())
    }

    async fn playing_content_metadata(&self) -> Result<Vec<MetadataEntry>, BusError> {
        let viewer = PlayingContentMetadataViewerProxy::builder(&self.connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let maps = viewer.get_playing_content_metadata().await?;
        Ok(metadata_from_maps(&maps))
    }

    async fn output_call(&self, call: &OutputCall) -> Result<CallOutput, BusError> {
        match call {
            OutputCall::Audio(call) => {
                let audio = AudioManagerProxy::builder(&self.connection)
                    .cache_properties(CacheProperties::No)
                    .build()
                    .await?;
                invoke_audio(&audio, *call).await
            }
            OutputCall::Video(call) => {
                let video = VideoOutputProxy::builder(&self.connection)
                    .cache_properties(CacheProperties::No)
                    .build()
                    .await?;
                invoke_video(&video, call).await
            }
        }
    }

    async fn subscribe(
        &self,
        player: &PlayerPath,
        signals: &[SignalKind],
    ) -> Result<SignalStream, BusError> {
        let proxy = self.player_proxy(player).await?;
        let version = self.version;

        let mut streams = Vec::with_capacity(signals.len());
        for &kind in signals {
            let messages = proxy.inner().receive_signal(kind.member()).await?;
            let decoded: SignalStream = Box::pin(
                messages.map(move |message| decode(kind, version, &message)),
            );
            streams.push(decoded);
        }

        Ok(Box::pin(stream::select_all(streams)))
    }

    async fn subscribe_service(&self) -> Result<SignalStream, BusError> {
        let viewer = PlayingContentMetadataViewerProxy::builder(&self.connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let version = self.version;
        let kind = SignalKind::MetadataUpdated;

        let messages = viewer.inner().receive_signal(kind.member()).await?;
        Ok(Box::pin(messages.map(move |message| decode(kind, version, &message))))
    }
}

/// Decode a signal body; bodies that cannot be read are passed on as
/// [`PlayerSignal::Unreadable`] so the user still sees them.
fn decode(kind: SignalKind, version: ProtocolVersion, message: &Message) -> PlayerSignal {
    decode_body(kind, version, message).unwrap_or_else(|e| {
        warn!("{kind} signal with unexpected body: {e}");
        PlayerSignal::Unreadable {
            kind,
            reason: e.to_string(),
        }
    })
}

fn decode_body(
    kind: SignalKind,
    version: ProtocolVersion,
    message: &Message,
) -> Result<PlayerSignal, BusError> {
    let body = message.body();
    let signal = match kind {
        SignalKind::Initialized => PlayerSignal::Initialized,
        SignalKind::Eof => PlayerSignal::Eof,
        SignalKind::Buffering => PlayerSignal::Buffering,
        SignalKind::Buffered => PlayerSignal::Buffered,
        SignalKind::Seeked => PlayerSignal::Seeked,
        SignalKind::Stopped => PlayerSignal::Stopped,
        SignalKind::RequestWindow => PlayerSignal::RequestWindow,
        SignalKind::Suspended => PlayerSignal::Suspended,
        SignalKind::Restored => PlayerSignal::Restored,
        SignalKind::NoResource => PlayerSignal::NoResource,
        SignalKind::NeedReply => PlayerSignal::NeedReply,
        SignalKind::RecordStart => PlayerSignal::RecordStart,
        SignalKind::RecordStop => PlayerSignal::RecordStop,
        SignalKind::PlayerStateChanged => {
            PlayerSignal::StateChanged(state_payload(version, &body)?)
        }
        SignalKind::Error => {
            let (domain, message) = body.deserialize::<(u32, String)>()?;
            PlayerSignal::Error { domain, message }
        }
        SignalKind::TargetReady => {
            let map = body.deserialize::<HashMap<String, OwnedValue>>()?;
            PlayerSignal::TargetReady(target_info_from_map(&map))
        }
        SignalKind::MetadataUpdated => {
            let maps = body.deserialize::<Vec<HashMap<String, OwnedValue>>>()?;
            PlayerSignal::MetadataUpdated(metadata_from_maps(&maps))
        }
    };
    Ok(signal)
}

/// Read a state change body in either shape.
///
/// Services do not always send the shape their revision documents, so the
/// revision only decides which shape is tried first. Ordinals are resolved
/// later against the revision's state table either way.
fn state_payload(version: ProtocolVersion, body: &Body) -> Result<StatePayload, BusError> {
    let single = || body.deserialize::<i32>().map(StatePayload::New);
    let pair = || {
        body.deserialize::<(i32, i32)>()
            .map(|(old, new)| StatePayload::Transition { old, new })
    };

    let payload = match version.state_payload() {
        StatePayloadShape::NewOnly => single().or_else(|_| pair()),
        StatePayloadShape::OldAndNew => pair().or_else(|_| single()),
    };
    Ok(payload?)
}

async fn invoke(
    proxy: &MediaPlayerProxy<'static>,
    call: &PlayerCall,
) -> Result<CallOutput, BusError> {
    let output = match call {
        PlayerCall::SetUri(uri) => unit(proxy.set_uri(uri).await)?,
        PlayerCall::SetTarget(target) => {
            unit(proxy.set_target(target.type_id(), target.params()).await)?
        }
        PlayerCall::Play => unit(proxy.play().await)?,
        PlayerCall::Pause => unit(proxy.pause().await)?,
        PlayerCall::Stop => unit(proxy.stop().await)?,
        PlayerCall::SetPosition(ms) => unit(proxy.set_position(*ms).await)?,
        PlayerCall::GetPosition => CallOutput::Millis(proxy.get_position().await?),
        PlayerCall::SetPlaybackRate(rate) => unit(proxy.set_playback_rate(*rate).await)?,
        PlayerCall::GetPlaybackRate => CallOutput::Number(proxy.get_playback_rate().await?),
        PlayerCall::SetVolume(volume) => unit(proxy.set_volume(*volume).await)?,
        PlayerCall::GetVolume => CallOutput::Integer(proxy.get_volume().await?.into()),
        PlayerCall::SetWindowId(id) => unit(proxy.set_window_id(*id).await)?,
        PlayerCall::SetVideoSize(rect) => unit(
            proxy
                .set_video_size(rect.x, rect.y, rect.width, rect.height)
                .await,
        )?,
        PlayerCall::GetVideoSize => {
            let (width, height) = proxy.get_video_size().await?;
            CallOutput::Size { width, height }
        }
        PlayerCall::GetBufferedTime => CallOutput::Millis(proxy.get_buffered_time().await?),
        PlayerCall::GetBufferedBytes => CallOutput::Bytes(proxy.get_buffered_bytes().await?),
        PlayerCall::GetMediaSizeTime => CallOutput::Millis(proxy.get_media_size_time().await?),
        PlayerCall::GetMediaSizeBytes => CallOutput::Bytes(proxy.get_media_size_bytes().await?),
        PlayerCall::HasVideo => CallOutput::Flag(proxy.has_video().await?),
        PlayerCall::HasAudio => CallOutput::Flag(proxy.has_audio().await?),
        PlayerCall::IsStreaming => CallOutput::Flag(proxy.is_streaming().await?),
        PlayerCall::IsSeekable => CallOutput::Flag(proxy.is_seekable().await?),
        PlayerCall::SupportFullscreen => CallOutput::Flag(proxy.support_fullscreen().await?),
        PlayerCall::GetPlayerState => CallOutput::State(proxy.get_player_state().await?),
        PlayerCall::Suspend => unit(proxy.suspend().await)?,
        PlayerCall::Restore => unit(proxy.restore().await)?,
        PlayerCall::GetCurrentVideo => CallOutput::Integer(proxy.get_current_video().await?.into()),
        PlayerCall::SetCurrentVideo(index) => unit(proxy.set_current_video(*index).await)?,
        PlayerCall::GetVideoNum => CallOutput::Integer(proxy.get_video_num().await?.into()),
        PlayerCall::GetCurrentAudio => CallOutput::Integer(proxy.get_current_audio().await?.into()),
        PlayerCall::SetCurrentAudio(index) => unit(proxy.set_current_audio(*index).await)?,
        PlayerCall::GetAudioNum => CallOutput::Integer(proxy.get_audio_num().await?.into()),
        PlayerCall::GetCurrentSubtitle => {
            CallOutput::Integer(proxy.get_current_subtitle().await?.into())
        }
        PlayerCall::SetCurrentSubtitle(index) => {
            unit(proxy.set_current_subtitle(*index).await)?
        }
        PlayerCall::GetSubtitleNum => CallOutput::Integer(proxy.get_subtitle_num().await?.into()),
        PlayerCall::SetSubtitleUri(uri) => unit(proxy.set_subtitle_uri(uri).await)?,
        PlayerCall::SetMute(mute) => unit(proxy.set_mute(i32::from(*mute)).await)?,
        PlayerCall::IsMute => CallOutput::Flag(proxy.is_mute().await? != 0),
        PlayerCall::SetScaleMode(mode) => unit(proxy.set_scale_mode(mode.as_raw()).await)?,
        PlayerCall::GetScaleMode => CallOutput::Scale(proxy.get_scale_mode().await?),
        PlayerCall::SetBufferDepth(format, value) => {
            unit(proxy.set_buffer_depth(format.as_raw(), *value).await)?
        }
        PlayerCall::GetBufferDepth(format) => {
            CallOutput::Integer(proxy.get_buffer_depth(format.as_raw()).await?)
        }
        PlayerCall::GetCurrentUri => CallOutput::Text(proxy.get_current_uri().await?),
        PlayerCall::GetTitle => CallOutput::Text(proxy.get_title().await?),
        PlayerCall::GetArtist => CallOutput::Text(proxy.get_artist().await?),
        PlayerCall::GetProtocolName => CallOutput::Text(proxy.get_protocol_name().await?),
        PlayerCall::GetPat => CallOutput::Pat(pat_from_maps(&proxy.get_pat().await?)),
        PlayerCall::GetPmt => {
            let (program_number, pcr_pid, streams) = proxy.get_pmt().await?;
            CallOutput::Pmt(ProgramMap {
                program_number,
                pcr_pid,
                streams: streams_from_maps(&streams),
            })
        }
        PlayerCall::GetAssociatedDataChannel => {
            let (ip, port) = proxy.get_associated_data_channel().await?;
            CallOutput::DataChannel { ip, port }
        }
        PlayerCall::Record { enable, location } => {
            unit(proxy.record(*enable, location).await)?
        }
    };
    Ok(output)
}

async fn invoke_audio(
    proxy: &AudioManagerProxy<'static>,
    call: AudioCall,
) -> Result<CallOutput, BusError> {
    let output = match call {
        AudioCall::SetVolume { output, volume } => {
            unit(proxy.set_volume(output.as_raw(), volume).await)?
        }
        AudioCall::GetVolume(output) => {
            CallOutput::Integer(proxy.get_volume(output.as_raw()).await?.into())
        }
        AudioCall::SetState { output, on } => {
            unit(proxy.set_state(output.as_raw(), i32::from(on)).await)?
        }
        AudioCall::GetState(output) => {
            CallOutput::OutputState(proxy.get_state(output.as_raw()).await?)
        }
    };
    Ok(output)
}

async fn invoke_video(
    proxy: &VideoOutputProxy<'static>,
    call: &VideoCall,
) -> Result<CallOutput, BusError> {
    let output = match call {
        VideoCall::GetValidVideoOutput => CallOutput::Names(proxy.get_valid_video_output().await?),
        VideoCall::GetValidMode(name) => CallOutput::Names(proxy.get_valid_mode(name).await?),
        VideoCall::SetMode { output, mode } => unit(proxy.set_mode(output, mode).await)?,
        VideoCall::GetMode(name) => CallOutput::Text(proxy.get_mode(name).await?),
    };
    Ok(output)
}

fn unit(result: zbus::Result<()>) -> Result<CallOutput, BusError> {
    result.map(|()| CallOutput::Unit).map_err(BusError::from)
}

fn text_field(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|value| value.downcast_ref::<&str>().ok())
        .map(str::to_string)
}

fn u32_field(map: &HashMap<String, OwnedValue>, key: &str) -> Option<u32> {
    let value = map.get(key)?;
    value
        .downcast_ref::<u32>()
        .ok()
        .or_else(|| value.downcast_ref::<i32>().ok().and_then(|v| u32::try_from(v).ok()))
}

/// Build metadata entries from `URI`/`Title`/`Artist` maps.
pub(crate) fn metadata_from_maps(maps: &[HashMap<String, OwnedValue>]) -> Vec<MetadataEntry> {
    maps.iter()
        .map(|map| MetadataEntry {
            uri: text_field(map, "URI").unwrap_or_default(),
            title: text_field(map, "Title").unwrap_or_default(),
            artist: text_field(map, "Artist").unwrap_or_default(),
        })
        .collect()
}

/// Extract geometry from a `TargetReady` map.
pub(crate) fn target_info_from_map(map: &HashMap<String, OwnedValue>) -> TargetInfo {
    TargetInfo {
        rectangle: text_field(map, "rectangle"),
        plane_id: map
            .get("plane-id")
            .and_then(|value| value.downcast_ref::<i32>().ok()),
    }
}

/// Build PAT entries, skipping maps without both keys.
pub(crate) fn pat_from_maps(maps: &[HashMap<String, OwnedValue>]) -> Vec<PatEntry> {
    maps.iter()
        .filter_map(|map| {
            Some(PatEntry {
                program_number: u32_field(map, "program-number")?,
                pid: u32_field(map, "pid")?,
            })
        })
        .collect()
}

/// Build PMT stream entries, skipping maps without both keys.
pub(crate) fn streams_from_maps(maps: &[HashMap<String, OwnedValue>]) -> Vec<StreamInfo> {
    maps.iter()
        .filter_map(|map| {
            Some(StreamInfo {
                pid: u32_field(map, "pid")?,
                stream_type: u32_field(map, "stream-type")?,
            })
        })
        .collect()
}
