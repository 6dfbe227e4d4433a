use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::Stream;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, instrument, warn};

use super::{
    BusError, CallOutput, EventListener, EventSource, ListenerContext, MetadataEntry, OutputCall,
    PlayerBus, PlayerCall, PlayerEvent, PlayerHandle, PlayerPath, ProtocolVersion, SessionError,
};
use crate::services::common::Property;

/// How a new player should be leased.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerRequest {
    /// The client answers every liveness ping.
    Attended,
    /// The player runs for the given budget without pings.
    Unattended(Duration),
}

/// Parameters of a self-scheduling recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderSchedule {
    /// Delay before recording starts
    pub start: Duration,
    /// How long to record
    pub duration: Duration,
    /// Source to record
    pub uri: String,
    /// Destination file
    pub location: String,
}

/// Owns the lifecycle of remote player handles.
///
/// Holds at most one current handle. Every handle obtained stays subscribed
/// to its notifications until it is removed or found to be stale, so
/// superseded attended players keep answering liveness pings.
pub struct SessionManager {
    bus: Arc<dyn PlayerBus>,
    version: ProtocolVersion,
    current: Property<Option<PlayerHandle>>,
    listeners: Mutex<HashMap<PlayerPath, EventListener>>,
    service_listener: Mutex<Option<EventListener>>,
    events_tx: broadcast::Sender<PlayerEvent>,
    shutdown_tx: watch::Sender<bool>,
}

impl SessionManager {
    /// Create a session manager on top of a bus adapter.
    pub fn new(bus: Arc<dyn PlayerBus>, version: ProtocolVersion) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            bus,
            version,
            current: Property::new(None),
            listeners: Mutex::new(HashMap::new()),
            service_listener: Mutex::new(None),
            events_tx,
            shutdown_tx,
        }
    }

    /// Protocol revision this session speaks.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Most recently requested handle that has not been removed.
    pub fn current(&self) -> Option<PlayerHandle> {
        self.current.get()
    }

    /// Changes of the current handle, starting with its present value.
    pub fn watch_current(&self) -> impl Stream<Item = Option<PlayerHandle>> + Send {
        self.current.watch()
    }

    /// Decoded notifications from every subscribed player and the service.
    pub fn events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events_tx.subscribe()
    }

    /// Ask the service for a new player and make it current.
    ///
    /// The previous handle, if any, is left alive on the service side.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if the service cannot be reached,
    /// `ResourceExhausted` if it declines to create a player and
    /// `SubscriptionFailed` if the new player's notifications cannot be
    /// received. In the last case the player is removed again and the
    /// current handle is unchanged.
    #[instrument(skip(self))]
    pub async fn request_player(
        &self,
        request: PlayerRequest,
    ) -> Result<PlayerHandle, SessionError> {
        let handle = match request {
            PlayerRequest::Attended => {
                let path = self
                    .bus
                    .request_player()
                    .await
                    .map_err(|e| request_error("RequestMediaPlayer", e))?;
                PlayerHandle::attended(path)
            }
            PlayerRequest::Unattended(budget) => {
                let (token, path) = self
                    .bus
                    .request_player_unattended(budget.as_secs_f64())
                    .await
                    .map_err(|e| request_error("RequestMediaPlayerUnattended", e))?;
                PlayerHandle::unattended(path, budget, token)
            }
        };

        self.adopt(&handle).await?;
        Ok(handle)
    }

    /// Ask the service for a recorder that starts and stops on its own.
    ///
    /// The recorder becomes the current handle, leased for the recording duration.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::request_player`].
    #[instrument(skip(self))]
    pub async fn request_scheduled_recorder(
        &self,
        schedule: &RecorderSchedule,
    ) -> Result<PlayerHandle, SessionError> {
        let (token, path) = self
            .bus
            .request_scheduled_recorder(
                schedule.start.as_secs_f64(),
                schedule.duration.as_secs_f64(),
                &schedule.uri,
                &schedule.location,
            )
            .await
            .map_err(|e| request_error("RequestScheduledRecorder", e))?;

        let handle = PlayerHandle::unattended(path, schedule.duration, token);
        self.adopt(&handle).await?;
        Ok(handle)
    }

    async fn adopt(&self, handle: &PlayerHandle) -> Result<(), SessionError> {
        let path = handle.path();
        let signals = self.version.player_signals(handle.is_attended());

        let stream = match self.bus.subscribe(path, &signals).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Cannot subscribe to signals of {path}, releasing it: {e}");
                if let Err(remove) = self.bus.remove_player(path).await {
                    debug!("Release of {path} failed: {remove}");
                }
                return Err(SessionError::SubscriptionFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let listener =
            EventListener::start(EventSource::Player(path.clone()), stream, self.context());
        self.listeners.lock().await.insert(path.clone(), listener);
        debug!("Subscribed to {} signals of {path}", signals.len());

        info!("Player {handle} is now current");
        self.current.set(Some(handle.clone()));
        Ok(())
    }

    /// Destroy a player on the service side.
    ///
    /// The remote call is always issued, so removing the same handle twice
    /// reports the second attempt as stale.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the service no longer knows the player and
    /// `ServiceUnavailable` if it cannot be reached.
    #[instrument(skip(self), fields(path = %handle.path()))]
    pub async fn remove_player(&self, handle: &PlayerHandle) -> Result<(), SessionError> {
        let path = handle.path();

        match self.bus.remove_player(path).await {
            Ok(()) => {
                info!("Removed player {path}");
                self.forget(path).await;
                Ok(())
            }
            Err(BusError::Unreachable(reason)) => {
                warn!("Cannot remove {path}: service unreachable");
                Err(SessionError::ServiceUnavailable(reason))
            }
            Err(e) => {
                warn!("Removal of {path} rejected: {e}");
                self.forget(path).await;
                Err(SessionError::InvalidHandle {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove the current handle.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` when there is no current handle, otherwise
    /// as [`SessionManager::remove_player`].
    pub async fn remove_current(&self) -> Result<PlayerHandle, SessionError> {
        let handle = self.current().ok_or(SessionError::NoActiveSession)?;
        self.remove_player(&handle).await?;
        Ok(handle)
    }

    /// Invoke a method on the current player.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` without a current handle, `InvalidHandle`
    /// (and clears the slot) if the player is gone, `ServiceUnavailable` if
    /// the service cannot be reached and `CallFailed` for other rejections.
    #[instrument(skip(self), fields(method = call.method()))]
    pub async fn call(&self, call: &PlayerCall) -> Result<CallOutput, SessionError> {
        let handle = self.current().ok_or(SessionError::NoActiveSession)?;
        let path = handle.path();

        match self.bus.call(path, call).await {
            Ok(output) => Ok(output),
            Err(BusError::Unreachable(reason)) => {
                warn!("{} on {path}: service unreachable", call.method());
                Err(SessionError::ServiceUnavailable(reason))
            }
            Err(BusError::UnknownObject(reason)) => {
                warn!("{path} is gone, clearing current handle");
                self.forget(path).await;
                Err(SessionError::InvalidHandle {
                    path: path.clone(),
                    reason,
                })
            }
            Err(e) => {
                warn!("{} on {path} failed: {e}", call.method());
                Err(SessionError::CallFailed {
                    method: call.method(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Fetch what the service is currently playing, across all players.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` or `CallFailed`.
    pub async fn playing_content_metadata(&self) -> Result<Vec<MetadataEntry>, SessionError> {
        self.bus
            .playing_content_metadata()
            .await
            .map_err(|e| match e {
                BusError::Unreachable(reason) => SessionError::ServiceUnavailable(reason),
                other => SessionError::CallFailed {
                    method: "GetPlayingContentMetadata",
                    reason: other.to_string(),
                },
            })
    }

    /// Invoke a method on the audio manager or the video output object.
    ///
    /// Needs no current player.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if the service cannot be reached and
    /// `CallFailed` if it rejects the call.
    #[instrument(skip(self), fields(method = call.method()))]
    pub async fn output_call(&self, call: &OutputCall) -> Result<CallOutput, SessionError> {
        self.bus.output_call(call).await.map_err(|e| match e {
            BusError::Unreachable(reason) => SessionError::ServiceUnavailable(reason),
            other => {
                warn!("{} failed: {other}", call.method());
                SessionError::CallFailed {
                    method: call.method(),
                    reason: other.to_string(),
                }
            }
        })
    }

    /// Subscribe to service-wide metadata updates.
    ///
    /// Subsequent calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if the subscription cannot be installed.
    pub async fn watch_service(&self) -> Result<(), SessionError> {
        let mut slot = self.service_listener.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let stream = self
            .bus
            .subscribe_service()
            .await
            .map_err(|e| SessionError::ServiceUnavailable(e.to_string()))?;
        *slot = Some(EventListener::start(
            EventSource::Service,
            stream,
            self.context(),
        ));

        debug!("Subscribed to service metadata updates");
        Ok(())
    }

    /// Stop every notification listener.
    ///
    /// Handles are not removed on the service side.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.listeners.lock().await.clear();
        self.service_listener.lock().await.take();
        debug!("Session listeners stopped");
    }

    async fn forget(&self, path: &PlayerPath) {
        self.listeners.lock().await.remove(path);
        self.current.update(|current| {
            if current.as_ref().is_some_and(|h| h.path() == path) {
                *current = None;
                return true;
            }
            false
        });
    }

    fn context(&self) -> ListenerContext {
        ListenerContext {
            bus: Arc::clone(&self.bus),
            version: self.version,
            events: self.events_tx.clone(),
            shutdown: self.shutdown_tx.subscribe(),
        }
    }
}

fn request_error(method: &'static str, error: BusError) -> SessionError {
    match error {
        BusError::Unreachable(reason) => SessionError::ServiceUnavailable(reason),
        BusError::Rejected { message, .. } | BusError::UnknownObject(message) => {
            warn!("{method} declined: {message}");
            SessionError::ResourceExhausted(message)
        }
        BusError::Decode(reason) => SessionError::CallFailed { method, reason },
    }
}
