//! In-memory stand-in for the media service.
//!
//! Available to unit tests and, with the `test-util` feature, to
//! integration tests and downstream crates.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{
    BusError, CallOutput, MetadataEntry, OutputCall, PlayerBus, PlayerCall, PlayerPath,
    PlayerSignal, SignalKind, SignalStream,
};

/// [`PlayerBus`] that hands out numbered players and records every call.
///
/// Tests push notifications with [`MockBus::emit`] and inject failures with
/// the `fail_*`, `refuse_players` and `go_offline` switches.
#[derive(Default)]
pub struct MockBus {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    next_id: u32,
    live: HashSet<PlayerPath>,
    calls: Vec<(PlayerPath, PlayerCall)>,
    output_calls: Vec<OutputCall>,
    replies: Vec<PlayerPath>,
    removals: Vec<PlayerPath>,
    subscriptions: HashMap<PlayerPath, Vec<SignalKind>>,
    senders: HashMap<PlayerPath, mpsc::UnboundedSender<PlayerSignal>>,
    service_sender: Option<mpsc::UnboundedSender<PlayerSignal>>,
    outputs: HashMap<&'static str, CallOutput>,
    failing: HashSet<&'static str>,
    refuse_players: bool,
    refuse_subscriptions: bool,
    unreachable: bool,
}

impl MockBus {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `output` from every call of `method`.
    pub fn set_output(&self, method: &'static str, output: CallOutput) {
        self.state().outputs.insert(method, output);
    }

    /// Reject every call of `method` with an engine error.
    pub fn fail_method(&self, method: &'static str) {
        self.state().failing.insert(method);
    }

    /// Decline every player request.
    pub fn refuse_players(&self) {
        self.state().refuse_players = true;
    }

    /// Fail every signal subscription.
    pub fn fail_subscriptions(&self) {
        self.state().refuse_subscriptions = true;
    }

    /// Behave as if the connection dropped.
    pub fn go_offline(&self) {
        self.state().unreachable = true;
    }

    /// Drop a player as if its budget ran out.
    pub fn expire(&self, path: &PlayerPath) {
        self.state().live.remove(path);
    }

    /// Deliver a notification from a player.
    pub fn emit(&self, path: &PlayerPath, signal: PlayerSignal) {
        if let Some(tx) = self.state().senders.get(path) {
            let _ = tx.send(signal);
        }
    }

    /// Deliver a service-wide notification.
    pub fn emit_service(&self, signal: PlayerSignal) {
        if let Some(tx) = &self.state().service_sender {
            let _ = tx.send(signal);
        }
    }

    /// Player calls received so far.
    pub fn calls(&self) -> Vec<(PlayerPath, PlayerCall)> {
        self.state().calls.clone()
    }

    /// Output object calls received so far.
    pub fn output_calls(&self) -> Vec<OutputCall> {
        self.state().output_calls.clone()
    }

    /// Liveness replies received so far.
    pub fn replies(&self) -> Vec<PlayerPath> {
        self.state().replies.clone()
    }

    /// Removal requests received so far, including rejected ones.
    pub fn removals(&self) -> Vec<PlayerPath> {
        self.state().removals.clone()
    }

    /// Whether the player still exists on the service side.
    pub fn is_live(&self, path: &PlayerPath) -> bool {
        self.state().live.contains(path)
    }

    /// Signals most recently subscribed for `path`.
    pub fn subscriptions(&self, path: &PlayerPath) -> Vec<SignalKind> {
        self.state()
            .subscriptions
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    fn check_reachable(state: &MockState) -> Result<(), BusError> {
        if state.unreachable {
            return Err(BusError::Unreachable("connection closed".to_string()));
        }
        Ok(())
    }

    fn result_for(state: &MockState, method: &'static str) -> Result<CallOutput, BusError> {
        if state.failing.contains(method) {
            return Err(BusError::Rejected {
                name: "com.meego.UMMS.Error.Engine".to_string(),
                message: "engine refused".to_string(),
            });
        }
        Ok(state
            .outputs
            .get(method)
            .cloned()
            .unwrap_or(CallOutput::Unit))
    }

    fn create(&self) -> Result<PlayerPath, BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        if state.refuse_players {
            return Err(BusError::Rejected {
                name: "com.meego.UMMS.Error.NoResource".to_string(),
                message: "too many players".to_string(),
            });
        }

        let path = PlayerPath::new(format!("/com/meego/UMMS/MediaPlayer{}", state.next_id));
        state.next_id += 1;
        state.live.insert(path.clone());
        Ok(path)
    }
}

#[async_trait]
impl PlayerBus for MockBus {
    async fn request_player(&self) -> Result<PlayerPath, BusError> {
        self.create()
    }

    async fn request_player_unattended(
        &self,
        budget_secs: f64,
    ) -> Result<(String, PlayerPath), BusError> {
        let path = self.create()?;
        Ok((format!("token-{budget_secs}"), path))
    }

    async fn request_scheduled_recorder(
        &self,
        _start_secs: f64,
        _duration_secs: f64,
        _uri: &str,
        _location: &str,
    ) -> Result<(String, PlayerPath), BusError> {
        let path = self.create()?;
        Ok(("recorder-token".to_string(), path))
    }

    async fn remove_player(&self, player: &PlayerPath) -> Result<(), BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        state.removals.push(player.clone());
        state.senders.remove(player);
        if state.live.remove(player) {
            Ok(())
        } else {
            Err(BusError::Rejected {
                name: "com.meego.UMMS.Error.NoSuchPlayer".to_string(),
                message: format!("{player} does not exist"),
            })
        }
    }

    async fn call(&self, player: &PlayerPath, call: &PlayerCall) -> Result<CallOutput, BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        if !state.live.contains(player) {
            return Err(BusError::UnknownObject(format!("no object at {player}")));
        }

        state.calls.push((player.clone(), call.clone()));
        Self::result_for(&state, call.method())
    }

    async fn reply(&self, player: &PlayerPath) -> Result<(), BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        state.replies.push(player.clone());
        Ok(())
    }

    async fn playing_content_metadata(&self) -> Result<Vec<MetadataEntry>, BusError> {
        let state = self.state();
        Self::check_reachable(&state)?;
        Ok(vec![MetadataEntry {
            uri: "file:///root/720p.m4v".to_string(),
            title: "Sample".to_string(),
            artist: "Nobody".to_string(),
        }])
    }

    async fn output_call(&self, call: &OutputCall) -> Result<CallOutput, BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        state.output_calls.push(call.clone());
        Self::result_for(&state, call.method())
    }

    async fn subscribe(
        &self,
        player: &PlayerPath,
        signals: &[SignalKind],
    ) -> Result<SignalStream, BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        if state.refuse_subscriptions {
            return Err(BusError::Rejected {
                name: "org.freedesktop.DBus.Error.LimitsExceeded".to_string(),
                message: "too many match rules".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.senders.insert(player.clone(), tx);
        state.subscriptions.insert(player.clone(), signals.to_vec());
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn subscribe_service(&self) -> Result<SignalStream, BusError> {
        let mut state = self.state();
        Self::check_reachable(&state)?;

        let (tx, rx) = mpsc::unbounded_channel();
        state.service_sender = Some(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}
