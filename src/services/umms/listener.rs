use std::sync::Arc;

use futures::StreamExt;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, instrument, warn};

use super::{
    EventSource, PlayerBus, PlayerEvent, PlayerPath, PlayerSignal, ProtocolVersion, SignalStream,
};

/// Everything a listener task needs besides its signal stream.
#[derive(Clone)]
pub(crate) struct ListenerContext {
    pub bus: Arc<dyn PlayerBus>,
    pub version: ProtocolVersion,
    pub events: broadcast::Sender<PlayerEvent>,
    pub shutdown: watch::Receiver<bool>,
}

/// Drains one subscription and publishes decoded events.
///
/// The task is aborted when the listener is dropped.
pub(crate) struct EventListener {
    handle: JoinHandle<()>,
}

impl EventListener {
    /// Spawn a task that forwards notifications from `stream`.
    #[instrument(skip(stream, context), fields(source = %source))]
    pub fn start(source: EventSource, stream: SignalStream, context: ListenerContext) -> Self {
        debug!("Starting event listener");

        let handle = tokio::spawn(async move {
            Self::run(source, stream, context).await;
        });

        Self { handle }
    }

    async fn run(source: EventSource, mut stream: SignalStream, mut context: ListenerContext) {
        if *context.shutdown.borrow() {
            return;
        }

        loop {
            tokio::select! {
                changed = context.shutdown.changed() => {
                    if changed.is_err() || *context.shutdown.borrow() {
                        debug!("Event listener for {source} shutting down");
                        break;
                    }
                }

                next = stream.next() => {
                    let Some(signal) = next else {
                        debug!("Signal stream ended for {source}");
                        break;
                    };
                    Self::handle_signal(&source, signal, &context);
                }
            }
        }
    }

    fn handle_signal(source: &EventSource, signal: PlayerSignal, context: &ListenerContext) {
        if signal == PlayerSignal::NeedReply {
            if let EventSource::Player(path) = source {
                acknowledge(path.clone(), context);
            }
            return;
        }

        let kind = signal.kind();
        let event = match PlayerEvent::decode(source.clone(), signal, context.version) {
            Ok(event) => event,
            Err(error) => {
                warn!("Undecodable {kind} from {source}: {error}");
                PlayerEvent::Undecodable {
                    source: source.clone(),
                    kind,
                    error,
                }
            }
        };

        let _ = context.events.send(event);
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Answer a liveness ping off the listener task.
fn acknowledge(path: PlayerPath, context: &ListenerContext) {
    let bus = Arc::clone(&context.bus);
    let events = context.events.clone();

    tokio::spawn(async move {
        let event = match bus.reply(&path).await {
            Ok(()) => {
                debug!("Acknowledged liveness ping from {path}");
                PlayerEvent::LivenessAcknowledged(path)
            }
            Err(e) => {
                warn!("Liveness reply to {path} failed: {e}");
                PlayerEvent::LivenessFailed {
                    path,
                    reason: e.to_string(),
                }
            }
        };
        let _ = events.send(event);
    });
}
