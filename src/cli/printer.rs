use chrono::Local;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::services::umms::PlayerEvent;

use super::formatting::format_event;

/// Writes notifications as they arrive, independent of the command loop.
///
/// The task is aborted when the printer is dropped.
pub struct EventPrinter {
    handle: JoinHandle<()>,
}

impl EventPrinter {
    /// Spawn a task that renders every event received on `events`.
    pub fn start<W>(mut events: broadcast::Receiver<PlayerEvent>, mut output: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Event printer fell behind, {missed} notifications dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let line = format!("{}\n", format_event(&event, Local::now()));
                if let Err(e) = output.write_all(line.as_bytes()).await {
                    warn!("Cannot write notification: {e}");
                    break;
                }
                let _ = output.flush().await;
            }
            debug!("Event printer stopped");
        });

        Self { handle }
    }
}

impl Drop for EventPrinter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
