//! Persistent duplex connection to the rig bridge.
//!
//! Modeled as two unidirectional channels rather than an event-emitter:
//! a bounded outbound command queue (capacity 1, only one command is
//! ever in flight) and a single inbound status subscriber. Command
//! delivery is fire-and-forget; the status stream is the only feedback.

use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::messages::{RigCommand, RigStatus};

/// Outbound queue depth. One command in flight at a time.
const COMMAND_QUEUE_CAPACITY: usize = 1;

/// Inbound status buffer between the reader task and the subscriber.
const STATUS_BUFFER_CAPACITY: usize = 16;

/// Errors from the rig channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to rig bridge at {url}")]
    Connection {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("rig channel is closed")]
    Closed,
}

type StatusSlot = Arc<Mutex<Option<mpsc::Sender<RigStatus>>>>;

/// Handle to the rig bridge connection.
///
/// Cloning shares the same underlying connection; `disconnect` is safe
/// to call multiple times.
#[derive(Clone)]
pub struct CommandChannel {
    command_tx: mpsc::Sender<RigCommand>,
    status_slot: StatusSlot,
    shutdown: CancellationToken,
}

impl CommandChannel {
    /// Establish the websocket connection and spawn the reader/writer
    /// tasks.
    ///
    /// Connection failure is surfaced to the caller; navigation-level
    /// callers are expected to degrade gracefully rather than block.
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|source| ChannelError::Connection {
                url: url.to_string(),
                source,
            })?;
        debug!(%url, "rig channel connected");

        let (mut sink, mut stream) = ws.split();
        let (command_tx, mut command_rx) = mpsc::channel::<RigCommand>(COMMAND_QUEUE_CAPACITY);
        let status_slot: StatusSlot = Arc::new(Mutex::new(None));
        let shutdown = CancellationToken::new();

        let writer_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.cancelled() => {
                        // Best-effort flush of anything already queued.
                        while let Ok(command) = command_rx.try_recv() {
                            if let Ok(payload) = serde_json::to_string(&command) {
                                let _ = sink.send(Message::Text(payload.into())).await;
                            }
                        }
                        let _ = sink.close().await;
                        break;
                    }
                    command = command_rx.recv() => {
                        let Some(command) = command else {
                            let _ = sink.close().await;
                            break;
                        };
                        let payload = match serde_json::to_string(&command) {
                            Ok(payload) => payload,
                            Err(e) => {
                                error!(error = %e, "failed to serialize rig command");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(Message::Text(payload.into())).await {
                            warn!(error = %e, "rig command write failed");
                            break;
                        }
                    }
                }
            }
        });

        let reader_shutdown = shutdown.clone();
        let reader_slot = status_slot.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_shutdown.cancelled() => break,
                    message = stream.next() => {
                        match message {
                            Some(Ok(Message::Text(text))) => {
                                match RigStatus::parse(text.as_str()) {
                                    Some(status) => {
                                        let sender = reader_slot.lock().await.clone();
                                        if let Some(tx) = sender {
                                            let _ = tx.send(status).await;
                                        }
                                    }
                                    None => debug!(frame = %text, "unrecognized status frame"),
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("rig channel closed by peer");
                                break;
                            }
                            Some(Ok(_)) => {} // ping/pong/binary
                            Some(Err(e)) => {
                                warn!(error = %e, "rig channel read failed");
                                break;
                            }
                        }
                    }
                }
            }
            // Drop the subscriber sender so a pending receiver observes
            // end-of-stream instead of hanging.
            reader_slot.lock().await.take();
        });

        Ok(Self {
            command_tx,
            status_slot,
            shutdown,
        })
    }

    /// Queue a command for the rig. Fire-and-forget: no acknowledgement
    /// is awaited; feedback arrives on the status stream.
    pub async fn send(&self, command: RigCommand) -> Result<(), ChannelError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// Register the inbound status subscriber.
    ///
    /// At-most-one-handler semantics: a later call replaces the previous
    /// subscriber, whose receiver then reports end-of-stream.
    pub async fn subscribe(&self) -> mpsc::Receiver<RigStatus> {
        let (tx, rx) = mpsc::channel(STATUS_BUFFER_CAPACITY);
        *self.status_slot.lock().await = Some(tx);
        rx
    }

    /// Handle to the outbound command queue, for wiring a sequencer.
    pub fn command_sender(&self) -> mpsc::Sender<RigCommand> {
        self.command_tx.clone()
    }

    /// Close the connection. Safe to call multiple times.
    pub fn disconnect(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_channel() -> (CommandChannel, mpsc::Receiver<RigCommand>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let channel = CommandChannel {
            command_tx,
            status_slot: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        };
        (channel, command_rx)
    }

    #[tokio::test]
    async fn send_queues_commands() {
        let (channel, mut command_rx) = detached_channel();
        channel.send(RigCommand::Home).await.unwrap();
        assert_eq!(command_rx.recv().await, Some(RigCommand::Home));
    }

    #[tokio::test]
    async fn send_after_writer_is_gone_reports_closed() {
        let (channel, command_rx) = detached_channel();
        drop(command_rx);
        assert!(matches!(
            channel.send(RigCommand::Home).await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test]
    async fn resubscribe_replaces_the_previous_subscriber() {
        let (channel, _command_rx) = detached_channel();
        let mut first = channel.subscribe().await;
        let mut second = channel.subscribe().await;

        let sender = channel.status_slot.lock().await.clone().unwrap();
        sender.send(RigStatus::SequenceComplete).await.unwrap();
        drop(sender);

        // First subscriber's sender was dropped on replacement.
        assert_eq!(first.recv().await, None);
        assert_eq!(second.recv().await, Some(RigStatus::SequenceComplete));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let (channel, _command_rx) = detached_channel();
        channel.disconnect();
        channel.disconnect();
        assert!(channel.shutdown.is_cancelled());
    }
}
