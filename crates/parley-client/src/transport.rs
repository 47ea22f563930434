//! WebSocket transport.
//!
//! Executes [`crate::ConnectionAction`] transport commands against real
//! sockets and reports back [`TransportEvent`]s in the order they happened.
//! Each dialed connection runs on its own task; all tasks feed a single event
//! channel so the caller observes one ordered stream.

use std::collections::HashMap;

use futures::{SinkExt, StreamExt};
use parley_core::ConnectionId;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::tungstenite::{self, Message, protocol::CloseFrame};

use crate::event::{CLOSE_POLICY_VIOLATION, CloseReason, TransportEvent, TransportEventKind};

/// Capacity of the shared event channel.
const EVENT_CAPACITY: usize = 256;

/// Errors from transport commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No connection with this id was dialed, or it was hung up
    #[error("unknown connection {0}")]
    Unknown(ConnectionId),

    /// Connection task has already finished
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

enum Outbound {
    Text(String),
    Close,
}

struct Link {
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

/// WebSocket transport for relay connections.
pub struct Transport {
    events_tx: mpsc::Sender<TransportEvent>,
    events_rx: mpsc::Receiver<TransportEvent>,
    links: HashMap<ConnectionId, Link>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    /// Create a transport with no connections.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        Self { events_tx, events_rx, links: HashMap::new() }
    }

    /// Start connecting `id` to `url`.
    ///
    /// Returns immediately. The outcome arrives as `Opened`, `Closed` or
    /// `Failed` through [`Self::next_event`].
    pub fn dial(&mut self, id: ConnectionId, url: &str) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(id, url.to_string(), outbound_rx, self.events_tx.clone()));

        if let Some(previous) = self.links.insert(id, Link { outbound, task }) {
            previous.task.abort();
        }
    }

    /// Queue one text frame on `id`.
    ///
    /// # Errors
    ///
    /// - `TransportError::Unknown` if `id` was never dialed or was hung up
    /// - `TransportError::Closed` if the connection task has ended
    pub fn transmit(&mut self, id: ConnectionId, text: String) -> Result<(), TransportError> {
        let link = self.links.get(&id).ok_or(TransportError::Unknown(id))?;
        link.outbound.send(Outbound::Text(text)).map_err(|_| TransportError::Closed(id))
    }

    /// Close `id`. Idempotent.
    ///
    /// The connection task sends a close frame and exits. No further events
    /// are reported for `id` once the caller has hung up, and any that race
    /// through are filtered by the connection manager.
    pub fn hang_up(&mut self, id: ConnectionId) {
        if let Some(link) = self.links.remove(&id) {
            if link.outbound.send(Outbound::Close).is_err() {
                link.task.abort();
            }
        }
    }

    /// Wait for the next transport event.
    ///
    /// A `Closed` or `Failed` event is the last one its task sends, so the
    /// link is released as it passes through. Returns `None` only if every
    /// sender is gone, which cannot happen while the transport itself is
    /// alive.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        let event = self.events_rx.recv().await?;
        if matches!(event.kind, TransportEventKind::Closed(_) | TransportEventKind::Failed(_))
            && self.links.remove(&event.id).is_some()
        {
            tracing::debug!(id = %event.id, "link finished");
        }
        Some(event)
    }

    /// Number of connections neither hung up nor finished.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Abort every connection task.
    pub fn stop(&mut self) {
        for (_, link) in self.links.drain() {
            link.task.abort();
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_link(
    id: ConnectionId,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::Sender<TransportEvent>,
) {
    let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(tungstenite::Error::Http(response)) => {
            let status = response.status();
            // The relay refuses bad tokens during the handshake
            let event = if status.as_u16() == 401 || status.as_u16() == 403 {
                TransportEvent::closed(
                    id,
                    Some(CloseReason::new(CLOSE_POLICY_VIOLATION, format!("HTTP {status}"))),
                )
            } else {
                TransportEvent::failed(id, format!("handshake rejected: HTTP {status}"))
            };
            let _ = events.send(event).await;
            return;
        },
        Err(e) => {
            let _ = events.send(TransportEvent::failed(id, e.to_string())).await;
            return;
        },
    };

    tracing::debug!(%id, "websocket open");
    if events.send(TransportEvent::opened(id)).await.is_err() {
        return;
    }

    let (mut writer, mut reader) = stream.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = writer.send(Message::text(text)).await {
                        let _ = events.send(TransportEvent::failed(id, e.to_string())).await;
                        return;
                    }
                },
                Some(Outbound::Close) | None => {
                    let _ = writer.send(Message::Close(None)).await;
                    let _ = writer.close().await;
                    return;
                },
            },
            inbound = reader.next() => {
                let event = match inbound {
                    Some(Ok(Message::Text(text))) => TransportEvent::frame(id, text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => {
                        TransportEvent::frame(id, String::from_utf8_lossy(&bytes).into_owned())
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map(close_reason);
                        let _ = events.send(TransportEvent::closed(id, reason)).await;
                        return;
                    },
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = events.send(TransportEvent::failed(id, e.to_string())).await;
                        return;
                    },
                    None => {
                        let _ = events.send(TransportEvent::closed(id, None)).await;
                        return;
                    },
                };

                if events.send(event).await.is_err() {
                    return;
                }
            },
        }
    }
}

fn close_reason(frame: CloseFrame) -> CloseReason {
    CloseReason::new(u16::from(frame.code), frame.reason.as_str())
}
