//! Single persistent WebSocket relay to the backend's stats stream.
//!
//! Every `connect` hands back a fresh [`RelayEvents`] stream. The stream ends right after the
//! connection's terminal state (`Disconnected` or `Failed`) has been delivered, so a consumer
//! that drains streams one after another observes transitions in production order.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Serialize;
use shared::{domain::RelayState, error::BridgeError, protocol::StatsSnapshot};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle, time::timeout};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    StateChanged(RelayState),
    StatsReceived(StatsSnapshot),
}

pub type RelayEvents = UnboundedReceiverStream<RelayEvent>;

struct RelayShared {
    generation: u64,
    state: RelayState,
    events: Option<mpsc::UnboundedSender<RelayEvent>>,
}

/// State shared between the channel and its reader task.
///
/// Writes are tagged with the connection generation; writes from a torn-down connection
/// are ignored.
#[derive(Clone)]
struct StateCell(Arc<Mutex<RelayShared>>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(RelayShared {
            generation: 0,
            state: RelayState::Disconnected,
            events: None,
        })))
    }

    fn lock(&self) -> MutexGuard<'_, RelayShared> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> RelayState {
        self.lock().state.clone()
    }

    fn begin(&self) -> (u64, RelayEvents) {
        let mut shared = self.lock();
        shared.generation += 1;
        shared.state = RelayState::Disconnected;
        let (tx, rx) = mpsc::unbounded_channel();
        shared.events = Some(tx);
        (shared.generation, UnboundedReceiverStream::new(rx))
    }

    fn transition(&self, generation: u64, next: RelayState) -> bool {
        let mut shared = self.lock();
        if shared.generation != generation || shared.state == next {
            return false;
        }
        // Only one terminal state is ever reported per connection.
        if shared.state.is_terminal() && next.is_terminal() {
            return false;
        }

        info!(generation, from = shared.state.label(), to = next.label(), "relay: state changed");
        shared.state = next.clone();
        let terminal = next.is_terminal();
        if let Some(tx) = &shared.events {
            let _ = tx.send(RelayEvent::StateChanged(next));
        }
        if terminal {
            shared.events = None;
        }
        true
    }

    fn forward_stats(&self, generation: u64, snapshot: StatsSnapshot) {
        let shared = self.lock();
        if shared.generation != generation || !shared.state.is_connected() {
            return;
        }
        if let Some(tx) = &shared.events {
            let _ = tx.send(RelayEvent::StatsReceived(snapshot));
        }
    }
}

/// Read-only view of the relay state, usable without holding the channel.
#[derive(Clone)]
pub struct RelayObserver(StateCell);

impl RelayObserver {
    pub fn state(&self) -> RelayState {
        self.0.state()
    }
}

struct ActiveRelay {
    generation: u64,
    writer: WsWriter,
    reader: JoinHandle<()>,
}

pub struct RelayChannel {
    cell: StateCell,
    connect_timeout: Duration,
    active: Option<ActiveRelay>,
}

impl RelayChannel {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            cell: StateCell::new(),
            connect_timeout,
            active: None,
        }
    }

    pub fn state(&self) -> RelayState {
        self.cell.state()
    }

    pub fn observer(&self) -> RelayObserver {
        RelayObserver(self.cell.clone())
    }

    /// Opens a connection and settles it before returning.
    ///
    /// An address that cannot be dialed at all is an `InvalidAddress` error. A failed
    /// handshake is not an error: it is reported as `Failed` on the returned stream.
    pub async fn connect(&mut self, address: &str) -> Result<RelayEvents, BridgeError> {
        let url = parse_relay_address(address)?;
        self.teardown().await;

        let (generation, events) = self.cell.begin();
        self.cell.transition(generation, RelayState::Connecting);

        let stream = match timeout(self.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(err)) => {
                warn!(%url, error = %err, "relay: handshake failed");
                self.cell
                    .transition(generation, RelayState::Failed(err.to_string()));
                return Ok(events);
            }
            Err(_) => {
                warn!(
                    %url,
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "relay: handshake timed out"
                );
                self.cell.transition(
                    generation,
                    RelayState::Failed(format!(
                        "connect timed out after {}ms",
                        self.connect_timeout.as_millis()
                    )),
                );
                return Ok(events);
            }
        };

        let (writer, reader) = stream.split();
        self.cell.transition(generation, RelayState::Connected);
        let reader = tokio::spawn(read_frames(reader, self.cell.clone(), generation));
        self.active = Some(ActiveRelay {
            generation,
            writer,
            reader,
        });
        Ok(events)
    }

    /// Sends one JSON text frame. The backend defines no inbound commands yet.
    pub async fn send<T: Serialize>(&mut self, payload: &T) -> Result<(), BridgeError> {
        if !self.cell.state().is_connected() {
            return Err(BridgeError::NotConnected);
        }
        let Some(active) = self.active.as_mut() else {
            return Err(BridgeError::NotConnected);
        };
        let text = serde_json::to_string(payload)
            .map_err(|err| BridgeError::MalformedResponse(err.to_string()))?;

        if let Err(err) = active.writer.send(Message::Text(text)).await {
            warn!(error = %err, "relay: send failed");
            let generation = active.generation;
            self.cell
                .transition(generation, RelayState::Failed(err.to_string()));
            return Err(BridgeError::Unreachable(err.to_string()));
        }
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), BridgeError> {
        let open = self.active.is_some() && self.cell.state().is_connected();
        self.teardown().await;
        if open {
            Ok(())
        } else {
            Err(BridgeError::NotConnected)
        }
    }

    async fn teardown(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active.reader.abort();
        self.cell
            .transition(active.generation, RelayState::Disconnected);
        match timeout(CLOSE_HANDSHAKE_TIMEOUT, active.writer.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(error = %err, "relay: close frame not delivered"),
            Err(_) => debug!("relay: close handshake timed out"),
        }
    }
}

impl Drop for RelayChannel {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.reader.abort();
        }
    }
}

async fn read_frames(mut reader: WsReader, cell: StateCell, generation: u64) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Text(text)) => decode_and_forward(&cell, generation, text.as_bytes()),
            Ok(Message::Binary(bytes)) => decode_and_forward(&cell, generation, &bytes),
            Ok(Message::Close(close)) => {
                info!(?close, "relay: closed by backend");
                cell.transition(generation, RelayState::Disconnected);
                return;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "relay: transport error");
                cell.transition(generation, RelayState::Failed(err.to_string()));
                return;
            }
        }
    }
    cell.transition(generation, RelayState::Disconnected);
}

fn decode_and_forward(cell: &StateCell, generation: u64, bytes: &[u8]) {
    match serde_json::from_slice::<StatsSnapshot>(bytes) {
        Ok(snapshot) => cell.forward_stats(generation, snapshot),
        Err(err) => warn!(error = %err, len = bytes.len(), "relay: dropping malformed frame"),
    }
}

pub fn parse_relay_address(address: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(address.trim())
        .map_err(|err| BridgeError::InvalidAddress(format!("{address}: {err}")))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(BridgeError::InvalidAddress(format!(
            "{address}: scheme must be ws:// or wss://"
        )));
    }
    if url.host_str().is_none() {
        return Err(BridgeError::InvalidAddress(format!("{address}: missing host")));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/relay_tests.rs"]
mod tests;
