//! WebSocket transport.
//!
//! Provides [`SocketHandle`], a thin layer that moves JSON text frames
//! between a socket and channels. Connection policy stays in the Sans-IO
//! `ConnectionManager`; this module only reports what happened, tagged with
//! the generation the manager assigned when it asked for the socket.

use futures_util::{SinkExt, StreamExt};
use studybuddy_app::TransportEvent;
use studybuddy_proto::{InboundEvent, OutboundEvent};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

use crate::error::TransportError;

/// Outbound queue depth per socket.
const OUTBOUND_CAPACITY: usize = 32;

/// Handle to one socket generation.
///
/// Events are sent through the handle; everything observed on the socket
/// arrives on the channel passed to [`open`]. Dropping the handle sends a
/// close frame and ends the task without reporting a `Closed` event.
#[derive(Debug)]
pub struct SocketHandle {
    generation: u64,
    outbound: mpsc::Sender<OutboundEvent>,
}

impl SocketHandle {
    /// Generation this socket belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue an event for the socket without waiting.
    ///
    /// Intents are fire-and-forget: a full queue drops the event instead of
    /// stalling the runtime loop, which is also what drains inbound events.
    pub fn send(&self, event: OutboundEvent) -> Result<(), TransportError> {
        self.outbound.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Connection("outbound queue full".to_string()),
            TrySendError::Closed(_) => TransportError::Connection("socket task ended".to_string()),
        })
    }
}

/// Upgrade request for `socket_url` carrying `token` as a bearer credential.
pub fn socket_request(socket_url: &str, token: &str) -> Result<Request, TransportError> {
    let mut request = socket_url
        .into_client_request()
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);
    Ok(request)
}

/// Open a socket for `generation`.
///
/// Returns once the task is spawned. The handshake outcome arrives on
/// `events` as `Opened` or `Closed`.
pub fn open(
    socket_url: &str,
    token: &str,
    generation: u64,
    events: mpsc::Sender<TransportEvent>,
) -> Result<SocketHandle, TransportError> {
    let request = socket_request(socket_url, token)?;
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    tokio::spawn(run_socket(request, generation, outbound_rx, events));

    Ok(SocketHandle { generation, outbound: outbound_tx })
}

/// Run one socket, bridging between channels and the WebSocket.
async fn run_socket(
    request: Request,
    generation: u64,
    mut outbound: mpsc::Receiver<OutboundEvent>,
    events: mpsc::Sender<TransportEvent>,
) {
    let socket = match connect_async(request).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            tracing::debug!(generation, error = %e, "socket handshake failed");
            let _ = events.send(TransportEvent::Closed { generation, reason: e.to_string() }).await;
            return;
        },
    };

    if events.send(TransportEvent::Opened { generation }).await.is_err() {
        return;
    }

    let (mut sink, mut stream) = socket.split();

    let reason = loop {
        tokio::select! {
            maybe_event = outbound.recv() => {
                let Some(event) = maybe_event else {
                    // Handle dropped: deliberate close, nothing to report.
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                };
                match event.encode() {
                    Ok(text) => {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            break e.to_string();
                        }
                    },
                    Err(e) => tracing::warn!(generation, event = event.name(), error = %e, "dropping unencodable event"),
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match InboundEvent::decode(text.as_str()) {
                    Ok(event) => {
                        if events.send(TransportEvent::Received { generation, event }).await.is_err() {
                            return;
                        }
                    },
                    Err(e) if e.is_ignorable() => tracing::debug!(generation, error = %e, "skipping frame"),
                    Err(e) => tracing::warn!(generation, error = %e, "skipping malformed frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break frame.map_or_else(
                        || "closed by server".to_string(),
                        |f| format!("closed by server ({})", u16::from(f.code)),
                    );
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_string(),
            }
        }
    };

    tracing::debug!(generation, %reason, "socket closed");
    let _ = events.send(TransportEvent::Closed { generation, reason }).await;
}
