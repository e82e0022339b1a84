//! Integration tests for the WebSocket transport.
//!
//! These tests run a real WebSocket server on loopback and verify the
//! transport authenticates, decodes pushes, encodes intents and reports
//! closure with the right generation.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use studybuddy_app::TransportEvent;
use studybuddy_client::transport;
use studybuddy_proto::{
    GroupId, InboundEvent, MessageId, OutboundEvent, UserId, WireMessage, WireUser,
};
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_tungstenite::{
    WebSocketStream, accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

const WAIT: Duration = Duration::from_secs(5);

/// Bind a loopback listener and return it with its `ws://` URL.
async fn start_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

/// Accept one socket, reporting the Authorization header it presented.
async fn accept(
    listener: &TcpListener,
) -> (WebSocketStream<tokio::net::TcpStream>, Option<String>) {
    let (stream, _) = listener.accept().await.unwrap();
    let (auth_tx, auth_rx) = oneshot::channel();

    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let auth = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let _ = auth_tx.send(auth);
        Ok(response)
    };

    let socket = accept_hdr_async(stream, callback).await.unwrap();
    (socket, auth_rx.await.unwrap())
}

fn push(id: &str) -> String {
    InboundEvent::NewMessage(WireMessage {
        id: MessageId::from(id),
        group_id: GroupId::from("g1"),
        content: "hi".to_string(),
        sender: WireUser {
            id: UserId::from("u2"),
            first_name: "Bob".to_string(),
            last_name: "Stone".to_string(),
            avatar: None,
        },
        timestamp: "2024-05-01T10:15:00Z".to_string(),
    })
    .encode()
    .unwrap()
}

async fn next_event(rx: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn socket_authenticates_and_exchanges_events() {
    let (listener, url) = start_server().await;
    let (seen_tx, seen_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, auth) = accept(&listener).await;
        socket.send(Message::Text(push("m1").into())).await.unwrap();

        let frame = socket.next().await.unwrap().unwrap();
        let _ = seen_tx.send((auth, frame.into_text().unwrap().as_str().to_owned()));
        socket.close(None).await.unwrap();
    });

    let (tx, mut rx) = mpsc::channel(8);
    let handle = transport::open(&url, "tok", 3, tx).unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Opened { generation: 3 });
    assert!(matches!(
        next_event(&mut rx).await,
        TransportEvent::Received { generation: 3, event: InboundEvent::NewMessage(ref m) }
            if m.id == MessageId::from("m1")
    ));

    handle.send(OutboundEvent::JoinGroup { group_id: GroupId::from("g1") }).unwrap();

    let (auth, text) = timeout(WAIT, seen_rx).await.unwrap().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer tok"));
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["event"], "join_group");
    assert_eq!(json["data"], "g1");

    assert!(matches!(next_event(&mut rx).await, TransportEvent::Closed { generation: 3, .. }));
}

#[tokio::test]
async fn malformed_and_unknown_frames_are_skipped() {
    let (listener, url) = start_server().await;

    tokio::spawn(async move {
        let (mut socket, _) = accept(&listener).await;
        for text in ["garbage".to_string(), r#"{"event":"typing","data":{}}"#.to_string(), push("m2")]
        {
            socket.send(Message::Text(text.into())).await.unwrap();
        }
        // Hold the socket open until the client goes away.
        while let Some(Ok(_)) = socket.next().await {}
    });

    let (tx, mut rx) = mpsc::channel(8);
    let _handle = transport::open(&url, "tok", 1, tx).unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Opened { generation: 1 });
    assert!(matches!(
        next_event(&mut rx).await,
        TransportEvent::Received { generation: 1, event: InboundEvent::NewMessage(ref m) }
            if m.id == MessageId::from("m2")
    ));
}

#[tokio::test]
async fn dropping_handle_closes_quietly() {
    let (listener, url) = start_server().await;
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = accept(&listener).await;
        let mut saw_close = false;
        while let Some(Ok(frame)) = socket.next().await {
            if frame.is_close() {
                saw_close = true;
                break;
            }
        }
        let _ = closed_tx.send(saw_close);
    });

    let (tx, mut rx) = mpsc::channel(8);
    let handle = transport::open(&url, "tok", 2, tx).unwrap();
    assert_eq!(next_event(&mut rx).await, TransportEvent::Opened { generation: 2 });

    drop(handle);

    assert!(timeout(WAIT, closed_rx).await.unwrap().unwrap());
    // A deliberate close is not reported as a failure.
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.map_or(true, |e| e.is_none()));
}
