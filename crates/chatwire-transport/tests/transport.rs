//! End-to-end transport tests against an in-process WebSocket server.
//!
//! Each test spins up a real `tokio-tungstenite` listener on an ephemeral
//! port and drives the server side of the socket directly, so budget
//! enforcement, fragment reassembly, renames, and error reporting are all
//! exercised over actual sockets.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chatwire_core::{
    ChatRequest, EventHandler, EventKind, MessagePayload, SessionEvent, SessionKey,
    TransportConfig, TransportError,
};
use chatwire_transport::{EvictionCandidate, EvictionPolicy, SocketManager};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_async, accept_hdr_async};

type ServerSocket = WebSocketStream<TcpStream>;

/// Accept-loop server handing each established socket to the test body.
async fn ws_server() -> (String, mpsc::UnboundedReceiver<ServerSocket>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (socket_tx, socket_rx) = mpsc::unbounded_channel();
    drop(tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let socket_tx = socket_tx.clone();
            drop(tokio::spawn(async move {
                if let Ok(socket) = accept_async(stream).await {
                    let _ = socket_tx.send(socket);
                }
            }));
        }
    }));
    (format!("ws://{addr}/api/chat/ws"), socket_rx)
}

/// Like [`ws_server`], additionally reporting each handshake request URI.
async fn ws_server_capturing_uris() -> (
    String,
    mpsc::UnboundedReceiver<ServerSocket>,
    mpsc::UnboundedReceiver<String>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (socket_tx, socket_rx) = mpsc::unbounded_channel();
    let (uri_tx, uri_rx) = mpsc::unbounded_channel();
    drop(tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let socket_tx = socket_tx.clone();
            let uri_tx = uri_tx.clone();
            drop(tokio::spawn(async move {
                let callback = move |req: &Request, resp: Response| {
                    let _ = uri_tx.send(req.uri().to_string());
                    Ok(resp)
                };
                if let Ok(socket) = accept_hdr_async(stream, callback).await {
                    let _ = socket_tx.send(socket);
                }
            }));
        }
    }));
    (format!("ws://{addr}/api/chat/ws"), socket_rx, uri_rx)
}

/// Listener that forwards every delivered event into a channel.
fn recorder() -> (EventHandler, mpsc::UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: EventHandler = Arc::new(move |event: &SessionEvent| {
        let _ = tx.send(event.clone());
    });
    (handler, rx)
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed")
}

fn fragment(id: serde_json::Value, content: &str, reasoning: &str, end: bool) -> Message {
    Message::text(
        json!({
            "conversationId": id,
            "content": content,
            "reasoning_content": reasoning,
            "end": end,
        })
        .to_string(),
    )
}

fn key(s: &str) -> SessionKey {
    SessionKey::from(s)
}

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_resolves_true_then_duplicate_false() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");

    let first = manager
        .create_connection(session.clone(), "u1", Some("tok"), None, &url)
        .await
        .unwrap();
    assert!(first);
    let _socket = recv(&mut sockets).await;

    let second = manager
        .create_connection(session.clone(), "u1", Some("tok"), None, &url)
        .await
        .unwrap();
    assert!(!second);

    // No second socket was ever dialed.
    assert!(sockets.try_recv().is_err());
}

#[tokio::test]
async fn create_rejects_empty_arguments() {
    let manager = SocketManager::spawn(TransportConfig::default());

    let err = manager
        .create_connection(key(""), "u1", None, None, "ws://127.0.0.1:1/ws")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidArgument(_)));

    let err = manager
        .create_connection(key("tmp-1"), "", None, None, "ws://127.0.0.1:1/ws")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidArgument(_)));
}

#[tokio::test]
async fn create_times_out_when_handshake_stalls() {
    // A TCP listener that accepts and then never answers the handshake.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(tokio::spawn(async move {
        let mut parked = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            parked.push(stream);
        }
    }));

    let manager = SocketManager::spawn(TransportConfig {
        connect_timeout: Duration::from_millis(200),
        ..TransportConfig::default()
    });
    let err = manager
        .create_connection(key("tmp-1"), "u1", None, None, &format!("ws://{addr}/ws"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ConnectTimeout(s) if s == key("tmp-1")));
}

#[tokio::test]
async fn failed_handshake_rejects_and_emits_error_event() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_error, mut errors) = recorder();
    manager.on(&session, EventKind::Error, on_error);

    let err = manager
        .create_connection(session.clone(), "u1", None, None, &format!("ws://{addr}/ws"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ConnectFailed { .. }));

    let SessionEvent::Error(message) = recv(&mut errors).await else {
        panic!("expected error event");
    };
    assert!(message.contains("failed to create connection"));
}

#[tokio::test]
async fn managers_are_independent_instances() {
    let (url, mut sockets) = ws_server().await;
    let first = SocketManager::spawn(TransportConfig::default());
    let second = SocketManager::spawn(TransportConfig::default());

    // Same key on both managers: no shared global state, both open.
    assert!(
        first
            .create_connection(key("tmp-1"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _a = recv(&mut sockets).await;
    assert!(
        second
            .create_connection(key("tmp-1"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _b = recv(&mut sockets).await;
}

// ─── Endpoint URL ────────────────────────────────────────────────────────────

#[tokio::test]
async fn temporary_key_connects_with_sentinel_id() {
    let (url, mut sockets, mut uris) = ws_server_capturing_uris().await;
    let manager = SocketManager::spawn(TransportConfig::default());

    assert!(
        manager
            .create_connection(key("tmp-5"), "u1", Some("tok"), Some("p1"), &url)
            .await
            .unwrap()
    );
    let _socket = recv(&mut sockets).await;
    let uri = recv(&mut uris).await;
    assert!(uri.contains("Authorization=Bearer%20tok"), "uri: {uri}");
    assert!(uri.contains("id=-1"), "uri: {uri}");
    assert!(uri.contains("presetId=p1"), "uri: {uri}");
}

#[tokio::test]
async fn durable_key_connects_with_its_own_id() {
    let (url, mut sockets, mut uris) = ws_server_capturing_uris().await;
    let manager = SocketManager::spawn(TransportConfig::default());

    assert!(
        manager
            .create_connection(key("99"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _socket = recv(&mut sockets).await;
    let uri = recv(&mut uris).await;
    assert!(uri.contains("id=99"), "uri: {uri}");
    assert!(uri.contains("Authorization=&"), "uri: {uri}");
}

// ─── Fragment reassembly ─────────────────────────────────────────────────────

#[tokio::test]
async fn fragments_reassemble_in_order_and_reset() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_message, mut messages) = recorder();
    manager.on(&session, EventKind::Message, on_message);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;

    socket.send(fragment(json!(7), "a", "x", false)).await.unwrap();
    socket.send(fragment(json!(7), "b", "", false)).await.unwrap();
    socket.send(fragment(json!(7), "c", "y", true)).await.unwrap();

    let SessionEvent::Message(MessagePayload::Stream(update)) = recv(&mut messages).await else {
        panic!("expected first stream update");
    };
    assert_eq!(update.conversation_id, key("7")); // numeric id normalized
    assert_eq!(update.content, "a");
    assert_eq!(update.partial_content, "a");
    assert_eq!(update.partial_reasoning, "x");

    let SessionEvent::Message(MessagePayload::Stream(update)) = recv(&mut messages).await else {
        panic!("expected second stream update");
    };
    assert_eq!(update.content, "b");
    assert_eq!(update.partial_content, "ab");

    let SessionEvent::Message(MessagePayload::Complete(complete)) = recv(&mut messages).await
    else {
        panic!("expected complete message");
    };
    assert_eq!(complete.conversation_id, key("7"));
    assert_eq!(complete.content, "abc");
    assert_eq!(complete.thought_process, "xy");

    // Buffers reset on end: the next response starts from scratch.
    socket.send(fragment(json!(7), "z", "", true)).await.unwrap();
    let SessionEvent::Message(MessagePayload::Complete(complete)) = recv(&mut messages).await
    else {
        panic!("expected second complete message");
    };
    assert_eq!(complete.content, "z");
    assert_eq!(complete.thought_process, "");
}

#[tokio::test]
async fn frame_order_is_preserved_per_session() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_message, mut messages) = recorder();
    manager.on(&session, EventKind::Message, on_message);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;

    let mut expected = String::new();
    for i in 0..10 {
        socket
            .send(fragment(json!(1), &i.to_string(), "", false))
            .await
            .unwrap();
        expected.push_str(&i.to_string());
    }

    let mut seen = String::new();
    for _ in 0..10 {
        let SessionEvent::Message(MessagePayload::Stream(update)) = recv(&mut messages).await
        else {
            panic!("expected stream update");
        };
        seen.push_str(&update.content);
        assert_eq!(update.partial_content, seen);
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn frames_without_conversation_id_pass_through() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_message, mut messages) = recorder();
    manager.on(&session, EventKind::Message, on_message);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;
    let payload = json!({"type": "notice", "n": 1});
    socket.send(Message::text(payload.to_string())).await.unwrap();

    let SessionEvent::Message(MessagePayload::Raw(raw)) = recv(&mut messages).await else {
        panic!("expected raw passthrough");
    };
    assert_eq!(raw, payload);
}

#[tokio::test]
async fn malformed_frame_reports_error_and_keeps_connection() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_message, mut messages) = recorder();
    let (on_error, mut errors) = recorder();
    manager.on(&session, EventKind::Message, on_message);
    manager.on(&session, EventKind::Error, on_error);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;

    socket.send(Message::text("definitely not json")).await.unwrap();
    let SessionEvent::Error(message) = recv(&mut errors).await else {
        panic!("expected error event");
    };
    // Generic message only — no parser internals.
    assert_eq!(message, "error parsing message");

    // The socket survives the bad frame.
    socket.send(fragment(json!(1), "ok", "", true)).await.unwrap();
    let SessionEvent::Message(MessagePayload::Complete(complete)) = recv(&mut messages).await
    else {
        panic!("expected complete message");
    };
    assert_eq!(complete.content, "ok");
}

// ─── Send ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_message_reaches_the_socket() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;

    manager.send_message(&session, ChatRequest::new("hi").into_value());
    let frame = tokio::time::timeout(Duration::from_secs(3), socket.next())
        .await
        .expect("timed out")
        .expect("socket closed")
        .unwrap();
    let Message::Text(text) = frame else {
        panic!("expected text frame");
    };
    let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(value["type"], "chat");
    assert_eq!(value["content"], "hi");
}

#[tokio::test]
async fn send_after_close_reports_error_naming_the_session() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());

    // A second live session so the error can list tracked keys.
    assert!(
        manager
            .create_connection(key("55"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _other = recv(&mut sockets).await;

    let session = key("tmp-9");
    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _socket = recv(&mut sockets).await;

    manager.close_connection(&session);
    // Explicit close dropped the registry; a fresh listener under the same
    // key is created lazily and observes the send failure.
    let (on_error, mut errors) = recorder();
    manager.on(&session, EventKind::Error, on_error);
    manager.send_message(&session, json!({"type": "chat", "content": "late"}));

    let SessionEvent::Error(message) = recv(&mut errors).await else {
        panic!("expected error event");
    };
    assert!(message.contains("tmp-9"), "message: {message}");
    assert!(message.contains("55"), "message: {message}");
}

// ─── Close ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn remote_close_dispatches_close_event() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_close, mut closes) = recorder();
    manager.on(&session, EventKind::Close, on_close);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let socket = recv(&mut sockets).await;
    drop(socket); // peer goes away

    assert_eq!(recv(&mut closes).await, SessionEvent::Close);
}

#[tokio::test]
async fn explicit_close_drops_listeners_silently() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (on_close, mut closes) = recorder();
    manager.on(&session, EventKind::Close, on_close);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _socket = recv(&mut sockets).await;

    // Registry is deleted before the worker's close event arrives, so the
    // pre-registered close listener never fires.
    manager.close_connection(&session);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(closes.try_recv().is_err());
}

// ─── Budget / eviction ───────────────────────────────────────────────────────

#[tokio::test]
async fn ceiling_evicts_oldest_connection_of_that_user() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig {
        max_connections_per_user: 2,
        ..TransportConfig::default()
    });
    let (on_close, mut closes) = recorder();
    manager.on(&key("s1"), EventKind::Close, on_close);

    for session in ["s1", "s2"] {
        assert!(
            manager
                .create_connection(key(session), "u1", None, None, &url)
                .await
                .unwrap()
        );
        let _ = recv(&mut sockets).await;
    }

    // Third connection for the same user: s1 (oldest) is evicted.
    assert!(
        manager
            .create_connection(key("s3"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _ = recv(&mut sockets).await;
    assert_eq!(recv(&mut closes).await, SessionEvent::Close);

    // s1 is gone: creating it again opens a fresh socket instead of the
    // duplicate no-op.
    assert!(
        manager
            .create_connection(key("s1"), "u1", None, None, &url)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn ceiling_is_per_user() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig {
        max_connections_per_user: 1,
        ..TransportConfig::default()
    });
    let (on_close, mut closes) = recorder();
    manager.on(&key("u1-chat"), EventKind::Close, on_close);

    assert!(
        manager
            .create_connection(key("u1-chat"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _socket_u1 = recv(&mut sockets).await;

    // Another user's connection does not count against u1's budget.
    assert!(
        manager
            .create_connection(key("u2-chat"), "u2", None, None, &url)
            .await
            .unwrap()
    );
    let _socket_u2 = recv(&mut sockets).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(closes.try_recv().is_err());

    // u1's duplicate-key check still sees the live connection.
    assert!(
        !manager
            .create_connection(key("u1-chat"), "u1", None, None, &url)
            .await
            .unwrap()
    );
}

/// Opposite of the default policy, to prove the strategy is swappable.
struct NewestFirst;

impl EvictionPolicy for NewestFirst {
    fn select_victim(&self, candidates: &[EvictionCandidate]) -> Option<SessionKey> {
        candidates
            .iter()
            .max_by_key(|c| c.created_at)
            .map(|c| c.session.clone())
    }
}

#[tokio::test]
async fn eviction_policy_is_injectable() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn_with_policy(
        TransportConfig {
            max_connections_per_user: 2,
            ..TransportConfig::default()
        },
        Box::new(NewestFirst),
    );
    let (on_close, mut closes) = recorder();
    manager.on(&key("s2"), EventKind::Close, on_close);

    let mut held = Vec::new();
    for session in ["s1", "s2"] {
        assert!(
            manager
                .create_connection(key(session), "u1", None, None, &url)
                .await
                .unwrap()
        );
        held.push(recv(&mut sockets).await);
    }
    assert!(
        manager
            .create_connection(key("s3"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    held.push(recv(&mut sockets).await);

    // NewestFirst evicted s2, not s1.
    assert_eq!(recv(&mut closes).await, SessionEvent::Close);
    assert!(
        !manager
            .create_connection(key("s1"), "u1", None, None, &url)
            .await
            .unwrap()
    );
}

// ─── Rename ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rename_preserves_listeners_and_reroutes_sends() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let temporary = key("tmp-1");
    let durable = key("42");
    let (on_message, mut messages) = recorder();
    manager.on(&temporary, EventKind::Message, on_message);

    assert!(
        manager
            .create_connection(temporary.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;

    manager.update_connection_id(&temporary, &durable);

    // Sending under the new key round-trips through the worker, proving the
    // rename was processed before the server responds.
    manager.send_message(&durable, json!({"type": "chat", "content": "hello"}));
    let inbound = tokio::time::timeout(Duration::from_secs(3), socket.next())
        .await
        .expect("timed out")
        .expect("socket closed")
        .unwrap();
    assert!(matches!(inbound, Message::Text(_)));

    socket.send(fragment(json!(42), "hi", "", true)).await.unwrap();
    let SessionEvent::Message(MessagePayload::Complete(complete)) = recv(&mut messages).await
    else {
        panic!("expected complete message");
    };
    assert_eq!(complete.conversation_id, durable);
    assert_eq!(complete.content, "hi");

    // Exactly once: the handler moved, it was not copied.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(messages.try_recv().is_err());
}

#[tokio::test]
async fn rename_of_missing_session_changes_nothing() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let durable = key("42");
    let (on_error, mut errors) = recorder();
    manager.on(&durable, EventKind::Error, on_error);

    // Keep one live connection around to show it is unaffected.
    assert!(
        manager
            .create_connection(key("7"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let _socket = recv(&mut sockets).await;

    manager.update_connection_id(&key("ghost"), &durable);

    // Nothing was renamed: sends under the target key fail as unavailable.
    manager.send_message(&durable, json!({"type": "stop"}));
    let SessionEvent::Error(message) = recv(&mut errors).await else {
        panic!("expected error event");
    };
    assert!(message.contains("42"), "message: {message}");
    assert!(message.contains("7"), "message: {message}");

    // The untouched session is still live.
    assert!(
        !manager
            .create_connection(key("7"), "u1", None, None, &url)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn rename_refuses_to_stomp_a_live_target() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());

    let mut held = Vec::new();
    for session in ["s1", "s2"] {
        assert!(
            manager
                .create_connection(key(session), "u1", None, None, &url)
                .await
                .unwrap()
        );
        held.push(recv(&mut sockets).await);
    }

    manager.update_connection_id(&key("s1"), &key("s2"));

    // Both connections survive the refused rename.
    assert!(
        !manager
            .create_connection(key("s1"), "u1", None, None, &url)
            .await
            .unwrap()
    );
    assert!(
        !manager
            .create_connection(key("s2"), "u1", None, None, &url)
            .await
            .unwrap()
    );
}

// ─── Listener registry behavior over the wire ────────────────────────────────

#[tokio::test]
async fn off_stops_delivery() {
    let (url, mut sockets) = ws_server().await;
    let manager = SocketManager::spawn(TransportConfig::default());
    let session = key("tmp-1");
    let (removed, mut removed_rx) = recorder();
    let (kept, mut kept_rx) = recorder();
    manager.on(&session, EventKind::Message, Arc::clone(&removed));
    manager.on(&session, EventKind::Message, kept);
    manager.off(&session, EventKind::Message, &removed);

    assert!(
        manager
            .create_connection(session.clone(), "u1", None, None, &url)
            .await
            .unwrap()
    );
    let mut socket = recv(&mut sockets).await;
    socket.send(fragment(json!(1), "x", "", true)).await.unwrap();

    // Dispatch is in-order: once the kept listener saw the event, the
    // removed listener's silence is conclusive.
    let _ = recv(&mut kept_rx).await;
    assert!(removed_rx.try_recv().is_err());
}
