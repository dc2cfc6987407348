//! Transport worker: exclusive owner of all socket state.
//!
//! One task runs the [`Worker`] loop. Requests arrive from the coordinator
//! on an unbounded channel; per-connection connect/reader tasks feed socket
//! lifecycle signals back on an internal channel; both are handled by one
//! `select!` loop. Because budget check, eviction, and map mutation all
//! happen inside that single loop, no two creates for the same user can
//! interleave, and frame order per session survives end-to-end: one reader
//! task per socket → one worker loop → one dispatch loop.
//!
//! Sockets are never written from the loop itself — each open connection
//! has a writer task pumping an outbound queue into the sink, so a slow
//! socket cannot stall every other session.

use std::collections::HashMap;
use std::time::Instant;

use chatwire_core::{
    CompleteMessage, InboundFrame, MessagePayload, PartialMessage, SessionKey, StreamUpdate,
    TransportConfig, TransportError,
};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::eviction::{EvictionCandidate, EvictionPolicy};
use crate::protocol::{WorkerEvent, WorkerRequest};
use crate::url::build_connect_url;

type WsSink = futures::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Lifecycle signals from per-connection tasks, tagged with a stable
/// connection id so frames keep routing correctly across session renames.
enum SocketSignal {
    Opened {
        conn_id: u64,
        outbound: mpsc::UnboundedSender<Message>,
    },
    OpenFailed {
        conn_id: u64,
        timed_out: bool,
        reason: String,
    },
    Frame {
        conn_id: u64,
        text: String,
    },
    ReadFailed {
        conn_id: u64,
        reason: String,
    },
    Closed {
        conn_id: u64,
    },
}

enum ConnState {
    /// Handshake in flight; holds the pending create acknowledgment.
    Connecting {
        reply: Option<oneshot::Sender<Result<bool, TransportError>>>,
    },
    /// Socket open; frames go through the writer task's queue.
    Open {
        outbound: mpsc::UnboundedSender<Message>,
    },
}

/// One tracked connection: socket handle (via its writer queue), owning
/// user, creation time for eviction ordering, and the fragment accumulator.
struct Connection {
    conn_id: u64,
    user_id: String,
    created_at: Instant,
    state: ConnState,
    partial: PartialMessage,
}

/// The worker loop state. Constructed by the coordinator, consumed by
/// [`Worker::run`] inside its own task.
pub(crate) struct Worker {
    requests: mpsc::UnboundedReceiver<WorkerRequest>,
    events: mpsc::Sender<WorkerEvent>,
    signals_tx: mpsc::Sender<SocketSignal>,
    signals_rx: mpsc::Receiver<SocketSignal>,
    connections: HashMap<SessionKey, Connection>,
    /// Reverse index: connection id → current session key.
    index: HashMap<u64, SessionKey>,
    next_conn_id: u64,
    config: TransportConfig,
    policy: Box<dyn EvictionPolicy>,
}

impl Worker {
    pub(crate) fn new(
        requests: mpsc::UnboundedReceiver<WorkerRequest>,
        events: mpsc::Sender<WorkerEvent>,
        config: TransportConfig,
        policy: Box<dyn EvictionPolicy>,
    ) -> Self {
        let (signals_tx, signals_rx) = mpsc::channel(config.event_buffer);
        Self {
            requests,
            events,
            signals_tx,
            signals_rx,
            connections: HashMap::new(),
            index: HashMap::new(),
            next_conn_id: 0,
            config,
            policy,
        }
    }

    /// Run until the coordinator side drops its request sender.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
                // `signals_tx` lives on `self`, so recv() never yields None here.
                Some(signal) = self.signals_rx.recv() => self.handle_signal(signal).await,
            }
        }
        debug!(
            open_connections = self.connections.len(),
            "transport worker shutting down"
        );
        // Dropping the connections drops every writer queue; writer tasks
        // close their sinks on queue end.
    }

    async fn handle_request(&mut self, request: WorkerRequest) {
        match request {
            WorkerRequest::Create {
                session,
                user_id,
                token,
                preset_id,
                endpoint,
                reply,
            } => {
                self.handle_create(session, user_id, token, preset_id, endpoint, reply)
                    .await;
            }
            WorkerRequest::Send { session, payload } => self.handle_send(&session, payload).await,
            WorkerRequest::Close { session } => {
                self.close_session(&session).await;
            }
            WorkerRequest::Rename { old, new } => self.handle_rename(old, new).await,
            WorkerRequest::Check { session, reply } => {
                let open = matches!(
                    self.connections.get(&session).map(|c| &c.state),
                    Some(ConnState::Open { .. })
                );
                let _ = reply.send(open);
            }
        }
    }

    async fn handle_create(
        &mut self,
        session: SessionKey,
        user_id: String,
        token: Option<String>,
        preset_id: Option<String>,
        endpoint: String,
        reply: oneshot::Sender<Result<bool, TransportError>>,
    ) {
        // Existence check, never silent replacement. The coordinator asks
        // first, but two creates racing through the channel land here.
        if self.connections.contains_key(&session) {
            let _ = reply.send(Ok(false));
            return;
        }

        if self.user_connection_count(&user_id) >= self.config.max_connections_per_user {
            let candidates = self.candidates_for(&user_id);
            if let Some(victim) = self.policy.select_victim(&candidates) {
                info!(session = %victim, user = %user_id, "evicting connection over per-user ceiling");
                counter!("ws_evictions_total").increment(1);
                self.close_session(&victim).await;
            }
        }

        let conn_id = self.next_conn_id;
        self.next_conn_id += 1;

        let url = build_connect_url(&endpoint, token.as_deref(), &session, preset_id.as_deref());
        info!(session = %session, user = %user_id, conn_id, "creating connection");

        let _ = self.connections.insert(
            session.clone(),
            Connection {
                conn_id,
                user_id,
                created_at: Instant::now(),
                state: ConnState::Connecting { reply: Some(reply) },
                partial: PartialMessage::default(),
            },
        );
        let _ = self.index.insert(conn_id, session);
        gauge!("ws_connections_active").set(self.connections.len() as f64);

        let signals = self.signals_tx.clone();
        let timeout = self.config.connect_timeout;
        drop(tokio::spawn(async move {
            open_socket(conn_id, url, timeout, signals).await;
        }));
    }

    async fn handle_send(&mut self, session: &SessionKey, payload: Value) {
        let error = match self.connections.get(session) {
            Some(Connection {
                state: ConnState::Open { outbound },
                ..
            }) => match serde_json::to_string(&payload) {
                Ok(text) => {
                    debug!(session = %session, bytes = text.len(), "sending message");
                    if outbound.send(Message::text(text)).is_ok() {
                        return;
                    }
                    format!("cannot send message: connection {session} is shutting down")
                }
                Err(e) => {
                    warn!(session = %session, error = %e, "unserializable outbound payload");
                    format!("cannot send message: payload for {session} is not serializable")
                }
            },
            Some(_) => {
                format!("cannot send message: connection {session} is not in the open state")
            }
            None => {
                // Name the tracked keys for debuggability, as the caller's
                // key may have gone stale across a rename.
                let mut keys: Vec<&str> =
                    self.connections.keys().map(SessionKey::as_str).collect();
                keys.sort_unstable();
                format!(
                    "cannot send message: connection {session} is not available. available connections: {}",
                    keys.join(", ")
                )
            }
        };
        counter!("ws_send_errors_total").increment(1);
        self.emit(WorkerEvent::Error {
            session: session.clone(),
            error,
        })
        .await;
    }

    /// Close a session's connection (explicit request or eviction). Always
    /// emits `Close`, even when nothing was tracked under the key.
    async fn close_session(&mut self, session: &SessionKey) {
        if let Some(conn) = self.connections.remove(session) {
            let _ = self.index.remove(&conn.conn_id);
            gauge!("ws_connections_active").set(self.connections.len() as f64);
            match conn.state {
                ConnState::Open { outbound } => {
                    // Best effort; the writer task closes the sink when the
                    // queue ends regardless.
                    let _ = outbound.send(Message::Close(None));
                }
                ConnState::Connecting { reply } => {
                    if let Some(reply) = reply {
                        let _ = reply.send(Err(TransportError::ConnectFailed {
                            session: session.clone(),
                            reason: "connection closed before open".to_owned(),
                        }));
                    }
                }
            }
        }
        self.emit(WorkerEvent::Close {
            session: session.clone(),
        })
        .await;
    }

    async fn handle_rename(&mut self, old: SessionKey, new: SessionKey) {
        if !self.connections.contains_key(&old) {
            self.emit(WorkerEvent::Error {
                session: old.clone(),
                error: format!("cannot update connection id: connection {old} not found"),
            })
            .await;
            return;
        }
        // One connection per key: refuse to stomp a live target.
        if self.connections.contains_key(&new) {
            self.emit(WorkerEvent::Error {
                session: old.clone(),
                error: format!("cannot update connection id: connection {new} already exists"),
            })
            .await;
            return;
        }
        if let Some(conn) = self.connections.remove(&old) {
            let _ = self.index.insert(conn.conn_id, new.clone());
            let _ = self.connections.insert(new.clone(), conn);
            info!(old = %old, new = %new, "connection id updated");
            self.emit(WorkerEvent::IdUpdated { old, new }).await;
        }
    }

    async fn handle_signal(&mut self, signal: SocketSignal) {
        match signal {
            SocketSignal::Opened { conn_id, outbound } => {
                let Some(session) = self.index.get(&conn_id).cloned() else {
                    // Closed (or evicted) while the handshake was in flight.
                    let _ = outbound.send(Message::Close(None));
                    return;
                };
                if let Some(conn) = self.connections.get_mut(&session) {
                    if let ConnState::Connecting { reply } = &mut conn.state {
                        if let Some(reply) = reply.take() {
                            let _ = reply.send(Ok(true));
                        }
                    }
                    conn.state = ConnState::Open { outbound };
                    info!(session = %session, conn_id, "connection open");
                    self.emit(WorkerEvent::Open { session }).await;
                }
            }
            SocketSignal::OpenFailed {
                conn_id,
                timed_out,
                reason,
            } => {
                counter!("ws_connect_failures_total").increment(1);
                let Some(session) = self.index.remove(&conn_id) else {
                    return;
                };
                if let Some(conn) = self.connections.remove(&session) {
                    gauge!("ws_connections_active").set(self.connections.len() as f64);
                    if let ConnState::Connecting { reply: Some(reply) } = conn.state {
                        let _ = reply.send(Err(if timed_out {
                            TransportError::ConnectTimeout(session.clone())
                        } else {
                            TransportError::ConnectFailed {
                                session: session.clone(),
                                reason: reason.clone(),
                            }
                        }));
                    }
                }
                warn!(session = %session, conn_id, %reason, "connection failed to open");
                self.emit(WorkerEvent::Error {
                    session,
                    error: if timed_out {
                        "connection timeout".to_owned()
                    } else {
                        format!("failed to create connection: {reason}")
                    },
                })
                .await;
            }
            SocketSignal::Frame { conn_id, text } => {
                counter!("ws_frames_total").increment(1);
                let Some(session) = self.index.get(&conn_id).cloned() else {
                    return;
                };
                self.handle_frame(&session, &text).await;
            }
            SocketSignal::ReadFailed { conn_id, reason } => {
                if let Some(session) = self.index.get(&conn_id).cloned() {
                    warn!(session = %session, %reason, "socket read error");
                    self.emit(WorkerEvent::Error {
                        session,
                        error: "WebSocket error".to_owned(),
                    })
                    .await;
                }
            }
            SocketSignal::Closed { conn_id } => {
                // Ignored when the session was already closed explicitly.
                if let Some(session) = self.index.remove(&conn_id) {
                    let _ = self.connections.remove(&session);
                    gauge!("ws_connections_active").set(self.connections.len() as f64);
                    info!(session = %session, conn_id, "connection closed by peer");
                    self.emit(WorkerEvent::Close { session }).await;
                }
            }
        }
    }

    /// Demultiplex one inbound frame: streamed fragments accumulate into the
    /// connection's partial message, everything else passes through.
    async fn handle_frame(&mut self, session: &SessionKey, text: &str) {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                // Generic message only — parser internals stay private.
                counter!("ws_parse_errors_total").increment(1);
                debug!(session = %session, error = %e, "discarding malformed frame");
                self.emit(WorkerEvent::Error {
                    session: session.clone(),
                    error: "error parsing message".to_owned(),
                })
                .await;
                return;
            }
        };
        let payload = match frame {
            InboundFrame::Raw(value) => MessagePayload::Raw(value),
            InboundFrame::Fragment(fragment) => {
                let Some(conn) = self.connections.get_mut(session) else {
                    return;
                };
                conn.partial.absorb(&fragment);
                if fragment.end {
                    let (content, thought_process) = conn.partial.take();
                    MessagePayload::Complete(CompleteMessage {
                        conversation_id: fragment.conversation_id,
                        content,
                        thought_process,
                    })
                } else {
                    MessagePayload::Stream(StreamUpdate {
                        conversation_id: fragment.conversation_id,
                        content: fragment.content,
                        reasoning_content: fragment.reasoning_content,
                        partial_content: conn.partial.content.clone(),
                        partial_reasoning: conn.partial.reasoning_content.clone(),
                    })
                }
            }
        };
        self.emit(WorkerEvent::Message {
            session: session.clone(),
            payload,
        })
        .await;
    }

    fn user_connection_count(&self, user_id: &str) -> usize {
        self.connections
            .values()
            .filter(|c| c.user_id == user_id)
            .count()
    }

    fn candidates_for(&self, user_id: &str) -> Vec<EvictionCandidate> {
        self.connections
            .iter()
            .filter(|(_, c)| c.user_id == user_id)
            .map(|(session, c)| EvictionCandidate {
                session: session.clone(),
                created_at: c.created_at,
            })
            .collect()
    }

    /// Forward one event to the dispatch task. Awaiting the bounded channel
    /// applies backpressure instead of dropping, preserving per-session
    /// order. A closed channel means the manager is gone; the loop will
    /// notice on the next request recv.
    async fn emit(&self, event: WorkerEvent) {
        let _ = self.events.send(event).await;
    }
}

/// Handshake one socket, then hand its halves to writer/reader tasks.
async fn open_socket(
    conn_id: u64,
    url: String,
    timeout: std::time::Duration,
    signals: mpsc::Sender<SocketSignal>,
) {
    let connected = tokio::time::timeout(timeout, connect_async(url.as_str())).await;
    match connected {
        Err(_) => {
            let _ = signals
                .send(SocketSignal::OpenFailed {
                    conn_id,
                    timed_out: true,
                    reason: format!("no open within {timeout:?}"),
                })
                .await;
        }
        Ok(Err(e)) => {
            let _ = signals
                .send(SocketSignal::OpenFailed {
                    conn_id,
                    timed_out: false,
                    reason: e.to_string(),
                })
                .await;
        }
        Ok(Ok((socket, _response))) => {
            let (sink, source) = socket.split();
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            drop(tokio::spawn(write_loop(sink, outbound_rx)));
            drop(tokio::spawn(read_loop(conn_id, source, signals.clone())));
            let _ = signals
                .send(SocketSignal::Opened {
                    conn_id,
                    outbound: outbound_tx,
                })
                .await;
        }
    }
}

/// Pump queued outbound frames into the sink; close it when the queue ends.
/// Close-time failures are swallowed — the connection is going away either
/// way and the worker has already reported `Close`.
async fn write_loop(mut sink: WsSink, mut outbound: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = outbound.recv().await {
        if sink.send(message).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}

/// Forward inbound text frames to the worker loop; report read errors and
/// the eventual close. Control frames are handled by the library.
async fn read_loop(conn_id: u64, mut source: WsSource, signals: mpsc::Sender<SocketSignal>) {
    while let Some(item) = source.next().await {
        match item {
            Ok(Message::Text(text)) => {
                if signals
                    .send(SocketSignal::Frame {
                        conn_id,
                        text: text.to_string(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping/pong/binary — nothing to demultiplex
            Err(e) => {
                let _ = signals
                    .send(SocketSignal::ReadFailed {
                        conn_id,
                        reason: e.to_string(),
                    })
                    .await;
                break;
            }
        }
    }
    let _ = signals.send(SocketSignal::Closed { conn_id }).await;
}
