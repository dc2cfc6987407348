//! Command-line chat client over the chatwire transport.
//!
//! Opens one session, sends one prompt, streams the response to stdout as it
//! arrives, and exits once the complete message (or an error, or a close)
//! comes back. Useful for poking at a backend and as a worked example of the
//! [`SocketManager`] API.

#![deny(unsafe_code)]

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use chatwire_core::{
    ChatRequest, EventHandler, EventKind, MessagePayload, SessionEvent, SessionKey,
    TransportConfig,
};
use chatwire_transport::SocketManager;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Send one chat message over a WebSocket session and stream the reply.
#[derive(Debug, Parser)]
#[command(name = "chatwire", version, about)]
struct Args {
    /// WebSocket endpoint, e.g. ws://localhost:8080/api/chat/ws
    #[arg(long)]
    url: String,

    /// Session key. Defaults to a fresh temporary key, which asks the
    /// backend to allocate a durable conversation id.
    #[arg(long)]
    session: Option<String>,

    /// User id owning the connection (budget accounting).
    #[arg(long, default_value = "cli")]
    user: String,

    /// Bearer token passed in the connect URL.
    #[arg(long)]
    token: Option<String>,

    /// Preset id passed in the connect URL.
    #[arg(long)]
    preset: Option<String>,

    /// Model to request.
    #[arg(long, default_value = chatwire_core::outbound::DEFAULT_MODEL)]
    model: String,

    /// The prompt to send.
    #[arg(long)]
    message: String,

    /// Let the backend use web search.
    #[arg(long)]
    enable_web: bool,

    /// Give up waiting for the complete response after this many seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

/// Terminal outcome of the one-shot exchange.
enum Outcome {
    Complete,
    Error(String),
    Closed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let session = args
        .session
        .map(SessionKey::from)
        .unwrap_or_else(mint_temporary_key);
    info!(session = %session, url = %args.url, "starting chat");

    let manager = SocketManager::spawn(TransportConfig::default());
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

    let on_message: EventHandler = {
        let outcome_tx = outcome_tx.clone();
        Arc::new(move |event: &SessionEvent| {
            let SessionEvent::Message(payload) = event else {
                return;
            };
            match payload {
                MessagePayload::Stream(update) => {
                    print!("{}", update.content);
                    let _ = std::io::stdout().flush();
                }
                MessagePayload::Complete(complete) => {
                    // Stream updates already printed the accumulation; just
                    // terminate the line and report.
                    println!();
                    debug!(
                        conversation = %complete.conversation_id,
                        content_len = complete.content.len(),
                        reasoning_len = complete.thought_process.len(),
                        "response complete"
                    );
                    let _ = outcome_tx.send(Outcome::Complete);
                }
                MessagePayload::Raw(value) => {
                    debug!(frame = %value, "passthrough frame");
                }
            }
        })
    };
    let on_error: EventHandler = {
        let outcome_tx = outcome_tx.clone();
        Arc::new(move |event: &SessionEvent| {
            if let SessionEvent::Error(message) = event {
                let _ = outcome_tx.send(Outcome::Error(message.clone()));
            }
        })
    };
    let on_close: EventHandler = Arc::new(move |event: &SessionEvent| {
        if matches!(event, SessionEvent::Close) {
            let _ = outcome_tx.send(Outcome::Closed);
        }
    });
    manager.on(&session, EventKind::Message, on_message);
    manager.on(&session, EventKind::Error, on_error);
    manager.on(&session, EventKind::Close, on_close);

    let opened = manager
        .create_connection(
            session.clone(),
            &args.user,
            args.token.as_deref(),
            args.preset.as_deref(),
            &args.url,
        )
        .await
        .context("failed to open connection")?;
    debug!(opened, "connection ready");

    let request = ChatRequest::new(&args.message)
        .model(&args.model)
        .enable_web(args.enable_web);
    manager.send_message(&session, request.into_value());

    let outcome = tokio::time::timeout(Duration::from_secs(args.timeout), outcome_rx.recv())
        .await
        .context("timed out waiting for a response")?
        .context("transport shut down before a response arrived")?;

    manager.close_connection(&session);
    match outcome {
        Outcome::Complete => Ok(()),
        Outcome::Error(message) => anyhow::bail!("transport error: {message}"),
        Outcome::Closed => anyhow::bail!("connection closed before the response completed"),
    }
}

/// Client-minted temporary key; the connect URL carries the sentinel `-1`
/// and the backend allocates the durable id.
fn mint_temporary_key() -> SessionKey {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    SessionKey::new(format!("{}{millis}", chatwire_core::keys::TEMP_PREFIX))
}
