//! # chatwire-core
//!
//! Foundation types for the chatwire real-time chat transport.
//!
//! This crate provides the shared vocabulary the transport and its callers
//! depend on:
//!
//! - **Session keys**: [`keys::SessionKey`] — canonical string key for one
//!   logical conversation, temporary (`tmp-` prefixed) or server-assigned
//! - **Wire frames**: [`frames::InboundFrame`] parsing and the
//!   [`frames::PartialMessage`] fragment accumulator
//! - **Outbound builders**: [`outbound::ChatRequest`] / [`outbound::StopRequest`]
//!   matching the backend chat protocol
//! - **Events**: [`events::SessionEvent`] delivered to registered listeners
//! - **Errors**: [`errors::TransportError`] via `thiserror`
//! - **Config**: [`config::TransportConfig`] — connection budget and timeouts
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `chatwire-transport` and `chatwire-cli`.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod events;
pub mod frames;
pub mod keys;
pub mod outbound;

pub use config::TransportConfig;
pub use errors::TransportError;
pub use events::{CompleteMessage, EventHandler, EventKind, MessagePayload, SessionEvent, StreamUpdate};
pub use frames::{Fragment, InboundFrame, PartialMessage};
pub use keys::SessionKey;
pub use outbound::{ChatRequest, StopRequest};
