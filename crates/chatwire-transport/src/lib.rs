//! # chatwire-transport
//!
//! Real-time chat transport: many logical chat sessions multiplexed over
//! WebSocket connections, with socket I/O isolated in a background worker
//! task.
//!
//! Two cooperating layers, dependency order leaf-first:
//!
//! - **Transport worker** (`worker`): owns every socket exclusively.
//!   Connects, sends, receives, closes; reassembles streamed token fragments
//!   per session; enforces the per-user connection budget with eviction;
//!   reports lifecycle and data as events over an async channel.
//! - **[`SocketManager`]** (coordinator): runs in the caller's context.
//!   Session-keyed API (create/send/close/on/off/rename), a listener
//!   registry per session and event kind, and a dispatch task forwarding
//!   worker events to registered listeners.
//!
//! The two sides share nothing but message channels — the worker mutates
//! connection state only inside its own loop, the coordinator mutates the
//! listener registry only on its side, so there are no cross-context races
//! by construction. Failures cross the boundary as
//! [`chatwire_core::SessionEvent::Error`] events, never as panics.
//!
//! ## Crate Position
//!
//! Depends on: chatwire-core. Depended on by: chatwire-cli.

#![deny(unsafe_code)]

pub mod coordinator;
pub mod eviction;
mod protocol;
mod registry;
mod url;
mod worker;

pub use coordinator::SocketManager;
pub use eviction::{EvictionCandidate, EvictionPolicy, OldestFirst};
