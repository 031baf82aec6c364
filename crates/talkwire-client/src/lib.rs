//! Channel client
//!
//! Action-based client state machine for Talkwire real-time channels. Manages
//! the reconnecting connection lifecycle, presence heartbeats, and the
//! reconciled channel state (message log, presence, typing).
//!
//! # Architecture
//!
//! The client follows Sans-IO and Action-Based patterns. It receives events
//! ([`ClientEvent`]), processes them through pure state machine logic, and
//! returns actions ([`ClientAction`]) for the caller to execute. Time arrives
//! as a parameter on events, so the whole machine runs under virtual time in
//! tests.
//!
//! # Components
//!
//! - [`ChannelClient`]: Top-level state machine for one channel
//! - [`Supervisor`]: Reconnection lifecycle (close code 1000 is terminal,
//!   anything else schedules a fixed-delay retry)
//! - [`Heartbeat`]: Periodic presence signal, armed only while open
//! - [`ChannelState`]: Ordered message log, presence set, typing set
//! - [`ClientEvent`] / [`ClientAction`] / [`ChannelUpdate`]: The event,
//!   action, and notification vocabulary
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::open`]: Spawn a WebSocket-backed channel task
//! - [`transport::ChannelHandle`]: Command/update channels to the task

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;
mod heartbeat;
mod router;
mod state;
mod supervisor;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{
    ChannelClient, ClientOptions, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RETRY_DELAY,
    DEFAULT_TYPING_TTL,
};
pub use error::ClientError;
pub use event::{ChannelUpdate, ClientAction, ClientEvent};
pub use heartbeat::Heartbeat;
pub use state::ChannelState;
pub use supervisor::{CloseOutcome, ConnectionStatus, Supervisor};
pub use talkwire_proto::{ChannelScope, ClientCommand, NORMAL_CLOSURE, ServerEvent};
