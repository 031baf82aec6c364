//! Wire format for the Talkwire real-time channel protocol.
//!
//! Every frame exchanged with the server is a JSON object carrying a `type`
//! discriminator. Inbound frames decode to [`ServerEvent`]; outbound frames
//! encode from [`ClientCommand`]. The channel data model ([`ChannelMessage`],
//! [`UserProfile`]) is shared by both directions.
//!
//! This crate is pure data: no I/O, no connection state. Lifecycle and state
//! reconciliation live in `talkwire-client`.

mod command;
mod errors;
mod event;
mod scope;
mod types;

pub use command::ClientCommand;
pub use errors::{ProtocolError, Result};
pub use event::ServerEvent;
pub use scope::{ChannelScope, NORMAL_CLOSURE, should_retry};
pub use types::{ChannelId, ChannelMessage, InquiryId, MessageId, UserId, UserProfile};
