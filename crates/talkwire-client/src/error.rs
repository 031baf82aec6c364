//! Client error types.
//!
//! Strongly-typed errors for the protocol core. Action preconditions
//! (`NotConnected`) are ordinary recoverable conditions the owner reacts to;
//! they never tear down the connection or the client.

use thiserror::Error;

use crate::supervisor::ConnectionStatus;

/// Errors returned by [`crate::ChannelClient::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// An action was attempted while the connection was not open.
    ///
    /// Sends are rejected immediately rather than buffered; the caller
    /// re-issues after reconnection.
    #[error("cannot {operation}: connection is {status:?}, not open")]
    NotConnected {
        /// Action that was attempted.
        operation: &'static str,
        /// Connection status at the time of the attempt.
        status: ConnectionStatus,
    },

    /// An outbound command could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<talkwire_proto::ProtocolError> for ClientError {
    fn from(err: talkwire_proto::ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}
