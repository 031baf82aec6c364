//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire frames.
///
/// Decode failures are expected in normal operation (the server may speak a
/// newer dialect); callers drop the offending frame and keep the connection
/// alive. They must never tear down the channel.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Inbound frame was not a valid event envelope.
    #[error("failed to decode frame: {source}")]
    Decode {
        /// Underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Outbound command could not be serialized.
    #[error("failed to encode {kind} command: {reason}")]
    Encode {
        /// Command kind that failed to serialize.
        kind: &'static str,
        /// Underlying serializer message.
        reason: String,
    },
}
