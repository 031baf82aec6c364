//! Client events, actions, and outward notifications.

use talkwire_proto::{
    ChannelMessage, ClientCommand, InquiryId, MessageId, UserId, UserProfile,
};

use crate::supervisor::ConnectionStatus;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Executing transport I/O and reporting its outcomes back
/// - Driving time forward via ticks
/// - Forwarding user intents (send, edit, typing, ...)
///
/// Generic over `I` (Instant type) so production code uses real time and
/// tests drive virtual time deterministically.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Owner asked the client to come online. Idempotent while a connection
    /// is open or being established.
    Connect,

    /// Owner asked for terminal teardown: cancels any pending retry, stops
    /// the heartbeat, then closes the connection with a normal-closure code.
    Disconnect,

    /// The transport finished an open attempt successfully.
    TransportOpened {
        /// Current time.
        now: I,
    },

    /// The transport's open attempt failed before a connection existed.
    TransportFailed {
        /// Transport-level description of the failure.
        reason: String,
        /// Current time.
        now: I,
    },

    /// An open connection closed.
    TransportClosed {
        /// WebSocket close code; 1000 is terminal, anything else retries.
        code: u16,
        /// Close reason, if the peer supplied one.
        reason: String,
        /// Current time.
        now: I,
    },

    /// One raw text frame arrived from the server.
    FrameReceived {
        /// Frame text, undecoded.
        text: String,
        /// Current time.
        now: I,
    },

    /// Periodic tick for retry scheduling, heartbeats, and typing expiry.
    Tick {
        /// Current time.
        now: I,
    },

    /// Post a new message.
    SendMessage {
        /// Message text.
        content: String,
        /// Message being replied to, if any.
        reply_to: Option<MessageId>,
        /// Inquiry scope, required on inbox channels.
        inquiry_id: Option<InquiryId>,
    },

    /// Edit an existing message.
    EditMessage {
        /// Message to edit.
        message_id: MessageId,
        /// Replacement text.
        content: String,
    },

    /// Soft-delete an existing message.
    DeleteMessage {
        /// Message to delete.
        message_id: MessageId,
    },

    /// Mark messages read within an inquiry.
    MarkRead {
        /// Inquiry the receipt applies to.
        inquiry_id: InquiryId,
        /// Ids covered by the receipt.
        message_ids: Vec<MessageId>,
    },

    /// Announce typing started. Fire-and-forget, no acknowledgment.
    StartTyping {
        /// Inquiry scope, present on inbox channels only.
        inquiry_id: Option<InquiryId>,
    },

    /// Announce typing stopped. Fire-and-forget, no acknowledgment.
    StopTyping {
        /// Inquiry scope, present on inbox channels only.
        inquiry_id: Option<InquiryId>,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Open a new transport connection to the channel endpoint.
    ///
    /// Exactly one connection may be live at a time; the client only emits
    /// this when no other connection exists or is being established.
    OpenConnection,

    /// Close the live transport connection.
    CloseConnection {
        /// WebSocket close code to send.
        code: u16,
        /// Close reason to send.
        reason: String,
    },

    /// Encode and send one command frame on the open connection.
    SendFrame(ClientCommand),

    /// Deliver a semantic notification to the owner.
    Notify(ChannelUpdate),
}

/// Notifications delivered to the owner.
///
/// The owner renders from these plus the read-only projections on
/// [`crate::ChannelState`]; it never mutates channel state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelUpdate {
    /// The connection lifecycle moved to a new status.
    StatusChanged(ConnectionStatus),

    /// A full-state snapshot replaced the local log and presence.
    Resynced,

    /// A new message was appended to the log.
    MessageNew(ChannelMessage),

    /// An existing message was replaced in place.
    MessageEdited(ChannelMessage),

    /// An existing message was soft-deleted; it remains in the log.
    MessageDeleted(MessageId),

    /// A read receipt arrived.
    MessagesRead {
        /// Inquiry scope, present on inbox channels only.
        inquiry_id: Option<InquiryId>,
        /// Ids covered by the receipt.
        message_ids: Vec<MessageId>,
        /// Who read them.
        reader_id: UserId,
    },

    /// A user entered the channel.
    UserJoined(UserProfile),

    /// A user left the channel (and was cleared from the typing set).
    UserLeft(UserId),

    /// A user's typing state changed.
    TypingChanged {
        /// The user in question.
        user_id: UserId,
        /// New typing state.
        is_typing: bool,
        /// Inquiry scope, present on inbox channels only.
        inquiry_id: Option<InquiryId>,
    },

    /// The server reported an error event. Channel state is untouched.
    ServerError(String),

    /// A locally issued action was rejected before any frame was sent
    /// (typically: not connected). The action is not retried automatically;
    /// the owner re-issues after reconnection.
    ActionFailed {
        /// Action that was rejected.
        operation: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
