//! Inbound event envelopes.

use serde::{Deserialize, Serialize};

use crate::{
    errors::Result,
    types::{ChannelMessage, InquiryId, MessageId, UserId, UserProfile},
};

/// One inbound frame, decoded by its `type` discriminator.
///
/// Unrecognized kinds decode to [`ServerEvent::Unknown`] so a newer server
/// dialect degrades to a dropped frame instead of a decode error. Frames that
/// fail to decode entirely (malformed JSON, missing fields) surface as
/// [`crate::ProtocolError::Decode`]; both cases are non-fatal by contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full-state snapshot: replaces the local log and presence wholesale.
    ///
    /// Sent once per connection open; the baseline for each epoch. Also
    /// arrives under the legacy `connection.established` kind.
    #[serde(rename = "initial.state", alias = "connection.established")]
    InitialState {
        /// Complete message log, in server order.
        messages: Vec<ChannelMessage>,
        /// Complete presence set.
        participants: Vec<UserProfile>,
    },

    /// A new message was posted.
    #[serde(rename = "message.new")]
    MessageNew {
        /// The message, with its server-assigned id.
        message: ChannelMessage,
    },

    /// An existing message was edited; matched by id.
    #[serde(rename = "message.edited")]
    MessageEdited {
        /// Replacement for the message with the same id.
        message: ChannelMessage,
    },

    /// An existing message was soft-deleted; matched by id.
    #[serde(rename = "message.deleted")]
    MessageDeleted {
        /// Id of the deleted message.
        message_id: MessageId,
    },

    /// A user entered the channel.
    #[serde(rename = "user.joined")]
    UserJoined {
        /// The joining user.
        user: UserProfile,
    },

    /// A user left the channel.
    #[serde(rename = "user.left")]
    UserLeft {
        /// Id of the departing user.
        user_id: UserId,
    },

    /// A user started or stopped typing.
    #[serde(rename = "typing.indicator")]
    TypingIndicator {
        /// The typing user.
        user: UserProfile,
        /// True to mark typing, false to clear.
        is_typing: bool,
        /// Inquiry scope, present on inbox channels only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inquiry_id: Option<InquiryId>,
    },

    /// Messages were marked read by a participant.
    #[serde(rename = "messages.read")]
    MessagesRead {
        /// Inquiry scope, present on inbox channels only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inquiry_id: Option<InquiryId>,
        /// Ids covered by the receipt.
        message_ids: Vec<MessageId>,
        /// Who read them.
        reader_id: UserId,
    },

    /// Server-reported error; surfaced to the owner, never alters state.
    #[serde(rename = "error")]
    Error {
        /// Human-readable description from the server.
        message: String,
    },

    /// Any event kind this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Decode one inbound text frame.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Inquiry scope carried by this event, if any.
    ///
    /// Scope matching is the consumer's concern: the router applies every
    /// event, and layers that track a single inquiry filter on this.
    pub fn inquiry_id(&self) -> Option<InquiryId> {
        match self {
            Self::TypingIndicator { inquiry_id, .. } | Self::MessagesRead { inquiry_id, .. } => {
                *inquiry_id
            },
            _ => None,
        }
    }
}
