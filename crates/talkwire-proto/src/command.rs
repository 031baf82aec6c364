//! Outbound command envelopes.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ProtocolError, Result},
    types::{InquiryId, MessageId},
};

/// One outbound frame, encoded with a `type` discriminator.
///
/// Commands carry no client-generated id correlation: the server is the sole
/// source of message identity, and the echo arrives later as a
/// `message.new` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Post a new message.
    #[serde(rename = "message.send")]
    MessageSend {
        /// Message text.
        content: String,
        /// Message this one replies to, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<MessageId>,
        /// Inquiry scope, required on inbox channels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inquiry_id: Option<InquiryId>,
    },

    /// Replace the body of an existing message.
    #[serde(rename = "message.edit")]
    MessageEdit {
        /// Message to edit.
        message_id: MessageId,
        /// Replacement text.
        content: String,
    },

    /// Soft-delete an existing message.
    #[serde(rename = "message.delete")]
    MessageDelete {
        /// Message to delete.
        message_id: MessageId,
    },

    /// Mark messages read within an inquiry.
    #[serde(rename = "message.read")]
    MessagesRead {
        /// Inquiry the receipt applies to.
        inquiry_id: InquiryId,
        /// Ids covered by the receipt.
        message_ids: Vec<MessageId>,
    },

    /// Announce that the user started typing. Fire-and-forget.
    #[serde(rename = "typing.start")]
    TypingStart {
        /// Inquiry scope, present on inbox channels only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inquiry_id: Option<InquiryId>,
    },

    /// Announce that the user stopped typing. Fire-and-forget.
    #[serde(rename = "typing.stop")]
    TypingStop {
        /// Inquiry scope, present on inbox channels only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inquiry_id: Option<InquiryId>,
    },

    /// Periodic liveness signal keeping server-side presence from expiring.
    #[serde(rename = "presence.update")]
    PresenceUpdate,
}

impl ClientCommand {
    /// Encode this command as one outbound text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::Encode { kind: self.kind(), reason: e.to_string() })
    }

    /// Wire name of this command's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MessageSend { .. } => "message.send",
            Self::MessageEdit { .. } => "message.edit",
            Self::MessageDelete { .. } => "message.delete",
            Self::MessagesRead { .. } => "message.read",
            Self::TypingStart { .. } => "typing.start",
            Self::TypingStop { .. } => "typing.stop",
            Self::PresenceUpdate => "presence.update",
        }
    }
}
