//! Channel data model shared by inbound events and outbound commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned message identifier.
///
/// Unique within a channel and monotonically increasing in arrival order,
/// but NOT guaranteed contiguous.
pub type MessageId = u64;

/// Stable user identifier.
pub type UserId = u64;

/// Identifier of a discussion channel.
pub type ChannelId = u64;

/// Identifier of an inbox inquiry (the inbox channel's sub-scope).
pub type InquiryId = u64;

/// A participant as the server presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user id.
    pub id: UserId,

    /// Human-readable name for rendering.
    pub display_name: String,

    /// Role or account type (e.g. "member", "staff").
    #[serde(default)]
    pub role: String,
}

/// One message in a channel's ordered log.
///
/// # Invariants
///
/// - Identity is `id`; edits and deletes match by id and mutate in place.
/// - Deletion is soft: `deleted` flips to true, the record stays in the log
///   and `body` is retained.
/// - `reply_to` is self-referential and may point at a message that is not
///   locally known (e.g. scrolled out of the snapshot window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Server-assigned id.
    pub id: MessageId,

    /// Channel (or inquiry) this message belongs to.
    pub channel_id: ChannelId,

    /// Author of the message.
    pub sender: UserProfile,

    /// Message text.
    pub body: String,

    /// Message this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,

    /// True once the message has been edited.
    #[serde(default)]
    pub edited: bool,

    /// True once the message has been soft-deleted.
    #[serde(default)]
    pub deleted: bool,

    /// Server-side creation time.
    pub created_at: DateTime<Utc>,

    /// Server-side last-modification time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn message_defaults_for_omitted_flags() {
        let json = r#"{
            "id": 7,
            "channel_id": 3,
            "sender": {"id": 1, "display_name": "ada"},
            "body": "hello",
            "created_at": "2026-01-05T10:00:00Z",
            "updated_at": "2026-01-05T10:00:00Z"
        }"#;

        let msg: ChannelMessage = serde_json::from_str(json).unwrap();
        assert!(!msg.edited);
        assert!(!msg.deleted);
        assert_eq!(msg.reply_to, None);
        assert_eq!(msg.sender.role, "");
    }

    #[test]
    fn reply_to_omitted_when_absent() {
        let msg = ChannelMessage {
            id: 1,
            channel_id: 1,
            sender: UserProfile { id: 1, display_name: "ada".to_string(), role: String::new() },
            body: "hi".to_string(),
            reply_to: None,
            edited: false,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("reply_to").is_none());
    }
}
