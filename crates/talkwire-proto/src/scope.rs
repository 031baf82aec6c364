//! Channel scopes, endpoint construction, and close-code policy.

use std::fmt;

use crate::types::ChannelId;

/// WebSocket close code for intentional, terminal closure.
///
/// Any other code is treated as abnormal and triggers the retry policy.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Whether a close code should schedule a reconnection attempt.
pub fn should_retry(code: u16) -> bool {
    code != NORMAL_CLOSURE
}

/// The conversation context a client is bound to.
///
/// The scope (together with the auth token) is fixed for the lifetime of a
/// client instance; switching scopes means constructing a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelScope {
    /// A discussion room, addressed by its numeric id.
    Discussion(ChannelId),

    /// The caller's private inbox. One socket carries every inquiry;
    /// inquiry-scoped events are filtered by the consuming layer.
    Inbox,
}

impl ChannelScope {
    /// Path segment under `/ws/` for this scope.
    pub fn path(&self) -> String {
        match self {
            Self::Discussion(id) => format!("discussions/{id}"),
            Self::Inbox => "inbox".to_string(),
        }
    }

    /// Full endpoint URL: `{base}/ws/{scope-path}/?token={token}`.
    ///
    /// `base` is the ws(s) origin without a trailing slash.
    pub fn endpoint_url(&self, base: &str, token: &str) -> String {
        format!("{base}/ws/{}/?token={token}", self.path())
    }
}

impl fmt::Display for ChannelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discussion(id) => write!(f, "discussion {id}"),
            Self::Inbox => write!(f, "inbox"),
        }
    }
}
