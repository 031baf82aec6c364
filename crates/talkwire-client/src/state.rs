//! Reconciled channel state.
//!
//! The observable view of a channel: ordered message log, presence set, and
//! typing set. Mutation is funneled through the frame router and the action
//! API (single-writer discipline); external callers only get read-only
//! projections.
//!
//! # Invariants
//!
//! - The log is ordered by arrival; a message id appears at most once.
//! - Deletes are soft: the record stays in the log with `deleted = true` and
//!   its body retained.
//! - Presence membership is idempotent; removing a user also clears their
//!   typing entry.

use std::collections::{BTreeMap, HashMap};

use talkwire_proto::{ChannelMessage, MessageId, UserId, UserProfile};

/// Reconciled view of one channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    /// Message log in arrival order.
    messages: Vec<ChannelMessage>,
    /// Message id -> log position, for O(1) dedup and in-place mutation.
    by_id: HashMap<MessageId, usize>,
    /// Present users, ordered by id for stable projections.
    presence: BTreeMap<UserId, UserProfile>,
    /// Users currently marked typing.
    typing: BTreeMap<UserId, UserProfile>,
}

impl ChannelState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered message log, deleted messages included (flagged, not removed).
    pub fn messages(&self) -> &[ChannelMessage] {
        &self.messages
    }

    /// Look up a message by id.
    pub fn message(&self, id: MessageId) -> Option<&ChannelMessage> {
        self.by_id.get(&id).and_then(|&i| self.messages.get(i))
    }

    /// Present users, ordered by id.
    pub fn participants(&self) -> impl Iterator<Item = &UserProfile> {
        self.presence.values()
    }

    /// Number of present users.
    pub fn participant_count(&self) -> usize {
        self.presence.len()
    }

    /// True if the user is present.
    pub fn is_present(&self, user_id: UserId) -> bool {
        self.presence.contains_key(&user_id)
    }

    /// Users currently typing, ordered by id.
    pub fn typing_users(&self) -> impl Iterator<Item = &UserProfile> {
        self.typing.values()
    }

    /// True if the user is currently marked typing.
    pub fn is_typing(&self, user_id: UserId) -> bool {
        self.typing.contains_key(&user_id)
    }

    /// Replace the log and presence wholesale from a full-state snapshot.
    ///
    /// The snapshot is the baseline for a new connection epoch: prior local
    /// state is discarded, never merged. The typing set is cleared since a
    /// snapshot carries no typing information.
    pub(crate) fn replace(&mut self, messages: Vec<ChannelMessage>, users: Vec<UserProfile>) {
        self.messages = Vec::with_capacity(messages.len());
        self.by_id = HashMap::with_capacity(messages.len());
        // A snapshot carrying a repeated id keeps the first copy, matching
        // the append path.
        for message in messages {
            if !self.by_id.contains_key(&message.id) {
                self.by_id.insert(message.id, self.messages.len());
                self.messages.push(message);
            }
        }
        self.presence = users.into_iter().map(|u| (u.id, u)).collect();
        self.typing.clear();
    }

    /// Append a message if its id is not already present.
    ///
    /// Returns false for a duplicate id (dedup: applied exactly once).
    pub(crate) fn append_message(&mut self, message: ChannelMessage) -> bool {
        if self.by_id.contains_key(&message.id) {
            return false;
        }
        self.by_id.insert(message.id, self.messages.len());
        self.messages.push(message);
        true
    }

    /// Replace the message with the same id in place.
    ///
    /// Returns false if the id is unknown (stale edit, ignored).
    pub(crate) fn apply_edit(&mut self, message: ChannelMessage) -> bool {
        match self.by_id.get(&message.id) {
            Some(&i) => {
                if let Some(slot) = self.messages.get_mut(i) {
                    *slot = message;
                    true
                } else {
                    false
                }
            },
            None => false,
        }
    }

    /// Soft-delete the message with the given id.
    ///
    /// The body is retained; only the flag flips. Returns false if unknown.
    pub(crate) fn apply_delete(&mut self, id: MessageId) -> bool {
        match self.by_id.get(&id) {
            Some(&i) => match self.messages.get_mut(i) {
                Some(msg) => {
                    msg.deleted = true;
                    true
                },
                None => false,
            },
            None => false,
        }
    }

    /// Insert a user into the presence set. Idempotent.
    ///
    /// Returns false if the user was already present (duplicate join).
    pub(crate) fn insert_participant(&mut self, user: UserProfile) -> bool {
        match self.presence.entry(user.id) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(user);
                true
            },
        }
    }

    /// Remove a user from presence, cascading removal from the typing set.
    ///
    /// Returns true if the user was present in either set.
    pub(crate) fn remove_participant(&mut self, user_id: UserId) -> bool {
        let was_present = self.presence.remove(&user_id).is_some();
        let was_typing = self.typing.remove(&user_id).is_some();
        was_present || was_typing
    }

    /// Mark or clear a user's typing state. Returns true if it changed.
    pub(crate) fn set_typing(&mut self, user: UserProfile, is_typing: bool) -> bool {
        if is_typing {
            self.typing.insert(user.id, user).is_none()
        } else {
            self.typing.remove(&user.id).is_some()
        }
    }

    /// Clear a user's typing state by id (stop event lost, TTL expired).
    pub(crate) fn clear_typing(&mut self, user_id: UserId) -> bool {
        self.typing.remove(&user_id).is_some()
    }
}
