//! Frame router: applies decoded events to channel state.
//!
//! One decoded [`ServerEvent`] in, zero or more [`ChannelUpdate`]
//! notifications out. Unknown kinds and no-op events (duplicate message,
//! duplicate join, stale edit) are logged and dropped; nothing here is ever
//! fatal. Scope (inquiry) filtering is deliberately NOT done here: the
//! router applies every event and layers tracking a single inquiry filter
//! on [`ServerEvent::inquiry_id`].

use talkwire_proto::ServerEvent;

use crate::{event::ChannelUpdate, state::ChannelState};

/// Apply one event to the state, returning the notifications it produced.
pub(crate) fn route(event: ServerEvent, state: &mut ChannelState) -> Vec<ChannelUpdate> {
    match event {
        ServerEvent::InitialState { messages, participants } => {
            tracing::debug!(
                messages = messages.len(),
                participants = participants.len(),
                "applying full-state snapshot"
            );
            state.replace(messages, participants);
            vec![ChannelUpdate::Resynced]
        },

        ServerEvent::MessageNew { message } => {
            if state.append_message(message.clone()) {
                vec![ChannelUpdate::MessageNew(message)]
            } else {
                tracing::debug!(id = message.id, "dropping duplicate message");
                vec![]
            }
        },

        ServerEvent::MessageEdited { message } => {
            if state.apply_edit(message.clone()) {
                vec![ChannelUpdate::MessageEdited(message)]
            } else {
                tracing::debug!(id = message.id, "ignoring edit of unknown message");
                vec![]
            }
        },

        ServerEvent::MessageDeleted { message_id } => {
            if state.apply_delete(message_id) {
                vec![ChannelUpdate::MessageDeleted(message_id)]
            } else {
                tracing::debug!(id = message_id, "ignoring delete of unknown message");
                vec![]
            }
        },

        ServerEvent::UserJoined { user } => {
            if state.insert_participant(user.clone()) {
                vec![ChannelUpdate::UserJoined(user)]
            } else {
                // Duplicate join: presence membership is idempotent.
                vec![]
            }
        },

        ServerEvent::UserLeft { user_id } => {
            let was_typing = state.is_typing(user_id);
            if state.remove_participant(user_id) {
                let mut updates = vec![ChannelUpdate::UserLeft(user_id)];
                if was_typing {
                    updates.push(ChannelUpdate::TypingChanged {
                        user_id,
                        is_typing: false,
                        inquiry_id: None,
                    });
                }
                updates
            } else {
                vec![]
            }
        },

        ServerEvent::TypingIndicator { user, is_typing, inquiry_id } => {
            let user_id = user.id;
            if state.set_typing(user, is_typing) {
                vec![ChannelUpdate::TypingChanged { user_id, is_typing, inquiry_id }]
            } else {
                vec![]
            }
        },

        ServerEvent::MessagesRead { inquiry_id, message_ids, reader_id } => {
            vec![ChannelUpdate::MessagesRead { inquiry_id, message_ids, reader_id }]
        },

        // Surfaced to the owner only; channel state is untouched.
        ServerEvent::Error { message } => vec![ChannelUpdate::ServerError(message)],

        ServerEvent::Unknown => {
            tracing::debug!("dropping frame with unrecognized event kind");
            vec![]
        },
    }
}
