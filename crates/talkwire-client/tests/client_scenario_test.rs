//! End-to-end scenarios driving the full client state machine.

#![allow(clippy::unwrap_used)]

use std::time::Instant;

use serde_json::json;
use talkwire_client::{
    ChannelClient, ChannelScope, ChannelUpdate, ClientAction, ClientCommand, ClientEvent,
    ClientOptions, ConnectionStatus, DEFAULT_RETRY_DELAY,
};

fn feed(client: &mut ChannelClient<Instant>, now: Instant, frame: &serde_json::Value) -> Vec<ChannelUpdate> {
    let actions =
        client.handle(ClientEvent::FrameReceived { text: frame.to_string(), now }).unwrap();
    actions
        .into_iter()
        .filter_map(|a| match a {
            ClientAction::Notify(update) => Some(update),
            _ => None,
        })
        .collect()
}

fn message_json(id: u64, body: &str) -> serde_json::Value {
    json!({
        "id": id,
        "channel_id": 42,
        "sender": {"id": 2, "display_name": "bo", "role": "member"},
        "body": body,
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": "2026-01-05T10:00:00Z"
    })
}

fn log_ids(client: &ChannelClient<Instant>) -> Vec<u64> {
    client.state().messages().iter().map(|m| m.id).collect()
}

#[test]
fn reconnect_resyncs_from_fresh_snapshot() {
    let mut client = ChannelClient::new(ChannelScope::Discussion(42), ClientOptions::default());
    let t0 = Instant::now();

    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();

    // First epoch: snapshot [1, 2, 3] with user 7 present.
    let updates = feed(&mut client, t0, &json!({
        "type": "initial.state",
        "messages": [message_json(1, "a"), message_json(2, "b"), message_json(3, "c")],
        "participants": [{"id": 7, "display_name": "sv"}]
    }));
    assert_eq!(updates, vec![ChannelUpdate::Resynced]);
    assert!(client.state().is_present(7));

    let updates =
        feed(&mut client, t0, &json!({"type": "message.new", "message": message_json(4, "d")}));
    assert!(matches!(updates.as_slice(), [ChannelUpdate::MessageNew(m)] if m.id == 4));
    assert_eq!(log_ids(&client), vec![1, 2, 3, 4]);

    // The connection drops abnormally and the retry timer fires.
    client
        .handle(ClientEvent::TransportClosed { code: 1006, reason: String::new(), now: t0 })
        .unwrap();
    assert_eq!(client.status(), ConnectionStatus::WaitingToRetry);
    let due = client.handle(ClientEvent::Tick { now: t0 + DEFAULT_RETRY_DELAY }).unwrap();
    assert!(due.contains(&ClientAction::OpenConnection));
    client.handle(ClientEvent::TransportOpened { now: t0 + DEFAULT_RETRY_DELAY }).unwrap();

    // Second epoch: the server pruned 1 and 2 and added 5. The snapshot is
    // the baseline; nothing from the first epoch survives by merging.
    let updates = feed(&mut client, t0 + DEFAULT_RETRY_DELAY, &json!({
        "type": "initial.state",
        "messages": [message_json(3, "c"), message_json(4, "d"), message_json(5, "e")],
        "participants": []
    }));
    assert_eq!(updates, vec![ChannelUpdate::Resynced]);
    assert_eq!(log_ids(&client), vec![3, 4, 5]);
    assert!(!client.state().is_present(7));
}

#[test]
fn departing_user_stops_typing() {
    let mut client = ChannelClient::new(ChannelScope::Discussion(42), ClientOptions::default());
    let t0 = Instant::now();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();

    feed(&mut client, t0, &json!({
        "type": "user.joined",
        "user": {"id": 9, "display_name": "cy"}
    }));
    feed(&mut client, t0, &json!({
        "type": "typing.indicator",
        "user": {"id": 9, "display_name": "cy"},
        "is_typing": true
    }));
    assert!(client.state().is_typing(9));

    let updates = feed(&mut client, t0, &json!({"type": "user.left", "user_id": 9}));
    assert_eq!(updates, vec![
        ChannelUpdate::UserLeft(9),
        ChannelUpdate::TypingChanged { user_id: 9, is_typing: false, inquiry_id: None },
    ]);
    assert!(!client.state().is_typing(9));
}

#[test]
fn inbox_actions_carry_inquiry_scope() {
    let mut client = ChannelClient::new(ChannelScope::Inbox, ClientOptions::default());
    let t0 = Instant::now();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();

    let actions = client
        .handle(ClientEvent::MarkRead { inquiry_id: 12, message_ids: vec![3, 4] })
        .unwrap();
    assert_eq!(actions, vec![ClientAction::SendFrame(ClientCommand::MessagesRead {
        inquiry_id: 12,
        message_ids: vec![3, 4],
    })]);

    let actions = client.handle(ClientEvent::StartTyping { inquiry_id: Some(12) }).unwrap();
    assert_eq!(
        actions,
        vec![ClientAction::SendFrame(ClientCommand::TypingStart { inquiry_id: Some(12) })]
    );
}

#[test]
fn read_receipts_pass_through_without_state_change() {
    let mut client = ChannelClient::new(ChannelScope::Inbox, ClientOptions::default());
    let t0 = Instant::now();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();

    let updates = feed(&mut client, t0, &json!({
        "type": "messages.read",
        "inquiry_id": 12,
        "message_ids": [3, 4],
        "reader_id": 7
    }));
    assert_eq!(updates, vec![ChannelUpdate::MessagesRead {
        inquiry_id: Some(12),
        message_ids: vec![3, 4],
        reader_id: 7,
    }]);
    assert!(client.state().messages().is_empty());
}

#[test]
fn unknown_and_malformed_frames_never_break_the_session() {
    let mut client = ChannelClient::new(ChannelScope::Discussion(42), ClientOptions::default());
    let t0 = Instant::now();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();

    let updates = feed(&mut client, t0, &json!({"type": "cart.updated", "items": [1]}));
    assert!(updates.is_empty());

    let actions = client
        .handle(ClientEvent::FrameReceived { text: "{not json".to_string(), now: t0 })
        .unwrap();
    assert!(actions.is_empty());

    // The session is still fully live.
    assert_eq!(client.status(), ConnectionStatus::Open);
    let updates =
        feed(&mut client, t0, &json!({"type": "message.new", "message": message_json(1, "a")}));
    assert_eq!(updates.len(), 1);
}

#[test]
fn server_error_event_surfaces_without_closing() {
    let mut client = ChannelClient::new(ChannelScope::Discussion(42), ClientOptions::default());
    let t0 = Instant::now();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();

    let updates = feed(&mut client, t0, &json!({"type": "error", "message": "rate limited"}));
    assert_eq!(updates, vec![ChannelUpdate::ServerError("rate limited".to_string())]);
    assert_eq!(client.status(), ConnectionStatus::Open);
}
