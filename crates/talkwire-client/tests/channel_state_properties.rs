//! Property-based tests for channel state reconciliation.
//!
//! All mutation flows through the public frame path, so these drive the
//! client with raw JSON frames the way a live connection would.

#![allow(clippy::unwrap_used)]

use std::time::Instant;

use proptest::prelude::*;
use serde_json::json;
use talkwire_client::{ChannelClient, ChannelScope, ClientEvent, ClientOptions};

fn open_client() -> (ChannelClient<Instant>, Instant) {
    let mut client = ChannelClient::new(ChannelScope::Discussion(1), ClientOptions::default());
    let t0 = Instant::now();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::TransportOpened { now: t0 }).unwrap();
    (client, t0)
}

fn feed(client: &mut ChannelClient<Instant>, now: Instant, frame: &serde_json::Value) {
    client.handle(ClientEvent::FrameReceived { text: frame.to_string(), now }).unwrap();
}

fn message_json(id: u64, body: &str) -> serde_json::Value {
    json!({
        "id": id,
        "channel_id": 1,
        "sender": {"id": 1, "display_name": "mo", "role": "member"},
        "body": body,
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": "2026-01-05T10:00:00Z"
    })
}

/// Property: each message id appears at most once, and the first arrival wins.
#[test]
fn prop_log_dedups_by_id_first_arrival_wins() {
    proptest!(|(ids in proptest::collection::vec(1u64..40, 0..60))| {
        let (mut client, t0) = open_client();

        for (seq, &id) in ids.iter().enumerate() {
            let frame = json!({"type": "message.new", "message": message_json(id, &format!("arrival {seq}"))});
            feed(&mut client, t0, &frame);
        }

        let mut first_arrival = Vec::new();
        for &id in &ids {
            if !first_arrival.contains(&id) {
                first_arrival.push(id);
            }
        }

        let log_ids: Vec<u64> = client.state().messages().iter().map(|m| m.id).collect();
        prop_assert_eq!(&log_ids, &first_arrival);

        for &id in &first_arrival {
            let first_seq = ids.iter().position(|&i| i == id).unwrap();
            let body = client.state().message(id).unwrap().body.clone();
            prop_assert_eq!(body, format!("arrival {first_seq}"));
        }
    });
}

/// Property: deletes never remove log entries, only flag them.
#[test]
fn prop_delete_is_soft_and_total_order_stable() {
    proptest!(|(
        ids in proptest::collection::hash_set(1u64..40, 1..20),
        deletes in proptest::collection::vec(1u64..60, 0..30),
    )| {
        let (mut client, t0) = open_client();
        for &id in &ids {
            feed(&mut client, t0, &json!({"type": "message.new", "message": message_json(id, "body")}));
        }
        let before: Vec<u64> = client.state().messages().iter().map(|m| m.id).collect();

        // Deletes of unknown ids are dropped; known ids flip the flag.
        for &id in &deletes {
            feed(&mut client, t0, &json!({"type": "message.deleted", "message_id": id}));
        }

        let after: Vec<u64> = client.state().messages().iter().map(|m| m.id).collect();
        prop_assert_eq!(&before, &after);

        for msg in client.state().messages() {
            prop_assert_eq!(msg.deleted, deletes.contains(&msg.id));
            prop_assert_eq!(&msg.body, "body");
        }
    });
}

/// Property: presence membership is idempotent under duplicate joins.
#[test]
fn prop_presence_idempotent_under_duplicate_joins() {
    proptest!(|(joins in proptest::collection::vec(1u64..20, 0..40))| {
        let (mut client, t0) = open_client();

        for &id in &joins {
            let frame = json!({
                "type": "user.joined",
                "user": {"id": id, "display_name": format!("user-{id}")}
            });
            feed(&mut client, t0, &frame);
        }

        let distinct: std::collections::HashSet<u64> = joins.iter().copied().collect();
        prop_assert_eq!(client.state().participant_count(), distinct.len());
        for &id in &distinct {
            prop_assert!(client.state().is_present(id));
        }
    });
}

/// Property: a leave always clears the user's typing entry.
#[test]
fn prop_leave_cascades_to_typing() {
    proptest!(|(id in 1u64..100, was_typing in any::<bool>())| {
        let (mut client, t0) = open_client();

        feed(&mut client, t0, &json!({
            "type": "user.joined",
            "user": {"id": id, "display_name": "x"}
        }));
        if was_typing {
            feed(&mut client, t0, &json!({
                "type": "typing.indicator",
                "user": {"id": id, "display_name": "x"},
                "is_typing": true
            }));
        }

        feed(&mut client, t0, &json!({"type": "user.left", "user_id": id}));
        prop_assert!(!client.state().is_present(id));
        prop_assert!(!client.state().is_typing(id));
    });
}

/// Property: a snapshot is a baseline, never a merge.
#[test]
fn prop_snapshot_replaces_wholesale() {
    proptest!(|(
        stale in proptest::collection::vec(1u64..30, 0..15),
        snapshot in proptest::collection::vec(30u64..60, 0..15),
    )| {
        let (mut client, t0) = open_client();
        for &id in &stale {
            feed(&mut client, t0, &json!({"type": "message.new", "message": message_json(id, "stale")}));
        }

        let mut snapshot_ids = Vec::new();
        for &id in &snapshot {
            if !snapshot_ids.contains(&id) {
                snapshot_ids.push(id);
            }
        }
        let messages: Vec<serde_json::Value> =
            snapshot_ids.iter().map(|&id| message_json(id, "fresh")).collect();
        feed(&mut client, t0, &json!({
            "type": "initial.state",
            "messages": messages,
            "participants": [{"id": 7, "display_name": "sv"}]
        }));

        let log_ids: Vec<u64> = client.state().messages().iter().map(|m| m.id).collect();
        prop_assert_eq!(log_ids, snapshot_ids);
        prop_assert_eq!(client.state().participant_count(), 1);
    });
}
