//! Fuzz target for the client state machine
//!
//! Drives the full client with arbitrary event sequences under virtual time.
//!
//! # Invariants
//!
//! - Event handling NEVER panics, whatever the ordering
//! - At most one connection is live at any point (dials and closes balance)
//! - Disconnect always lands the client in the Disconnected status

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use talkwire_client::{
    ChannelClient, ChannelScope, ClientAction, ClientEvent, ClientOptions, ConnectionStatus,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Connect,
    Disconnect,
    Opened,
    Failed,
    Closed { code: u16 },
    Frame { text: String },
    Tick { advance_ms: u16 },
    SendMessage,
    StartTyping,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut client: ChannelClient = ChannelClient::new(
        ChannelScope::Discussion(1),
        ClientOptions::default(),
    );
    let mut now = Instant::now();
    // Model of the transport: how many connections the actions leave live.
    let mut live: i64 = 0;

    for op in ops {
        let event = match op {
            Op::Connect => ClientEvent::Connect,
            Op::Disconnect => ClientEvent::Disconnect,
            Op::Opened => ClientEvent::TransportOpened { now },
            Op::Failed => {
                // A failed dial leaves nothing live.
                live = (live - 1).max(0);
                ClientEvent::TransportFailed { reason: String::new(), now }
            },
            Op::Closed { code } => {
                live = (live - 1).max(0);
                ClientEvent::TransportClosed { code, reason: String::new(), now }
            },
            Op::Frame { text } => ClientEvent::FrameReceived { text, now },
            Op::Tick { advance_ms } => {
                now += Duration::from_millis(u64::from(advance_ms));
                ClientEvent::Tick { now }
            },
            Op::SendMessage => ClientEvent::SendMessage {
                content: "x".to_string(),
                reply_to: None,
                inquiry_id: None,
            },
            Op::StartTyping => ClientEvent::StartTyping { inquiry_id: None },
        };

        let Ok(actions) = client.handle(event) else {
            continue;
        };
        for action in actions {
            match action {
                ClientAction::OpenConnection => live += 1,
                ClientAction::CloseConnection { .. } => live = (live - 1).max(0),
                _ => {},
            }
        }
        assert!(live <= 1, "more than one connection live");
    }

    client.handle(ClientEvent::Disconnect).ok();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
});
