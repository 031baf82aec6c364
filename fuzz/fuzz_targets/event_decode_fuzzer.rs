//! Fuzz target for inbound frame decoding
//!
//! # Strategy
//!
//! - Raw bytes: completely arbitrary frame text (general malformation)
//! - Near-miss JSON: valid JSON with a mutated `type` discriminator
//!
//! # Invariants
//!
//! - NEVER panic on malformed frames
//! - Unknown `type` values decode to the Unknown kind, not an error

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use talkwire_proto::ServerEvent;

#[derive(Debug, Arbitrary)]
enum FrameInput {
    RawBytes(Vec<u8>),
    TaggedObject { kind: String, extra_key: String, extra_value: u64 },
}

fuzz_target!(|input: FrameInput| {
    let text = match input {
        FrameInput::RawBytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return,
        },
        FrameInput::TaggedObject { kind, extra_key, extra_value } => {
            serde_json::json!({"type": kind, extra_key: extra_value}).to_string()
        },
    };

    // Decoding must never panic; any outcome is acceptable.
    let _ = ServerEvent::decode(&text);
});
