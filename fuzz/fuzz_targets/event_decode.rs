//! Fuzz target for InboundEvent::decode
//!
//! This fuzzer feeds arbitrary text frames to the socket decoder to find:
//! - Parser crashes or panics
//! - Identifier coercions that do not survive a re-encode
//! - Envelopes whose data is accepted for the wrong event name
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use studybuddy_proto::InboundEvent;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let Ok(event) = InboundEvent::decode(&text) else {
        return;
    };

    // Anything accepted must encode and decode back to the same event.
    let encoded = event.encode().expect("decoded event must encode");
    let decoded = InboundEvent::decode(&encoded).expect("encoded event must decode");
    assert_eq!(decoded, event);
});
