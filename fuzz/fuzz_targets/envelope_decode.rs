//! Fuzz target for Envelope::decode
//!
//! Feeds arbitrary bytes through the envelope decoder and, when decoding
//! succeeds, through the typed payload extractors. Server frames are
//! untrusted input: malformed JSON, wrong shapes, and unknown event names
//! must all come back as errors, never as panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pinge_proto::{DirectMessagePush, Envelope, GroupMessagePush};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding must only ever return Err for invalid frames.
    let Ok(envelope) = Envelope::decode(text) else {
        return;
    };

    // Payload extraction on a decoded envelope must also never panic,
    // whatever the data section holds.
    let _ = envelope.payload::<DirectMessagePush>();
    let _ = envelope.payload::<GroupMessagePush>();
});
