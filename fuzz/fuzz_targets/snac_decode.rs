//! Fuzz target for SNAC decoding
//!
//! Covers the full header + typed-body dispatch path, including every body
//! codec reachable from a `(food group, subgroup)` pair. Valid decodes are
//! re-encoded and decoded again; the round trip must be stable.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use warble_proto::SnacMessage;

fuzz_target!(|data: &[u8]| {
    let mut buf = Bytes::copy_from_slice(data);
    if let Ok(msg) = SnacMessage::decode(&mut buf) {
        let mut wire = Vec::new();
        if msg.encode(&mut wire).is_ok() {
            let mut again = Bytes::from(wire);
            let reparsed = SnacMessage::decode(&mut again)
                .unwrap_or_else(|e| unreachable!("re-decode of encoded SNAC failed: {e}"));
            assert_eq!(msg, reparsed);
        }
    }
});
