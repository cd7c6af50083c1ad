//! Fuzz target for TLV block decoding
//!
//! Exercises all three block shapes (rest, counted, length-prefixed) against
//! arbitrary input. Count and length prefixes are attacker-controlled, so
//! over-allocation and over-read bugs would surface here first.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use warble_proto::TlvBlock;

fuzz_target!(|data: &[u8]| {
    let mut rest = Bytes::copy_from_slice(data);
    let _ = TlvBlock::decode_rest(&mut rest);

    let mut counted = Bytes::copy_from_slice(data);
    let _ = TlvBlock::decode_counted(&mut counted);

    let mut len_prefixed = Bytes::copy_from_slice(data);
    let _ = TlvBlock::decode_len_prefixed(&mut len_prefixed);
});
