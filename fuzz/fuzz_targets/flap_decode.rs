//! Fuzz target for FLAP frame decoding
//!
//! Feeds arbitrary byte sequences to the frame decoder to find:
//! - Parser crashes or panics
//! - Integer overflows in length handling
//! - Buffer over-reads past the claimed payload length
//!
//! The decoder should NEVER panic. All invalid inputs must return an error.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use warble_proto::FlapFrame;

fuzz_target!(|data: &[u8]| {
    let mut buf = Bytes::copy_from_slice(data);
    let _ = FlapFrame::decode(&mut buf);
});
