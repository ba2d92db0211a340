//! Fuzz target for capture file decoding
//!
//! # Invariants
//!
//! - Arbitrary bytes decode to entries or a `Decode` error
//! - Decoded entries re-encode and decode to the same entries
//! - NEVER panic on malformed CBOR

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaymirror_replay::{ReplayError, read_capture, write_capture};

fuzz_target!(|data: &[u8]| {
    match read_capture(data) {
        Ok(entries) => {
            let mut bytes = Vec::new();
            write_capture(&mut bytes, &entries).expect("decoded entries re-encode");
            let again = read_capture(bytes.as_slice()).expect("re-encoded entries decode");
            assert_eq!(entries, again);
        },
        Err(ReplayError::Decode { .. }) => {},
        Err(other) => panic!("unexpected error: {other}"),
    }
});
