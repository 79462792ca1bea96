//! Fuzz harness for the evidence-pack reader.
//!
//! The reader is the engine's untrusted-input boundary: arbitrary bytes
//! must produce either a parsed pack or a structural `PackError`, never a
//! panic. This target exercises the gzip/tar/JSON layers with malformed
//! archives, truncated streams, and pathological entry paths.

#![no_main]
use libfuzzer_sys::fuzz_target;
use seal_core::pack::read_pack;

fuzz_target!(|data: &[u8]| {
    let _ = read_pack(data);
});
