//! Chunk-boundary invariance for the swr-decoder crate.
//!
//! Feeding a module in pieces must produce the same result as decoding the
//! whole buffer, wherever the pieces are cut.

use proptest::prelude::*;
use swr_decoder::{decode_module, Module, Status, StreamingDecoder};

const MODULE: &str = r#"
(module
  (import "env" "print" (func $print (param i32 i32)))
  (import "env" "memory" (memory 1))
  (global $base (mut i32) (i32.const 1024))
  (global $pi f64 (f64.const 3.141592653589793))
  (func $greet (export "greet") (result i64)
    (local i32 i64 i64)
    (local.set 0 (i32.const 0xDEADBEEF))
    (block $exit
      (loop $again
        (br_if $exit (i32.eqz (local.get 0)))
        (local.set 0 (i32.sub (local.get 0) (i32.const 1)))
        (br_table 0 1 0 (local.get 0))))
    (if (result i64) (i32.const 1)
      (then (i64.const -9223372036854775808))
      (else (i64.const 9223372036854775807))))
  (func (export "store") (param i32 f32)
    (f32.store offset=8 (local.get 0) (local.get 1))
    (drop (memory.grow (i32.const 1))))
  (data (i32.const 0) "streaming decoder test payload")
  (data (i32.const 64) "\00\01\02\03\04\05\06\07")
)
"#;

fn module_bytes() -> Vec<u8> {
    wat::parse_str(MODULE).unwrap()
}

fn decode_in_chunks(bytes: &[u8], sizes: &[usize]) -> Module {
    let mut decoder = StreamingDecoder::default();
    let mut rest = bytes;
    let mut sizes = sizes.iter().cycle();
    while !rest.is_empty() {
        let size = (*sizes.next().unwrap()).min(rest.len());
        let (chunk, tail) = rest.split_at(size);
        decoder.feed(chunk).unwrap();
        rest = tail;
    }
    decoder.finish().unwrap()
}

#[test]
fn test_byte_at_a_time_matches_whole_buffer() {
    let bytes = module_bytes();
    let whole = decode_module(&bytes).unwrap();
    assert_eq!(decode_in_chunks(&bytes, &[1]), whole);
}

#[test]
fn test_every_single_split_point() {
    let bytes = module_bytes();
    let whole = decode_module(&bytes).unwrap();
    for split in 1..bytes.len() {
        let mut decoder = StreamingDecoder::default();
        decoder.feed(&bytes[..split]).unwrap();
        decoder.feed(&bytes[split..]).unwrap();
        assert_eq!(decoder.finish().unwrap(), whole, "split at {split}");
    }
}

#[test]
fn test_status_after_last_chunk() {
    let bytes = module_bytes();
    let mut decoder = StreamingDecoder::default();
    assert_eq!(decoder.feed(&bytes[..bytes.len() - 1]).unwrap(), Status::NeedMoreInput);
    assert_eq!(decoder.feed(&bytes[bytes.len() - 1..]).unwrap(), Status::SectionBoundary);
    assert_eq!(decoder.bytes_received(), bytes.len() as u64);
}

#[test]
fn test_incomplete_stream_fails_to_finish() {
    let bytes = module_bytes();
    let mut decoder = StreamingDecoder::default();
    decoder.feed(&bytes[..bytes.len() / 2]).unwrap();
    assert!(decoder.finish().is_err());
}

#[test]
fn test_empty_chunks_are_harmless() {
    let bytes = module_bytes();
    let mut decoder = StreamingDecoder::default();
    decoder.feed(&[]).unwrap();
    decoder.feed(&bytes).unwrap();
    decoder.feed(&[]).unwrap();
    assert_eq!(decoder.finish().unwrap(), decode_module(&bytes).unwrap());
}

proptest! {
    #[test]
    fn prop_any_partition_decodes_identically(
        sizes in prop::collection::vec(1usize..48, 1..24)
    ) {
        let bytes = module_bytes();
        let whole = decode_module(&bytes).unwrap();
        prop_assert_eq!(decode_in_chunks(&bytes, &sizes), whole);
    }
}
