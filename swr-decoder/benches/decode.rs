//! Whole-buffer versus chunked decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use swr_decoder::{decode_module, StreamingDecoder};

/// Module with enough functions and data to make section decoding visible
fn bench_module() -> Vec<u8> {
    let mut text = String::from("(module (memory 1)\n");
    for i in 0..200 {
        text.push_str(&format!(
            "(func (export \"f{i}\") (param i32) (result i32)
               (local i32 i64 f64)
               (block (result i32)
                 (loop
                   (br_if 1 (i32.eqz (local.get 0)))
                   (local.set 0 (i32.sub (local.get 0) (i32.const {i}))))
                 (i32.load offset=16 (local.get 0))))\n"
        ));
    }
    text.push_str("(data (i32.const 0) \"");
    text.push_str(&"x".repeat(4096));
    text.push_str("\"))");
    wat::parse_str(&text).unwrap()
}

fn benchmark_whole_buffer(c: &mut Criterion) {
    let bytes = bench_module();
    c.bench_function("decode_whole_buffer", |b| {
        b.iter(|| black_box(decode_module(black_box(&bytes)).unwrap()));
    });
}

fn benchmark_chunked(c: &mut Criterion) {
    let bytes = bench_module();
    let mut group = c.benchmark_group("decode_chunked");
    for chunk_size in [1usize, 64, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &chunk_size, |b, &size| {
            b.iter(|| {
                let mut decoder = StreamingDecoder::default();
                for chunk in bytes.chunks(size) {
                    decoder.feed(black_box(chunk)).unwrap();
                }
                black_box(decoder.finish().unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_whole_buffer, benchmark_chunked);
criterion_main!(benches);
