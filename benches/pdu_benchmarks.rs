// ABOUTME: Benchmark suite for the SMS-SUBMIT PDU encoder
// ABOUTME: Measures encoding cost across message sizes and both data coding schemes

use atsms::command::encode_body;
use atsms::pdu::{Encoder, gsm7};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

const ADDRESS: &str = "+15551234567";

fn bench_encode(c: &mut Criterion) {
    let encoder = Encoder::new().with_reference(1);

    let mut group = c.benchmark_group("encode");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("gsm7_short", |b| {
        b.iter(|| encoder.encode(black_box(ADDRESS), black_box("Hello World")))
    });

    group.bench_function("ucs2_short", |b| {
        b.iter(|| encoder.encode(black_box(ADDRESS), black_box("Привет, мир")))
    });

    group.finish();
}

fn bench_message_sizes(c: &mut Criterion) {
    let encoder = Encoder::new().with_reference(1);
    let mut group = c.benchmark_group("message_sizes");

    for size in [10, 160, 320, 1600] {
        let text = "x".repeat(size);
        group.bench_with_input(BenchmarkId::new("gsm7", size), &text, |b, text| {
            b.iter(|| encoder.encode(black_box(ADDRESS), black_box(text)))
        });
    }

    group.finish();
}

fn bench_septet_packing(c: &mut Criterion) {
    let septets = gsm7::to_septets(&"The quick brown fox ".repeat(8)).unwrap_or_default();

    c.bench_function("gsm7_pack_160", |b| {
        b.iter(|| gsm7::pack(black_box(&septets), 0))
    });

    c.bench_function("body_framing", |b| {
        b.iter(|| encode_body(black_box("0011000B915155214365F70000AA02C834")))
    });
}

criterion_group!(benches, bench_encode, bench_message_sizes, bench_septet_packing);
criterion_main!(benches);
