#![allow(missing_docs)]
//! Benchmarks for Aleph sequential decoding and ISO 2709 encoding.
//!
//! Inputs are generated in memory so the suite needs no fixture files.

use alephmarc::{
    encode_record, AlephSequentialEncoder, AlephSequentialReader, Charset, MarcReader,
    RecordEncoder,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;

/// Sequential text for `count` typical bibliographic records.
fn generate_sequential(count: usize) -> Vec<u8> {
    let mut text = String::new();
    for n in 1..=count {
        text.push_str(&format!("{n:09} LDR   L 00000nam^a2200000^a^4500\n"));
        text.push_str(&format!("{n:09} 001   L {n:09}\n"));
        text.push_str(&format!("{n:09} 008   L 950101s1995^^^^xxu^^^^^^^^^^^000^0^eng^d\n"));
        text.push_str(&format!("{n:09} 1001  L $$aAuthor, Example$$d1900-1980.\n"));
        text.push_str(&format!(
            "{n:09} 24510 L $$aTitle number {n} :$$bwith a subtitle /$$cby Example Author.\n"
        ));
        text.push_str(&format!("{n:09} 260   L $$aNew York :$$bPublisher,$$c1995.\n"));
        text.push_str(&format!("{n:09} 650 0 L $$aBibliography$$xHistory.\n"));
    }
    text.into_bytes()
}

fn encode_all(input: &[u8]) -> Vec<u8> {
    let mut reader = AlephSequentialReader::new(Cursor::new(input));
    let mut output = Vec::new();
    while let Ok(Some(record)) = reader.read_record() {
        if let Ok(bytes) = encode_record(&record, Charset::utf8()) {
            output.extend(bytes);
        }
    }
    output
}

fn benchmark_decode_1k(c: &mut Criterion) {
    let input = generate_sequential(1_000);

    c.bench_function("decode_sequential_1k", |b| {
        b.iter(|| {
            let mut reader = AlephSequentialReader::new(Cursor::new(black_box(&input[..])));
            let mut count = 0;
            while let Ok(Some(_record)) = reader.read_record() {
                count += 1;
            }
            count
        });
    });
}

fn benchmark_convert_1k(c: &mut Criterion) {
    let input = generate_sequential(1_000);

    c.bench_function("convert_sequential_to_iso2709_1k", |b| {
        b.iter(|| encode_all(black_box(&input)).len());
    });
}

fn benchmark_convert_10k(c: &mut Criterion) {
    let input = generate_sequential(10_000);

    c.bench_function("convert_sequential_to_iso2709_10k", |b| {
        b.iter(|| encode_all(black_box(&input)).len());
    });
}

fn benchmark_reverse_1k(c: &mut Criterion) {
    let binary = encode_all(&generate_sequential(1_000));

    c.bench_function("convert_iso2709_to_sequential_1k", |b| {
        b.iter(|| {
            let mut reader = MarcReader::new(Cursor::new(black_box(&binary[..])));
            let mut encoder = AlephSequentialEncoder::default();
            let mut text = Vec::new();
            while let Ok(Some(record)) = reader.read_record() {
                if let Ok(bytes) = encoder.encode(&record) {
                    text.extend(bytes);
                }
            }
            text.len()
        });
    });
}

criterion_group!(
    benches,
    benchmark_decode_1k,
    benchmark_convert_1k,
    benchmark_convert_10k,
    benchmark_reverse_1k,
);
criterion_main!(benches);
