//! Performance benchmarks for status decoding and battery estimation.
//!
//! Status pushes are decoded on the transport's delivery path, so decoding
//! must stay far below the cost of the I/O that produced the report.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench decode_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sesame_core::DeviceVariant;
use sesame_protocol::{CalibrationCurve, RawStatusReport, StatusDecoder};
use std::hint::black_box;

/// Lock report: ADC 811 (~5.7 V), position 32, both flags set.
const LOCK_REPORT_HEX: &str = "2b03000020000006";

/// Benchmark decoding a report for each variant.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    let report = RawStatusReport::from_hex(LOCK_REPORT_HEX).unwrap();

    for variant in DeviceVariant::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(variant), &variant, |b, &variant| {
            b.iter(|| {
                let status = StatusDecoder::decode(black_box(&report), variant).unwrap();
                black_box(status);
            });
        });
    }

    group.finish();
}

/// Benchmark decoding straight from the hex wire form.
fn bench_decode_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_hex");
    group.throughput(Throughput::Elements(1));

    group.bench_function("decode_hex_lock", |b| {
        b.iter(|| {
            let status =
                StatusDecoder::decode_hex(black_box(LOCK_REPORT_HEX), DeviceVariant::Lock).unwrap();
            black_box(status);
        });
    });

    group.finish();
}

/// Benchmark the estimator across the full ADC range.
fn bench_estimate_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_sweep");
    group.throughput(Throughput::Elements(1024));

    let curve = CalibrationCurve::for_variant(DeviceVariant::Lock);
    let voltages: Vec<f64> = (0..1024u16)
        .map(|adc| f64::from(adc) * 7.2 / 1023.0)
        .collect();

    group.bench_function("lock_curve_1024", |b| {
        b.iter(|| {
            let total: f64 = voltages.iter().map(|&v| curve.estimate(black_box(v))).sum();
            black_box(total);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_decode_hex, bench_estimate_sweep);

criterion_main!(benches);
