//! End-to-end split benchmarks: parse, cluster, partition and zip.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ledgersplit::{HeaderPreset, Splitter, SplitterConfig};

/// Generate a payments CSV with `rows` rows spread over `accountants`
/// accountants, every third row spelled in lower case.
fn generate_payments(rows: usize, accountants: usize) -> String {
    let mut data = HeaderPreset::English.headers().join(",");
    data.push_str(",Accountant\n");

    for row in 0..rows {
        let accountant = format!("Accountant Number {}", row % accountants);
        let accountant = if row % 3 == 0 {
            accountant.to_lowercase()
        } else {
            accountant
        };
        data.push_str(&format!(
            "2024-{:02},2024-{:02}-{:02},Business {},First,Last,a@b.c,050-0000000,Sale,Card,{:.2},{:.2},{:.2},{:.2},Service {},{}\n",
            (row % 12) + 1,
            (row % 12) + 1,
            (row % 28) + 1,
            row % 50,
            row as f64 * 1.5,
            row as f64 * 0.02,
            row as f64 * 0.17,
            row as f64 * 1.31,
            row,
            accountant
        ));
    }

    data
}

/// Benchmark the whole pipeline as row count grows.
fn bench_split_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_rows");
    let splitter = Splitter::new(SplitterConfig::default()).unwrap();

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_payments(*rows, 40);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| black_box(splitter.split_bytes(data.as_bytes(), "bench.csv").unwrap()))
        });
    }

    group.finish();
}

/// Benchmark the pipeline as the accountant count grows.
fn bench_split_accountants(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_accountants");
    let splitter = Splitter::new(SplitterConfig::default()).unwrap();

    for accountants in [10, 100, 400].iter() {
        let data = generate_payments(5_000, *accountants);

        group.bench_with_input(
            BenchmarkId::new("accountants", accountants),
            &data,
            |b, data| {
                b.iter(|| black_box(splitter.split_bytes(data.as_bytes(), "bench.csv").unwrap()))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_split_rows, bench_split_accountants);
criterion_main!(benches);
