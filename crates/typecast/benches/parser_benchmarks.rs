//! Parser performance benchmarks.
//!
//! Measures ingestion performance across different file sizes and formats.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Write;
use tempfile::NamedTempFile;
use typecast::input::Parser;

/// Generate synthetic delimited data with the specified number of rows and columns.
fn generate_data(rows: usize, cols: usize, delimiter: char) -> String {
    let mut data = String::new();

    // Header row
    for i in 0..cols {
        if i > 0 {
            data.push(delimiter);
        }
        data.push_str(&format!("column_{}", i + 1));
    }
    data.push('\n');

    // Data rows
    for row in 0..rows {
        for col in 0..cols {
            if col > 0 {
                data.push(delimiter);
            }
            // Mix of data types
            match col % 6 {
                0 => data.push_str(&format!("ID_{:06}", row)),
                1 => data.push_str(&format!("{:.2}", row as f64 * 1.5)),
                2 => data.push_str(&format!("{:02}/{:02}/2023", (row % 28) + 1, (row % 12) + 1)),
                3 => data.push_str(if row % 2 == 0 { "yes" } else { "no" }),
                4 => data.push_str(&format!("Category_{}", row % 10)),
                5 => data.push_str(&format!("{} days 01:00:00", row % 30)),
                _ => unreachable!(),
            }
        }
        data.push('\n');
    }

    data
}

/// Benchmark parsing CSV files of various sizes from disk.
fn bench_parse_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_csv");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_data(*rows, 12, ',');
        let bytes = data.len();

        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter_with_setup(
                || {
                    let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
                    temp.write_all(data.as_bytes()).unwrap();
                    temp
                },
                |temp| {
                    let parser = Parser::new();
                    black_box(parser.parse_file(temp.path()).unwrap())
                },
            )
        });
    }

    group.finish();
}

/// Benchmark parsing an in-memory upload, as the HTTP surface does.
fn bench_parse_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_bytes");

    for rows in [1_000, 10_000, 50_000].iter() {
        let data = generate_data(*rows, 12, ',');

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            let parser = Parser::new();
            b.iter(|| black_box(parser.parse_bytes("upload.csv", data.as_bytes()).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark parsing with varying column counts.
fn bench_parse_column_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_column_scaling");

    let rows = 1_000;
    for cols in [6, 12, 24, 48].iter() {
        let data = generate_data(rows, *cols, '\t');

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("cols", cols), &data, |b, data| {
            let parser = Parser::new();
            b.iter(|| black_box(parser.parse_bytes("upload.csv", data.as_bytes()).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_csv,
    bench_parse_bytes,
    bench_parse_column_scaling,
);
criterion_main!(benches);
