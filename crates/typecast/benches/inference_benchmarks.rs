//! Inference pipeline performance benchmarks.
//!
//! Measures column classification and end-to-end chunked inference.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use typecast::inference::{ColumnClassifier, InferenceJobConfig};
use typecast::schema::Column;
use typecast::{Dataset, Engine, EngineConfig};

/// One text column per cascade outcome.
fn generate_columns(rows: usize) -> Vec<Column> {
    let column = |name: &str, f: &dyn Fn(usize) -> String| {
        let values: Vec<String> = (0..rows).map(f).collect();
        Column::from_text(name, &values)
    };

    vec![
        column("flag", &|i| if i % 2 == 0 { "yes".into() } else { "no".into() }),
        column("level", &|i| format!("level_{}", i % 7)),
        column("amount", &|i| format!("{}.{}", i, i % 10)),
        column("joined", &|i| format!("{:02}/{:02}/{}", i % 28 + 1, i % 12 + 1, 2000 + i % 25)),
        column("z", &|i| format!("{}+{}j", i, i % 13)),
        column("wait", &|i| format!("{} days {:02}:00:00", i, i % 24)),
        column("note", &|i| format!("free text entry {i}")),
    ]
}

/// Benchmark classifying one column of each kind.
fn bench_classify_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_column");
    let config = InferenceJobConfig::default();
    let classifier = ColumnClassifier::new(&config);

    for column in generate_columns(10_000) {
        group.throughput(Throughput::Elements(column.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("column", column.name.clone()),
            &column,
            |b, column| b.iter(|| black_box(classifier.classify(column))),
        );
    }

    group.finish();
}

/// Benchmark the full chunked pipeline as rows grow past the chunk threshold.
fn bench_chunked_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_inference");
    group.sample_size(10);

    for rows in [5_000, 20_000, 100_000].iter() {
        let dataset = Dataset::new(generate_columns(*rows)).unwrap();
        let engine = Engine::with_config(EngineConfig::default());

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &dataset, |b, dataset| {
            b.iter_with_setup(
                || dataset.clone(),
                |dataset| black_box(engine.infer_dataset(dataset).unwrap()),
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify_column, bench_chunked_inference);
criterion_main!(benches);
