// Performance benchmarks for the fill pipeline
//
// Run benchmarks with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use docfill::pdf_generator::{PageLayout, render_text};
use docfill::placeholder::{scan, substitute};
use std::collections::BTreeMap;

fn template(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Clause {}: {{{{Party{}}}}} agrees with {{{{Name}}}}.\n", i, i % 10))
        .collect()
}

fn values() -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = (0..10)
        .map(|i| (format!("Party{}", i), format!("Party number {}", i)))
        .collect();
    values.insert("Name".to_string(), "Ann Example".to_string());
    values
}

/// Benchmark placeholder scanning
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for lines in [10, 100, 1000] {
        let text = template(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &text, |b, text| {
            b.iter(|| scan(black_box(text)))
        });
    }
    group.finish();
}

/// Benchmark substitution
fn bench_substitute(c: &mut Criterion) {
    let text = template(1000);
    let values = values();
    c.bench_function("substitute_1000_lines", |b| {
        b.iter(|| substitute(black_box(&text), black_box(&values)))
    });
}

/// Benchmark PDF rendering of filled text
fn bench_render(c: &mut Criterion) {
    let layout = PageLayout::a4();
    let mut group = c.benchmark_group("render_text");
    for lines in [10, 100, 1000] {
        let filled = substitute(&template(lines), &values());
        group.bench_with_input(BenchmarkId::from_parameter(lines), &filled, |b, filled| {
            b.iter(|| render_text(black_box(filled), &layout))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan, bench_substitute, bench_render);
criterion_main!(benches);
