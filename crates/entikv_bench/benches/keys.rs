//! Key encoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use entikv_core::keys::{instance_key, scope_range, unique_label_key, validate_id, validate_label};
use entikv_core::new_id;

fn bench_key_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("keys");
    let id = new_id();
    let parent_id = new_id();

    group.bench_function("instance_top_level", |b| {
        b.iter(|| black_box(instance_key(black_box("wc"), black_box(&id), None)));
    });

    group.bench_function("instance_child", |b| {
        b.iter(|| {
            black_box(instance_key(
                black_box("w"),
                black_box(&id),
                Some(("wc", black_box(&parent_id))),
            ))
        });
    });

    group.bench_function("unique_label_child", |b| {
        b.iter(|| {
            black_box(unique_label_key(
                black_box("w"),
                Some(("wc", black_box(&parent_id))),
                black_box("a reasonably long label"),
            ))
        });
    });

    group.bench_function("scope_range_child", |b| {
        b.iter(|| black_box(scope_range(black_box("w"), Some(("wc", black_box(&parent_id))))));
    });

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let id = new_id();

    group.bench_function("id", |b| {
        b.iter(|| validate_id(black_box(&id)).is_ok());
    });

    group.bench_function("label", |b| {
        b.iter(|| validate_label(black_box("a reasonably long label")).is_ok());
    });

    group.bench_function("new_id", |b| {
        b.iter(|| black_box(new_id()));
    });

    group.finish();
}

criterion_group!(benches, bench_key_encoding, bench_validation);
criterion_main!(benches);
