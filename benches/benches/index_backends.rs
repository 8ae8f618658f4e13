// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sala_index::{Aabb2D, Index, Segment};

/// `n` horizontal and `n` vertical walls, one unit apart.
fn street_grid(n: usize) -> Vec<Segment> {
    let len = n as f64;
    let mut out = Vec::with_capacity(2 * n);
    for i in 0..n {
        let c = i as f64 + 0.5;
        out.push(Segment::new(0.0, c, len, c));
        out.push(Segment::new(c, 0.0, c, len));
    }
    out
}

fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat");
    for &n in &[32_usize, 128] {
        let segs = street_grid(n);
        group.throughput(Throughput::Elements(segs.len() as u64));
        group.bench_function(format!("insert_query_segments_n{n}"), |b| {
            b.iter_batched(
                Index::<u32>::new,
                |mut idx| {
                    for (i, s) in segs.iter().enumerate() {
                        idx.insert_segment(*s, i as u32);
                    }
                    let hits: usize = (0..n)
                        .map(|i| idx.query_point(i as f64 + 0.5, 3.5).count())
                        .sum();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    for &n in &[32_usize, 128] {
        let segs = street_grid(n);
        let cell = n as f64 / 64.0;
        group.throughput(Throughput::Elements(segs.len() as u64));
        group.bench_function(format!("insert_query_segments_n{n}"), |b| {
            b.iter_batched(
                || Index::<u32>::with_uniform_grid(cell, cell, 0.0, 0.0),
                |mut idx| {
                    for (i, s) in segs.iter().enumerate() {
                        idx.insert_segment(*s, i as u32);
                    }
                    let hits: usize = (0..n)
                        .map(|i| idx.query_point(i as f64 + 0.5, 3.5).count())
                        .sum();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            );
        });
        let mut idx = Index::<u32>::with_uniform_grid(cell, cell, 0.0, 0.0);
        for (i, s) in segs.iter().enumerate() {
            idx.insert_segment(*s, i as u32);
        }
        group.bench_function(format!("query_rect_n{n}"), |b| {
            b.iter(|| {
                let hits = idx.query_rect(Aabb2D::new(2.0, 2.0, 6.0, 6.0)).count();
                black_box(hits);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flat, bench_grid);
criterion_main!(benches);
