// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Line, Point, Rect};
use sala_core::NoComm;
use sala_isovist::{BspTree, Isovist, IsovistOptions};
use sala_vga::{FillType, GraphOptions, PointMap, analysis};

/// A square room of side `size` with a partition wall part way across.
fn walls(size: f64) -> Vec<Line> {
    vec![
        Line::new((0.0, 0.0), (size, 0.0)),
        Line::new((size, 0.0), (size, size)),
        Line::new((size, size), (0.0, size)),
        Line::new((0.0, size), (0.0, 0.0)),
        Line::new((size * 0.5, 0.0), (size * 0.5, size * 0.6)),
    ]
}

fn filled_room(size: f64) -> PointMap {
    let region = Rect::new(-0.5, -0.5, size + 0.5, size + 0.5);
    let mut map = PointMap::new("bench", region, 1.0).unwrap();
    map.block_lines(&walls(size));
    map.make_points(Point::new(1.0, 1.0), FillType::Full).unwrap();
    map
}

fn bench_make_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_graph");
    for &size in &[16.0, 32.0] {
        let room = filled_room(size);
        group.throughput(Throughput::Elements(room.filled_point_count() as u64));
        group.bench_function(format!("room_{size}"), |b| {
            b.iter_batched(
                || room.clone(),
                |mut map| {
                    map.make_graph(&GraphOptions::default(), &NoComm).unwrap();
                    black_box(map.filled_point_count());
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_analyses(c: &mut Criterion) {
    let mut group = c.benchmark_group("vga");
    let mut room = filled_room(24.0);
    room.make_graph(&GraphOptions::default(), &NoComm).unwrap();
    group.bench_function("visual_global", |b| {
        b.iter(|| {
            analysis::visual_global(&mut room, &Default::default(), &NoComm).unwrap();
        });
    });
    group.bench_function("metric_global", |b| {
        b.iter(|| {
            analysis::metric_global(&mut room, &Default::default(), &NoComm).unwrap();
        });
    });
    group.finish();
}

fn bench_isovist(c: &mut Criterion) {
    let tree = BspTree::build(walls(32.0).into_iter().zip(0..));
    let options = IsovistOptions::default();
    c.bench_function("isovist_32", |b| {
        b.iter(|| {
            let iso = Isovist::compute(&tree, Point::new(8.0, 20.0), &options);
            black_box(iso.stats());
        });
    });
}

criterion_group!(benches, bench_make_graph, bench_analyses, bench_isovist);
criterion_main!(benches);
