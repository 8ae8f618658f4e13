// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Line;
use sala_core::NoComm;
use sala_shape::analysis::{self, AxialOptions, TopoMetKind, TopoMetOptions, TulipOptions};
use sala_shape::{DEFAULT_STUB_REMOVAL, ShapeGraph};

/// `n` streets each way, overhanging the last crossing by half a block.
fn street_grid(n: usize) -> Vec<Line> {
    let len = n as f64;
    let mut out = Vec::with_capacity(2 * n);
    for i in 0..n {
        let c = i as f64 + 0.5;
        out.push(Line::new((0.0, c), (len, c)));
        out.push(Line::new((c, 0.0), (c, len)));
    }
    out
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[16_usize, 48] {
        let lines = street_grid(n);
        group.throughput(Throughput::Elements(lines.len() as u64));
        group.bench_function(format!("axial_n{n}"), |b| {
            b.iter(|| {
                let g = ShapeGraph::axial_from_lines("grid", &lines, &NoComm).unwrap();
                black_box(g.map().len());
            });
        });
        let axial = ShapeGraph::axial_from_lines("grid", &lines, &NoComm).unwrap();
        group.bench_function(format!("segments_n{n}"), |b| {
            b.iter(|| {
                let g = ShapeGraph::segments_from_axial(&axial, DEFAULT_STUB_REMOVAL, &NoComm)
                    .unwrap();
                black_box(g.map().len());
            });
        });
    }
    group.finish();
}

fn bench_analyses(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_analysis");
    let lines = street_grid(24);
    let mut axial = ShapeGraph::axial_from_lines("grid", &lines, &NoComm).unwrap();
    let mut segments =
        ShapeGraph::segments_from_axial(&axial, DEFAULT_STUB_REMOVAL, &NoComm).unwrap();

    // Reruns reset their own columns, so one graph serves every iteration.
    let options = AxialOptions {
        radii: vec![-1.0, 3.0],
        choice: true,
        ..Default::default()
    };
    group.bench_function("axial_integration_choice", |b| {
        b.iter(|| analysis::axial_integration(&mut axial, &options, &NoComm).unwrap());
    });
    let options = TulipOptions {
        choice: true,
        ..Default::default()
    };
    group.bench_function("tulip_1024_choice", |b| {
        b.iter(|| analysis::segment_tulip(&mut segments, &options, &NoComm).unwrap());
    });
    let options = TopoMetOptions {
        kind: TopoMetKind::Metric,
        radii: vec![-1.0, 8.0],
        choice: true,
    };
    group.bench_function("topomet_metric_choice", |b| {
        b.iter(|| analysis::segment_topomet(&mut segments, &options, &NoComm).unwrap());
    });
    group.bench_function("segment_angular", |b| {
        b.iter(|| analysis::segment_angular(&mut segments, &[-1.0, 2.0], &NoComm).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_analyses);
criterion_main!(benches);
