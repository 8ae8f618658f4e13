// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility graph of a room with a partition.
//!
//! Rasterize walls, fill the open space, build the graph, then run global, local and
//! step-depth analyses and print a few values.
//!
//! Run:
//! - `cargo run -p sala_demos --example vga_room`
//! - `RUST_LOG=debug cargo run -p sala_demos --example vga_room` for analysis logs

use kurbo::{Line, Point, Rect};
use sala_core::NoComm;
use sala_vga::analysis::{self, StepDepthKind, VgaOptions};
use sala_vga::{FillType, GraphOptions, PointMap};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut map = PointMap::new("room", Rect::new(-0.5, -0.5, 20.5, 12.5), 1.0).unwrap();
    map.block_lines(&[
        Line::new((0.0, 0.0), (20.0, 0.0)),
        Line::new((20.0, 0.0), (20.0, 12.0)),
        Line::new((20.0, 12.0), (0.0, 12.0)),
        Line::new((0.0, 12.0), (0.0, 0.0)),
        // Partition with a doorway at the top.
        Line::new((10.0, 0.0), (10.0, 8.0)),
    ]);
    let filled = map.make_points(Point::new(2.0, 2.0), FillType::Full).unwrap();
    println!("filled {filled} points");

    let built = map.make_graph(&GraphOptions::default(), &NoComm).unwrap();
    println!("graph columns: {:?}", built.new_columns);

    let options = VgaOptions::default();
    analysis::visual_global(&mut map, &options, &NoComm).unwrap();
    analysis::visual_local(&mut map, &options, &NoComm).unwrap();

    let left = map.pixelate(Point::new(3.0, 3.0), false).unwrap();
    let right = map.pixelate(Point::new(17.0, 3.0), false).unwrap();
    map.set_selected(left, true);
    analysis::step_depth(&mut map, StepDepthKind::Visual, &NoComm).unwrap();

    let table = map.attributes();
    for name in ["Visual Integration [HH]", "Visual Mean Depth", "Visual Control"] {
        let col = table.column_index(name).unwrap();
        println!(
            "{name}: left {:.3}, right {:.3}",
            table.value(left.key(), col),
            table.value(right.key(), col)
        );
    }
    let steps = table.column_index("Visual Step Depth").unwrap();
    let depth = table.value(right.key(), steps);
    println!("steps from left to right room: {depth}");
    assert!(depth >= 2.0, "the partition should hide the right room");
}
