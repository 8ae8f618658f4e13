// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Isovists from a few standpoints in an L-shaped room.
//!
//! Run:
//! - `cargo run -p sala_demos --example isovist_view`

use std::f64::consts::PI;

use kurbo::{Line, Point};
use sala_isovist::{BspTree, Isovist, IsovistOptions};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let walls = [
        Line::new((0.0, 0.0), (20.0, 0.0)),
        Line::new((20.0, 0.0), (20.0, 8.0)),
        Line::new((20.0, 8.0), (8.0, 8.0)),
        Line::new((8.0, 8.0), (8.0, 20.0)),
        Line::new((8.0, 20.0), (0.0, 20.0)),
        Line::new((0.0, 20.0), (0.0, 0.0)),
    ];
    let tree = BspTree::build(walls.iter().copied().zip(0..));
    println!("bsp holds {} lines", tree.len());

    let full = IsovistOptions::default();
    // Looking east only.
    let window = IsovistOptions {
        start_angle: -PI / 4.0,
        end_angle: PI / 4.0,
        ..Default::default()
    };
    for (label, centre) in [
        ("corner", Point::new(4.0, 4.0)),
        ("east wing", Point::new(16.0, 4.0)),
        ("north wing", Point::new(4.0, 16.0)),
    ] {
        let stats = Isovist::compute(&tree, centre, &full).stats();
        let east = Isovist::compute(&tree, centre, &window).stats();
        println!(
            "{label}: area {:.1}, perimeter {:.1}, drift {:.2} at {:.0} deg, east area {:.1}",
            stats.area, stats.perimeter, stats.drift_magnitude, stats.drift_angle, east.area
        );
    }
}
