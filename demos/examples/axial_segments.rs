// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axial and segment analysis of a small street grid.
//!
//! Build an axial map from street centre lines, cut it into segments, then compare axial
//! integration with tulip angular integration and metric choice.
//!
//! Run:
//! - `cargo run -p sala_demos --example axial_segments`

use kurbo::Line;
use sala_core::{NoComm, RadiusType};
use sala_shape::analysis::{self, AxialOptions, TopoMetKind, TopoMetOptions, TulipOptions};
use sala_shape::{DEFAULT_STUB_REMOVAL, ShapeGraph};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // A high street, two cross streets and a back lane.
    let streets = [
        Line::new((0.0, 50.0), (200.0, 50.0)),
        Line::new((40.0, 0.0), (40.0, 100.0)),
        Line::new((150.0, 0.0), (150.0, 100.0)),
        Line::new((40.0, 90.0), (150.0, 90.0)),
    ];
    let mut axial = ShapeGraph::axial_from_lines("town", &streets, &NoComm).unwrap();
    let options = AxialOptions {
        radii: vec![-1.0, 2.0],
        choice: true,
        ..Default::default()
    };
    analysis::axial_integration(&mut axial, &options, &NoComm).unwrap();
    analysis::axial_local(&mut axial, &NoComm).unwrap();
    let table = axial.attributes();
    let hh = table.column_index("Integration [HH]").unwrap();
    let choice = table.column_index("Choice").unwrap();
    for (r, shape) in axial.map().iter() {
        println!(
            "axial {r} ({:.0} long): integration {:.3}, choice {}",
            shape.length(),
            table.value(r, hh),
            table.value(r, choice)
        );
    }

    let mut segments =
        ShapeGraph::segments_from_axial(&axial, DEFAULT_STUB_REMOVAL, &NoComm).unwrap();
    println!("{} segments", segments.map().len());
    let tulip = TulipOptions {
        radii: vec![-1.0, 120.0],
        radius_type: RadiusType::Metric,
        choice: true,
        ..Default::default()
    };
    analysis::segment_tulip(&mut segments, &tulip, &NoComm).unwrap();
    let metric = TopoMetOptions {
        kind: TopoMetKind::Metric,
        choice: true,
        ..Default::default()
    };
    analysis::segment_topomet(&mut segments, &metric, &NoComm).unwrap();

    let table = segments.attributes();
    let integration = table.column_index("T1024 Integration").unwrap();
    let local = table.column_index("T1024 Node Count R120 metric").unwrap();
    let choice = table.column_index("Metric Choice").unwrap();
    for (r, _) in segments.map().iter() {
        println!(
            "segment {r}: angular integration {:.3}, reach within 120 {}, metric choice {}",
            table.value(r, integration),
            table.value(r, local),
            table.value(r, choice)
        );
    }
}
