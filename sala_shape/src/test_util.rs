// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Line, Point};
use sala_core::NoComm;

use crate::graph::{DEFAULT_STUB_REMOVAL, MapKind, ShapeGraph};
use crate::shape::SalaShape;

pub(crate) fn l(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
    Line::new((x0, y0), (x1, y1))
}

/// One horizontal line with two verticals through it.
pub(crate) fn comb() -> Vec<Line> {
    vec![
        l(0.0, 0.0, 10.0, 0.0),
        l(2.0, -3.0, 2.0, 3.0),
        l(8.0, -3.0, 8.0, 3.0),
    ]
}

/// Segments of [`comb`]: 0 runs (2,0)→(8,0); 1 and 2 run up the left vertical from
/// (2,-3); 3 and 4 run up the right vertical from (8,-3).
pub(crate) fn comb_segments() -> ShapeGraph {
    let axial = ShapeGraph::axial_from_lines("comb", &comb(), &NoComm).unwrap();
    ShapeGraph::segments_from_axial(&axial, DEFAULT_STUB_REMOVAL, &NoComm).unwrap()
}

/// `n` lines in a zigzag, each touching only the next.
pub(crate) fn zigzag(n: usize) -> ShapeGraph {
    let lines: Vec<Line> = (0..n)
        .map(|i| {
            let x = i as f64;
            if i % 2 == 0 {
                l(x, 0.0, x + 1.0, 1.0)
            } else {
                l(x, 1.0, x + 1.0, 0.0)
            }
        })
        .collect();
    ShapeGraph::axial_from_lines("zigzag", &lines, &NoComm).unwrap()
}

/// Convex graph of `n` unit points linked by `edges`.
pub(crate) fn linked(n: usize, edges: &[(i32, i32)]) -> ShapeGraph {
    let mut g = ShapeGraph::new("linked", MapKind::Convex);
    for i in 0..n {
        g.add_shape(SalaShape::Point(Point::new(i as f64, 0.0)))
            .unwrap();
    }
    for (a, b) in edges {
        g.link(*a, *b).unwrap();
    }
    g
}

pub(crate) fn value(g: &ShapeGraph, col: &str, r: i32) -> f64 {
    let c = g
        .attributes()
        .column_index(col)
        .unwrap_or_else(|| panic!("missing column {col:?}"));
    g.attributes().value(r, c)
}
