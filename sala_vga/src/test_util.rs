// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures: a 10 × 10 room on a unit grid.

use kurbo::{Line, Point, Rect};
use sala_core::NoComm;

use crate::graph::GraphOptions;
use crate::point_map::{FillType, PointMap};

pub(crate) fn square_walls() -> Vec<Line> {
    vec![
        Line::new((0.0, 0.0), (10.0, 0.0)),
        Line::new((10.0, 0.0), (10.0, 10.0)),
        Line::new((10.0, 10.0), (0.0, 10.0)),
        Line::new((0.0, 10.0), (0.0, 0.0)),
    ]
}

/// Walls run through the centres of the outer ring of cells, so an empty room fills the
/// 9 × 9 block from `(1, 1)` to `(9, 9)`.
pub(crate) fn room(extra: &[Line]) -> PointMap {
    let mut m = PointMap::new("room", Rect::new(-0.5, -0.5, 10.5, 10.5), 1.0).unwrap();
    let mut walls = square_walls();
    walls.extend_from_slice(extra);
    m.block_lines(&walls);
    m.make_points(Point::new(2.0, 8.0), FillType::Full).unwrap();
    m
}

pub(crate) fn graph_room(extra: &[Line]) -> PointMap {
    let mut m = room(extra);
    m.make_graph(&GraphOptions::default(), &NoComm).unwrap();
    m
}
