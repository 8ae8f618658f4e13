// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sala Shape: shape maps and the axial, segment and convex graphs built on them.
//!
//! - [`ShapeMap`]: points, lines, polylines and polygons under stable [`ShapeRef`]s, with
//!   a uniform grid index for point, rectangle and line queries, an attribute row per
//!   shape and a [`Connector`] per shape.
//! - [`ShapeGraph`]: a shape map plus what its connectors mean ([`MapKind`]). Axial maps
//!   link crossing lines; segment maps cut axial lines at their junctions and link
//!   segment ends with direction and turn ([`SegmentRef`]); convex maps are linked by
//!   hand.
//! - [`analysis`]: axial integration and choice, control, tulip and exact angular
//!   segment analyses, topological and metric segment analyses, and step depth.
//!
//! ## Features
//!
//! - `serde` *(default)*: derives `Serialize`/`Deserialize` for shape graphs, connectors
//!   and attribute tables.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Line;
//! use sala_core::NoComm;
//! use sala_shape::{DEFAULT_STUB_REMOVAL, ShapeGraph, analysis};
//!
//! // A crossbar with two uprights through it.
//! let lines = [
//!     Line::new((0.0, 0.0), (10.0, 0.0)),
//!     Line::new((2.0, -3.0), (2.0, 3.0)),
//!     Line::new((8.0, -3.0), (8.0, 3.0)),
//! ];
//! let mut axial = ShapeGraph::axial_from_lines("comb", &lines, &NoComm).unwrap();
//! analysis::axial_integration(&mut axial, &Default::default(), &NoComm).unwrap();
//! let col = axial.attributes().column_index("Mean Depth").unwrap();
//! assert_eq!(axial.attributes().value(0, col), 1.0);
//!
//! // The crossbar's overhanging ends are stubs; each upright splits in two.
//! let mut segments = ShapeGraph::segments_from_axial(&axial, DEFAULT_STUB_REMOVAL, &NoComm).unwrap();
//! assert_eq!(segments.map().len(), 5);
//! analysis::segment_tulip(&mut segments, &Default::default(), &NoComm).unwrap();
//! let col = segments.attributes().column_index("T1024 Node Count").unwrap();
//! assert_eq!(segments.attributes().value(0, col), 5.0);
//! ```

pub mod analysis;
mod connector;
mod graph;
mod shape;
mod shape_map;

#[cfg(test)]
mod test_util;

pub use connector::{Connector, Dir, SegmentRef};
pub use graph::{
    AXIAL_LINE_REF, CONNECTIVITY, DEFAULT_STUB_REMOVAL, LINE_LENGTH, MapKind, SEGMENT_LENGTH,
    ShapeGraph,
};
pub use sala_core::ShapeRef;
pub use shape::{SalaShape, ShapeKinds};
pub use shape_map::{DEFAULT_CELL_SIZE, ShapeMap};
