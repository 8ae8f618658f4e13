// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sala VGA: visibility graph analysis on a regular grid of points.
//!
//! - [`PointMap`]: a grid over a region. Blocking lines are rasterized onto it with
//!   [`PointMap::block_lines`], then open space is seed-filled with
//!   [`PointMap::make_points`]. Pairs of points can be merged to act as one place.
//! - [`PointMap::make_graph`]: builds the visibility graph with a spark sieve. Each filled
//!   point gets a [`Node`] whose 32 angular [`Bin`]s list the points it can see, nearest
//!   first. Sight is symmetric: if `a` sees `b` in bin `k`, `b` sees `a` in bin
//!   `(k + 16) % 32`.
//! - [`analysis`]: global, local, metric, angular, step-depth, through-vision and isovist
//!   measures, written to the map's [`AttributeTable`](sala_core::AttributeTable).
//!
//! ## Features
//!
//! - `serde` *(default)*: derives `Serialize`/`Deserialize` for point maps, so a saved
//!   graph reloads with identical analysis results.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Line, Point, Rect};
//! use sala_core::NoComm;
//! use sala_vga::{FillType, GraphOptions, PointMap, analysis};
//!
//! let mut map = PointMap::new("room", Rect::new(-0.5, -0.5, 6.5, 4.5), 1.0).unwrap();
//! map.block_lines(&[
//!     Line::new((0.0, 0.0), (6.0, 0.0)),
//!     Line::new((6.0, 0.0), (6.0, 4.0)),
//!     Line::new((6.0, 4.0), (0.0, 4.0)),
//!     Line::new((0.0, 4.0), (0.0, 0.0)),
//! ]);
//! let filled = map.make_points(Point::new(3.0, 2.0), FillType::Full).unwrap();
//! // The walls run through the outer cells, leaving a 5 × 3 block.
//! assert_eq!(filled, 15);
//!
//! map.make_graph(&GraphOptions::default(), &NoComm).unwrap();
//! let result = analysis::visual_global(&mut map, &Default::default(), &NoComm).unwrap();
//! assert!(result.completed);
//!
//! let col = map.attributes().column_index("Visual Mean Depth").unwrap();
//! let key = map.pixelate(Point::new(3.0, 2.0), false).unwrap().key();
//! assert_eq!(map.attributes().value(key, col), 1.0);
//! ```

pub mod analysis;
mod graph;
mod merge;
mod node;
mod pixel;
mod point_map;
mod sieve;

#[cfg(test)]
mod test_util;

pub use graph::{CONNECTIVITY, FIRST_MOMENT, GraphOptions, SECOND_MOMENT};
pub use merge::MergePairs;
pub use node::{BIN_COUNT, BIN_WIDTH, Bin, Node, bin_angle, grid, which_bin};
pub use pixel::{PixelRef, Point, PointState};
pub use point_map::{FillType, PointMap};
