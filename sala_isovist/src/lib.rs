// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sala Isovist: visible regions from a viewpoint among boundary lines.
//!
//! - [`BspTree`]: a binary space partition of tagged lines, visited near side first.
//! - [`Isovist`]: the visible polygon from a centre point over a field-of-view window,
//!   with [`IsovistStats`] (area, perimeter, occluded perimeter, drift, radials).
//!
//! Results are reproducible on a given platform but not bit-identical across platforms;
//! compare them within a small positional tolerance.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Line, Point};
//! use sala_isovist::{BspTree, Isovist, IsovistOptions};
//!
//! let walls = [
//!     Line::new((0.0, 0.0), (4.0, 0.0)),
//!     Line::new((4.0, 0.0), (4.0, 4.0)),
//!     Line::new((4.0, 4.0), (0.0, 4.0)),
//!     Line::new((0.0, 4.0), (0.0, 0.0)),
//! ];
//! let tree = BspTree::build(walls.into_iter().zip(0..));
//! let iso = Isovist::compute(&tree, Point::new(2.0, 2.0), &IsovistOptions::default());
//! assert!((iso.stats().area - 16.0).abs() < 1e-9);
//! ```

mod bsp;
mod isovist;

pub use bsp::{BspNode, BspTree, Side, tolerance_for};
pub use isovist::{Block, Isovist, IsovistOptions, IsovistStats, REGION_TAG};
