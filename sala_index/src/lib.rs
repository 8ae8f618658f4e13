// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sala Index: a generic 2D spatial index and grid rasterizer for spatial network maps.
//!
//! - Insert, update, and remove boxes or segments with user payloads, addressed by generational [`Key`]s.
//! - Query by point, intersecting rectangle, or segment.
//! - Rasterize segments onto a uniform cell grid with [`GridSpec::cells_on_segment`].
//!
//! It does not depend on any geometry crate; callers convert their own point and line types to
//! [`Aabb2D`] and [`Segment`]. Shape maps use it to find candidate shapes near a query, and point
//! maps use the rasterizer to decide which grid cells a wall passes through.
//!
//! Backends are pluggable via a simple trait so you can swap the spatial strategy without API churn.
//! The default backend is a flat vector (linear scan). A uniform grid backend is available with
//! feature `backend_grid`.
//!
//! ## Features
//!
//! - `backend_grid` *(default)*: enables the uniform grid backend backed by `hashbrown` and `smallvec`.
//!
//! # Example
//!
//! ```rust
//! use sala_index::{Aabb2D, Index, Segment};
//!
//! let mut idx: Index<u32> = Index::new();
//! let _wall = idx.insert_segment(Segment::new(0.0, 0.0, 10.0, 0.0), 1);
//! let room = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 2);
//!
//! let hits: Vec<_> = idx.query_point(5.0, 5.0).map(|(_, p)| p).collect();
//! assert_eq!(hits, [2]);
//!
//! idx.remove(room);
//! assert_eq!(idx.query_point(5.0, 5.0).count(), 0);
//! ```
//!
//! Rasterizing a wall onto a grid:
//!
//! ```rust
//! use sala_index::{GridSpec, Segment};
//!
//! let grid = GridSpec::new(0.0, 0.0, 1.0, 1.0);
//! let cells = grid.cells_on_segment(Segment::new(0.5, 0.5, 2.5, 0.5));
//! assert_eq!(cells, [(0, 0), (1, 0), (2, 0)]);
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod index;
mod raster;
mod types;

pub use backend::{Backend, Extent};
pub use index::{Index, IndexGeneric, Key};
pub use raster::GridSpec;
pub use types::{Aabb2D, Segment};
