// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sala Core: shared building blocks for spatial network analysis.
//!
//! - [`geom`]: a small geometry kernel over [`kurbo`] types (intersection with tolerance,
//!   cropping, turning angles, polygon measures).
//! - [`AttributeTable`]: a sparse columnar table keyed by integer row keys, where `-1`
//!   means "not computed".
//! - [`Communicator`] and [`ProgressPoller`]: progress reporting and cooperative
//!   cancellation for long-running analyses.
//! - [`measures`]: integration, relative asymmetry and entropy from depth histograms.
//! - [`radius`]: radius normalisation and column-name suffixes.
//! - [`CostQueue`]: the min-cost queue behind metric and angular traversals, and
//!   [`Visited`] marks that reset in constant time between origins.
//! - [`ColumnSet`]: column bookkeeping so cancelled analyses leave no partial results.
//!
//! The point-map crate (`sala_vga`) and the shape-graph crate (`sala_shape`) both build on
//! these.
//!
//! ## Features
//!
//! - `serde` *(default)*: derives `Serialize`/`Deserialize` for [`AttributeTable`] and
//!   [`RadiusType`].
//!
//! # Example
//!
//! ```rust
//! use sala_core::{AttributeTable, DepthHistogram, IntegrationMeasures, NOT_COMPUTED};
//!
//! let mut table = AttributeTable::new();
//! table.add_row(0);
//! let col = table.insert_or_reset_column("Mean Depth").unwrap();
//! assert_eq!(table.value(0, col), NOT_COMPUTED);
//!
//! // Origin plus two nodes at depth 1 and one at depth 2.
//! let mut h = DepthHistogram::new();
//! for d in [0, 1, 1, 2] {
//!     h.add(d);
//! }
//! let m = IntegrationMeasures::from_histogram(&h);
//! table.set_value(0, col, m.mean_depth);
//! assert!((table.value(0, col) - 4.0 / 3.0).abs() < 1e-12);
//! ```

mod attributes;
mod comm;
mod error;
pub mod geom;
pub mod measures;
mod queue;
pub mod radius;
mod result;
mod visited;

pub use attributes::{AttributeTable, ColumnStats, NOT_COMPUTED};
pub use comm::{CancelFlag, Communicator, NoComm, POLL_INTERVAL, Progress, ProgressPoller};
pub use error::{Result, SalaError, ShapeRef};
pub use measures::{DepthHistogram, IntegrationMeasures};
pub use queue::CostQueue;
pub use radius::{RADIUS_N, RadiusType};
pub use result::{AnalysisResult, ColumnSet};
pub use visited::Visited;

pub use kurbo;
