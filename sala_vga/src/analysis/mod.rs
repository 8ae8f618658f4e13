// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility graph analyses.
//!
//! Every analysis takes the map, its options and a [`Communicator`], writes its columns into
//! the map's attribute table and returns an [`AnalysisResult`]. On any error, including
//! cancellation, the columns it created are removed again.
//!
//! [`Communicator`]: sala_core::Communicator
//! [`AnalysisResult`]: sala_core::AnalysisResult

mod global;
mod isovist;
mod local;
mod metric;
mod step_depth;
mod through_vision;
mod traverse;

pub use global::visual_global;
pub use isovist::isovist_properties;
pub use local::visual_local;
pub use metric::{angular_global, metric_global};
pub use step_depth::{StepDepthKind, step_depth};
pub use through_vision::through_vision;

use sala_core::{RADIUS_N, Result, SalaError};

use crate::pixel::PixelRef;
use crate::point_map::PointMap;

/// Options shared by the per-point analyses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VgaOptions {
    /// Radius in the analysis' own cost: steps, map units or right angles. `-1` is
    /// unbounded.
    pub radius: f64,
    /// Only compute values for selected points.
    pub gates_only: bool,
}

impl Default for VgaOptions {
    fn default() -> Self {
        Self {
            radius: RADIUS_N,
            gates_only: false,
        }
    }
}

fn require_graph(map: &PointMap) -> Result<()> {
    if !map.graph_built() {
        return Err(SalaError::GraphNotBuilt);
    }
    Ok(())
}

/// Points to compute values for.
fn origins(map: &PointMap, options: &VgaOptions) -> Vec<PixelRef> {
    if options.gates_only {
        map.selection()
    } else {
        map.filled_pixels()
    }
}
