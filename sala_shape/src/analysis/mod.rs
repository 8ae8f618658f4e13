// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape graph analyses.
//!
//! Like the point map analyses, each one writes its columns into the graph's attribute
//! table and returns an [`AnalysisResult`]; on error, cancellation included, the columns
//! it created are removed again.
//!
//! [`AnalysisResult`]: sala_core::AnalysisResult

mod axial;
mod local;
mod segment_angular;
mod step_depth;
mod topomet;
mod traverse;
mod tulip;

pub use axial::{AxialOptions, axial_integration};
pub use local::axial_local;
pub use segment_angular::segment_angular;
pub use step_depth::step_depth;
pub use topomet::{TopoMetKind, TopoMetOptions, segment_topomet};
pub use tulip::{TulipOptions, segment_tulip};

use sala_core::{Result, SalaError};

use crate::graph::{MapKind, ShapeGraph};

fn require_shapes(graph: &ShapeGraph) -> Result<()> {
    if graph.map().is_empty() {
        return Err(SalaError::EmptyMap);
    }
    Ok(())
}

/// Segment analyses need a segment map with at least one segment.
fn require_segments(graph: &ShapeGraph) -> Result<()> {
    if graph.kind() != MapKind::Segment {
        return Err(SalaError::EmptyMap);
    }
    require_shapes(graph)
}
