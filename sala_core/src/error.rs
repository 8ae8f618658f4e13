// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy shared by every analysis.
//!
//! Numeric degeneracy (zero node counts, zero-length lines) is never an error: it is
//! reported through the `-1` sentinel in attribute columns.

/// Shape reference within a shape map.
pub type ShapeRef = i32;

/// Errors raised by map construction and analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SalaError {
    /// The user cancelled the operation; partially built state has been rolled back.
    #[error("operation cancelled")]
    Cancelled,
    /// Visibility graph construction needs blocking lines to be rasterized first.
    #[error("blocking lines have not been prepared for this point map")]
    LinesNotBlocked,
    /// The point map has no filled points to analyse.
    #[error("the point map has no filled points")]
    NoFilledPoints,
    /// A step-depth style analysis was started with nothing selected.
    #[error("no origin is selected")]
    NoSelection,
    /// The fill seed lies outside the grid.
    #[error("seed point lies outside the grid")]
    SeedOutsideGrid,
    /// The fill seed lies on a blocked or already filled cell.
    #[error("seed cell is blocked or already filled")]
    SeedNotFillable,
    /// A shape reference does not exist in the map.
    #[error("shape {0} not found")]
    ShapeNotFound(ShapeRef),
    /// A shape reference is already in use.
    #[error("shape reference {0} already exists")]
    DuplicateShape(ShapeRef),
    /// Attempt to overwrite a locked attribute column.
    #[error("column {0:?} is locked")]
    LockedColumn(String),
    /// A named attribute column does not exist.
    #[error("column {0:?} not found")]
    ColumnNotFound(String),
    /// Grid spacing or region is unusable.
    #[error("invalid grid: {0}")]
    InvalidGrid(&'static str),
    /// Analysis requires a visibility graph that has not been built.
    #[error("the visibility graph has not been built")]
    GraphNotBuilt,
    /// The map holds no shapes of the kind required by the analysis.
    #[error("the shape map is empty")]
    EmptyMap,
}

/// Result alias used across the workspace.
pub type Result<T, E = SalaError> = core::result::Result<T, E>;

impl SalaError {
    /// Whether this error is a user cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
