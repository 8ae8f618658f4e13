// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid addresses and per-cell state.

use kurbo::Line;

use crate::node::Node;

/// Column and row of a grid cell.
///
/// Packs into an `i32` attribute-table key as `(x << 16) | y`, so keys order by column
/// and then by row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelRef {
    /// Column.
    pub x: i16,
    /// Row.
    pub y: i16,
}

impl PixelRef {
    /// Create a reference.
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Attribute-table key.
    pub const fn key(self) -> i32 {
        ((self.x as i32) << 16) | (self.y as u16 as i32)
    }

    /// Inverse of [`PixelRef::key`].
    #[allow(
        clippy::cast_possible_truncation,
        reason = "keys are built from two 16-bit halves"
    )]
    pub const fn from_key(key: i32) -> Self {
        Self {
            x: (key >> 16) as i16,
            y: (key & 0xffff) as u16 as i16,
        }
    }

    /// Offset by a grid step, if it stays within `i16`.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let x = i16::try_from(i32::from(self.x) + dx).ok()?;
        let y = i16::try_from(i32::from(self.y) + dy).ok()?;
        Some(Self { x, y })
    }

    /// Step from `self` to `other`.
    pub fn delta(self, other: Self) -> (i32, i32) {
        (
            i32::from(other.x) - i32::from(self.x),
            i32::from(other.y) - i32::from(self.y),
        )
    }
}

bitflags::bitflags! {
    /// State of a grid cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PointState: u16 {
        /// Nothing on this cell.
        const EMPTY         = 0;
        /// Part of the analysed space.
        const FILLED        = 1 << 0;
        /// A blocking line passes through the cell.
        const BLOCKED       = 1 << 1;
        /// Filled, with at least one unfilled neighbour.
        const EDGE          = 1 << 2;
        /// Filled by a context fill.
        const CONTEXTFILLED = 1 << 3;
        /// Filled by an augmenting fill.
        const AUGMENTED     = 1 << 4;
        /// Selected by the user.
        const SELECTED      = 1 << 5;
        /// One end of a merge pair.
        const MERGED        = 1 << 6;
        /// Highlighted for display.
        const HIGHLIGHT     = 1 << 7;
    }
}

/// One grid cell.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// State flags.
    pub state: PointState,
    /// Blocking lines cropped to this cell.
    pub lines: Vec<Line>,
    /// Visibility adjacency, once the graph is built.
    pub node: Option<Node>,
}

impl Point {
    /// Whether the cell is filled.
    #[inline]
    pub fn filled(&self) -> bool {
        self.state.contains(PointState::FILLED)
    }

    /// Whether a blocking line crosses the cell.
    #[inline]
    pub fn blocked(&self) -> bool {
        self.state.contains(PointState::BLOCKED)
    }

    /// Whether the cell is on the edge of the filled region.
    #[inline]
    pub fn edge(&self) -> bool {
        self.state.contains(PointState::EDGE)
    }

    /// Clear fill-related flags and the node.
    pub(crate) fn unfill(&mut self) {
        self.state.remove(
            PointState::FILLED
                | PointState::EDGE
                | PointState::CONTEXTFILLED
                | PointState::AUGMENTED
                | PointState::SELECTED
                | PointState::MERGED,
        );
        self.node = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip_including_negatives() {
        for p in [
            PixelRef::new(0, 0),
            PixelRef::new(3, 7),
            PixelRef::new(-2, 5),
            PixelRef::new(4, -1),
            PixelRef::new(i16::MAX, i16::MIN),
        ] {
            assert_eq!(PixelRef::from_key(p.key()), p);
        }
    }

    #[test]
    fn keys_order_by_column_then_row() {
        assert!(PixelRef::new(1, 9).key() < PixelRef::new(2, 0).key());
        assert!(PixelRef::new(2, 0).key() < PixelRef::new(2, 1).key());
    }

    #[test]
    fn offsets() {
        let p = PixelRef::new(2, 3);
        assert_eq!(p.offset(-1, 1), Some(PixelRef::new(1, 4)));
        assert_eq!(p.delta(PixelRef::new(5, 1)), (3, -2));
        assert_eq!(PixelRef::new(i16::MAX, 0).offset(1, 0), None);
    }
}
