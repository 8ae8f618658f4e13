// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use crate::types::{Aabb2D, Segment};

/// Spatial footprint of one slot: either a box or a thin segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Extent {
    /// An area-like entry, indexed by its bounds.
    Box(Aabb2D),
    /// A line-like entry, indexed only where the segment actually runs.
    Segment(Segment),
}

impl Extent {
    /// Bounding box of the extent.
    pub fn bounds(&self) -> Aabb2D {
        match self {
            Self::Box(b) => *b,
            Self::Segment(s) => Aabb2D::from_segment(*s),
        }
    }

    /// Exact test against a query rectangle.
    pub fn touches(&self, rect: &Aabb2D) -> bool {
        match self {
            Self::Box(b) => b.overlaps(rect),
            Self::Segment(s) => s.touches(rect),
        }
    }
}

/// Spatial backend abstraction used by [`IndexGeneric`][crate::IndexGeneric].
///
/// Visitors may see the same slot more than once; [`IndexGeneric`][crate::IndexGeneric]
/// deduplicates before handing results out.
pub trait Backend {
    /// Insert a new slot into the spatial structure.
    fn insert(&mut self, slot: usize, extent: Extent);

    /// Remove a slot from the spatial structure.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Visit slots whose extent intersects the rectangle.
    fn visit_rect<F: FnMut(usize)>(&self, rect: Aabb2D, f: F);

    /// Visit slots whose extent contains the point.
    fn visit_point<F: FnMut(usize)>(&self, x: f64, y: f64, f: F) {
        self.visit_rect(Aabb2D::new(x, y, x, y), f);
    }

    /// Visit slots whose extent may meet the segment.
    ///
    /// The default implementation is conservative: it visits everything touching
    /// the segment's bounding box.
    fn visit_segment<F: FnMut(usize)>(&self, seg: Segment, f: F) {
        self.visit_rect(Aabb2D::from_segment(seg), f);
    }
}
