// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

/// Axis-aligned bounding box in 2D.
///
/// Uses a y-up convention: `min_y` is the bottom edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2D {
    /// Minimum x (left)
    pub min_x: f64,
    /// Minimum y (bottom)
    pub min_y: f64,
    /// Maximum x (right)
    pub max_x: f64,
    /// Maximum y (top)
    pub max_y: f64,
}

impl Aabb2D {
    /// Create a new AABB from min/max corners.
    #[inline]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create an AABB from origin and size.
    pub const fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    /// Smallest AABB enclosing the segment `(x0, y0)`–`(x1, y1)`.
    pub fn from_segment(seg: Segment) -> Self {
        Self::new(
            seg.x0.min(seg.x1),
            seg.y0.min(seg.y1),
            seg.x0.max(seg.x1),
            seg.y0.max(seg.y1),
        )
    }

    /// Whether this AABB contains the point (edges inclusive).
    #[inline]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && self.min_y <= y && x <= self.max_x && y <= self.max_y
    }

    /// Whether two AABBs overlap. Shared edges count as overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// The union of two AABBs.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Grow the box by `d` on every side.
    pub fn inflate(&self, d: f64) -> Self {
        Self::new(self.min_x - d, self.min_y - d, self.max_x + d, self.max_y + d)
    }

    /// Return true if the AABB is inverted. Zero-area boxes (points, axis lines) are not empty.
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A straight segment between two points, in raw coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    /// Start x.
    pub x0: f64,
    /// Start y.
    pub y0: f64,
    /// End x.
    pub x1: f64,
    /// End y.
    pub y1: f64,
}

impl Segment {
    /// Create a segment from its end coordinates.
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whether the segment intersects the (closed) box, via Liang–Barsky clipping.
    pub fn touches(&self, aabb: &Aabb2D) -> bool {
        clip_parameters(self, aabb).is_some()
    }
}

/// Liang–Barsky clip of `seg` against `aabb`; returns the `(t0, t1)` parameter range inside.
pub(crate) fn clip_parameters(seg: &Segment, aabb: &Aabb2D) -> Option<(f64, f64)> {
    let dx = seg.x1 - seg.x0;
    let dy = seg.y1 - seg.y0;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let checks = [
        (-dx, seg.x0 - aabb.min_x),
        (dx, aabb.max_x - seg.x0),
        (-dy, seg.y0 - aabb.min_y),
        (dy, aabb.max_y - seg.y0),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_touches_box() {
        let b = Aabb2D::new(0.0, 0.0, 1.0, 1.0);
        assert!(Segment::new(-1.0, 0.5, 2.0, 0.5).touches(&b));
        assert!(Segment::new(0.5, 0.5, 0.6, 0.6).touches(&b));
        assert!(!Segment::new(-1.0, 2.0, 2.0, 2.0).touches(&b));
        // Diagonal passing just outside the corner.
        assert!(!Segment::new(1.5, 0.0, 2.5, 1.0).touches(&b));
    }

    #[test]
    fn overlap_is_edge_inclusive() {
        let a = Aabb2D::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb2D::new(1.0, 0.0, 2.0, 1.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&Aabb2D::new(1.5, 1.5, 2.0, 2.0)));
    }
}
