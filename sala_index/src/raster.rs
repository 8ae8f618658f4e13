// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform cell grids and segment rasterization.
//!
//! Cells are half-open: cell `(i, j)` covers
//! `[origin_x + i * cell_w, origin_x + (i + 1) * cell_w)` horizontally, and likewise
//! vertically. A segment lying exactly on a cell boundary is assigned to the cell
//! above/right of it.

use alloc::vec::Vec;

use crate::types::{Aabb2D, Segment};

/// Placement of a uniform grid: origin of cell `(0, 0)` and cell size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridSpec {
    /// Left edge of column 0.
    pub origin_x: f64,
    /// Bottom edge of row 0.
    pub origin_y: f64,
    /// Column width.
    pub cell_w: f64,
    /// Row height.
    pub cell_h: f64,
}

impl GridSpec {
    /// Create a grid placement. Cell sizes must be strictly positive.
    pub fn new(origin_x: f64, origin_y: f64, cell_w: f64, cell_h: f64) -> Self {
        debug_assert!(
            cell_w > 0.0 && cell_h > 0.0,
            "grid cell sizes must be strictly positive"
        );
        Self {
            origin_x,
            origin_y,
            cell_w,
            cell_h,
        }
    }

    /// Column containing `x`.
    #[inline]
    pub fn col_of(&self, x: f64) -> i32 {
        floor_to_i32((x - self.origin_x) / self.cell_w)
    }

    /// Row containing `y`.
    #[inline]
    pub fn row_of(&self, y: f64) -> i32 {
        floor_to_i32((y - self.origin_y) / self.cell_h)
    }

    /// Cell containing the point.
    #[inline]
    pub fn cell_of(&self, x: f64, y: f64) -> (i32, i32) {
        (self.col_of(x), self.row_of(y))
    }

    /// Bounds of a cell.
    pub fn cell_box(&self, col: i32, row: i32) -> Aabb2D {
        Aabb2D::from_xywh(
            self.origin_x + f64::from(col) * self.cell_w,
            self.origin_y + f64::from(row) * self.cell_h,
            self.cell_w,
            self.cell_h,
        )
    }

    /// Inclusive cell range `(min_col, min_row, max_col, max_row)` covered by a box.
    pub fn cells_for_aabb(&self, a: &Aabb2D) -> (i32, i32, i32, i32) {
        let (c0, c1) = half_open_span(a.min_x, a.max_x, self.origin_x, self.cell_w);
        let (r0, r1) = half_open_span(a.min_y, a.max_y, self.origin_y, self.cell_h);
        (c0, r0, c1, r1)
    }

    /// All cells crossed by the segment, in order from its start.
    ///
    /// Walks the segment one slab at a time along its major axis and emits
    /// every cell of the minor axis that the segment occupies inside the slab.
    pub fn cells_on_segment(&self, seg: Segment) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        let dx = seg.x1 - seg.x0;
        let dy = seg.y1 - seg.y0;
        if dx == 0.0 && dy == 0.0 {
            out.push(self.cell_of(seg.x0, seg.y0));
            return out;
        }
        let x_major = dx.abs() >= dy.abs();
        // Parametrize over the major axis so that each slab is visited once.
        let (a0, a1, b0, b1, o_a, w_a, o_b, w_b) = if x_major {
            (
                seg.x0,
                seg.x1,
                seg.y0,
                seg.y1,
                self.origin_x,
                self.cell_w,
                self.origin_y,
                self.cell_h,
            )
        } else {
            (
                seg.y0,
                seg.y1,
                seg.x0,
                seg.x1,
                self.origin_y,
                self.cell_h,
                self.origin_x,
                self.cell_w,
            )
        };
        let (s0, s1) = half_open_span(a0.min(a1), a0.max(a1), o_a, w_a);
        let forward = a1 >= a0;
        let slabs: Vec<i32> = if forward {
            (s0..=s1).collect()
        } else {
            (s0..=s1).rev().collect()
        };
        for s in slabs {
            let lo = (o_a + f64::from(s) * w_a).max(a0.min(a1));
            let hi = (o_a + f64::from(s + 1) * w_a).min(a0.max(a1));
            let t_lo = (lo - a0) / (a1 - a0);
            let t_hi = (hi - a0) / (a1 - a0);
            let b_lo = b0 + (b1 - b0) * t_lo;
            let b_hi = b0 + (b1 - b0) * t_hi;
            let (m0, m1) = half_open_span(b_lo.min(b_hi), b_lo.max(b_hi), o_b, w_b);
            // Emit minor cells in the direction of travel along the minor axis.
            let increasing = if forward { b_hi >= b_lo } else { b_lo >= b_hi };
            let mut push = |m: i32| {
                if x_major {
                    out.push((s, m));
                } else {
                    out.push((m, s));
                }
            };
            if increasing {
                for m in m0..=m1 {
                    push(m);
                }
            } else {
                for m in (m0..=m1).rev() {
                    push(m);
                }
            }
        }
        out
    }
}

/// Cell span of the closed interval `[lo, hi]` under half-open cells, never empty.
fn half_open_span(lo: f64, hi: f64, origin: f64, size: f64) -> (i32, i32) {
    let first = floor_to_i32((lo - origin) / size);
    let last_edge = (hi - origin) / size;
    let mut last = floor_to_i32(last_edge);
    if f64::from(last) == last_edge && last > first {
        last -= 1;
    }
    (first, last.max(first))
}

#[inline]
fn floor_to_i32(v: f64) -> i32 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
    )]
    let i = v as i32;
    if f64::from(i) > v { i.saturating_sub(1) } else { i }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_segment_covers_row() {
        let g = GridSpec::new(0.0, 0.0, 1.0, 1.0);
        let cells = g.cells_on_segment(Segment::new(0.5, 0.5, 3.5, 0.5));
        assert_eq!(cells, [(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn reversed_segment_visits_in_travel_order() {
        let g = GridSpec::new(0.0, 0.0, 1.0, 1.0);
        let cells = g.cells_on_segment(Segment::new(3.5, 0.5, 0.5, 0.5));
        assert_eq!(cells, [(3, 0), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn diagonal_segment_is_connected() {
        let g = GridSpec::new(0.0, 0.0, 1.0, 1.0);
        let cells = g.cells_on_segment(Segment::new(0.2, 0.1, 2.8, 1.9));
        assert_eq!(cells.first().copied(), Some((0, 0)));
        assert_eq!(cells.last().copied(), Some((2, 1)));
        for w in cells.windows(2) {
            let (a, b) = (w[0], w[1]);
            assert!((a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1, "gap between {a:?} and {b:?}");
        }
    }

    #[test]
    fn boundary_segment_goes_to_upper_cell() {
        let g = GridSpec::new(0.0, 0.0, 1.0, 1.0);
        let cells = g.cells_on_segment(Segment::new(0.5, 1.0, 1.5, 1.0));
        assert_eq!(cells, [(0, 1), (1, 1)]);
    }

    #[test]
    fn negative_coordinates_floor() {
        let g = GridSpec::new(0.0, 0.0, 2.0, 2.0);
        assert_eq!(g.cell_of(-0.5, -2.5), (-1, -2));
        assert_eq!(g.cells_for_aabb(&Aabb2D::new(0.0, 0.0, 4.0, 3.9)), (0, 0, 1, 1));
    }
}
