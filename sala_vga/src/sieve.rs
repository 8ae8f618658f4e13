// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spark sieve: line-of-sight search from one point, octant by octant.
//!
//! Each octant is swept ring by ring in a local frame where the octant is the wedge
//! `x > 0, 0 <= y <= x`. The sieve keeps the slopes `y / x` already shadowed by blocking
//! lines met in earlier rings. A candidate whose centre slope falls in an open gap is then
//! confirmed against the lines in the origin cell and around the candidate, which are the
//! only places the sight line can meet a wall that the sieve has not seen yet.

use kurbo::Vec2;

use crate::pixel::{PixelRef, PointState};
use crate::point_map::PointMap;

const SLOPE_TOL: f64 = 1e-9;

/// Signed permutation taking local octant coordinates to grid offsets.
#[derive(Copy, Clone, Debug)]
struct Octant {
    /// Grid offset of local `(1, 0)`.
    major: (i32, i32),
    /// Grid offset of local `(0, 1)`.
    minor: (i32, i32),
}

const OCTANTS: [Octant; 8] = [
    Octant { major: (1, 0), minor: (0, 1) },
    Octant { major: (0, 1), minor: (1, 0) },
    Octant { major: (0, 1), minor: (-1, 0) },
    Octant { major: (-1, 0), minor: (0, 1) },
    Octant { major: (-1, 0), minor: (0, -1) },
    Octant { major: (0, -1), minor: (-1, 0) },
    Octant { major: (0, -1), minor: (1, 0) },
    Octant { major: (1, 0), minor: (0, -1) },
];

impl Octant {
    fn to_grid(self, i: i32, j: i32) -> (i32, i32) {
        (
            self.major.0 * i + self.minor.0 * j,
            self.major.1 * i + self.minor.1 * j,
        )
    }

    fn to_local(self, v: Vec2) -> Vec2 {
        let (mx, my) = (f64::from(self.major.0), f64::from(self.major.1));
        let (nx, ny) = (f64::from(self.minor.0), f64::from(self.minor.1));
        Vec2::new(v.x * mx + v.y * my, v.x * nx + v.y * ny)
    }
}

/// Octant owning the direction `(dx, dy)`.
///
/// Octant `k` covers directions from `45k` degrees inclusive to `45(k + 1)` exclusive.
pub(crate) fn octant_of(dx: i32, dy: i32) -> usize {
    if dx == 0 && dy == 0 {
        return 0;
    }
    if dy > 0 || (dy == 0 && dx > 0) {
        if dx > 0 && dy < dx {
            0
        } else if dx > 0 {
            1
        } else if dx > -dy {
            2
        } else {
            3
        }
    } else {
        4 + octant_of(-dx, -dy)
    }
}

/// Shadowed slope intervals, sorted and merged.
#[derive(Clone, Debug, Default)]
pub(crate) struct SparkSieve {
    shadows: Vec<(f64, f64)>,
}

impl SparkSieve {
    pub(crate) fn reset(&mut self) {
        self.shadows.clear();
    }

    /// Whether no slope in `[0, 1]` remains open.
    pub(crate) fn is_closed(&self) -> bool {
        self.shadows
            .iter()
            .any(|(a, b)| *a <= SLOPE_TOL && *b >= 1.0 - SLOPE_TOL)
    }

    /// Whether `slope` falls in a shadow, its ends included.
    pub(crate) fn is_shadowed(&self, slope: f64) -> bool {
        self.shadows
            .iter()
            .any(|(a, b)| *a - SLOPE_TOL <= slope && slope <= *b + SLOPE_TOL)
    }

    pub(crate) fn block(&mut self, lo: f64, hi: f64) {
        if hi < -SLOPE_TOL || lo > 1.0 + SLOPE_TOL {
            return;
        }
        let (mut lo, mut hi) = (lo.max(0.0), hi.min(1.0));
        let mut kept = Vec::with_capacity(self.shadows.len() + 1);
        for (a, b) in self.shadows.drain(..) {
            if b < lo - SLOPE_TOL || a > hi + SLOPE_TOL {
                kept.push((a, b));
            } else {
                lo = lo.min(a);
                hi = hi.max(b);
            }
        }
        kept.push((lo, hi));
        kept.sort_by(|x, y| x.0.total_cmp(&y.0));
        self.shadows = kept;
    }

    /// Open slope intervals in `[0, 1]`.
    pub(crate) fn gaps(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::with_capacity(self.shadows.len() + 1);
        let mut at = 0.0;
        for (a, b) in &self.shadows {
            if *a > at {
                out.push((at, *a));
            }
            at = f64::max(at, *b);
        }
        if at <= 1.0 {
            out.push((at, 1.0));
        }
        out
    }
}

/// Points visible from `from`, with their grid offsets.
///
/// `octants` picks which octants to sweep and only points whose state holds all of
/// `targets` are accepted. `max_ring` bounds the sweep in rings and `max_dist2` bounds the
/// squared grid distance of accepted points.
pub(crate) fn sweep(
    map: &PointMap,
    from: PixelRef,
    octants: core::ops::Range<usize>,
    targets: PointState,
    max_ring: i32,
    max_dist2: Option<f64>,
    sieve: &mut SparkSieve,
    out: &mut Vec<PixelRef>,
) {
    let centre = map.depixelate(from);
    let spacing = map.spacing();
    for o in octants {
        let oct = OCTANTS[o];
        sieve.reset();
        for i in 1..=max_ring {
            if sieve.is_closed() {
                break;
            }
            if let Some(d2) = max_dist2
                && f64::from(i) * f64::from(i) > d2
            {
                break;
            }
            let fi = f64::from(i);
            for (g0, g1) in sieve.gaps() {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "slopes lie in [0, 1], so j lies in [0, i]"
                )]
                let (j0, j1) = ((g0 * fi).ceil() as i32, (g1 * fi).floor() as i32);
                for j in j0.max(0)..=j1.min(i) {
                    let (dx, dy) = oct.to_grid(i, j);
                    if octant_of(dx, dy) != o {
                        continue;
                    }
                    if let Some(d2) = max_dist2
                        && f64::from(dx * dx + dy * dy) > d2
                    {
                        continue;
                    }
                    let Some(to) = from.offset(dx, dy) else {
                        continue;
                    };
                    let Some(pt) = map.point(to) else {
                        continue;
                    };
                    if !pt.state.contains(targets) || sieve.is_shadowed(f64::from(j) / fi) {
                        continue;
                    }
                    if !sight_line_clear(map, from, to) {
                        continue;
                    }
                    out.push(to);
                }
            }
            // Shadows cast by this ring, including the rows just outside the wedge.
            for r in -1..=i + 1 {
                let (dx, dy) = oct.to_grid(i, r);
                let Some(cell) = from.offset(dx, dy) else {
                    continue;
                };
                let Some(pt) = map.point(cell) else {
                    continue;
                };
                for l in &pt.lines {
                    let a = oct.to_local((l.p0 - centre) / spacing);
                    let b = oct.to_local((l.p1 - centre) / spacing);
                    if a.x <= 0.0 || b.x <= 0.0 {
                        continue;
                    }
                    let (sa, sb) = (a.y / a.x, b.y / b.x);
                    sieve.block(sa.min(sb), sa.max(sb));
                }
            }
        }
    }
}

/// Direct check of the sight line against lines in the 3 × 3 blocks around both ends.
///
/// Rings never scan the origin's side neighbours, and a wall met in the target's own ring
/// has not been sieved yet. Touching a line counts as blocked, as in the sieve.
fn sight_line_clear(map: &PointMap, from: PixelRef, to: PixelRef) -> bool {
    let mut cells = [from; 18];
    let mut n = 0;
    for end in [from, to] {
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(c) = end.offset(dx, dy) {
                    cells[n] = c;
                    n += 1;
                }
            }
        }
    }
    !map.crosses_lines(from, to, &cells[..n])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octants_partition_directions() {
        let mut counts = [0; 8];
        for dx in -5..=5 {
            for dy in -5..=5 {
                if (dx, dy) == (0, 0) {
                    continue;
                }
                let o = octant_of(dx, dy);
                counts[o] += 1;
                // The octant's frame reaches the direction.
                let oct = OCTANTS[o];
                let found = (1..=5).any(|i| (0..=i).any(|j| oct.to_grid(i, j) == (dx, dy)));
                assert!(found, "({dx}, {dy}) not reachable in octant {o}");
            }
        }
        assert_eq!(counts.iter().sum::<i32>(), 120);
        assert!(counts.iter().all(|c| *c == 15), "{counts:?}");
    }

    #[test]
    fn opposite_directions_are_four_octants_apart() {
        for (dx, dy) in [(1, 0), (2, 1), (1, 1), (0, 3), (-1, 2), (-2, 2), (-3, 1)] {
            assert_eq!(octant_of(-dx, -dy), octant_of(dx, dy) + 4);
        }
    }

    #[test]
    fn sieve_merges_and_closes() {
        let mut s = SparkSieve::default();
        s.block(0.2, 0.4);
        s.block(0.6, 0.8);
        assert_eq!(s.gaps(), [(0.0, 0.2), (0.4, 0.6), (0.8, 1.0)]);
        s.block(0.3, 0.7);
        assert_eq!(s.gaps(), [(0.0, 0.2), (0.8, 1.0)]);
        assert!(s.is_shadowed(0.5));
        assert!(!s.is_closed());
        s.block(-1.0, 0.25);
        s.block(0.75, 3.0);
        assert!(s.is_closed());
        assert!(s.gaps().iter().all(|(a, b)| b - a < 1e-12));
    }
}
