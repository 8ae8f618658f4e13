// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Isovist construction by near-to-far BSP traversal.
//!
//! The viewing window starts as one or two open angular *gaps*. Lines are taken from the
//! BSP tree nearest first; each line's angular span is intersected with the open gaps, and
//! every overlap becomes a resolved *block* while the gap shrinks, splits or disappears.
//! A farther line that falls behind resolved blocks finds no open gap and contributes
//! nothing. Gaps still open at the end are closed by the bounding region, when one is
//! given. The visible polygon is then read off the blocks in angular order.
//!
//! Angles are in radians in `[0, 2π)`, measured counter-clockwise from the positive x axis.

use core::f64::consts::TAU;

use kurbo::{Line, Point, Rect, Vec2};
use sala_core::geom;

use crate::bsp::{BspNode, BspTree, tolerance_for};

/// Gaps narrower than this are considered closed.
const ANGLE_TOL: f64 = 1e-10;

/// Tag of blocks cut from the bounding region.
pub const REGION_TAG: i32 = -1;

/// Viewing window and output options.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsovistOptions {
    /// Start of the field of view.
    pub start_angle: f64,
    /// End of the field of view. Equal to `start_angle` for a full circle.
    pub end_angle: f64,
    /// Repeat the first vertex at the end of the polygon.
    pub close: bool,
    /// Region that bounds an unobstructed view. Also sets the point-matching tolerance.
    pub bounds: Option<Rect>,
}

impl Default for IsovistOptions {
    fn default() -> Self {
        Self {
            start_angle: 0.0,
            end_angle: 0.0,
            close: true,
            bounds: None,
        }
    }
}

impl IsovistOptions {
    /// Whether the window is the full circle.
    pub fn is_full(&self) -> bool {
        self.start_angle == self.end_angle
    }

    /// Whether the window crosses angle zero.
    pub fn wraps(&self) -> bool {
        !self.is_full() && geom::normalize_angle(self.start_angle) > geom::normalize_angle(self.end_angle)
    }
}

/// A resolved piece of boundary seen from the centre.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Block {
    /// Angle of `start`.
    pub start_angle: f64,
    /// Angle of `end`.
    pub end_angle: f64,
    /// Boundary point on the ray at `start_angle`.
    pub start: Point,
    /// Boundary point on the ray at `end_angle`.
    pub end: Point,
    /// Tag of the originating line.
    pub tag: i32,
}

/// An open angular interval.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Gap {
    start: f64,
    end: f64,
}

/// The visible region from one point.
#[derive(Clone, Debug)]
pub struct Isovist {
    centre: Point,
    options: IsovistOptions,
    blocks: Vec<Block>,
    gaps: Vec<Gap>,
    polygon: Vec<Point>,
    occluded_perimeter: f64,
    tolerance: f64,
    open: bool,
}

/// Summary measures of an isovist.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsovistStats {
    /// Polygon area.
    pub area: f64,
    /// Polygon perimeter.
    pub perimeter: f64,
    /// Length of polygon edges that are not boundary, i.e. radial jumps between blocks.
    pub occluded_perimeter: f64,
    /// Area centroid.
    pub centroid: Point,
    /// Distance from the centre to the centroid.
    pub drift_magnitude: f64,
    /// Direction from the centre to the centroid, in degrees in `[0, 360)`.
    pub drift_angle: f64,
    /// Nearest boundary distance.
    pub min_radial: f64,
    /// Farthest boundary distance.
    pub max_radial: f64,
    /// `4π · area / perimeter²`.
    pub compactness: f64,
}

impl Isovist {
    /// Compute the isovist of `centre` against the lines in `tree`.
    ///
    /// Directions that meet no line reach out to [`IsovistOptions::bounds`] if it holds
    /// the centre. Without bounds they fold back through the centre.
    pub fn compute(tree: &BspTree, centre: Point, options: &IsovistOptions) -> Self {
        let start = geom::normalize_angle(options.start_angle);
        let end = geom::normalize_angle(options.end_angle);
        let gaps = if options.is_full() {
            vec![Gap { start: 0.0, end: TAU }]
        } else if start < end {
            vec![Gap { start, end }]
        } else {
            vec![Gap { start, end: TAU }, Gap { start: 0.0, end }]
        };
        let mut iso = Self {
            centre,
            options: *options,
            blocks: Vec::new(),
            gaps: gaps.into_iter().filter(|g| g.end - g.start > ANGLE_TOL).collect(),
            polygon: Vec::new(),
            occluded_perimeter: 0.0,
            tolerance: options.bounds.map_or(tree.tolerance(), tolerance_for),
            open: false,
        };
        if let Some(root) = tree.root() {
            iso.visit(root);
        }
        iso.open = !iso.gaps.is_empty();
        if let Some(region) = options.bounds
            && iso.open
            && region.contains(centre)
        {
            iso.close_at(region);
        }
        iso.blocks.sort_by(|a, b| a.start_angle.total_cmp(&b.start_angle));
        iso.assemble();
        iso
    }

    fn visit(&mut self, node: &BspNode) {
        if self.gaps.is_empty() {
            return;
        }
        let (near, far) = node.near_far(self.centre);
        if let Some(n) = near {
            self.visit(n);
        }
        self.add_line(node.line, node.tag);
        if let Some(f) = far {
            self.visit(f);
        }
    }

    /// Cut the remaining gaps off at the edges of `region`.
    fn close_at(&mut self, region: Rect) {
        let c = [
            Point::new(region.x0, region.y0),
            Point::new(region.x1, region.y0),
            Point::new(region.x1, region.y1),
            Point::new(region.x0, region.y1),
        ];
        for (a, b) in c.iter().zip(c.iter().cycle().skip(1)) {
            self.add_line(Line::new(*a, *b), REGION_TAG);
        }
    }

    fn add_line(&mut self, line: Line, tag: i32) {
        if self.gaps.is_empty() {
            return;
        }
        let a = line.p0 - self.centre;
        let b = line.p1 - self.centre;
        let turn = a.cross(b);
        if turn.abs() <= self.tolerance * line_len(line) {
            // Seen edge-on.
            return;
        }
        let (first, second) = if turn > 0.0 { (a, b) } else { (b, a) };
        let s = geom::angle_of(first);
        let e = geom::angle_of(second);
        if s <= e {
            self.block_span(line, tag, s, e);
        } else {
            self.block_span(line, tag, s, TAU);
            self.block_span(line, tag, 0.0, e);
        }
    }

    fn block_span(&mut self, line: Line, tag: i32, s: f64, e: f64) {
        let mut next = Vec::with_capacity(self.gaps.len() + 1);
        for g in core::mem::take(&mut self.gaps) {
            let os = s.max(g.start);
            let oe = e.min(g.end);
            if oe - os <= ANGLE_TOL {
                next.push(g);
                continue;
            }
            self.blocks.push(Block {
                start_angle: os,
                end_angle: oe,
                start: self.ray_hit(line, os),
                end: self.ray_hit(line, oe),
                tag,
            });
            if os - g.start > ANGLE_TOL {
                next.push(Gap {
                    start: g.start,
                    end: os,
                });
            }
            if g.end - oe > ANGLE_TOL {
                next.push(Gap {
                    start: oe,
                    end: g.end,
                });
            }
        }
        self.gaps = next;
    }

    /// Where the ray from the centre at `angle` meets the infinite line through `line`.
    fn ray_hit(&self, line: Line, angle: f64) -> Point {
        let dir = Vec2::from_angle(angle);
        let d = line.p1 - line.p0;
        let denom = dir.cross(d);
        if denom.abs() < f64::EPSILON {
            // Grazing ray: take the nearer end point.
            return if (line.p0 - self.centre).hypot2() <= (line.p1 - self.centre).hypot2() {
                line.p0
            } else {
                line.p1
            };
        }
        let t = (line.p0 - self.centre).cross(d) / denom;
        self.centre + dir * t
    }

    fn assemble(&mut self) {
        let fov_start = geom::normalize_angle(self.options.start_angle);
        let wraps = self.options.wraps();
        // Blocks past angle zero in a wrapping window sort after those before it.
        let unwrap = |b: &Block, angle: f64| {
            if wraps && b.start_angle < fov_start - ANGLE_TOL {
                angle + TAU
            } else {
                angle
            }
        };
        let ordered: Vec<Block> = if wraps {
            let (after, before): (Vec<Block>, Vec<Block>) = self
                .blocks
                .iter()
                .copied()
                .partition(|b| b.start_angle >= fov_start - ANGLE_TOL);
            after.into_iter().chain(before).collect()
        } else {
            self.blocks.clone()
        };

        let tol = self.tolerance;
        let mut poly: Vec<Point> = Vec::with_capacity(ordered.len() * 2 + 2);
        let partial = !self.options.is_full();
        if partial && !self.options.wraps() {
            poly.push(self.centre);
        }
        let mut occluded = 0.0;
        let mut prev: Option<&Block> = None;
        for b in &ordered {
            if let Some(p) = prev {
                let open =
                    angular_gap(unwrap(p, p.end_angle), unwrap(b, b.start_angle)) > ANGLE_TOL;
                if open {
                    // Nothing was seen in this direction.
                    push_unique(&mut poly, self.centre, tol);
                } else if !geom::approx_eq(p.end, b.start, tol) {
                    occluded += (b.start - p.end).hypot();
                }
            }
            push_unique(&mut poly, b.start, tol);
            push_unique(&mut poly, b.end, tol);
            prev = Some(b);
        }
        if !partial
            && let (Some(first), Some(last)) = (ordered.first(), ordered.last())
        {
            if angular_gap(last.end_angle, first.start_angle + TAU) > ANGLE_TOL {
                push_unique(&mut poly, self.centre, tol);
            } else if !geom::approx_eq(last.end, first.start, tol) {
                occluded += (first.start - last.end).hypot();
            }
            if poly.len() > 1 && geom::approx_eq(poly[0], poly[poly.len() - 1], tol) {
                poly.pop();
            }
        }
        if partial && self.options.wraps() {
            push_unique(&mut poly, self.centre, tol);
        }
        if ordered.is_empty() {
            // Unbounded and unobstructed: only the centre is known.
            poly.clear();
            poly.push(self.centre);
        }
        if self.options.close
            && poly.len() > 1
            && !geom::approx_eq(poly[0], poly[poly.len() - 1], tol)
        {
            poly.push(poly[0]);
        }
        self.polygon = poly;
        self.occluded_perimeter = occluded;
    }

    /// Viewpoint.
    pub fn centre(&self) -> Point {
        self.centre
    }

    /// Visible polygon, in counter-clockwise order.
    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    /// Resolved blocks in angular order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether some part of the window saw no line, before any bounding region was applied.
    pub fn has_open_gaps(&self) -> bool {
        self.open
    }

    /// Distance to the boundary along the ray at `angle`, if a block covers it.
    pub fn distance_at(&self, angle: f64) -> Option<f64> {
        let a = geom::normalize_angle(angle);
        let b = self
            .blocks
            .iter()
            .find(|b| b.start_angle - ANGLE_TOL <= a && a <= b.end_angle + ANGLE_TOL)?;
        let hit = self.ray_hit(Line::new(b.start, b.end), a);
        Some((hit - self.centre).hypot())
    }

    /// Area, perimeter, drift and radial measures.
    pub fn stats(&self) -> IsovistStats {
        let area = geom::polygon_signed_area(&self.polygon).abs();
        let perimeter = geom::polyline_length(&self.polygon, true);
        let centroid = geom::polygon_centroid(&self.polygon);
        let drift = centroid - self.centre;
        let min_radial = self
            .blocks
            .iter()
            .map(|b| geom::distance_to_segment(self.centre, Line::new(b.start, b.end)))
            .fold(f64::INFINITY, f64::min);
        let max_radial = self
            .blocks
            .iter()
            .flat_map(|b| [b.start, b.end])
            .map(|p| (p - self.centre).hypot())
            .fold(0.0, f64::max);
        let compactness = if perimeter > 0.0 {
            4.0 * core::f64::consts::PI * area / (perimeter * perimeter)
        } else {
            0.0
        };
        IsovistStats {
            area,
            perimeter,
            occluded_perimeter: self.occluded_perimeter,
            centroid,
            drift_magnitude: drift.hypot(),
            drift_angle: geom::angle_of(drift).to_degrees(),
            min_radial: if min_radial.is_finite() { min_radial } else { 0.0 },
            max_radial,
            compactness,
        }
    }
}

fn line_len(l: Line) -> f64 {
    geom::line_length(l)
}

/// Counter-clockwise angle from `from` to `to`, where `to` may exceed `2π`.
fn angular_gap(from: f64, to: f64) -> f64 {
    (to - from).max(0.0)
}

fn push_unique(poly: &mut Vec<Point>, p: Point, tol: f64) {
    if poly.last().is_none_or(|last| !geom::approx_eq(*last, p, tol)) {
        poly.push(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, PI};

    fn square(size: f64) -> BspTree {
        let c = [
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ];
        BspTree::build((0..4).map(|i| (Line::new(c[i], c[(i + 1) % 4]), i32::try_from(i).unwrap())))
    }

    fn on_square_boundary(p: Point, size: f64) -> bool {
        let e = 1e-9;
        (p.x.abs() < e || (p.x - size).abs() < e || p.y.abs() < e || (p.y - size).abs() < e)
            && p.x > -e
            && p.x < size + e
            && p.y > -e
            && p.y < size + e
    }

    #[test]
    fn empty_box_is_the_box() {
        let tree = square(10.0);
        let iso = Isovist::compute(&tree, Point::new(5.0, 5.0), &IsovistOptions::default());
        let s = iso.stats();
        assert!((s.area - 100.0).abs() < 1e-9, "area {}", s.area);
        assert!((s.perimeter - 40.0).abs() < 1e-9, "perimeter {}", s.perimeter);
        assert_eq!(s.occluded_perimeter, 0.0);
        assert!(!iso.has_open_gaps());
        for p in iso.polygon() {
            assert!(on_square_boundary(*p, 10.0), "{p:?} off the boundary");
        }
        for corner in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            let corner = Point::from(corner);
            assert!(iso.polygon().iter().any(|p| geom::approx_eq(*p, corner, 1e-9)));
        }
        assert!((s.min_radial - 5.0).abs() < 1e-9);
        assert!((s.max_radial - 50.0_f64.sqrt()).abs() < 1e-9);
        assert!(s.drift_magnitude < 1e-9);
    }

    #[test]
    fn quarter_and_three_quarters_partition_the_circle() {
        let tree = square(10.0);
        let c = Point::new(5.0, 5.0);
        let quarter = Isovist::compute(
            &tree,
            c,
            &IsovistOptions {
                start_angle: 0.0,
                end_angle: FRAC_PI_2,
                close: true,
                bounds: None,
            },
        );
        let rest = Isovist::compute(
            &tree,
            c,
            &IsovistOptions {
                start_angle: FRAC_PI_2,
                end_angle: 0.0,
                close: true,
                bounds: None,
            },
        );
        // Non-wrapping window starts at the centre; wrapping window ends there.
        assert!(geom::approx_eq(quarter.polygon()[0], c, 1e-12));
        let r = rest.polygon();
        assert!(geom::approx_eq(r[r.len() - 2], c, 1e-12));

        let a = quarter.stats().area;
        let b = rest.stats().area;
        assert!((a - 25.0).abs() < 1e-9, "quarter area {a}");
        assert!((b - 75.0).abs() < 1e-9, "rest area {b}");

        let span = |iso: &Isovist| {
            iso.blocks()
                .iter()
                .map(|b| b.end_angle - b.start_angle)
                .sum::<f64>()
        };
        assert!((span(&quarter) - FRAC_PI_2).abs() < 1e-9);
        assert!((span(&rest) - 1.5 * PI).abs() < 1e-9);
    }

    #[test]
    fn nearer_wall_hides_farther_wall() {
        let mut lines: Vec<(Line, i32)> = Vec::new();
        let c = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        for i in 0..4 {
            lines.push((Line::new(c[i], c[(i + 1) % 4]), 0));
        }
        // Screen in front of the right wall.
        lines.push((Line::new((7.0, 4.0), (7.0, 6.0)), 9));
        let tree = BspTree::build(lines);
        let iso = Isovist::compute(&tree, Point::new(5.0, 5.0), &IsovistOptions::default());
        assert!((iso.distance_at(0.0).unwrap() - 2.0).abs() < 1e-9);
        assert!(iso.blocks().iter().any(|b| b.tag == 9));
        let s = iso.stats();
        assert!(s.occluded_perimeter > 0.0);
        assert!(s.area < 100.0);
        assert!((s.min_radial - 2.0).abs() < 1e-9);
    }

    #[test]
    fn no_lines_and_no_bounds_is_just_the_centre() {
        let tree = BspTree::build(core::iter::empty());
        let iso = Isovist::compute(&tree, Point::new(1.0, 1.0), &IsovistOptions::default());
        assert!(iso.has_open_gaps());
        assert_eq!(iso.polygon(), [Point::new(1.0, 1.0)]);
        assert_eq!(iso.stats().area, 0.0);
    }

    #[test]
    fn bounds_close_an_unobstructed_view() {
        let tree = BspTree::build(core::iter::empty());
        let bounds = Some(Rect::new(-10.0, -10.0, 10.0, 10.0));
        let full = Isovist::compute(
            &tree,
            Point::ORIGIN,
            &IsovistOptions {
                bounds,
                ..Default::default()
            },
        );
        assert!(full.has_open_gaps());
        assert!((full.stats().area - 400.0).abs() < 1e-9);
        assert!(full.blocks().iter().all(|b| b.tag == REGION_TAG));
        let p = full.polygon();
        assert!(geom::approx_eq(p[0], p[p.len() - 1], 1e-12));

        // The window's extreme rays run out to the region.
        let quarter = Isovist::compute(
            &tree,
            Point::ORIGIN,
            &IsovistOptions {
                start_angle: 0.0,
                end_angle: FRAC_PI_2,
                close: true,
                bounds,
            },
        );
        let p = quarter.polygon();
        assert!(geom::approx_eq(p[0], Point::ORIGIN, 1e-12));
        assert!(geom::approx_eq(p[1], Point::new(10.0, 0.0), 1e-9));
        assert!(geom::approx_eq(p[p.len() - 2], Point::new(0.0, 10.0), 1e-9));
        assert!(geom::approx_eq(p[p.len() - 1], Point::ORIGIN, 1e-12));
        let s = quarter.stats();
        assert!((s.area - 100.0).abs() < 1e-9, "area {}", s.area);
        assert!(s.occluded_perimeter.abs() < 1e-9);
    }

    #[test]
    fn wrapping_window_keeps_the_gap_across_zero() {
        let at = |deg: f64| Point::ORIGIN + Vec2::from_angle(deg.to_radians()) * 10.0;
        let tree = BspTree::build([
            (Line::new(at(300.0), at(330.0)), 0),
            (Line::new(at(30.0), at(60.0)), 1),
        ]);
        let iso = Isovist::compute(
            &tree,
            Point::ORIGIN,
            &IsovistOptions {
                start_angle: 270_f64.to_radians(),
                end_angle: FRAC_PI_2,
                close: true,
                bounds: None,
            },
        );
        let expected = [at(300.0), at(330.0), Point::ORIGIN, at(30.0), at(60.0), Point::ORIGIN];
        let p = iso.polygon();
        assert_eq!(p.len(), expected.len() + 1);
        for (got, want) in p.iter().zip(expected) {
            assert!(geom::approx_eq(*got, want, 1e-9), "{got:?} vs {want:?}");
        }
        let s = iso.stats();
        assert!(s.occluded_perimeter.abs() < 1e-9);
        // Two 30 degree wedges of radius 10.
        assert!((s.area - 50.0).abs() < 1e-9, "area {}", s.area);
    }
}
