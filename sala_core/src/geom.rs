// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry kernel: intersection tests, cropping, angles and polygon measures.
//!
//! All routines work on [`kurbo`] types. Tolerances are absolute distances in map units.

use core::f64::consts::{PI, TAU};

use kurbo::{Line, Point, Rect, Vec2};

/// Default absolute tolerance for coincidence tests.
pub const TOLERANCE: f64 = 1e-9;

/// Whether two points coincide within `tol`.
#[inline]
pub fn approx_eq(a: Point, b: Point, tol: f64) -> bool {
    (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol
}

/// Length of a line.
#[inline]
pub fn line_length(l: Line) -> f64 {
    (l.p1 - l.p0).hypot()
}

/// Bounding rectangle of a line.
#[inline]
pub fn line_bounds(l: Line) -> Rect {
    Rect::from_points(l.p0, l.p1)
}

/// Whether a line has (near) zero length.
#[inline]
pub fn is_degenerate(l: Line, tol: f64) -> bool {
    approx_eq(l.p0, l.p1, tol)
}

/// Direction of a line's travel, not normalized.
#[inline]
pub fn direction(l: Line) -> Vec2 {
    l.p1 - l.p0
}

/// Whether the bounding regions of two lines overlap, inflated by `tol`.
///
/// Always run this before [`intersect_line`]: the orientation test alone accepts
/// collinear lines that lie apart.
pub fn intersect_region(a: Line, b: Line, tol: f64) -> bool {
    let ra = line_bounds(a);
    let rb = line_bounds(b);
    ra.x0 <= rb.x1 + tol && rb.x0 <= ra.x1 + tol && ra.y0 <= rb.y1 + tol && rb.y0 <= ra.y1 + tol
}

/// Signed distance of `p` from the infinite line through `l`. Positive is to the left.
pub fn side_distance(l: Line, p: Point) -> f64 {
    let d = direction(l);
    let len = d.hypot();
    if len == 0.0 {
        return (p - l.p0).hypot();
    }
    d.cross(p - l.p0) / len
}

/// Orientation test: do the lines cross or touch within `tol`?
pub fn intersect_line(a: Line, b: Line, tol: f64) -> bool {
    let straddles = |l: Line, m: Line| {
        let d0 = side_distance(l, m.p0);
        let d1 = side_distance(l, m.p1);
        !((d0 > tol && d1 > tol) || (d0 < -tol && d1 < -tol))
    };
    straddles(a, b) && straddles(b, a)
}

/// Full segment intersection test with tolerance.
#[inline]
pub fn lines_intersect(a: Line, b: Line, tol: f64) -> bool {
    intersect_region(a, b, tol) && intersect_line(a, b, tol)
}

/// Strict crossing test: true only when each segment passes properly through the other,
/// i.e. touching end points and collinear overlap do not count.
pub fn lines_cross(a: Line, b: Line, tol: f64) -> bool {
    if !intersect_region(a, b, tol) {
        return false;
    }
    let proper = |l: Line, m: Line| {
        let d0 = side_distance(l, m.p0);
        let d1 = side_distance(l, m.p1);
        (d0 > tol && d1 < -tol) || (d0 < -tol && d1 > tol)
    };
    proper(a, b) && proper(b, a)
}

/// Parameters `(ta, tb)` at which the infinite lines through `a` and `b` meet, if not parallel.
pub fn line_parameters(a: Line, b: Line) -> Option<(f64, f64)> {
    let da = direction(a);
    let db = direction(b);
    let denom = da.cross(db);
    if denom.abs() < f64::EPSILON * da.hypot() * db.hypot() || denom == 0.0 {
        return None;
    }
    let w = b.p0 - a.p0;
    Some((w.cross(db) / denom, w.cross(da) / denom))
}

/// Point where two segments meet, if they do (parameters clamped by `tol` relative to length).
pub fn intersection_point(a: Line, b: Line, tol: f64) -> Option<Point> {
    let (ta, tb) = line_parameters(a, b)?;
    let ea = tol / line_length(a).max(f64::MIN_POSITIVE);
    let eb = tol / line_length(b).max(f64::MIN_POSITIVE);
    if ta < -ea || ta > 1.0 + ea || tb < -eb || tb > 1.0 + eb {
        return None;
    }
    Some(a.p0 + direction(a) * ta)
}

/// Crop a line to a rectangle (Liang–Barsky). Returns `None` if it misses the rectangle.
pub fn crop_line(l: Line, r: Rect) -> Option<Line> {
    let d = direction(l);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-d.x, l.p0.x - r.x0),
        (d.x, r.x1 - l.p0.x),
        (-d.y, l.p0.y - r.y0),
        (d.y, r.y1 - l.p0.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    Some(Line::new(l.p0 + d * t0, l.p0 + d * t1))
}

/// Angle of a vector in `[0, 2π)`.
#[inline]
pub fn angle_of(v: Vec2) -> f64 {
    normalize_angle(v.y.atan2(v.x))
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(a: f64) -> f64 {
    let r = a.rem_euclid(TAU);
    if r >= TAU { 0.0 } else { r }
}

/// Turning angle in `[0, π]` when travelling `a → b → c`. Zero for a straight path.
pub fn turn_angle(a: Point, b: Point, c: Point) -> f64 {
    vector_turn(b - a, c - b)
}

/// Angle in `[0, π]` between two travel directions.
pub fn vector_turn(u: Vec2, v: Vec2) -> f64 {
    let lu = u.hypot();
    let lv = v.hypot();
    if lu == 0.0 || lv == 0.0 {
        return 0.0;
    }
    (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0).acos()
}

/// Turn measured in right angles: `0` straight on, `1` a right angle, `2` a U-turn.
#[inline]
pub fn angular_weight(u: Vec2, v: Vec2) -> f64 {
    vector_turn(u, v) / (PI * 0.5)
}

/// Euclidean distance from `p` to the segment `l`.
pub fn distance_to_segment(p: Point, l: Line) -> f64 {
    let d = direction(l);
    let len2 = d.hypot2();
    if len2 == 0.0 {
        return (p - l.p0).hypot();
    }
    let t = ((p - l.p0).dot(d) / len2).clamp(0.0, 1.0);
    (p - (l.p0 + d * t)).hypot()
}

/// Signed polygon area (counter-clockwise positive). The ring may or may not be closed.
pub fn polygon_signed_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

/// Area-weighted centroid of a polygon; falls back to the vertex mean for degenerate rings.
pub fn polygon_centroid(pts: &[Point]) -> Point {
    let area = polygon_signed_area(pts);
    let n = pts.len();
    if area.abs() < f64::EPSILON {
        return vertex_mean(pts);
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let k = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * k;
        cy += (a.y + b.y) * k;
    }
    Point::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Mean of a point set; the origin if empty.
pub fn vertex_mean(pts: &[Point]) -> Point {
    if pts.is_empty() {
        return Point::ORIGIN;
    }
    #[allow(clippy::cast_precision_loss, reason = "vertex counts are small")]
    let n = pts.len() as f64;
    let s = pts.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    (s / n).to_point()
}

/// Length of a polyline; `closed` adds the closing edge.
pub fn polyline_length(pts: &[Point], closed: bool) -> f64 {
    let mut len: f64 = pts.windows(2).map(|w| (w[1] - w[0]).hypot()).sum();
    if closed && pts.len() > 2 {
        len += (pts[0] - pts[pts.len() - 1]).hypot();
    }
    len
}

/// Even–odd point-in-polygon test.
pub fn point_in_polygon(p: Point, pts: &[Point]) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Bounding rectangle of a point set.
pub fn bounds_of(pts: &[Point]) -> Rect {
    let mut it = pts.iter();
    let Some(first) = it.next() else {
        return Rect::ZERO;
    };
    it.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}
