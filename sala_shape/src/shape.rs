// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shapes held by a shape map.

use kurbo::{Line, Point, Rect};
use sala_core::geom;
use sala_index::{Aabb2D, Extent, Segment};

bitflags::bitflags! {
    /// Kinds of shape present in a map.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ShapeKinds: u8 {
        /// At least one point.
        const POINTS = 1 << 0;
        /// At least one straight line.
        const LINES = 1 << 1;
        /// At least one open polyline.
        const POLYLINES = 1 << 2;
        /// At least one closed polygon.
        const POLYGONS = 1 << 3;
    }
}

/// A point, line, open polyline or closed polygon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SalaShape {
    /// A single location.
    Point(Point),
    /// A straight line.
    Line(Line),
    /// An open chain of vertices.
    Polyline(Vec<Point>),
    /// A closed ring; the closing edge is implied.
    Polygon(Vec<Point>),
}

impl SalaShape {
    /// The kind flag for this shape.
    pub fn kind(&self) -> ShapeKinds {
        match self {
            Self::Point(_) => ShapeKinds::POINTS,
            Self::Line(_) => ShapeKinds::LINES,
            Self::Polyline(_) => ShapeKinds::POLYLINES,
            Self::Polygon(_) => ShapeKinds::POLYGONS,
        }
    }

    /// The line, if this is one.
    pub fn as_line(&self) -> Option<Line> {
        match self {
            Self::Line(l) => Some(*l),
            _ => None,
        }
    }

    /// Whether the shape is a closed polygon.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Polygon(_))
    }

    /// Vertices in order. A line yields its two end points.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Self::Point(p) => vec![*p],
            Self::Line(l) => vec![l.p0, l.p1],
            Self::Polyline(pts) | Self::Polygon(pts) => pts.clone(),
        }
    }

    /// Bounding rectangle.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Point(p) => Rect::from_points(*p, *p),
            Self::Line(l) => geom::line_bounds(*l),
            Self::Polyline(pts) | Self::Polygon(pts) => geom::bounds_of(pts),
        }
    }

    /// Area centroid for polygons, mid point for lines, vertex mean for polylines.
    pub fn centroid(&self) -> Point {
        match self {
            Self::Point(p) => *p,
            Self::Line(l) => l.p0.midpoint(l.p1),
            Self::Polyline(pts) => geom::vertex_mean(pts),
            Self::Polygon(pts) => geom::polygon_centroid(pts),
        }
    }

    /// Enclosed area; zero unless closed.
    pub fn area(&self) -> f64 {
        match self {
            Self::Polygon(pts) => geom::polygon_signed_area(pts).abs(),
            _ => 0.0,
        }
    }

    /// Boundary length of a closed shape; zero otherwise.
    pub fn perimeter(&self) -> f64 {
        match self {
            Self::Polygon(pts) => geom::polyline_length(pts, true),
            _ => 0.0,
        }
    }

    /// Length along the shape. Polygons report their perimeter.
    pub fn length(&self) -> f64 {
        match self {
            Self::Point(_) => 0.0,
            Self::Line(l) => geom::line_length(*l),
            Self::Polyline(pts) => geom::polyline_length(pts, false),
            Self::Polygon(pts) => geom::polyline_length(pts, true),
        }
    }

    /// Whether `p` lies on or inside the shape, within `tol`.
    pub fn touches_point(&self, p: Point, tol: f64) -> bool {
        match self {
            Self::Point(q) => (*q - p).hypot() <= tol,
            Self::Line(l) => geom::distance_to_segment(p, *l) <= tol,
            Self::Polyline(pts) => edges(pts, false).any(|e| geom::distance_to_segment(p, e) <= tol),
            Self::Polygon(pts) => {
                geom::point_in_polygon(p, pts)
                    || edges(pts, true).any(|e| geom::distance_to_segment(p, e) <= tol)
            }
        }
    }

    /// Whether `line` meets the shape, within `tol`.
    pub fn touches_line(&self, line: Line, tol: f64) -> bool {
        match self {
            Self::Point(p) => geom::distance_to_segment(*p, line) <= tol,
            Self::Line(l) => geom::lines_intersect(*l, line, tol),
            Self::Polyline(pts) => edges(pts, false).any(|e| geom::lines_intersect(e, line, tol)),
            Self::Polygon(pts) => {
                geom::point_in_polygon(line.p0, pts)
                    || edges(pts, true).any(|e| geom::lines_intersect(e, line, tol))
            }
        }
    }

    /// Whether the shape meets the rectangle `r`.
    pub fn touches_rect(&self, r: Rect) -> bool {
        match self {
            Self::Point(p) => contains_inclusive(r, *p),
            Self::Line(l) => geom::crop_line(*l, r).is_some(),
            Self::Polyline(pts) => edges(pts, false).any(|e| geom::crop_line(e, r).is_some()),
            Self::Polygon(pts) => {
                geom::point_in_polygon(r.center(), pts)
                    || edges(pts, true).any(|e| geom::crop_line(e, r).is_some())
            }
        }
    }

    /// Index extent: lines register only the cells they cross.
    pub(crate) fn extent(&self) -> Extent {
        match self {
            Self::Line(l) => Extent::Segment(Segment::new(l.p0.x, l.p0.y, l.p1.x, l.p1.y)),
            _ => Extent::Box(rect_to_aabb(self.bounds())),
        }
    }
}

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D {
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}

// `Rect::contains` excludes the top and right edges.
fn contains_inclusive(r: Rect, p: Point) -> bool {
    (r.x0..=r.x1).contains(&p.x) && (r.y0..=r.y1).contains(&p.y)
}

fn edges(pts: &[Point], closed: bool) -> impl Iterator<Item = Line> + '_ {
    let closing = (closed && pts.len() > 2).then(|| Line::new(pts[pts.len() - 1], pts[0]));
    pts.windows(2)
        .map(|w| Line::new(w[0], w[1]))
        .chain(closing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SalaShape {
        SalaShape::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ])
    }

    #[test]
    fn polygon_measures() {
        let s = square();
        assert_eq!(s.area(), 16.0);
        assert_eq!(s.perimeter(), 16.0);
        assert_eq!(s.centroid(), Point::new(2.0, 2.0));
        assert_eq!(s.bounds(), Rect::new(0.0, 0.0, 4.0, 4.0));
        assert!(s.is_closed());
        assert_eq!(s.kind(), ShapeKinds::POLYGONS);
    }

    #[test]
    fn open_shapes_have_no_area() {
        let l = SalaShape::Line(Line::new((0.0, 0.0), (3.0, 4.0)));
        assert_eq!(l.length(), 5.0);
        assert_eq!(l.area(), 0.0);
        assert_eq!(l.perimeter(), 0.0);
        assert_eq!(l.centroid(), Point::new(1.5, 2.0));

        let p = SalaShape::Polyline(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
        ]);
        assert_eq!(p.length(), 4.0);
        assert_eq!(p.points().len(), 3);
    }

    #[test]
    fn touching() {
        let s = square();
        assert!(s.touches_point(Point::new(1.0, 1.0), 1e-9));
        assert!(!s.touches_point(Point::new(5.0, 1.0), 1e-9));
        assert!(s.touches_line(Line::new((-1.0, 2.0), (1.0, 2.0)), 1e-9));
        // Wholly inside counts.
        assert!(s.touches_line(Line::new((1.0, 1.0), (2.0, 2.0)), 1e-9));

        assert!(s.touches_rect(Rect::new(3.0, 3.0, 6.0, 6.0)));
        assert!(s.touches_rect(Rect::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!s.touches_rect(Rect::new(5.0, 5.0, 6.0, 6.0)));

        let p = SalaShape::Polyline(vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0)]);
        assert!(p.touches_point(Point::new(1.0, 0.0), 1e-9));
        assert!(!p.touches_line(Line::new((0.0, 1.0), (2.0, 1.0)), 1e-9));
    }
}
