// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binary space partition of boundary lines.
//!
//! Each node holds one splitting line. Lines on the left of the splitter (positive side
//! distance, as seen travelling from `p0` to `p1`) go to the left subtree, the rest to the
//! right. Lines crossing the splitter are cut in two.

use kurbo::{Line, Point, Rect};
use sala_core::geom;

/// Side of a splitting line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    /// Positive side distance, or on the line.
    Left,
    /// Negative side distance.
    Right,
}

/// One node of a [`BspTree`].
#[derive(Clone, Debug)]
pub struct BspNode {
    /// Splitting line, also a boundary line in its own right.
    pub line: Line,
    /// Caller tag carried through cuts.
    pub tag: i32,
    /// Subtree on the left of `line`.
    pub left: Option<Box<BspNode>>,
    /// Subtree on the right of `line`.
    pub right: Option<Box<BspNode>>,
}

impl BspNode {
    /// Which side of this node's line `p` lies on.
    pub fn classify(&self, p: Point) -> Side {
        if geom::side_distance(self.line, p) >= 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Children ordered near side first, as seen from `p`.
    pub fn near_far(&self, p: Point) -> (Option<&Self>, Option<&Self>) {
        match self.classify(p) {
            Side::Left => (self.left.as_deref(), self.right.as_deref()),
            Side::Right => (self.right.as_deref(), self.left.as_deref()),
        }
    }
}

/// A BSP tree over tagged lines, with the bounds of everything it holds.
#[derive(Clone, Debug, Default)]
pub struct BspTree {
    root: Option<Box<BspNode>>,
    bounds: Option<Rect>,
    len: usize,
}

impl BspTree {
    /// Build a tree. Zero-length lines, and zero-length pieces left over from cuts, are
    /// dropped.
    pub fn build(lines: impl IntoIterator<Item = (Line, i32)>) -> Self {
        let lines: Vec<(Line, i32)> = lines.into_iter().collect();
        let bounds = lines
            .iter()
            .map(|(l, _)| geom::line_bounds(*l))
            .reduce(|a, b| a.union(b));
        let tol = bounds.map_or(geom::TOLERANCE, tolerance_for);
        let lines: Vec<(Line, i32)> = lines
            .into_iter()
            .filter(|(l, _)| !geom::is_degenerate(*l, tol))
            .collect();
        let mut len = 0;
        let root = build_node(lines, tol, &mut len);
        tracing::trace!(nodes = len, "built bsp tree");
        Self { root, bounds, len }
    }

    /// Root node, if any.
    pub fn root(&self) -> Option<&BspNode> {
        self.root.as_deref()
    }

    /// Bounds of the input lines.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Point-matching tolerance scaled to the tree's bounds.
    pub fn tolerance(&self) -> f64 {
        self.bounds.map_or(geom::TOLERANCE, tolerance_for)
    }

    /// Number of nodes (lines after cutting).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no lines.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visit every node's line with its tag.
    pub fn for_each_line(&self, mut f: impl FnMut(Line, i32)) {
        let mut stack: Vec<&BspNode> = self.root.as_deref().into_iter().collect();
        while let Some(n) = stack.pop() {
            f(n.line, n.tag);
            stack.extend(n.left.as_deref());
            stack.extend(n.right.as_deref());
        }
    }
}

/// `max(width, height) * 1e-9`, floored at [`geom::TOLERANCE`].
pub fn tolerance_for(bounds: Rect) -> f64 {
    (bounds.width().max(bounds.height()) * 1e-9).max(geom::TOLERANCE)
}

fn build_node(mut lines: Vec<(Line, i32)>, tol: f64, len: &mut usize) -> Option<Box<BspNode>> {
    if lines.is_empty() {
        return None;
    }
    let (line, tag) = lines.swap_remove(lines.len() / 2);
    *len += 1;
    let mut left = Vec::new();
    let mut right = Vec::new();
    for (l, t) in lines {
        let d0 = geom::side_distance(line, l.p0);
        let d1 = geom::side_distance(line, l.p1);
        if d0 >= -tol && d1 >= -tol {
            left.push((l, t));
        } else if d0 <= tol && d1 <= tol {
            right.push((l, t));
        } else {
            let cut = l.p0.lerp(l.p1, d0 / (d0 - d1));
            let (a, b) = (Line::new(l.p0, cut), Line::new(cut, l.p1));
            let (pos, neg) = if d0 > 0.0 { (a, b) } else { (b, a) };
            if !geom::is_degenerate(pos, tol) {
                left.push((pos, t));
            }
            if !geom::is_degenerate(neg, tol) {
                right.push((neg, t));
            }
        }
    }
    Some(Box::new(BspNode {
        line,
        tag,
        left: build_node(left, tol, len),
        right: build_node(right, tol, len),
    }))
}
