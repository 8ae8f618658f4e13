// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape graphs: axial, segment, convex and data maps, and how they are built.

use kurbo::{Line, ParamCurve, Point, Rect, Vec2};
use sala_core::{AttributeTable, Communicator, ProgressPoller, Result, SalaError, ShapeRef, geom};

use crate::connector::{Dir, SegmentRef};
use crate::shape::{SalaShape, ShapeKinds};
use crate::shape_map::{DEFAULT_CELL_SIZE, ShapeMap};

/// Locked column holding each shape's neighbour count.
pub const CONNECTIVITY: &str = "Connectivity";
/// Locked column holding each axial line's length.
pub const LINE_LENGTH: &str = "Line Length";
/// Locked column holding each segment's length.
pub const SEGMENT_LENGTH: &str = "Segment Length";
/// Locked column holding the axial line a segment was cut from.
pub const AXIAL_LINE_REF: &str = "Axial Line Ref";

/// Default share of its axial line below which a dangling end piece is dropped.
pub const DEFAULT_STUB_REMOVAL: f64 = 0.4;

// Cells per side of a freshly built map's spatial index.
const INDEX_RESOLUTION: f64 = 64.0;

/// What the shapes of a graph stand for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapKind {
    /// Longest lines of sight, linked where they cross.
    Axial,
    /// Axial lines cut at their junctions, linked end to end with turn weights.
    Segment,
    /// Convex spaces, linked by hand.
    Convex,
    /// Plain shapes with no graph.
    #[default]
    Data,
}

/// A shape map together with the meaning of its connectors.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeGraph {
    kind: MapKind,
    map: ShapeMap,
}

impl ShapeGraph {
    /// Empty graph. Every kind but [`MapKind::Data`] carries a [`CONNECTIVITY`] column.
    pub fn new(name: &str, kind: MapKind) -> Self {
        Self::with_map(ShapeMap::new(name), kind)
    }

    fn with_map(mut map: ShapeMap, kind: MapKind) -> Self {
        if kind != MapKind::Data {
            map.attributes.insert_or_reset_locked_column(CONNECTIVITY);
        }
        Self { kind, map }
    }

    /// What the shapes stand for.
    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// The underlying shapes.
    pub fn map(&self) -> &ShapeMap {
        &self.map
    }

    /// Mutable access to the underlying shapes.
    ///
    /// Shapes added this way are unlinked and carry no connectivity value.
    pub fn map_mut(&mut self) -> &mut ShapeMap {
        &mut self.map
    }

    /// The attribute table.
    pub fn attributes(&self) -> &AttributeTable {
        &self.map.attributes
    }

    /// Add an unlinked shape.
    pub fn add_shape(&mut self, shape: SalaShape) -> Result<ShapeRef> {
        let r = self.map.make_shape(shape, None)?;
        if let Some(slot) = self.map.slot_of(r) {
            self.refresh_connectivity(slot);
        }
        Ok(r)
    }

    /// Remove a shape, detaching it from its neighbours.
    pub fn remove_shape(&mut self, shape_ref: ShapeRef) -> Result<SalaShape> {
        let slot = self
            .map
            .slot_of(shape_ref)
            .ok_or(SalaError::ShapeNotFound(shape_ref))?;
        let (shape, neighbours) = self
            .map
            .remove_slot(slot)
            .ok_or(SalaError::ShapeNotFound(shape_ref))?;
        for n in neighbours {
            self.refresh_connectivity(n);
        }
        Ok(shape)
    }

    /// Link two shapes both ways. Returns false if they were already linked.
    pub fn link(&mut self, a: ShapeRef, b: ShapeRef) -> Result<bool> {
        let (sa, sb) = self.slot_pair(a, b)?;
        if sa == sb {
            return Ok(false);
        }
        let added = self.map.connector_mut(sa).is_some_and(|c| c.connect(sb));
        if let Some(c) = self.map.connector_mut(sb) {
            c.connect(sa);
        }
        self.refresh_connectivity(sa);
        self.refresh_connectivity(sb);
        Ok(added)
    }

    /// Remove the link between two shapes. Returns false if there was none.
    pub fn unlink(&mut self, a: ShapeRef, b: ShapeRef) -> Result<bool> {
        let (sa, sb) = self.slot_pair(a, b)?;
        let removed = self.map.connector_mut(sa).is_some_and(|c| c.detach(sb));
        if let Some(c) = self.map.connector_mut(sb) {
            c.detach(sa);
        }
        self.refresh_connectivity(sa);
        self.refresh_connectivity(sb);
        Ok(removed)
    }

    fn slot_pair(&self, a: ShapeRef, b: ShapeRef) -> Result<(usize, usize)> {
        let sa = self.map.slot_of(a).ok_or(SalaError::ShapeNotFound(a))?;
        let sb = self.map.slot_of(b).ok_or(SalaError::ShapeNotFound(b))?;
        Ok((sa, sb))
    }

    fn refresh_connectivity(&mut self, slot: usize) {
        let Some(col) = self.map.attributes.column_index(CONNECTIVITY) else {
            return;
        };
        if let Some(r) = self.map.ref_of(slot) {
            let degree = level(self.map.connector_at(slot).degree());
            self.map.attributes.set_value(r, col, degree);
        }
    }

    /// Axial map from lines: lines are linked wherever they cross or touch.
    ///
    /// Zero-length lines are skipped. Writes the locked [`CONNECTIVITY`] and
    /// [`LINE_LENGTH`] columns.
    pub fn axial_from_lines(name: &str, lines: &[Line], comm: &dyn Communicator) -> Result<Self> {
        let lines = usable_lines(lines);
        let mut graph = Self::with_map(indexed_map(name, &lines)?, MapKind::Axial);
        for l in &lines {
            graph.map.make_shape(SalaShape::Line(*l), None)?;
        }
        let tol = graph.map.tolerance();
        let slots = graph.map.live_slots();
        tracing::info!(lines = slots.len(), "building axial graph");
        let mut poller = ProgressPoller::new(comm, slots.len());
        for (n, s) in slots.iter().enumerate() {
            poller.tick(n)?;
            let Some(line) = graph.map.shape_at(*s).and_then(SalaShape::as_line) else {
                continue;
            };
            let probe = geom::line_bounds(line).inflate(tol, tol);
            let crossing: Vec<usize> = graph
                .map
                .candidates(probe)
                .filter(|c| c > s)
                .filter(|c| {
                    graph
                        .map
                        .shape_at(*c)
                        .and_then(SalaShape::as_line)
                        .is_some_and(|other| geom::lines_intersect(line, other, tol))
                })
                .collect();
            for c in crossing {
                if let Some(conn) = graph.map.connector_mut(*s) {
                    conn.connect(c);
                }
                if let Some(conn) = graph.map.connector_mut(c) {
                    conn.connect(*s);
                }
            }
        }
        let length = graph.map.attributes.insert_or_reset_locked_column(LINE_LENGTH);
        for s in slots {
            graph.refresh_connectivity(s);
            if let (Some(r), Some(shape)) = (graph.map.ref_of(s), graph.map.shape_at(s)) {
                let len = shape.length();
                graph.map.attributes.set_value(r, length, len);
            }
        }
        Ok(graph)
    }

    /// Segment map cut from an axial map.
    ///
    /// Each axial line is cut wherever a linked line meets it. A dangling end piece
    /// shorter than `stub_removal` times its axial line is dropped (pass
    /// [`DEFAULT_STUB_REMOVAL`] for the usual 40 %, or `0.0` to keep every piece). Writes
    /// the locked [`CONNECTIVITY`], [`SEGMENT_LENGTH`] and [`AXIAL_LINE_REF`] columns.
    pub fn segments_from_axial(
        axial: &Self,
        stub_removal: f64,
        comm: &dyn Communicator,
    ) -> Result<Self> {
        if !axial.map.kinds().contains(ShapeKinds::LINES) {
            return Err(SalaError::EmptyMap);
        }
        let tol = axial.map.tolerance();
        let slots = axial.map.live_slots();
        tracing::info!(lines = slots.len(), stub_removal, "cutting axial lines into segments");
        let mut poller = ProgressPoller::new(comm, slots.len());
        let mut pieces: Vec<(Line, ShapeRef)> = Vec::new();
        for (n, s) in slots.iter().enumerate() {
            poller.tick(n)?;
            let (Some(line), Some(r)) = (
                axial.map.shape_at(*s).and_then(SalaShape::as_line),
                axial.map.ref_of(*s),
            ) else {
                continue;
            };
            let others = axial
                .map
                .connector_at(*s)
                .connections
                .iter()
                .filter_map(|c| axial.map.shape_at(*c).and_then(SalaShape::as_line));
            for piece in cut_line(line, others, stub_removal, tol) {
                pieces.push((piece, r));
            }
        }

        let lines: Vec<Line> = pieces.iter().map(|(l, _)| *l).collect();
        let mut graph = Self::with_map(indexed_map(axial.map.name(), &lines)?, MapKind::Segment);
        let axial_col = graph.map.attributes.insert_or_reset_locked_column(AXIAL_LINE_REF);
        for (l, axial_ref) in pieces {
            let r = graph.map.make_shape(SalaShape::Line(l), None)?;
            graph.map.attributes.set_value(r, axial_col, f64::from(axial_ref));
        }
        graph.link_segment_ends(tol, comm)?;
        Ok(graph)
    }

    /// Segment map from lines that are already cut at their junctions.
    ///
    /// Segments are linked where their end points coincide.
    pub fn segments_from_lines(name: &str, lines: &[Line], comm: &dyn Communicator) -> Result<Self> {
        let lines = usable_lines(lines);
        let mut graph = Self::with_map(indexed_map(name, &lines)?, MapKind::Segment);
        for l in &lines {
            graph.map.make_shape(SalaShape::Line(*l), None)?;
        }
        let tol = graph.map.tolerance();
        graph.link_segment_ends(tol, comm)?;
        Ok(graph)
    }

    fn link_segment_ends(&mut self, tol: f64, comm: &dyn Communicator) -> Result<()> {
        let slots = self.map.live_slots();
        let mut poller = ProgressPoller::new(comm, slots.len());
        for (n, s) in slots.iter().enumerate() {
            poller.tick(n)?;
            let Some(line) = self.map.shape_at(*s).and_then(SalaShape::as_line) else {
                continue;
            };
            let forward = self.steps_from(*s, line.p1, line.p1 - line.p0, tol);
            let backward = self.steps_from(*s, line.p0, line.p0 - line.p1, tol);
            if let Some(c) = self.map.connector_mut(*s) {
                for step in forward.iter().chain(&backward) {
                    c.connect(step.slot);
                }
                c.forward = forward;
                c.backward = backward;
            }
        }
        let length = self.map.attributes.insert_or_reset_locked_column(SEGMENT_LENGTH);
        for s in slots {
            self.refresh_connectivity(s);
            if let (Some(r), Some(shape)) = (self.map.ref_of(s), self.map.shape_at(s)) {
                let len = shape.length();
                self.map.attributes.set_value(r, length, len);
            }
        }
        Ok(())
    }

    /// Steps onto segments with an end at `at`, leaving `from` while heading `heading`.
    fn steps_from(&self, from: usize, at: Point, heading: Vec2, tol: f64) -> Vec<SegmentRef> {
        let probe = Rect::new(at.x - tol, at.y - tol, at.x + tol, at.y + tol);
        let mut steps = Vec::new();
        for c in self.map.candidates(probe) {
            if c == from {
                continue;
            }
            let Some(other) = self.map.shape_at(c).and_then(SalaShape::as_line) else {
                continue;
            };
            if geom::approx_eq(other.p0, at, tol) {
                steps.push(SegmentRef {
                    dir: Dir::Forward,
                    slot: c,
                    weight: geom::angular_weight(heading, other.p1 - other.p0),
                });
            }
            if geom::approx_eq(other.p1, at, tol) {
                steps.push(SegmentRef {
                    dir: Dir::Backward,
                    slot: c,
                    weight: geom::angular_weight(heading, other.p0 - other.p1),
                });
            }
        }
        steps
    }
}

#[allow(clippy::cast_precision_loss, reason = "neighbour counts are small")]
pub(crate) fn level(n: usize) -> f64 {
    n as f64
}

fn usable_lines(lines: &[Line]) -> Vec<Line> {
    lines
        .iter()
        .copied()
        .filter(|l| !geom::is_degenerate(*l, geom::TOLERANCE))
        .collect()
}

/// An empty map whose index cells suit the extent of `lines`.
fn indexed_map(name: &str, lines: &[Line]) -> Result<ShapeMap> {
    let extent = lines
        .iter()
        .map(|l| geom::line_bounds(*l))
        .reduce(|a, b| a.union(b))
        .map_or(0.0, |r| r.width().max(r.height()));
    let cell = if extent > 0.0 {
        extent / INDEX_RESOLUTION
    } else {
        DEFAULT_CELL_SIZE
    };
    ShapeMap::with_cell_size(name, cell)
}

/// Cut `line` wherever one of `others` meets it, dropping short dangling ends.
fn cut_line(
    line: Line,
    others: impl Iterator<Item = Line>,
    stub_removal: f64,
    tol: f64,
) -> Vec<Line> {
    let len = geom::line_length(line);
    let eps = tol / len;
    let mut cuts = Vec::new();
    for other in others {
        match geom::line_parameters(line, other) {
            Some((t, _)) => cuts.push(t.clamp(0.0, 1.0)),
            // Parallel and touching: cut where the other line's ends lie on this one.
            None => {
                for p in [other.p0, other.p1] {
                    if geom::distance_to_segment(p, line) <= tol {
                        let t = (p - line.p0).dot(line.p1 - line.p0) / (len * len);
                        cuts.push(t.clamp(0.0, 1.0));
                    }
                }
            }
        }
    }
    let start_joined = cuts.iter().any(|t| *t <= eps);
    let end_joined = cuts.iter().any(|t| *t >= 1.0 - eps);
    cuts.push(0.0);
    cuts.push(1.0);
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|b, a| *b - *a <= eps);
    if let Some(last) = cuts.last_mut() {
        *last = 1.0;
    }

    let count = cuts.len() - 1;
    let mut out = Vec::with_capacity(count);
    for (i, w) in cuts.windows(2).enumerate() {
        let dangling = (i == 0 && !start_joined) || (i + 1 == count && !end_joined);
        let is_stub = count > 1 && dangling && (w[1] - w[0]) < stub_removal;
        if !is_stub {
            out.push(Line::new(line.eval(w[0]), line.eval(w[1])));
        }
    }
    out
}
