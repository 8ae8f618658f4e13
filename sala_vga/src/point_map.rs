// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Regular grid of points over a region, with fill, blocking lines and merge pairs.

use std::collections::VecDeque;

use kurbo::{Line, Point as KPoint, Rect, Vec2};
use sala_core::{AttributeTable, Result, SalaError, geom};
use sala_index::{GridSpec, Segment};

use crate::merge::MergePairs;
use crate::pixel::{PixelRef, Point, PointState};

/// How a seed fill marks the points it adds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FillType {
    /// Ordinary fill.
    #[default]
    Full,
    /// Fill of context space around the analysed area.
    Context,
    /// Fill added on top of an existing analysis.
    Augment,
}

impl FillType {
    fn state(self) -> PointState {
        match self {
            Self::Full => PointState::FILLED,
            Self::Context => PointState::FILLED | PointState::CONTEXTFILLED,
            Self::Augment => PointState::FILLED | PointState::AUGMENTED,
        }
    }
}

/// Largest grid dimension; pixel coordinates are 16-bit.
const MAX_CELLS: usize = i16::MAX as usize;

/// A grid of points for visibility graph analysis.
///
/// Cell `(i, j)` is centred on `bottom_left + (i · spacing, j · spacing)`. Attribute rows
/// are keyed by [`PixelRef::key`] and exist exactly for filled points.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointMap {
    name: String,
    region: Rect,
    spacing: f64,
    offset: Vec2,
    bottom_left: KPoint,
    cols: usize,
    rows: usize,
    pub(crate) points: Vec<Point>,
    pub(crate) merges: MergePairs,
    pub(crate) attributes: AttributeTable,
    pub(crate) blocking_lines: Vec<Line>,
    lines_blocked: bool,
    pub(crate) graph_built: bool,
    filled_count: usize,
}

impl PointMap {
    /// Allocate a grid over `region` with cells of side `spacing`.
    pub fn new(name: &str, region: Rect, spacing: f64) -> Result<Self> {
        let mut map = Self {
            name: name.to_owned(),
            region,
            spacing,
            offset: Vec2::ZERO,
            bottom_left: KPoint::ORIGIN,
            cols: 0,
            rows: 0,
            points: Vec::new(),
            merges: MergePairs::new(),
            attributes: AttributeTable::new(),
            blocking_lines: Vec::new(),
            lines_blocked: false,
            graph_built: false,
            filled_count: 0,
        };
        map.set_grid(spacing, Vec2::ZERO)?;
        Ok(map)
    }

    /// Reallocate the grid. Every point, attribute row and merge pair is discarded.
    ///
    /// `offset` shifts the cell centres from their default placement, where the first
    /// cell's lower-left corner sits on the region's lower-left corner.
    pub fn set_grid(&mut self, spacing: f64, offset: Vec2) -> Result<()> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(SalaError::InvalidGrid("spacing must be positive"));
        }
        let r = self.region;
        if !(r.width() > 0.0 && r.height() > 0.0) {
            return Err(SalaError::InvalidGrid("region has no area"));
        }
        let cols = cells_across(r.width() - offset.x, spacing);
        let rows = cells_across(r.height() - offset.y, spacing);
        if cols > MAX_CELLS || rows > MAX_CELLS {
            return Err(SalaError::InvalidGrid("grid is too large"));
        }
        self.spacing = spacing;
        self.offset = offset;
        self.bottom_left = KPoint::new(
            r.x0 + spacing * 0.5 + offset.x,
            r.y0 + spacing * 0.5 + offset.y,
        );
        self.cols = cols;
        self.rows = rows;
        self.points = vec![Point::default(); cols * rows];
        self.merges.clear();
        self.attributes = AttributeTable::new();
        self.lines_blocked = false;
        self.graph_built = false;
        self.filled_count = 0;
        tracing::debug!(name = %self.name, cols, rows, spacing, "allocated point grid");
        Ok(())
    }

    /// Map name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Region covered.
    pub fn region(&self) -> Rect {
        self.region
    }

    /// Cell side.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Grid offset passed to [`PointMap::set_grid`].
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Centre of cell `(0, 0)`.
    pub fn bottom_left(&self) -> KPoint {
        self.bottom_left
    }

    /// Attribute table; rows exist for filled points.
    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Mutable attribute table.
    pub fn attributes_mut(&mut self) -> &mut AttributeTable {
        &mut self.attributes
    }

    /// Whether [`PointMap::block_lines`] has run on the current grid.
    pub fn lines_blocked(&self) -> bool {
        self.lines_blocked
    }

    /// Whether the visibility graph is built.
    pub fn graph_built(&self) -> bool {
        self.graph_built
    }

    /// Number of filled points.
    pub fn filled_point_count(&self) -> usize {
        self.filled_count
    }

    /// Merge pairs.
    pub fn merges(&self) -> &MergePairs {
        &self.merges
    }

    /// Blocking lines passed to [`PointMap::block_lines`].
    pub fn blocking_lines(&self) -> &[Line] {
        &self.blocking_lines
    }

    /// Whether `p` addresses a cell of the grid.
    pub fn includes(&self, p: PixelRef) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.cols && (p.y as usize) < self.rows
    }

    pub(crate) fn index_of(&self, p: PixelRef) -> Option<usize> {
        self.includes(p)
            .then(|| p.y as usize * self.cols + p.x as usize)
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "grid dimensions are capped at i16::MAX"
    )]
    pub(crate) fn pixel_of(&self, index: usize) -> PixelRef {
        PixelRef::new((index % self.cols) as i16, (index / self.cols) as i16)
    }

    /// Cell at `p`.
    pub fn point(&self, p: PixelRef) -> Option<&Point> {
        self.index_of(p).map(|i| &self.points[i])
    }

    pub(crate) fn point_mut(&mut self, p: PixelRef) -> Option<&mut Point> {
        self.index_of(p).map(|i| &mut self.points[i])
    }

    /// Filled points in attribute-key order.
    pub fn filled_pixels(&self) -> Vec<PixelRef> {
        let mut v: Vec<PixelRef> = (0..self.points.len())
            .filter(|i| self.points[*i].filled())
            .map(|i| self.pixel_of(i))
            .collect();
        v.sort_unstable();
        v
    }

    /// Cell containing `p`. With `constrain`, points outside the grid snap to the nearest
    /// cell; otherwise they give `None`.
    pub fn pixelate(&self, p: KPoint, constrain: bool) -> Option<PixelRef> {
        let fx = ((p.x - self.bottom_left.x) / self.spacing).round();
        let fy = ((p.y - self.bottom_left.y) / self.spacing).round();
        let (max_x, max_y) = (self.cols as f64 - 1.0, self.rows as f64 - 1.0);
        let inside = (0.0..=max_x).contains(&fx) && (0.0..=max_y).contains(&fy);
        if !inside && !constrain {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "clamped into the grid, which is capped at i16::MAX"
        )]
        Some(PixelRef::new(
            fx.clamp(0.0, max_x) as i16,
            fy.clamp(0.0, max_y) as i16,
        ))
    }

    /// Centre of cell `p`.
    pub fn depixelate(&self, p: PixelRef) -> KPoint {
        KPoint::new(
            self.bottom_left.x + f64::from(p.x) * self.spacing,
            self.bottom_left.y + f64::from(p.y) * self.spacing,
        )
    }

    /// Bounds of cell `p`.
    pub fn cell_rect(&self, p: PixelRef) -> Rect {
        let c = self.depixelate(p);
        let h = self.spacing * 0.5;
        Rect::new(c.x - h, c.y - h, c.x + h, c.y + h)
    }

    pub(crate) fn raster(&self) -> GridSpec {
        let h = self.spacing * 0.5;
        GridSpec::new(
            self.bottom_left.x - h,
            self.bottom_left.y - h,
            self.spacing,
            self.spacing,
        )
    }

    pub(crate) fn tolerance(&self) -> f64 {
        self.spacing * 1e-9
    }

    /// Rasterize blocking lines onto the grid.
    ///
    /// Every cell a line passes through keeps the piece of the line inside it and is marked
    /// [`PointState::BLOCKED`]. Filled cells that become blocked are unfilled. Replaces any
    /// previous blocking.
    pub fn block_lines(&mut self, lines: &[Line]) {
        self.clear_graph();
        for pt in &mut self.points {
            pt.lines.clear();
            pt.state.remove(PointState::BLOCKED);
        }
        let grid = self.raster();
        let tol = self.tolerance();
        let mut blocked = 0_usize;
        for line in lines {
            if geom::is_degenerate(*line, tol) {
                continue;
            }
            let seg = Segment::new(line.p0.x, line.p0.y, line.p1.x, line.p1.y);
            for (c, r) in grid.cells_on_segment(seg) {
                let (Ok(x), Ok(y)) = (i16::try_from(c), i16::try_from(r)) else {
                    continue;
                };
                let pix = PixelRef::new(x, y);
                if !self.includes(pix) {
                    continue;
                }
                let Some(piece) = geom::crop_line(*line, self.cell_rect(pix)) else {
                    continue;
                };
                if geom::is_degenerate(piece, tol) {
                    continue;
                }
                if let Some(pt) = self.point_mut(pix) {
                    if !pt.blocked() {
                        blocked += 1;
                    }
                    pt.lines.push(piece);
                    pt.state.insert(PointState::BLOCKED);
                }
            }
        }
        for i in 0..self.points.len() {
            if self.points[i].blocked() && self.points[i].filled() {
                let pix = self.pixel_of(i);
                self.unfill_at(pix);
            }
        }
        self.blocking_lines = lines.to_vec();
        self.lines_blocked = true;
        tracing::debug!(lines = lines.len(), cells = blocked, "blocked lines on grid");
    }

    /// Whether moving between two cells crosses a blocking line kept by any of `cells`.
    pub(crate) fn crosses_lines(&self, from: PixelRef, to: PixelRef, cells: &[PixelRef]) -> bool {
        let seg = Line::new(self.depixelate(from), self.depixelate(to));
        let tol = self.tolerance();
        cells.iter().filter_map(|c| self.point(*c)).any(|pt| {
            pt.lines
                .iter()
                .any(|l| geom::lines_intersect(seg, *l, tol))
        })
    }

    /// Seed fill from `seed` through empty, unblocked cells, in eight directions.
    ///
    /// A diagonal step may not squeeze between blocking lines through the shared corner.
    /// Returns the number of cells filled.
    pub fn make_points(&mut self, seed: KPoint, fill: FillType) -> Result<usize> {
        let start = self.pixelate(seed, false).ok_or(SalaError::SeedOutsideGrid)?;
        match self.point(start) {
            Some(pt) if !pt.filled() && !pt.blocked() => {}
            _ => return Err(SalaError::SeedNotFillable),
        }
        self.clear_graph();
        let state = fill.state();
        let mut added = 0;
        let mut queue = VecDeque::from([start]);
        self.fill_at(start, state);
        added += 1;
        while let Some(cur) = queue.pop_front() {
            for (dx, dy) in NEIGHBOURS {
                let Some(next) = cur.offset(dx, dy) else {
                    continue;
                };
                match self.point(next) {
                    Some(pt) if !pt.filled() && !pt.blocked() => {}
                    _ => continue,
                }
                if dx != 0 && dy != 0 {
                    let sides = [
                        PixelRef::new(next.x, cur.y),
                        PixelRef::new(cur.x, next.y),
                    ];
                    if self.crosses_lines(cur, next, &sides) {
                        continue;
                    }
                }
                self.fill_at(next, state);
                added += 1;
                queue.push_back(next);
            }
        }
        tracing::info!(added, total = self.filled_count, "seed fill complete");
        Ok(added)
    }

    /// Fill or unfill a single cell. Blocked cells cannot be filled.
    pub fn fill_point(&mut self, p: PixelRef, fill: bool) -> bool {
        let Some(pt) = self.point(p) else {
            return false;
        };
        if fill == pt.filled() || (fill && pt.blocked()) {
            return false;
        }
        self.clear_graph();
        if fill {
            self.fill_at(p, PointState::FILLED);
        } else {
            self.unfill_at(p);
        }
        true
    }

    /// Unfill every cell, dropping the graph, merge pairs and attribute rows.
    pub fn clear_points(&mut self) {
        self.clear_graph();
        for pt in &mut self.points {
            pt.unfill();
        }
        self.merges.clear();
        self.attributes.clear_rows();
        self.filled_count = 0;
    }

    /// Drop the visibility graph and every attribute column, keeping the fill.
    pub fn unmake(&mut self) {
        self.clear_graph();
        let names: Vec<String> = self.attributes.column_names().map(str::to_owned).collect();
        for n in names {
            self.attributes.remove_column(&n);
        }
    }

    pub(crate) fn clear_graph(&mut self) {
        if !self.graph_built && self.points.iter().all(|p| p.node.is_none()) {
            return;
        }
        for pt in &mut self.points {
            pt.node = None;
        }
        self.graph_built = false;
    }

    fn fill_at(&mut self, p: PixelRef, state: PointState) {
        if let Some(pt) = self.point_mut(p) {
            pt.state.insert(state);
            self.filled_count += 1;
            self.attributes.add_row(p.key());
        }
    }

    fn unfill_at(&mut self, p: PixelRef) {
        if let Some(other) = self.merges.unmerge(p)
            && let Some(o) = self.point_mut(other)
        {
            o.state.remove(PointState::MERGED);
        }
        if let Some(pt) = self.point_mut(p) {
            pt.unfill();
            self.filled_count -= 1;
            self.attributes.remove_row(p.key());
        }
    }

    /// Flag filled points with at least one unfilled (or off-grid) eight-neighbour as
    /// [`PointState::EDGE`]. Returns how many were flagged.
    pub fn mark_edges(&mut self) -> usize {
        let mut count = 0;
        for i in 0..self.points.len() {
            if !self.points[i].filled() {
                self.points[i].state.remove(PointState::EDGE);
                continue;
            }
            let p = self.pixel_of(i);
            let edge = NEIGHBOURS.iter().any(|(dx, dy)| {
                p.offset(*dx, *dy)
                    .and_then(|n| self.point(n))
                    .is_none_or(|n| !n.filled())
            });
            self.points[i].state.set(PointState::EDGE, edge);
            count += usize::from(edge);
        }
        count
    }

    /// Unfill every filled point that is not on the edge of the fill.
    pub(crate) fn keep_edges_only(&mut self) -> usize {
        self.mark_edges();
        let interior: Vec<PixelRef> = (0..self.points.len())
            .filter(|i| self.points[*i].filled() && !self.points[*i].edge())
            .map(|i| self.pixel_of(i))
            .collect();
        for p in &interior {
            self.unfill_at(*p);
        }
        interior.len()
    }

    /// Join two filled points into a merge pair.
    pub fn merge_pixels(&mut self, a: PixelRef, b: PixelRef) -> Result<()> {
        for p in [a, b] {
            if !self.point(p).is_some_and(Point::filled) {
                return Err(SalaError::InvalidGrid("merge points must be filled"));
            }
        }
        for old in self.merges.merge(a, b) {
            if let Some(pt) = self.point_mut(old) {
                pt.state.remove(PointState::MERGED);
            }
        }
        for p in [a, b] {
            if let Some(pt) = self.point_mut(p) {
                pt.state.insert(PointState::MERGED);
            }
        }
        Ok(())
    }

    /// Break the merge pair containing `p`; returns the former partner.
    pub fn unmerge_pixel(&mut self, p: PixelRef) -> Option<PixelRef> {
        let other = self.merges.unmerge(p)?;
        for q in [p, other] {
            if let Some(pt) = self.point_mut(q) {
                pt.state.remove(PointState::MERGED);
            }
        }
        Some(other)
    }

    /// Merge partner of `p`.
    pub fn merge_partner(&self, p: PixelRef) -> Option<PixelRef> {
        self.merges.partner(p)
    }

    /// Select or deselect a filled point.
    pub fn set_selected(&mut self, p: PixelRef, selected: bool) {
        if let Some(pt) = self.point_mut(p)
            && pt.filled()
        {
            pt.state.set(PointState::SELECTED, selected);
            self.attributes.set_selected(p.key(), selected);
        }
    }

    /// Selected points in key order.
    pub fn selection(&self) -> Vec<PixelRef> {
        self.attributes
            .selected_keys()
            .into_iter()
            .map(PixelRef::from_key)
            .collect()
    }

    /// Deselect every point.
    pub fn clear_selection(&mut self) {
        for pt in &mut self.points {
            pt.state.remove(PointState::SELECTED);
        }
        self.attributes.clear_selection();
    }
}

/// Eight-neighbour steps.
pub(crate) const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn cells_across(extent: f64, spacing: f64) -> usize {
    let n = (extent / spacing - 1e-9).ceil().max(1.0);
    if n >= MAX_CELLS as f64 {
        return MAX_CELLS + 1;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "n is positive and below MAX_CELLS"
    )]
    let n = n as usize;
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{room, square_walls};

    #[test]
    fn grid_dimensions_and_centres() {
        let m = PointMap::new("g", Rect::new(0.0, 0.0, 10.0, 5.0), 1.0).unwrap();
        assert_eq!((m.cols(), m.rows()), (10, 5));
        assert_eq!(m.depixelate(PixelRef::new(0, 0)), KPoint::new(0.5, 0.5));
        assert_eq!(m.pixelate(KPoint::new(3.4, 2.6), false), Some(PixelRef::new(3, 2)));
        assert_eq!(m.pixelate(KPoint::new(30.0, 2.6), false), None);
        assert_eq!(m.pixelate(KPoint::new(30.0, 2.6), true), Some(PixelRef::new(9, 2)));
    }

    #[test]
    fn invalid_grids_are_rejected() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            PointMap::new("g", r, 0.0),
            Err(SalaError::InvalidGrid(_))
        ));
        assert!(matches!(
            PointMap::new("g", Rect::new(0.0, 0.0, 0.0, 1.0), 1.0),
            Err(SalaError::InvalidGrid(_))
        ));
    }

    #[test]
    fn enclosed_fill_counts_reachable_cells() {
        let m = room(&[]);
        // Walls run through the outer ring of cell centres; the 9 × 9 interior remains.
        assert_eq!(m.filled_point_count(), 81);
        assert_eq!(m.attributes().row_count(), 81);
    }

    #[test]
    fn fill_does_not_leak_through_a_partition() {
        let mut m = PointMap::new("p", Rect::new(-0.5, -0.5, 10.5, 10.5), 1.0).unwrap();
        let mut walls = square_walls();
        walls.push(Line::new((5.0, 0.0), (5.0, 10.0)));
        m.block_lines(&walls);
        let added = m.make_points(KPoint::new(2.0, 2.0), FillType::Full).unwrap();
        assert_eq!(added, 4 * 9);
    }

    #[test]
    fn fill_does_not_leak_through_a_diagonal_wall() {
        let mut m = PointMap::new("d", Rect::new(-0.5, -0.5, 10.5, 10.5), 1.0).unwrap();
        let mut walls = square_walls();
        walls.push(Line::new((0.0, 0.0), (10.0, 10.0)));
        m.block_lines(&walls);
        let added = m.make_points(KPoint::new(7.0, 2.0), FillType::Full).unwrap();
        // Below the diagonal: cells with 1 <= y < x <= 9, minus the diagonal itself.
        assert_eq!(added, (1..=9).map(|x| x - 1).sum::<usize>());
    }

    #[test]
    fn bad_seeds_change_nothing() {
        let mut m = PointMap::new("s", Rect::new(-0.5, -0.5, 10.5, 10.5), 1.0).unwrap();
        m.block_lines(&square_walls());
        assert_eq!(
            m.make_points(KPoint::new(50.0, 50.0), FillType::Full),
            Err(SalaError::SeedOutsideGrid)
        );
        assert_eq!(
            m.make_points(KPoint::new(0.0, 5.0), FillType::Full),
            Err(SalaError::SeedNotFillable)
        );
        assert_eq!(m.filled_point_count(), 0);
        m.make_points(KPoint::new(5.0, 5.0), FillType::Context).unwrap();
        assert_eq!(
            m.make_points(KPoint::new(5.0, 5.0), FillType::Full),
            Err(SalaError::SeedNotFillable)
        );
        let p = m.point(PixelRef::new(5, 5)).unwrap();
        assert!(p.state.contains(PointState::CONTEXTFILLED));
    }

    #[test]
    fn edges_ring_the_fill() {
        let mut m = room(&[]);
        // 9 × 9 block: the outer ring has 32 cells.
        assert_eq!(m.mark_edges(), 32);
        assert!(m.point(PixelRef::new(1, 1)).unwrap().edge());
        assert!(!m.point(PixelRef::new(5, 5)).unwrap().edge());
    }

    #[test]
    fn merge_and_unfill_keep_pairs_consistent() {
        let mut m = room(&[]);
        let (a, b) = (PixelRef::new(1, 1), PixelRef::new(9, 9));
        m.merge_pixels(a, b).unwrap();
        assert_eq!(m.merge_partner(b), Some(a));
        assert!(m.point(a).unwrap().state.contains(PointState::MERGED));
        assert!(m.fill_point(a, false));
        assert_eq!(m.merge_partner(b), None);
        assert!(!m.point(b).unwrap().state.contains(PointState::MERGED));
        assert!(m.merge_pixels(a, b).is_err());
    }

    #[test]
    fn selection_tracks_attribute_rows() {
        let mut m = room(&[]);
        m.set_selected(PixelRef::new(2, 3), true);
        m.set_selected(PixelRef::new(0, 0), true);
        assert_eq!(m.selection(), [PixelRef::new(2, 3)]);
        m.clear_selection();
        assert!(m.selection().is_empty());
    }

    #[test]
    fn clear_points_empties_everything() {
        let mut m = room(&[]);
        m.clear_points();
        assert_eq!(m.filled_point_count(), 0);
        assert_eq!(m.attributes().row_count(), 0);
        assert!(m.filled_pixels().is_empty());
    }
}
