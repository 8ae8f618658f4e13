// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility graph construction.

use sala_core::{AnalysisResult, ColumnSet, Communicator, ProgressPoller, Result, SalaError};

use crate::node::{BIN_COUNT, Node, grid, which_bin};
use crate::pixel::{PixelRef, PointState};
use crate::point_map::PointMap;
use crate::sieve::{SparkSieve, sweep};

/// Locked column holding the number of visible points.
pub const CONNECTIVITY: &str = "Connectivity";
/// Locked column holding the sum of distances to visible points.
pub const FIRST_MOMENT: &str = "Point First Moment";
/// Locked column holding the sum of squared distances to visible points.
pub const SECOND_MOMENT: &str = "Point Second Moment";

/// Visibility graph options.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GraphOptions {
    /// Link edge points only, then reduce the fill to them once the graph is built.
    pub boundary_graph: bool,
    /// Ignore points farther than this, in map units.
    pub max_dist: Option<f64>,
    /// Sweep half the octants and record each pair in both directions.
    pub reciprocal: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            boundary_graph: false,
            max_dist: None,
            reciprocal: true,
        }
    }
}

impl PointMap {
    /// Build the visibility graph of the filled points.
    ///
    /// Fails with [`SalaError::LinesNotBlocked`] before [`PointMap::block_lines`], and with
    /// [`SalaError::NoFilledPoints`] on an empty fill. On cancellation every node is dropped,
    /// the connectivity columns are rolled back and the fill is left as it was.
    pub fn make_graph(
        &mut self,
        options: &GraphOptions,
        comm: &dyn Communicator,
    ) -> Result<AnalysisResult> {
        if !self.lines_blocked() {
            return Err(SalaError::LinesNotBlocked);
        }
        if self.filled_point_count() == 0 {
            return Err(SalaError::NoFilledPoints);
        }
        self.clear_graph();
        tracing::info!(
            points = self.filled_point_count(),
            reciprocal = options.reciprocal,
            "building visibility graph"
        );

        let mut cols = ColumnSet::new();
        let conn = cols.insert_locked(&mut self.attributes, CONNECTIVITY);
        let first = cols.insert_locked(&mut self.attributes, FIRST_MOMENT);
        let second = cols.insert_locked(&mut self.attributes, SECOND_MOMENT);

        let targets = if options.boundary_graph {
            self.mark_edges();
            PointState::FILLED | PointState::EDGE
        } else {
            PointState::FILLED
        };
        let outcome = self.build_nodes(options, targets, comm);
        if outcome.is_err() {
            self.clear_graph();
            return cols.settle(&mut self.attributes, outcome);
        }
        if options.boundary_graph {
            let erased = self.keep_edges_only();
            tracing::debug!(erased, "restricted fill to edge points");
        }

        let spacing = self.spacing();
        let mut edges = 0_usize;
        for i in 0..self.points.len() {
            let pix = self.pixel_of(i);
            let Some(node) = self.points[i].node.as_ref() else {
                continue;
            };
            let (mut m1, mut m2) = (0.0, 0.0);
            for p in node.pixels() {
                let (dx, dy) = pix.delta(p);
                let d2 = f64::from(dx * dx + dy * dy) * spacing * spacing;
                m1 += d2.sqrt();
                m2 += d2;
            }
            let count = node.count();
            edges += count;
            let key = pix.key();
            #[allow(clippy::cast_precision_loss, reason = "connectivity fits in f64 mantissa")]
            self.attributes.set_value(key, conn, count as f64);
            self.attributes.set_value(key, first, m1);
            self.attributes.set_value(key, second, m2);
        }
        self.graph_built = true;
        tracing::info!(edges, "visibility graph built");
        cols.settle(&mut self.attributes, Ok(()))
    }

    fn build_nodes(
        &mut self,
        options: &GraphOptions,
        targets: PointState,
        comm: &dyn Communicator,
    ) -> Result<()> {
        let pixels: Vec<PixelRef> = self
            .filled_pixels()
            .into_iter()
            .filter(|p| self.point(*p).is_some_and(|pt| pt.state.contains(targets)))
            .collect();
        let max_ring = i32::try_from(self.cols().max(self.rows())).unwrap_or(i32::MAX);
        let spacing = self.spacing();
        let max_dist2 = options.max_dist.map(|d| (d / spacing) * (d / spacing));
        let octants = if options.reciprocal { 0..4 } else { 0..8 };

        let mut nodes: Vec<Option<Node>> = vec![None; self.points.len()];
        for p in &pixels {
            if let Some(i) = self.index_of(*p) {
                nodes[i] = Some(Node::new());
            }
        }
        let mut poller = ProgressPoller::new(comm, pixels.len());
        let mut sieve = SparkSieve::default();
        let mut seen = Vec::new();
        for (n, from) in pixels.iter().enumerate() {
            poller.tick(n)?;
            seen.clear();
            sweep(
                self,
                *from,
                octants.clone(),
                targets,
                max_ring,
                max_dist2,
                &mut sieve,
                &mut seen,
            );
            for to in &seen {
                let (dx, dy) = from.delta(*to);
                let k = which_bin(dx, dy);
                push_pixel(self, &mut nodes, *from, k, *to);
                if options.reciprocal {
                    push_pixel(self, &mut nodes, *to, (k + 16) % BIN_COUNT, *from);
                }
            }
        }

        for p in &pixels {
            if let Some(i) = self.index_of(*p)
                && let Some(mut node) = nodes[i].take()
            {
                node.finish(*p, spacing);
                self.points[i].node = Some(node);
            }
        }
        self.set_grid_connections();
        Ok(())
    }

    fn set_grid_connections(&mut self) {
        const STEPS: [(i32, i32, usize, u8); 4] = [
            (1, 0, 0, grid::RIGHT),
            (0, 1, 8, grid::UP),
            (-1, 0, 16, grid::LEFT),
            (0, -1, 24, grid::DOWN),
        ];
        for i in 0..self.points.len() {
            let pix = self.pixel_of(i);
            let Some(node) = self.points[i].node.as_ref() else {
                continue;
            };
            let mut bits = 0;
            for (dx, dy, bin, bit) in STEPS {
                if let Some(n) = pix.offset(dx, dy)
                    && node.bin_contains(bin, n)
                {
                    bits |= bit;
                }
            }
            if let Some(node) = self.points[i].node.as_mut() {
                node.set_grid_connections(bits);
            }
        }
    }

    /// Visible points of `p`, or nothing if it has no node.
    pub fn visible_from(&self, p: PixelRef) -> impl Iterator<Item = PixelRef> + '_ {
        self.point(p)
            .and_then(|pt| pt.node.as_ref())
            .into_iter()
            .flat_map(Node::pixels)
    }
}

fn push_pixel(map: &PointMap, nodes: &mut [Option<Node>], at: PixelRef, bin: usize, p: PixelRef) {
    if let Some(i) = map.index_of(at)
        && let Some(node) = nodes[i].as_mut()
    {
        node.bin_mut(bin).pixels.push(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{graph_room, room};
    use kurbo::Line;
    use sala_core::{CancelFlag, NOT_COMPUTED, NoComm};

    fn assert_symmetric(m: &PointMap) {
        for a in m.filled_pixels() {
            let node = m.point(a).unwrap().node.as_ref().unwrap();
            for k in 0..BIN_COUNT {
                for b in &node.bin(k).pixels {
                    let other = m.point(*b).unwrap().node.as_ref().unwrap();
                    assert!(
                        other.bin_contains((k + 16) % BIN_COUNT, a),
                        "{a:?} sees {b:?} in bin {k} but not the reverse"
                    );
                }
            }
        }
    }

    fn sees(m: &PointMap, a: (i16, i16), b: (i16, i16)) -> bool {
        let b = PixelRef::new(b.0, b.1);
        m.visible_from(PixelRef::new(a.0, a.1)).any(|p| p == b)
    }

    #[test]
    fn convex_room_is_fully_connected() {
        let m = graph_room(&[]);
        let conn = m.attributes().column_index(CONNECTIVITY).unwrap();
        for p in m.filled_pixels() {
            assert_eq!(m.attributes().value(p.key(), conn), 80.0);
        }
        assert!(m.attributes().is_locked(conn));
        assert_symmetric(&m);
    }

    #[test]
    fn full_sweep_matches_reciprocal_in_convex_room() {
        let a = graph_room(&[]);
        let mut b = room(&[]);
        b.make_graph(
            &GraphOptions {
                reciprocal: false,
                ..Default::default()
            },
            &NoComm,
        )
        .unwrap();
        for p in a.filled_pixels() {
            assert_eq!(a.point(p).unwrap().node, b.point(p).unwrap().node);
        }
    }

    #[test]
    fn partition_blocks_sight_lines() {
        let m = graph_room(&[Line::new((5.0, 0.0), (5.0, 6.0))]);
        assert_eq!(m.filled_point_count(), 75);
        assert!(!sees(&m, (4, 3), (6, 3)));
        assert!(!sees(&m, (1, 1), (9, 1)));
        assert!(sees(&m, (4, 8), (6, 8)));
        assert!(sees(&m, (1, 9), (9, 9)));
        assert!(sees(&m, (4, 3), (4, 9)));
        assert_symmetric(&m);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let mut m = graph_room(&[Line::new((3.0, 3.0), (7.0, 5.0))]);
        let before: Vec<_> = m.points.iter().map(|p| p.node.clone()).collect();
        m.make_graph(&GraphOptions::default(), &NoComm).unwrap();
        let after: Vec<_> = m.points.iter().map(|p| p.node.clone()).collect();
        assert_eq!(before, after);
        assert_symmetric(&m);
    }

    #[test]
    fn grazing_a_wall_end_blocks_sight() {
        let wall = Line::new((2.5, 6.5), (7.5, 6.5));
        for reciprocal in [true, false] {
            let mut m = room(&[wall]);
            let options = GraphOptions {
                reciprocal,
                ..Default::default()
            };
            m.make_graph(&options, &NoComm).unwrap();
            // (1, 8) to (3, 6) runs exactly through (2.5, 6.5).
            assert!(!sees(&m, (1, 8), (3, 6)), "reciprocal {reciprocal}");
            assert!(!sees(&m, (3, 6), (1, 8)), "reciprocal {reciprocal}");

            let tol = m.tolerance();
            let pixels = m.filled_pixels();
            for a in &pixels {
                for b in &pixels {
                    if a == b {
                        continue;
                    }
                    let sight = Line::new(m.depixelate(*a), m.depixelate(*b));
                    let clear = !m
                        .blocking_lines()
                        .iter()
                        .any(|l| sala_core::geom::lines_intersect(sight, *l, tol));
                    let seen = m.visible_from(*a).any(|p| p == *b);
                    assert_eq!(seen, clear, "{a:?} to {b:?}, reciprocal {reciprocal}");
                }
            }
        }
    }

    #[test]
    fn grid_connections_follow_fill() {
        let m = graph_room(&[]);
        let centre = m.point(PixelRef::new(5, 5)).unwrap().node.as_ref().unwrap();
        assert_eq!(
            centre.grid_connections(),
            grid::RIGHT | grid::UP | grid::LEFT | grid::DOWN
        );
        let corner = m.point(PixelRef::new(1, 1)).unwrap().node.as_ref().unwrap();
        assert_eq!(corner.grid_connections(), grid::RIGHT | grid::UP);
    }

    #[test]
    fn max_dist_limits_connections() {
        let mut m = room(&[]);
        m.make_graph(
            &GraphOptions {
                max_dist: Some(1.5),
                ..Default::default()
            },
            &NoComm,
        )
        .unwrap();
        let conn = m.attributes().column_index(CONNECTIVITY).unwrap();
        assert_eq!(m.attributes().value(PixelRef::new(5, 5).key(), conn), 8.0);
        assert_eq!(m.attributes().value(PixelRef::new(1, 1).key(), conn), 3.0);
    }

    #[test]
    fn moments_of_a_neighbourhood() {
        let mut m = room(&[]);
        m.make_graph(
            &GraphOptions {
                max_dist: Some(1.0),
                ..Default::default()
            },
            &NoComm,
        )
        .unwrap();
        let a = m.attributes();
        let key = PixelRef::new(5, 5).key();
        assert_eq!(a.value(key, a.column_index(FIRST_MOMENT).unwrap()), 4.0);
        assert_eq!(a.value(key, a.column_index(SECOND_MOMENT).unwrap()), 4.0);
    }

    #[test]
    fn boundary_graph_keeps_edges_only() {
        let mut m = room(&[]);
        m.make_graph(
            &GraphOptions {
                boundary_graph: true,
                ..Default::default()
            },
            &NoComm,
        )
        .unwrap();
        assert_eq!(m.filled_point_count(), 32);
        assert!(m.point(PixelRef::new(5, 5)).unwrap().node.is_none());
        assert!(sees(&m, (1, 1), (9, 9)));
        assert_symmetric(&m);
    }

    #[test]
    fn cancelled_boundary_graph_keeps_the_fill() {
        let mut m = room(&[]);
        let before = m.filled_pixels();
        let flag = CancelFlag::new();
        flag.cancel();
        let options = GraphOptions {
            boundary_graph: true,
            ..Default::default()
        };
        assert_eq!(m.make_graph(&options, &flag), Err(SalaError::Cancelled));
        assert_eq!(m.filled_point_count(), before.len());
        assert_eq!(m.filled_pixels(), before);
        assert!(m.attributes().has_row(PixelRef::new(5, 5).key()));
        assert!(m.points.iter().all(|p| p.node.is_none()));
    }

    #[test]
    fn preconditions() {
        let mut m = PointMap::new("x", kurbo::Rect::new(0.0, 0.0, 4.0, 4.0), 1.0).unwrap();
        assert_eq!(
            m.make_graph(&GraphOptions::default(), &NoComm),
            Err(SalaError::LinesNotBlocked)
        );
        m.block_lines(&[]);
        assert_eq!(
            m.make_graph(&GraphOptions::default(), &NoComm),
            Err(SalaError::NoFilledPoints)
        );
    }

    #[test]
    fn cancelled_rebuild_leaves_no_graph() {
        let mut m = graph_room(&[]);
        let flag = CancelFlag::new();
        flag.cancel();
        assert_eq!(
            m.make_graph(&GraphOptions::default(), &flag),
            Err(SalaError::Cancelled)
        );
        assert!(!m.graph_built());
        assert!(m.points.iter().all(|p| p.node.is_none()));
        let conn = m.attributes().column_index(CONNECTIVITY).unwrap();
        for p in m.filled_pixels() {
            assert_eq!(m.attributes().value(p.key(), conn), NOT_COMPUTED);
        }
    }

    #[test]
    fn cancelled_first_build_removes_columns() {
        let mut m = room(&[]);
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(m.make_graph(&GraphOptions::default(), &flag).is_err());
        assert_eq!(m.attributes().column_count(), 0);
    }
}
