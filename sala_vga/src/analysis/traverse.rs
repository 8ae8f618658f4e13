// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversals over the visibility graph.
//!
//! Merge partners are linked at zero cost: a partner joins the level (or cost) at which
//! its twin is reached, and the path direction restarts there.

use sala_core::radius::within;
use sala_core::{CostQueue, ProgressPoller, Result, Visited, geom};

use crate::pixel::PixelRef;
use crate::point_map::PointMap;

#[allow(clippy::cast_precision_loss, reason = "depths are far below 2^52")]
pub(crate) fn level(depth: usize) -> f64 {
    depth as f64
}

/// Scratch state reused across traversals of one map.
#[derive(Debug)]
pub(crate) struct Traversal {
    visited: Visited,
    cost: Vec<f64>,
    angle: Vec<f64>,
    prev: Vec<Option<PixelRef>>,
    queue: CostQueue<usize>,
    frontier: Vec<PixelRef>,
    next: Vec<PixelRef>,
}

impl Traversal {
    pub(crate) fn new(map: &PointMap) -> Self {
        let n = map.points.len();
        Self {
            visited: Visited::new(n),
            cost: vec![f64::INFINITY; n],
            angle: vec![0.0; n],
            prev: vec![None; n],
            queue: CostQueue::new(),
            frontier: Vec::new(),
            next: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.visited.reset();
        self.cost.fill(f64::INFINITY);
        self.angle.fill(0.0);
        self.prev.fill(None);
        self.queue.clear();
        self.frontier.clear();
        self.next.clear();
    }

    fn node_index(map: &PointMap, p: PixelRef) -> Option<usize> {
        map.index_of(p).filter(|i| map.points[*i].node.is_some())
    }

    /// Breadth-first levels from `sources`; `visit` gets each point and its step depth.
    pub(crate) fn visual(
        &mut self,
        map: &PointMap,
        sources: &[PixelRef],
        radius: f64,
        mut poller: Option<&mut ProgressPoller<'_>>,
        mut visit: impl FnMut(PixelRef, usize),
    ) -> Result<()> {
        self.reset();
        for s in sources {
            if let Some(i) = Self::node_index(map, *s)
                && self.visited.visit(i)
            {
                self.frontier.push(*s);
            }
        }
        let mut depth = 0;
        let mut settled = 0;
        while !self.frontier.is_empty() {
            let mut k = 0;
            while k < self.frontier.len() {
                if let Some(q) = map.merge_partner(self.frontier[k])
                    && let Some(j) = Self::node_index(map, q)
                    && self.visited.visit(j)
                {
                    self.frontier.push(q);
                }
                k += 1;
            }
            for p in &self.frontier {
                visit(*p, depth);
            }
            settled += self.frontier.len();
            if let Some(p) = poller.as_deref_mut() {
                p.tick(settled)?;
            }
            if !within(radius, level(depth + 1)) {
                break;
            }
            self.next.clear();
            for p in &self.frontier {
                for q in map.visible_from(*p) {
                    if let Some(j) = Self::node_index(map, q)
                        && self.visited.visit(j)
                    {
                        self.next.push(q);
                    }
                }
            }
            core::mem::swap(&mut self.frontier, &mut self.next);
            depth += 1;
        }
        Ok(())
    }

    /// Shortest paths by Euclidean length from `sources`.
    ///
    /// `visit` gets each point with its path length and the total turn along the path, in
    /// right angles.
    pub(crate) fn metric(
        &mut self,
        map: &PointMap,
        sources: &[PixelRef],
        radius: f64,
        poller: Option<&mut ProgressPoller<'_>>,
        visit: impl FnMut(PixelRef, f64, f64),
    ) -> Result<()> {
        let length = |from: kurbo::Point, to: kurbo::Point, _: f64| (to - from).hypot();
        self.search(map, sources, radius, poller, length, visit)
    }

    /// Least cumulative turn paths from `sources`, in right angles.
    pub(crate) fn angular(
        &mut self,
        map: &PointMap,
        sources: &[PixelRef],
        radius: f64,
        poller: Option<&mut ProgressPoller<'_>>,
        mut visit: impl FnMut(PixelRef, f64),
    ) -> Result<()> {
        let turn = |_: kurbo::Point, _: kurbo::Point, turn: f64| turn;
        self.search(map, sources, radius, poller, turn, |p, cost, _| visit(p, cost))
    }

    /// Dijkstra search where a step from `a` to `b` costs `step(a, b, turn)`; the first
    /// time a point is popped is final.
    fn search(
        &mut self,
        map: &PointMap,
        sources: &[PixelRef],
        radius: f64,
        mut poller: Option<&mut ProgressPoller<'_>>,
        step: impl Fn(kurbo::Point, kurbo::Point, f64) -> f64,
        mut visit: impl FnMut(PixelRef, f64, f64),
    ) -> Result<()> {
        self.reset();
        for s in sources {
            if let Some(i) = Self::node_index(map, *s) {
                self.cost[i] = 0.0;
                self.queue.push(0.0, i);
            }
        }
        let mut settled = 0;
        while let Some((c, i)) = self.queue.pop() {
            if !self.visited.visit(i) {
                continue;
            }
            let p = map.pixel_of(i);
            visit(p, c, self.angle[i]);
            settled += 1;
            if let Some(pl) = poller.as_deref_mut() {
                pl.tick(settled)?;
            }
            if let Some(q) = map.merge_partner(p)
                && let Some(j) = Self::node_index(map, q)
                && !self.visited.contains(j)
                && c < self.cost[j]
            {
                self.cost[j] = c;
                self.angle[j] = self.angle[i];
                self.prev[j] = None;
                self.queue.push(c, j);
            }
            let here = map.depixelate(p);
            let back = self.prev[i].map(|a| here - map.depixelate(a));
            for q in map.visible_from(p) {
                let Some(j) = Self::node_index(map, q) else {
                    continue;
                };
                if self.visited.contains(j) {
                    continue;
                }
                let there = map.depixelate(q);
                let turn = back.map_or(0.0, |b| geom::angular_weight(b, there - here));
                let nc = c + step(here, there, turn);
                if !within(radius, nc) || nc >= self.cost[j] {
                    continue;
                }
                self.cost[j] = nc;
                self.angle[j] = self.angle[i] + turn;
                self.prev[j] = Some(p);
                self.queue.push(nc, j);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::graph_room;
    use kurbo::Line;

    #[test]
    fn visual_levels_in_a_convex_room() {
        let m = graph_room(&[]);
        let mut t = Traversal::new(&m);
        let mut levels = [0_usize; 3];
        t.visual(&m, &[PixelRef::new(5, 5)], -1.0, None, |_, d| levels[d] += 1)
            .unwrap();
        assert_eq!(levels, [1, 80, 0]);
    }

    #[test]
    fn metric_paths_bend_round_a_partition() {
        let m = graph_room(&[Line::new((5.0, 0.0), (5.0, 6.0))]);
        let mut t = Traversal::new(&m);
        let target = PixelRef::new(6, 1);
        let mut found = None;
        t.metric(&m, &[PixelRef::new(4, 1)], -1.0, None, |p, d, a| {
            if p == target {
                found = Some((d, a));
            }
        })
        .unwrap();
        let (d, a) = found.unwrap();
        assert!(d > 12.0, "path length {d}");
        assert!(a > 0.5, "path turn {a}");
    }

    #[test]
    fn merge_links_cost_nothing() {
        let mut m = graph_room(&[Line::new((5.0, 0.0), (5.0, 6.0))]);
        m.merge_pixels(PixelRef::new(4, 1), PixelRef::new(6, 1)).unwrap();
        let mut t = Traversal::new(&m);
        let mut cost = None;
        t.metric(&m, &[PixelRef::new(4, 1)], -1.0, None, |p, d, _| {
            if p == PixelRef::new(6, 1) {
                cost = Some(d);
            }
        })
        .unwrap();
        assert_eq!(cost, Some(0.0));
    }

    #[test]
    fn angular_cost_is_zero_in_a_convex_room() {
        let m = graph_room(&[]);
        let mut t = Traversal::new(&m);
        let mut total = 0.0;
        let mut n = 0;
        t.angular(&m, &[PixelRef::new(2, 2)], -1.0, None, |_, c| {
            total += c;
            n += 1;
        })
        .unwrap();
        assert_eq!((n, total), (81, 0.0));
    }
}
