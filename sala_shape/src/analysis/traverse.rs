// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversals over shape connectors.
//!
//! Directed searches run over states `2 · slot + dir`: a segment entered forwards leaves
//! by its end, one entered backwards leaves by its start.

use sala_core::radius::within;
use sala_core::{CostQueue, NOT_COMPUTED, Result, SalaError, Visited};

use crate::connector::Dir;
use crate::shape_map::ShapeMap;

pub(crate) fn state(slot: usize, dir: Dir) -> usize {
    slot * 2 + dir.index()
}

pub(crate) fn state_slot(state: usize) -> usize {
    state / 2
}

pub(crate) fn state_dir(state: usize) -> Dir {
    if state % 2 == 0 { Dir::Forward } else { Dir::Backward }
}

/// Per-slot weights from a column, with uncomputed values counting as zero.
pub(crate) fn weights(map: &ShapeMap, col: Option<&str>) -> Result<Option<Vec<f64>>> {
    let Some(name) = col else {
        return Ok(None);
    };
    let c = map
        .attributes
        .column_index(name)
        .ok_or_else(|| SalaError::ColumnNotFound(name.to_owned()))?;
    let mut w = vec![0.0; map.slot_count()];
    for slot in map.live_slots() {
        if let Some(r) = map.ref_of(slot) {
            let v = map.attributes.value(r, c);
            w[slot] = if v == NOT_COMPUTED { 0.0 } else { v.max(0.0) };
        }
    }
    Ok(Some(w))
}

/// Segment lengths by slot.
pub(crate) fn lengths(map: &ShapeMap) -> Vec<f64> {
    (0..map.slot_count())
        .map(|s| map.shape_at(s).map_or(0.0, |shape| shape.length()))
        .collect()
}

/// Breadth-first levels over undirected connections.
#[derive(Debug)]
pub(crate) struct Bfs {
    visited: Visited,
    depth: Vec<usize>,
    order: Vec<usize>,
}

impl Bfs {
    pub(crate) fn new(map: &ShapeMap) -> Self {
        let n = map.slot_count();
        Self {
            visited: Visited::new(n),
            depth: vec![0; n],
            order: Vec::new(),
        }
    }

    /// Visit everything within `max_depth` steps of `sources`; returns slots in visit order.
    pub(crate) fn run(&mut self, map: &ShapeMap, sources: &[usize], max_depth: Option<usize>) -> &[usize] {
        self.visited.reset();
        self.order.clear();
        for s in sources {
            if self.visited.visit(*s) {
                self.depth[*s] = 0;
                self.order.push(*s);
            }
        }
        let mut next = 0;
        while next < self.order.len() {
            let v = self.order[next];
            next += 1;
            let d = self.depth[v] + 1;
            if max_depth.is_some_and(|m| d > m) {
                continue;
            }
            for w in &map.connector_at(v).connections {
                if self.visited.visit(*w) {
                    self.depth[*w] = d;
                    self.order.push(*w);
                }
            }
        }
        &self.order
    }

    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }

    pub(crate) fn depth(&self, slot: usize) -> usize {
        self.depth[slot]
    }

    pub(crate) fn reached(&self, slot: usize) -> bool {
        self.visited.contains(slot)
    }
}

/// Least cumulative turn over directed segment steps.
#[derive(Debug)]
pub(crate) struct AngularSearch {
    settled: Visited,
    reached: Visited,
    queue: CostQueue<usize>,
}

impl AngularSearch {
    pub(crate) fn new(map: &ShapeMap) -> Self {
        let n = map.slot_count();
        Self {
            settled: Visited::new(2 * n),
            reached: Visited::new(n),
            queue: CostQueue::new(),
        }
    }

    /// Calls `found(slot, cost)` once per segment reached within `radius`, cheapest first.
    pub(crate) fn run(
        &mut self,
        map: &ShapeMap,
        sources: &[usize],
        radius: f64,
        mut found: impl FnMut(usize, f64),
    ) {
        self.settled.reset();
        self.reached.reset();
        self.queue.clear();
        for s in sources {
            self.queue.push(0.0, state(*s, Dir::Forward));
            self.queue.push(0.0, state(*s, Dir::Backward));
        }
        while let Some((cost, st)) = self.queue.pop() {
            if !self.settled.visit(st) {
                continue;
            }
            let slot = state_slot(st);
            if self.reached.visit(slot) {
                found(slot, cost);
            }
            for step in map.connector_at(slot).exits(state_dir(st)) {
                let next = state(step.slot, step.dir);
                let c = cost + step.weight;
                if within(radius, c) && !self.settled.contains(next) {
                    self.queue.push(c, next);
                }
            }
        }
    }
}

/// Sums the targets lying beyond each node of a shortest-path tree.
///
/// `order` lists tree nodes in settle order, so parents come before children. Each
/// node passes its own target weight plus everything beyond it up to its parent; the
/// amount beyond a node, excluding itself, is what it adds to choice.
pub(crate) fn accumulate_choice(
    order: &[usize],
    parent: impl Fn(usize) -> Option<usize>,
    target: impl Fn(usize) -> f64,
    scratch: &mut [f64],
    mut beyond: impl FnMut(usize, f64),
) {
    for n in order {
        scratch[*n] = target(*n);
    }
    for n in order.iter().rev() {
        let own = target(*n);
        let total = scratch[*n];
        if let Some(p) = parent(*n) {
            scratch[p] += total;
            beyond(*n, total - own);
        }
    }
}
