// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend.
//!
//! This backend buckets entries into fixed-size grid cells and answers queries
//! by touching only the cells overlapping the query primitive. It suits shape maps,
//! where lines are long and thin and most queries are small compared to the map.
//! Boxes are registered in every cell they cover; segments only in the cells they cross.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::backend::{Backend, Extent};
use crate::raster::GridSpec;
use crate::types::{Aabb2D, Segment};

/// Uniform grid backend with fixed cell size.
pub struct Grid {
    spec: GridSpec,
    cells: HashMap<(i32, i32), Cell>,
    slots: Vec<Option<SlotEntry>>,
}

#[derive(Clone, Debug)]
struct SlotEntry {
    extent: Extent,
    // Cells currently containing this entry.
    cells: SmallVec<[(i32, i32); 4]>,
}

#[derive(Default)]
struct Cell {
    slots: SmallVec<[usize; 8]>,
}

impl Debug for Grid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total_slots = self.slots.len();
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Grid")
            .field("spec", &self.spec)
            .field("total_slots", &total_slots)
            .field("live_slots", &live_slots)
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl Grid {
    /// Create a grid backend with the given cell size and origin offset.
    pub fn new(cell_w: f64, cell_h: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            spec: GridSpec::new(origin_x, origin_y, cell_w, cell_h),
            cells: HashMap::new(),
            slots: Vec::new(),
        }
    }

    /// The cell layout used by this backend.
    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    fn cells_for_extent(&self, extent: &Extent) -> SmallVec<[(i32, i32); 4]> {
        match extent {
            Extent::Box(b) => {
                let (c0, r0, c1, r1) = self.spec.cells_for_aabb(b);
                let mut out = SmallVec::new();
                for r in r0..=r1 {
                    for c in c0..=c1 {
                        out.push((c, r));
                    }
                }
                out
            }
            Extent::Segment(s) => self.spec.cells_on_segment(*s).into_iter().collect(),
        }
    }

    fn collect<I: Iterator<Item = (i32, i32)>>(&self, keys: I, mut keep: impl FnMut(&Extent) -> bool) -> Vec<usize> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut out = Vec::new();
        for key in keys {
            let Some(cell) = self.cells.get(&key) else {
                continue;
            };
            for &slot in &cell.slots {
                if !seen.insert(slot) {
                    continue;
                }
                if let Some(Some(entry)) = self.slots.get(slot)
                    && keep(&entry.extent)
                {
                    out.push(slot);
                }
            }
        }
        out.sort_unstable();
        out
    }
}

impl Backend for Grid {
    fn insert(&mut self, slot: usize, extent: Extent) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        let cells = self.cells_for_extent(&extent);
        for key in &cells {
            self.cells.entry(*key).or_default().slots.push(slot);
        }
        self.slots[slot] = Some(SlotEntry { extent, cells });
    }

    fn remove(&mut self, slot: usize) {
        let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        for key in entry.cells {
            if let Some(cell) = self.cells.get_mut(&key) {
                if let Some(pos) = cell.slots.iter().position(|&s| s == slot) {
                    cell.slots.swap_remove(pos);
                }
                if cell.slots.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.slots.clear();
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Aabb2D, f: F) {
        let (c0, r0, c1, r1) = self.spec.cells_for_aabb(&rect);
        let keys = (r0..=r1).flat_map(|r| (c0..=c1).map(move |c| (c, r)));
        self.collect(keys, |e| e.touches(&rect)).into_iter().for_each(f);
    }

    fn visit_segment<F: FnMut(usize)>(&self, seg: Segment, f: F) {
        let bounds = Aabb2D::from_segment(seg);
        let keys = self.spec.cells_on_segment(seg).into_iter();
        self.collect(keys, |e| match e {
            Extent::Box(b) => seg.touches(b),
            Extent::Segment(s) => Aabb2D::from_segment(*s).overlaps(&bounds),
        })
        .into_iter()
        .for_each(f);
    }
}
