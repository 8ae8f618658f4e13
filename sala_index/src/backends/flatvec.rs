// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend with linear scans. Small and simple; good for tiny sets.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, Extent};
use crate::types::{Aabb2D, Segment};

/// Flat vector backend with linear scans.
#[derive(Default)]
pub struct FlatVec {
    entries: Vec<Option<Extent>>,
}

impl Debug for FlatVec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.entries.len();
        let alive = self.entries.iter().filter(|e| e.is_some()).count();
        f.debug_struct("FlatVec")
            .field("total_slots", &total)
            .field("alive", &alive)
            .finish_non_exhaustive()
    }
}

impl Backend for FlatVec {
    fn insert(&mut self, slot: usize, extent: Extent) {
        if self.entries.len() <= slot {
            self.entries.resize_with(slot + 1, || None);
        }
        self.entries[slot] = Some(extent);
    }

    fn remove(&mut self, slot: usize) {
        if let Some(e) = self.entries.get_mut(slot) {
            *e = None;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Aabb2D, mut f: F) {
        for (i, slot) in self.entries.iter().enumerate() {
            if let Some(e) = slot.as_ref()
                && e.touches(&rect)
            {
                f(i);
            }
        }
    }

    fn visit_segment<F: FnMut(usize)>(&self, seg: Segment, mut f: F) {
        let bounds = Aabb2D::from_segment(seg);
        for (i, slot) in self.entries.iter().enumerate() {
            let Some(e) = slot.as_ref() else {
                continue;
            };
            let hit = match e {
                Extent::Box(b) => seg.touches(b),
                Extent::Segment(s) => Aabb2D::from_segment(*s).overlaps(&bounds),
            };
            if hit {
                f(i);
            }
        }
    }
}
