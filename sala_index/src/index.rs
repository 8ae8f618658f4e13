// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, Extent};
use crate::types::{Aabb2D, Segment};

/// Generational handle for entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<P> {
    generation: u32,
    extent: Extent,
    payload: P,
}

/// A generic spatial index parameterized by a spatial backend.
///
/// Changes are applied to the backend immediately; there is no batching step.
#[derive(Debug)]
pub struct IndexGeneric<P: Copy + Debug, B: Backend> {
    entries: Vec<Option<Entry<P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    backend: B,
}

impl<P, B> IndexGeneric<P, B>
where
    P: Copy + Debug,
    B: Backend + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<P, B> IndexGeneric<P, B>
where
    P: Copy + Debug,
    B: Backend,
{
    /// Create an empty index over an explicit backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            backend,
        }
    }

    /// Reserve space for at least `n` entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free_list.len()
    }

    /// Whether the index holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a box-shaped entry. Returns a stable handle `Key`.
    pub fn insert(&mut self, aabb: Aabb2D, payload: P) -> Key {
        self.insert_extent(Extent::Box(aabb), payload)
    }

    /// Insert a segment-shaped entry. Returns a stable handle `Key`.
    pub fn insert_segment(&mut self, seg: Segment, payload: P) -> Key {
        self.insert_extent(Extent::Segment(seg), payload)
    }

    fn insert_extent(&mut self, extent: Extent, payload: P) -> Key {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].saturating_add(1);
            idx
        } else {
            self.entries.push(None);
            self.generations.push(1);
            self.entries.len() - 1
        };
        let generation = self.generations[idx];
        self.entries[idx] = Some(Entry {
            generation,
            extent,
            payload,
        });
        self.backend.insert(idx, extent);
        Key::new(idx, generation)
    }

    /// Move an existing entry to a new box.
    pub fn update(&mut self, key: Key, aabb: Aabb2D) {
        self.update_extent(key, Extent::Box(aabb));
    }

    /// Move an existing entry to a new segment.
    pub fn update_segment(&mut self, key: Key, seg: Segment) {
        self.update_extent(key, Extent::Segment(seg));
    }

    fn update_extent(&mut self, key: Key, extent: Extent) {
        if let Some(e) = self.entry_mut(key) {
            e.extent = extent;
            self.backend.remove(key.idx());
            self.backend.insert(key.idx(), extent);
        }
    }

    /// Remove an existing entry. Stale keys are ignored.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        let payload = self.entry_mut(key)?.payload;
        self.entries[key.idx()] = None;
        self.free_list.push(key.idx());
        self.backend.remove(key.idx());
        Some(payload)
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generations.clear();
        self.free_list.clear();
        self.backend.clear();
    }

    /// Payload stored under a key, if the key is still live.
    pub fn get(&self, key: Key) -> Option<P> {
        let e = self.entries.get(key.idx())?.as_ref()?;
        (e.generation == key.1).then_some(e.payload)
    }

    /// Query for entries whose extent contains the point.
    pub fn query_point(&self, x: f64, y: f64) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut slots = Vec::new();
        self.backend.visit_point(x, y, |i| slots.push(i));
        self.resolve(slots)
    }

    /// Query for entries whose extent intersects the given rectangle.
    pub fn query_rect(&self, rect: Aabb2D) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut slots = Vec::new();
        self.backend.visit_rect(rect, |i| slots.push(i));
        self.resolve(slots)
    }

    /// Query for entries that may meet a segment.
    ///
    /// Results are candidates: callers run their own exact intersection test.
    pub fn query_segment(&self, seg: Segment) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut slots = Vec::new();
        self.backend.visit_segment(seg, |i| slots.push(i));
        self.resolve(slots)
    }

    fn resolve(&self, mut slots: Vec<usize>) -> impl Iterator<Item = (Key, P)> + '_ {
        slots.sort_unstable();
        slots.dedup();
        slots.into_iter().filter_map(|i| {
            let e = self.entries.get(i)?.as_ref()?;
            Some((Key::new(i, e.generation), e.payload))
        })
    }

    fn entry_mut(&mut self, key: Key) -> Option<&mut Entry<P>> {
        let e = self.entries.get_mut(key.idx())?.as_mut()?;
        if e.generation != key.1 {
            return None;
        }
        Some(e)
    }
}

/// Default index using a flat vector backend.
pub type Index<P> = IndexGeneric<P, crate::backends::FlatVec>;

impl<P: Copy + Debug> Default for Index<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "backend_grid")]
impl<P: Copy + Debug> Index<P> {
    /// Create a grid-backed index with given cell size and origin.
    pub fn with_uniform_grid(
        cell_w: f64,
        cell_h: f64,
        origin_x: f64,
        origin_y: f64,
    ) -> IndexGeneric<P, crate::backends::Grid> {
        IndexGeneric::with_backend(crate::backends::Grid::new(cell_w, cell_h, origin_x, origin_y))
    }
}
