// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-shape adjacency.

/// Direction of travel along a segment: `Forward` runs from its start to its end.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dir {
    /// Start to end.
    #[default]
    Forward,
    /// End to start.
    Backward,
}

impl Dir {
    /// The other direction.
    pub fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Forward => 0,
            Self::Backward => 1,
        }
    }
}

/// A directed step onto a neighbouring segment.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentRef {
    /// Direction of travel along the neighbour once entered.
    pub dir: Dir,
    /// Slot of the neighbour in the shape map.
    pub slot: usize,
    /// Turn taken onto the neighbour, in right angles (`0..=2`).
    pub weight: f64,
}

/// Neighbours of one shape.
///
/// `connections` lists every neighbour. Segment maps also fill `forward` (leaving by the
/// segment's end) and `backward` (leaving by its start).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connector {
    /// Undirected neighbours, sorted.
    pub connections: Vec<usize>,
    /// Steps leaving by the end point.
    pub forward: Vec<SegmentRef>,
    /// Steps leaving by the start point.
    pub backward: Vec<SegmentRef>,
}

impl Connector {
    /// Number of neighbours.
    pub fn degree(&self) -> usize {
        self.connections.len()
    }

    /// Steps leaving a segment travelled in `dir`.
    pub fn exits(&self, dir: Dir) -> &[SegmentRef] {
        match dir {
            Dir::Forward => &self.forward,
            Dir::Backward => &self.backward,
        }
    }

    /// Add an undirected neighbour; false if already present.
    pub(crate) fn connect(&mut self, slot: usize) -> bool {
        match self.connections.binary_search(&slot) {
            Ok(_) => false,
            Err(at) => {
                self.connections.insert(at, slot);
                true
            }
        }
    }

    /// Drop every reference to `slot`; true if there was one.
    pub(crate) fn detach(&mut self, slot: usize) -> bool {
        let before = self.connections.len() + self.forward.len() + self.backward.len();
        self.connections.retain(|s| *s != slot);
        self.forward.retain(|r| r.slot != slot);
        self.backward.retain(|r| r.slot != slot);
        before != self.connections.len() + self.forward.len() + self.backward.len()
    }

    /// Every slot this connector refers to.
    pub(crate) fn neighbours(&self) -> impl Iterator<Item = usize> + '_ {
        self.connections
            .iter()
            .copied()
            .chain(self.forward.iter().map(|r| r.slot))
            .chain(self.backward.iter().map(|r| r.slot))
    }

    pub(crate) fn remap(&mut self, f: impl Fn(usize) -> usize) {
        for s in &mut self.connections {
            *s = f(*s);
        }
        self.connections.sort_unstable();
        for r in self.forward.iter_mut().chain(self.backward.iter_mut()) {
            r.slot = f(r.slot);
        }
    }
}
