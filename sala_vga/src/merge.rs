// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Merge pairs: two points that act as one place (for example both sides of a doorway).
//!
//! Each unordered pair is stored once, with an index from either end to the pair.

use hashbrown::HashMap;

use crate::pixel::PixelRef;

/// Set of unordered point pairs with lookup from either side.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<(PixelRef, PixelRef)>", into = "Vec<(PixelRef, PixelRef)>")
)]
pub struct MergePairs {
    pairs: Vec<(PixelRef, PixelRef)>,
    index: HashMap<PixelRef, usize>,
}

impl MergePairs {
    /// No pairs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `a` and `b`, first detaching either from any previous partner.
    ///
    /// Returns the previous partners that were detached.
    pub fn merge(&mut self, a: PixelRef, b: PixelRef) -> Vec<PixelRef> {
        let mut detached = Vec::new();
        detached.extend(self.unmerge(a));
        detached.extend(self.unmerge(b));
        if a != b {
            self.index.insert(a, self.pairs.len());
            self.index.insert(b, self.pairs.len());
            self.pairs.push((a, b));
        }
        detached
    }

    /// Detach `p` from its partner; returns the partner.
    pub fn unmerge(&mut self, p: PixelRef) -> Option<PixelRef> {
        let i = self.index.remove(&p)?;
        let (a, b) = self.pairs.swap_remove(i);
        let other = if a == p { b } else { a };
        self.index.remove(&other);
        if let Some(&(c, d)) = self.pairs.get(i) {
            self.index.insert(c, i);
            self.index.insert(d, i);
        }
        Some(other)
    }

    /// Partner of `p`.
    pub fn partner(&self, p: PixelRef) -> Option<PixelRef> {
        let (a, b) = self.pairs[*self.index.get(&p)?];
        Some(if a == p { b } else { a })
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PixelRef, PixelRef)> + '_ {
        self.pairs.iter().copied()
    }

    /// Remove every pair.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.index.clear();
    }
}

impl From<Vec<(PixelRef, PixelRef)>> for MergePairs {
    fn from(pairs: Vec<(PixelRef, PixelRef)>) -> Self {
        let mut m = Self::new();
        for (a, b) in pairs {
            m.merge(a, b);
        }
        m
    }
}

impl From<MergePairs> for Vec<(PixelRef, PixelRef)> {
    fn from(m: MergePairs) -> Self {
        m.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i16, y: i16) -> PixelRef {
        PixelRef::new(x, y)
    }

    #[test]
    fn lookup_from_either_side() {
        let mut m = MergePairs::new();
        m.merge(p(0, 0), p(5, 5));
        assert_eq!(m.partner(p(0, 0)), Some(p(5, 5)));
        assert_eq!(m.partner(p(5, 5)), Some(p(0, 0)));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remerge_detaches_old_partner() {
        let mut m = MergePairs::new();
        m.merge(p(0, 0), p(1, 0));
        m.merge(p(2, 0), p(3, 0));
        let detached = m.merge(p(0, 0), p(3, 0));
        assert_eq!(detached, [p(1, 0), p(2, 0)]);
        assert_eq!(m.partner(p(1, 0)), None);
        assert_eq!(m.partner(p(3, 0)), Some(p(0, 0)));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn unmerge_keeps_index_consistent() {
        let mut m = MergePairs::new();
        m.merge(p(0, 0), p(1, 0));
        m.merge(p(2, 0), p(3, 0));
        m.merge(p(4, 0), p(5, 0));
        assert_eq!(m.unmerge(p(1, 0)), Some(p(0, 0)));
        // The last pair moved into the freed slot.
        assert_eq!(m.partner(p(5, 0)), Some(p(4, 0)));
        assert_eq!(m.partner(p(2, 0)), Some(p(3, 0)));
        assert_eq!(m.len(), 2);
    }
}
