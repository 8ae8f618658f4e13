// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Visit marks over `0..len`, cleared in constant time between traversals.
///
/// Each mark stores the generation it was made in; [`Visited::reset`] moves to the next
/// generation, so traversals from every origin of a large graph reuse one allocation.
#[derive(Clone, Debug)]
pub struct Visited {
    stamp: Vec<u32>,
    current: u32,
}

impl Visited {
    /// Unmarked set over `0..len`.
    pub fn new(len: usize) -> Self {
        Self {
            stamp: vec![0; len],
            current: 1,
        }
    }

    /// Clear every mark.
    pub fn reset(&mut self) {
        self.current = self.current.wrapping_add(1);
        if self.current == 0 {
            self.stamp.fill(0);
            self.current = 1;
        }
    }

    /// Mark `i`; false if it was already marked.
    pub fn visit(&mut self, i: usize) -> bool {
        if self.stamp[i] == self.current {
            return false;
        }
        self.stamp[i] = self.current;
        true
    }

    /// Whether `i` is marked.
    pub fn contains(&self, i: usize) -> bool {
        self.stamp[i] == self.current
    }
}
