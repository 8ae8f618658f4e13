// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Min-cost priority queue for metric and angular traversals.

use core::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

/// Items popped cheapest first; equal costs pop in push order.
#[derive(Clone, Debug)]
pub struct CostQueue<T: Ord> {
    heap: BinaryHeap<Reverse<(OrderedFloat<f64>, u64, T)>>,
    seq: u64,
}

impl<T: Ord> Default for CostQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }
}

impl<T: Ord> CostQueue<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `item` at `cost`.
    pub fn push(&mut self, cost: f64, item: T) {
        self.heap.push(Reverse((OrderedFloat(cost), self.seq, item)));
        self.seq += 1;
    }

    /// Cheapest item and its cost.
    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|Reverse((c, _, t))| (c.into_inner(), t))
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Drop every item, keeping capacity.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheapest_first_then_fifo() {
        let mut q = CostQueue::new();
        q.push(2.0, 'c');
        q.push(0.5, 'a');
        q.push(2.0, 'b');
        q.push(1.0, 'z');
        let order: Vec<char> = core::iter::from_fn(|| q.pop().map(|(_, t)| t)).collect();
        assert_eq!(order, ['a', 'z', 'c', 'b']);
        assert!(q.is_empty());
    }

    #[test]
    fn nan_costs_sort_last() {
        let mut q = CostQueue::new();
        q.push(f64::NAN, 1);
        q.push(3.0, 2);
        assert_eq!(q.pop(), Some((3.0, 2)));
        assert!(q.pop().is_some_and(|(c, t)| c.is_nan() && t == 1));
    }
}
