// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-point visibility adjacency in 32 angular bins.

use core::f64::consts::PI;

use crate::pixel::PixelRef;

/// Number of angular bins per node.
pub const BIN_COUNT: usize = 32;

/// Angular width of one bin.
pub const BIN_WIDTH: f64 = PI / 16.0;

/// Bin of the direction `(dx, dy)`.
///
/// Opposite directions land in bins exactly 16 apart: the lower half-plane is binned by
/// negating into the upper half-plane.
pub fn which_bin(dx: i32, dy: i32) -> usize {
    if dy < 0 || (dy == 0 && dx < 0) {
        return 16 + upper_bin(-dx, -dy);
    }
    upper_bin(dx, dy)
}

fn upper_bin(dx: i32, dy: i32) -> usize {
    let a = f64::from(dy).atan2(f64::from(dx));
    #[allow(
        clippy::cast_possible_truncation,
        reason = "the angle lies in [0, π], so the quotient lies in [0, 16]"
    )]
    let k = (a / BIN_WIDTH).floor() as i64;
    usize::try_from(k.clamp(0, 15)).unwrap_or(0)
}

/// Centre angle of a bin.
pub fn bin_angle(bin: usize) -> f64 {
    #[allow(clippy::cast_precision_loss, reason = "bin indices are tiny")]
    let b = bin as f64;
    (b + 0.5) * BIN_WIDTH
}

/// Grid connection bits.
pub mod grid {
    /// Right-hand neighbour is visible.
    pub const RIGHT: u8 = 1 << 0;
    /// Upper neighbour is visible.
    pub const UP: u8 = 1 << 1;
    /// Left-hand neighbour is visible.
    pub const LEFT: u8 = 1 << 2;
    /// Lower neighbour is visible.
    pub const DOWN: u8 = 1 << 3;
}

/// Visible points in one angular sector, nearest first.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bin {
    /// Visible points.
    pub pixels: Vec<PixelRef>,
    /// Distance to the farthest visible point.
    pub far_distance: f64,
    /// Distance to the nearest boundary along the bin's centre ray; `-1` until isovist
    /// properties have been computed.
    pub occ_distance: f64,
}

/// Visibility adjacency of a filled point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    bins: [Bin; BIN_COUNT],
    grid_connections: u8,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            bins: core::array::from_fn(|_| Bin {
                occ_distance: -1.0,
                ..Bin::default()
            }),
            grid_connections: 0,
        }
    }
}

impl Node {
    /// Empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// All bins.
    pub fn bins(&self) -> &[Bin; BIN_COUNT] {
        &self.bins
    }

    /// One bin.
    pub fn bin(&self, k: usize) -> &Bin {
        &self.bins[k]
    }

    pub(crate) fn bin_mut(&mut self, k: usize) -> &mut Bin {
        &mut self.bins[k]
    }

    /// Total number of visible points.
    pub fn count(&self) -> usize {
        self.bins.iter().map(|b| b.pixels.len()).sum()
    }

    /// Visible points, bin by bin.
    pub fn pixels(&self) -> impl Iterator<Item = PixelRef> + '_ {
        self.bins.iter().flat_map(|b| b.pixels.iter().copied())
    }

    /// Whether `p` is visible from this node, looking in bin `k`.
    pub fn bin_contains(&self, k: usize, p: PixelRef) -> bool {
        self.bins[k].pixels.contains(&p)
    }

    /// Grid connection bits (see [`grid`]).
    pub fn grid_connections(&self) -> u8 {
        self.grid_connections
    }

    pub(crate) fn set_grid_connections(&mut self, bits: u8) {
        self.grid_connections = bits;
    }

    /// Sort each bin nearest first, relative to `from`, and record far distances.
    pub(crate) fn finish(&mut self, from: PixelRef, spacing: f64) {
        for b in &mut self.bins {
            b.pixels.sort_by_key(|p| {
                let (dx, dy) = from.delta(*p);
                (i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy), *p)
            });
            b.pixels.dedup();
            b.far_distance = b.pixels.last().map_or(0.0, |p| {
                let (dx, dy) = from.delta(*p);
                spacing * f64::from(dx).hypot(f64::from(dy))
            });
        }
    }
}
