// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Analysis radii and the column-name suffixes derived from them.
//!
//! A radius of [`RADIUS_N`] (any negative value) means "unbounded".

/// The unbounded radius.
pub const RADIUS_N: f64 = -1.0;

/// How a radius is measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RadiusType {
    /// Hop count.
    Topological,
    /// Euclidean path length.
    Metric,
    /// Cumulative turn, in right angles.
    #[default]
    Angular,
}

/// Whether `r` is the unbounded radius.
#[inline]
pub fn is_unbounded(r: f64) -> bool {
    r < 0.0
}

/// Whether a cost lies inside a radius.
#[inline]
pub fn within(radius: f64, cost: f64) -> bool {
    is_unbounded(radius) || cost <= radius
}

/// Sort concrete radii ascending, drop duplicates, and put a single unbounded radius last.
///
/// Per-band accumulation relies on this ordering. An empty list becomes `[RADIUS_N]`.
pub fn normalize_radii(radii: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = radii
        .iter()
        .copied()
        .filter(|r| !is_unbounded(*r) && r.is_finite())
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    if out.is_empty() || radii.iter().any(|r| is_unbounded(*r)) {
        out.push(RADIUS_N);
    }
    out
}

/// Index of the tightest band containing `cost`, given normalized radii.
pub fn band_of(radii: &[f64], cost: f64) -> Option<usize> {
    radii.iter().position(|r| within(*r, cost))
}

/// Plain suffix: empty when unbounded, otherwise `" R{r}"`.
pub fn radius_suffix(r: f64) -> String {
    if is_unbounded(r) {
        String::new()
    } else {
        format!(" R{r}")
    }
}

/// Suffix tagged with the radius type, as used by segment analyses.
///
/// Angular radii carry no tag; metric and topological radii are tagged `metric` and `step`.
pub fn typed_radius_suffix(r: f64, kind: RadiusType) -> String {
    if is_unbounded(r) {
        return String::new();
    }
    match kind {
        RadiusType::Angular => format!(" R{r}"),
        RadiusType::Metric => format!(" R{r} metric"),
        RadiusType::Topological => format!(" R{r} step"),
    }
}
