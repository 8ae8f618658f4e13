// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-based integration measures.
//!
//! A traversal records how many nodes it reached at each depth in a [`DepthHistogram`];
//! [`IntegrationMeasures::from_histogram`] turns that into the usual space-syntax
//! measures. Node counts include the origin. Any measure whose denominator vanishes, or
//! whose value is not finite, is reported as [`NOT_COMPUTED`].

use crate::attributes::NOT_COMPUTED;

/// Diamond value used to normalise relative asymmetry (Hillier and Hanson).
pub fn dvalue(k: f64) -> f64 {
    2.0 * (k * (((k + 2.0) / 3.0).log2() - 1.0) + 1.0) / ((k - 1.0) * (k - 2.0))
}

/// P-value normalisation constant for relative asymmetry.
pub fn pvalue(k: f64) -> f64 {
    2.0 * (k - k.log2() - 1.0) / ((k - 1.0) * (k - 2.0))
}

/// Teklenburg integration.
pub fn teklinteg(node_count: f64, total_depth: f64) -> f64 {
    (0.5 * (node_count - 2.0)).ln() / (total_depth - node_count + 1.0).ln()
}

/// Largest total depth a graph of `n` nodes (origin included) can have when its deepest
/// node lies at depth `d`: a chain to depth `d - 1` with every other node at depth `d`.
pub fn palm_tree(n: f64, d: f64) -> f64 {
    (d - 1.0) * d * 0.5 + (n - d) * d
}

/// Map non-finite values to the sentinel.
#[inline]
pub fn finite_or_sentinel(v: f64) -> f64 {
    if v.is_finite() { v } else { NOT_COMPUTED }
}

/// Number of nodes reached at each depth. Index 0 is the origin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepthHistogram {
    counts: Vec<usize>,
}

impl DepthHistogram {
    /// Empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all counts, keeping capacity.
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Record one node at `depth`.
    pub fn add(&mut self, depth: usize) {
        if self.counts.len() <= depth {
            self.counts.resize(depth + 1, 0);
        }
        self.counts[depth] += 1;
    }

    /// Count at a depth.
    pub fn at(&self, depth: usize) -> usize {
        self.counts.get(depth).copied().unwrap_or(0)
    }

    /// Nodes reached, origin included.
    pub fn node_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Sum of depths.
    pub fn total_depth(&self) -> usize {
        self.counts.iter().enumerate().map(|(d, c)| d * c).sum()
    }

    /// Deepest populated level.
    pub fn max_depth(&self) -> usize {
        self.counts.iter().rposition(|c| *c > 0).unwrap_or(0)
    }

    /// Sum of `1 / depth` over non-origin nodes.
    pub fn inverse_depth_sum(&self) -> f64 {
        self.counts
            .iter()
            .enumerate()
            .skip(1)
            .map(|(d, c)| count_f64(*c) / count_f64(d))
            .sum()
    }

    /// Raw counts by depth.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// The histogram restricted to depths up to `max_depth`.
    pub fn truncated(&self, max_depth: usize) -> Self {
        let end = self.counts.len().min(max_depth.saturating_add(1));
        Self {
            counts: self.counts[..end].to_vec(),
        }
    }
}

#[inline]
#[allow(clippy::cast_precision_loss, reason = "graph sizes fit in f64 mantissa")]
pub(crate) fn count_f64(n: usize) -> f64 {
    n as f64
}

/// Depth entropy and relativised entropy in bits.
///
/// `mean_depth` is the mean over non-origin nodes. Relativised entropy compares the depth
/// distribution against a Poisson distribution of the same mean; levels that would need
/// an overflowing factorial contribute nothing.
pub fn entropies(h: &DepthHistogram, mean_depth: f64) -> (f64, f64) {
    let others = count_f64(h.node_count().saturating_sub(1));
    if others <= 0.0 {
        return (NOT_COMPUTED, NOT_COMPUTED);
    }
    let mut entropy = 0.0;
    let mut rel_entropy = 0.0;
    let mut factorial = 1.0_f64;
    for (d, c) in h.counts().iter().enumerate().skip(1) {
        factorial *= count_f64(d);
        if *c == 0 {
            continue;
        }
        let prob = count_f64(*c) / others;
        entropy -= prob * prob.log2();
        let q = mean_depth.powi(i32::try_from(d).unwrap_or(i32::MAX)) / factorial
            * (-mean_depth).exp();
        if q > 0.0 && q.is_finite() {
            rel_entropy += prob * (prob / q).log2();
        }
    }
    (finite_or_sentinel(entropy), finite_or_sentinel(rel_entropy))
}

/// Integration and related measures derived from one origin's depth histogram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegrationMeasures {
    /// Nodes reached, origin included.
    pub node_count: f64,
    /// Sum of depths of reached nodes.
    pub total_depth: f64,
    /// Mean depth over non-origin nodes.
    pub mean_depth: f64,
    /// Relative asymmetry.
    pub ra: f64,
    /// Real relative asymmetry.
    pub rra: f64,
    /// Integration, diamond-value normalised (`[HH]`).
    pub integration_hh: f64,
    /// Integration, p-value normalised.
    pub integration_pv: f64,
    /// Teklenburg integration.
    pub integration_tekl: f64,
    /// Penn-normalised integration.
    pub penn_norm: f64,
    /// Depth entropy.
    pub entropy: f64,
    /// Relativised depth entropy.
    pub rel_entropy: f64,
    /// Harmonic mean depth.
    pub harmonic_mean_depth: f64,
}

impl IntegrationMeasures {
    /// Every measure at the sentinel except the node count.
    pub fn not_computed(node_count: f64) -> Self {
        Self {
            node_count,
            total_depth: NOT_COMPUTED,
            mean_depth: NOT_COMPUTED,
            ra: NOT_COMPUTED,
            rra: NOT_COMPUTED,
            integration_hh: NOT_COMPUTED,
            integration_pv: NOT_COMPUTED,
            integration_tekl: NOT_COMPUTED,
            penn_norm: NOT_COMPUTED,
            entropy: NOT_COMPUTED,
            rel_entropy: NOT_COMPUTED,
            harmonic_mean_depth: NOT_COMPUTED,
        }
    }

    /// Compute every measure from a histogram.
    pub fn from_histogram(h: &DepthHistogram) -> Self {
        let n = count_f64(h.node_count());
        if n <= 1.0 {
            return Self::not_computed(n);
        }
        let total = count_f64(h.total_depth());
        let mean_depth = total / (n - 1.0);
        let (entropy, rel_entropy) = entropies(h, mean_depth);
        let harmonic_mean_depth = finite_or_sentinel((n - 1.0) / h.inverse_depth_sum());

        let mut m = Self {
            node_count: n,
            total_depth: total,
            mean_depth,
            entropy,
            rel_entropy,
            harmonic_mean_depth,
            ..Self::not_computed(n)
        };
        if n <= 2.0 {
            return m;
        }

        let ra = 2.0 * (mean_depth - 1.0) / (n - 2.0);
        m.ra = finite_or_sentinel(ra);
        m.rra = finite_or_sentinel(ra / dvalue(n));
        if ra > 0.0 {
            m.integration_hh = finite_or_sentinel(dvalue(n) / ra);
            m.integration_pv = finite_or_sentinel(pvalue(n) / ra);
        }
        let tekl = teklinteg(n, total);
        if total - n + 1.0 > 1.0 {
            m.integration_tekl = finite_or_sentinel(tekl);
        }
        let depth = count_f64(h.max_depth());
        if depth > 1.0 {
            let dmin = n - 1.0;
            let dmax = palm_tree(n, depth);
            if dmax != dmin {
                m.penn_norm = finite_or_sentinel((dmax - total) / (dmax - dmin));
            }
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(levels: &[usize]) -> DepthHistogram {
        let mut h = DepthHistogram::new();
        for (d, c) in levels.iter().enumerate() {
            for _ in 0..*c {
                h.add(d);
            }
        }
        h
    }

    #[test]
    fn lone_origin_is_all_sentinel() {
        let m = IntegrationMeasures::from_histogram(&histogram(&[1]));
        assert_eq!(m.node_count, 1.0);
        for v in [
            m.total_depth,
            m.mean_depth,
            m.ra,
            m.rra,
            m.integration_hh,
            m.integration_pv,
            m.integration_tekl,
            m.penn_norm,
            m.entropy,
            m.rel_entropy,
            m.harmonic_mean_depth,
        ] {
            assert_eq!(v, NOT_COMPUTED);
        }
    }

    #[test]
    fn pair_has_depth_but_no_asymmetry() {
        let m = IntegrationMeasures::from_histogram(&histogram(&[1, 1]));
        assert_eq!(m.mean_depth, 1.0);
        assert_eq!(m.entropy, 0.0);
        assert_eq!(m.ra, NOT_COMPUTED);
        assert_eq!(m.rra, NOT_COMPUTED);
        assert_eq!(m.penn_norm, NOT_COMPUTED);
        assert_eq!(m.integration_hh, NOT_COMPUTED);
    }

    #[test]
    fn truncation_drops_deeper_levels() {
        let h = histogram(&[1, 2, 3]);
        assert_eq!(h.truncated(1).node_count(), 3);
        assert_eq!(h.truncated(1).total_depth(), 2);
        assert_eq!(h.truncated(9), h);
    }

    #[test]
    fn chain_of_five_from_end() {
        // Path 0-1-2-3-4 seen from node 0.
        let m = IntegrationMeasures::from_histogram(&histogram(&[1, 1, 1, 1, 1]));
        assert_eq!(m.node_count, 5.0);
        assert_eq!(m.total_depth, 10.0);
        assert_eq!(m.mean_depth, 2.5);
        assert!((m.ra - 1.0).abs() < 1e-12);
        assert!((m.integration_hh - dvalue(5.0)).abs() < 1e-12);
        assert!((m.entropy - 2.0).abs() < 1e-12);
        // A chain is the deepest palm tree, so Penn norm is zero.
        assert!(m.penn_norm.abs() < 1e-12);
        assert!((m.harmonic_mean_depth - 4.0 / (1.0 + 0.5 + 1.0 / 3.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn star_centre_has_zero_asymmetry() {
        let m = IntegrationMeasures::from_histogram(&histogram(&[1, 4]));
        assert_eq!(m.ra, 0.0);
        // Infinite integration is reported as not computed.
        assert_eq!(m.integration_hh, NOT_COMPUTED);
        assert_eq!(m.penn_norm, NOT_COMPUTED);
    }

    #[test]
    fn histogram_accessors() {
        let h = histogram(&[1, 2, 0, 3]);
        assert_eq!(h.node_count(), 6);
        assert_eq!(h.total_depth(), 11);
        assert_eq!(h.max_depth(), 3);
        assert_eq!(h.at(2), 0);
        assert_eq!(h.at(9), 0);
    }

    #[test]
    fn palm_tree_of_chain() {
        assert_eq!(palm_tree(3.0, 2.0), 3.0);
        assert_eq!(palm_tree(5.0, 4.0), 10.0);
    }
}
