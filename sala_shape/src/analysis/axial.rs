// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::radius::{is_unbounded, normalize_radii, radius_suffix, within};
use sala_core::{
    AnalysisResult, AttributeTable, ColumnSet, Communicator, DepthHistogram, IntegrationMeasures,
    NOT_COMPUTED, ProgressPoller, RADIUS_N, Result,
};

use super::require_shapes;
use super::traverse::{Bfs, weights};
use crate::graph::{ShapeGraph, level};
use crate::shape_map::ShapeMap;

/// Settings for [`axial_integration`].
#[derive(Clone, Debug, PartialEq)]
pub struct AxialOptions {
    /// Step radii; [`RADIUS_N`] is unbounded.
    pub radii: Vec<f64>,
    /// Also compute choice.
    pub choice: bool,
    /// Column weighting each shape, e.g. floor area.
    pub weighting_col: Option<String>,
    /// Also write "RA", "RRA" and "Total Depth".
    pub fulloutput: bool,
}

impl Default for AxialOptions {
    fn default() -> Self {
        Self {
            radii: vec![RADIUS_N],
            choice: false,
            weighting_col: None,
            fulloutput: false,
        }
    }
}

#[derive(Debug)]
struct WeightedColumns {
    mean_depth: usize,
    total: usize,
    choice: Option<(usize, usize)>,
}

#[derive(Debug)]
struct BandColumns {
    radius: f64,
    choice: Option<(usize, usize)>,
    entropy: usize,
    hh: usize,
    pv: usize,
    tekl: usize,
    penn: usize,
    harmonic: usize,
    mean_depth: usize,
    node_count: usize,
    rel_entropy: usize,
    full: Option<(usize, usize, usize)>,
    weighted: Option<WeightedColumns>,
}

impl BandColumns {
    fn insert(
        cols: &mut ColumnSet,
        table: &mut AttributeTable,
        radius: f64,
        options: &AxialOptions,
    ) -> Result<Self> {
        let suffix = radius_suffix(radius);
        let mut col = |name: &str| cols.insert(table, &format!("{name}{suffix}"));
        let choice = if options.choice {
            Some((col("Choice")?, col("Choice [Norm]")?))
        } else {
            None
        };
        let entropy = col("Entropy")?;
        let hh = col("Integration [HH]")?;
        let pv = col("Integration [P-value]")?;
        let tekl = col("Integration [Tekl]")?;
        let penn = col("Integration [Penn norm]")?;
        let harmonic = col("Harmonic Mean Depth")?;
        let mean_depth = col("Mean Depth")?;
        let node_count = col("Node Count")?;
        let rel_entropy = col("Relativised Entropy")?;
        let full = if options.fulloutput {
            Some((col("RA")?, col("RRA")?, col("Total Depth")?))
        } else {
            None
        };
        let weighted = match &options.weighting_col {
            Some(w) => Some(WeightedColumns {
                mean_depth: col(&format!("Mean Depth [{w} Wgt]"))?,
                total: col(&format!("Total {w}"))?,
                choice: if options.choice {
                    Some((
                        col(&format!("Choice [{w} Wgt]"))?,
                        col(&format!("Choice [{w} Wgt][Norm]"))?,
                    ))
                } else {
                    None
                },
            }),
            None => None,
        };
        Ok(Self {
            radius,
            choice,
            entropy,
            hh,
            pv,
            tekl,
            penn,
            harmonic,
            mean_depth,
            node_count,
            rel_entropy,
            full,
            weighted,
        })
    }

    fn write(&self, t: &mut AttributeTable, key: i32, m: &IntegrationMeasures) {
        t.set_value(key, self.entropy, m.entropy);
        t.set_value(key, self.hh, m.integration_hh);
        t.set_value(key, self.pv, m.integration_pv);
        t.set_value(key, self.tekl, m.integration_tekl);
        t.set_value(key, self.penn, m.penn_norm);
        t.set_value(key, self.harmonic, m.harmonic_mean_depth);
        t.set_value(key, self.mean_depth, m.mean_depth);
        t.set_value(key, self.node_count, m.node_count);
        t.set_value(key, self.rel_entropy, m.rel_entropy);
        if let Some((ra, rra, total)) = self.full {
            t.set_value(key, ra, m.ra);
            t.set_value(key, rra, m.rra);
            t.set_value(key, total, m.total_depth);
        }
    }
}

/// Per band and slot choice totals, with the pair counts they are normalised by.
#[derive(Debug)]
struct ChoiceTotals {
    choice: Vec<f64>,
    weighted: Vec<f64>,
    pairs: Vec<f64>,
    weighted_pairs: Vec<f64>,
}

impl ChoiceTotals {
    fn new(n: usize) -> Self {
        Self {
            choice: vec![0.0; n],
            weighted: vec![0.0; n],
            pairs: vec![NOT_COMPUTED; n],
            weighted_pairs: vec![NOT_COMPUTED; n],
        }
    }
}

/// Global and radius-restricted integration of an axial (or convex) graph.
///
/// One breadth-first search per shape serves every radius. For each radius the columns
/// listed on [`AxialOptions`] are written, suffixed `" R{r}"` when the radius is bounded.
/// Choice counts each unordered pair of shapes once; where several shortest paths join
/// a pair, the pair is shared equally between them.
pub fn axial_integration(
    graph: &mut ShapeGraph,
    options: &AxialOptions,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_shapes(graph)?;
    let map = graph.map_mut();
    let w = weights(map, options.weighting_col.as_deref())?;
    let mut cols = ColumnSet::new();
    let outcome = run(map, options, w.as_deref(), comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(
    map: &mut ShapeMap,
    options: &AxialOptions,
    w: Option<&[f64]>,
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let radii = normalize_radii(&options.radii);
    let bands = radii
        .iter()
        .map(|r| BandColumns::insert(cols, &mut map.attributes, *r, options))
        .collect::<Result<Vec<_>>>()?;
    let max_depth = radii
        .iter()
        .all(|r| !is_unbounded(*r))
        .then(|| radii.last().map_or(0, |r| step_limit(*r)));

    let slots = map.live_slots();
    tracing::info!(shapes = slots.len(), radii = ?radii, choice = options.choice, "axial integration");
    let n = map.slot_count();
    let mut totals: Vec<ChoiceTotals> = bands.iter().map(|_| ChoiceTotals::new(n)).collect();
    let mut sigma = vec![0.0; n];
    let mut delta = vec![0.0; n];
    let mut wdelta = vec![0.0; n];
    let mut bfs = Bfs::new(map);
    let mut poller = ProgressPoller::new(comm, slots.len());
    for (i, origin) in slots.iter().enumerate() {
        poller.tick(i)?;
        bfs.run(map, &[*origin], max_depth);
        let mut h = DepthHistogram::new();
        for v in bfs.order() {
            h.add(bfs.depth(*v));
        }
        let Some(key) = map.ref_of(*origin) else {
            continue;
        };
        for (b, band) in bands.iter().enumerate() {
            let in_band = |d: usize| within(band.radius, level(d));
            let hb = if is_unbounded(band.radius) {
                h.clone()
            } else {
                h.truncated(step_limit(band.radius))
            };
            let m = IntegrationMeasures::from_histogram(&hb);
            band.write(&mut map.attributes, key, &m);
            let others = m.node_count - 1.0;
            totals[b].pairs[*origin] = if others > 1.0 {
                others * (others - 1.0) * 0.5
            } else {
                NOT_COMPUTED
            };

            if let (Some(w), Some(wc)) = (w, &band.weighted) {
                let (mut total, mut depth_sum, mut squares) = (0.0, 0.0, 0.0);
                for v in bfs.order().iter().filter(|v| in_band(bfs.depth(**v))) {
                    total += w[*v];
                    depth_sum += w[*v] * level(bfs.depth(*v));
                    if v != origin {
                        squares += w[*v] * w[*v];
                    }
                }
                let rest = total - w[*origin];
                let mean = if rest > 0.0 { depth_sum / rest } else { NOT_COMPUTED };
                map.attributes.set_value(key, wc.mean_depth, mean);
                map.attributes.set_value(key, wc.total, total);
                totals[b].weighted_pairs[*origin] = (rest * rest - squares) * 0.5;
            }

            if options.choice {
                brandes(
                    map,
                    &bfs,
                    *origin,
                    in_band,
                    w,
                    (&mut sigma[..], &mut delta[..], &mut wdelta[..]),
                    &mut totals[b],
                );
            }
        }
    }

    if options.choice {
        for (band, t) in bands.iter().zip(&totals) {
            for slot in &slots {
                let Some(key) = map.ref_of(*slot) else {
                    continue;
                };
                if let Some((choice, norm)) = band.choice {
                    map.attributes.set_value(key, choice, t.choice[*slot]);
                    map.attributes.set_value(key, norm, normalised(t.choice[*slot], t.pairs[*slot]));
                }
                if let Some((choice, norm)) = band.weighted.as_ref().and_then(|wc| wc.choice) {
                    map.attributes.set_value(key, choice, t.weighted[*slot]);
                    let v = normalised(t.weighted[*slot], t.weighted_pairs[*slot]);
                    map.attributes.set_value(key, norm, v);
                }
            }
        }
    }
    Ok(())
}

/// Depth limit of a bounded step radius.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "bounded radii are non-negative and far below usize::MAX"
)]
fn step_limit(radius: f64) -> usize {
    radius.floor() as usize
}

fn normalised(v: f64, pairs: f64) -> f64 {
    if pairs > 0.0 { v / pairs } else { NOT_COMPUTED }
}

/// Shortest-path dependencies of one origin, added to the band's choice totals.
///
/// Only destinations in a later slot than the origin count, so each pair is seen once.
fn brandes(
    map: &ShapeMap,
    bfs: &Bfs,
    origin: usize,
    in_band: impl Fn(usize) -> bool,
    w: Option<&[f64]>,
    (sigma, delta, wdelta): (&mut [f64], &mut [f64], &mut [f64]),
    totals: &mut ChoiceTotals,
) {
    let order = bfs.order();
    for v in order {
        delta[*v] = 0.0;
        wdelta[*v] = 0.0;
        let paths: f64 = if *v == origin {
            1.0
        } else {
            let d = bfs.depth(*v);
            map.connector_at(*v)
                .connections
                .iter()
                .filter(|u| bfs.reached(**u) && bfs.depth(**u) + 1 == d)
                .map(|u| sigma[*u])
                .sum()
        };
        sigma[*v] = paths;
    }
    let w_origin = w.map_or(0.0, |w| w[origin]);
    for v in order.iter().rev() {
        let d = bfs.depth(*v);
        if !in_band(d) {
            continue;
        }
        let (count, weight) = if *v > origin {
            (1.0, w_origin * w.map_or(0.0, |w| w[*v]))
        } else {
            (0.0, 0.0)
        };
        if *v != origin {
            totals.choice[*v] += delta[*v];
            totals.weighted[*v] += wdelta[*v];
        }
        for u in &map.connector_at(*v).connections {
            if bfs.reached(*u) && bfs.depth(*u) + 1 == d {
                let share = sigma[*u] / sigma[*v];
                delta[*u] += share * (count + delta[*v]);
                wdelta[*u] += share * (weight + wdelta[*v]);
            }
        }
    }
}
