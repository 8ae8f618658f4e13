// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Angular segment analysis over a bucket queue.
//!
//! Angular cost is counted in whole "tulip units", a quarter of the bin count per right
//! angle. A circular array of `bins` buckets then replaces the priority queue: no single
//! step turns more than half way round it. Entries sharing a bucket are taken in random
//! order, drawn from a generator seeded by [`TulipOptions::seed`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sala_core::radius::{normalize_radii, typed_radius_suffix, within};
use sala_core::{
    AnalysisResult, AttributeTable, ColumnSet, Communicator, NOT_COMPUTED, ProgressPoller,
    RADIUS_N, RadiusType, Result, Visited,
};

use super::require_segments;
use super::traverse::{accumulate_choice, lengths, state, state_dir, state_slot, weights};
use crate::connector::Dir;
use crate::graph::{ShapeGraph, level};
use crate::shape_map::ShapeMap;

/// Smallest usable bin count: one unit per right angle.
const MIN_BINS: usize = 4;

/// Settings for [`segment_tulip`].
#[derive(Clone, Debug, PartialEq)]
pub struct TulipOptions {
    /// Buckets in the circular queue; also sets the angular resolution.
    pub tulip_bins: usize,
    /// Radii in units of [`Self::radius_type`]; [`RADIUS_N`] is unbounded.
    pub radii: Vec<f64>,
    /// What the radii measure.
    pub radius_type: RadiusType,
    /// Also compute choice.
    pub choice: bool,
    /// Column weighting each segment, e.g. segment length.
    pub weighting_col: Option<String>,
    /// Seed for breaking ties within a bucket.
    pub seed: u64,
}

impl Default for TulipOptions {
    fn default() -> Self {
        Self {
            tulip_bins: 1024,
            radii: vec![RADIUS_N],
            radius_type: RadiusType::Angular,
            choice: false,
            weighting_col: None,
            seed: 0,
        }
    }
}

#[derive(Debug)]
struct BandColumns {
    radius: f64,
    choice: Option<usize>,
    integration: usize,
    mean_depth: usize,
    node_count: usize,
    total_depth: usize,
    total_length: usize,
    weighted: Option<WeightedColumns>,
}

#[derive(Debug)]
struct WeightedColumns {
    choice: Option<usize>,
    integration: usize,
    mean_depth: usize,
    total: usize,
}

impl BandColumns {
    fn insert(
        cols: &mut ColumnSet,
        table: &mut AttributeTable,
        prefix: &str,
        radius: f64,
        options: &TulipOptions,
    ) -> Result<Self> {
        let suffix = typed_radius_suffix(radius, options.radius_type);
        let mut col = |name: &str| cols.insert(table, &format!("{prefix}{name}{suffix}"));
        let choice = options.choice.then(|| col("Choice")).transpose()?;
        let integration = col("Integration")?;
        let mean_depth = col("Mean Depth")?;
        let node_count = col("Node Count")?;
        let total_depth = col("Total Depth")?;
        let total_length = col("Total Segment Length")?;
        let weighted = match &options.weighting_col {
            Some(w) => Some(WeightedColumns {
                choice: options
                    .choice
                    .then(|| col(&format!("Choice [{w} Wgt]")))
                    .transpose()?,
                integration: col(&format!("Integration [{w} Wgt]"))?,
                mean_depth: col(&format!("Mean Depth [{w} Wgt]"))?,
                total: col(&format!("Total {w}"))?,
            }),
            None => None,
        };
        Ok(Self {
            radius,
            choice,
            integration,
            mean_depth,
            node_count,
            total_depth,
            total_length,
            weighted,
        })
    }
}

/// Angular integration and choice of every segment, approximated with tulip bins.
///
/// Depth is cumulative turn in right angles along the least-turning route. Node count
/// includes the origin. Integration is node count squared over total depth, and mean
/// depth is total depth over the other segments reached.
pub fn segment_tulip(
    graph: &mut ShapeGraph,
    options: &TulipOptions,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_segments(graph)?;
    let map = graph.map_mut();
    let w = weights(map, options.weighting_col.as_deref())?;
    let mut cols = ColumnSet::new();
    let outcome = run(map, options, w.as_deref(), comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(
    map: &mut ShapeMap,
    options: &TulipOptions,
    w: Option<&[f64]>,
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let bins = options.tulip_bins.max(MIN_BINS);
    let prefix = format!("T{bins} ");
    let radii = normalize_radii(&options.radii);
    let bands = radii
        .iter()
        .map(|r| BandColumns::insert(cols, &mut map.attributes, &prefix, *r, options))
        .collect::<Result<Vec<_>>>()?;

    let slots = map.live_slots();
    tracing::info!(
        segments = slots.len(),
        bins,
        radius_type = ?options.radius_type,
        radii = ?radii,
        "tulip analysis"
    );
    let lengths = lengths(map);
    let n = map.slot_count();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut tulip = Tulip::new(n, bins);
    let mut choice = vec![vec![0.0; n]; bands.len()];
    let mut wchoice = vec![vec![0.0; n]; bands.len()];
    let mut scratch = vec![0.0; n];
    let mut poller = ProgressPoller::new(comm, slots.len());
    for (i, origin) in slots.iter().enumerate() {
        poller.tick(i)?;
        let Some(key) = map.ref_of(*origin) else {
            continue;
        };
        for (b, band) in bands.iter().enumerate() {
            tulip.run(map, &lengths, *origin, band.radius, options.radius_type, &mut rng);
            let (mut count, mut total_depth, mut total_length) = (0.0, 0.0, 0.0);
            let (mut wtotal, mut wdepth) = (0.0, 0.0);
            for s in &tulip.order {
                let d = tulip.depth[*s];
                count += 1.0;
                total_depth += d;
                total_length += lengths[*s];
                if let Some(w) = w {
                    wtotal += w[*s];
                    wdepth += w[*s] * d;
                }
            }
            let t = &mut map.attributes;
            t.set_value(key, band.node_count, count);
            t.set_value(key, band.total_depth, total_depth);
            t.set_value(key, band.total_length, total_length);
            t.set_value(key, band.mean_depth, ratio(total_depth, count - 1.0));
            t.set_value(key, band.integration, ratio(count * count, total_depth));
            if let (Some(w), Some(wc)) = (w, &band.weighted) {
                t.set_value(key, wc.total, wtotal);
                t.set_value(key, wc.mean_depth, ratio(wdepth, wtotal - w[*origin]));
                t.set_value(key, wc.integration, ratio(wtotal * wtotal, wdepth));
            }

            if options.choice {
                let parent = |s: usize| tulip.parent[s];
                accumulate_choice(
                    &tulip.order,
                    parent,
                    |s| if s > *origin { 1.0 } else { 0.0 },
                    &mut scratch,
                    |s, v| choice[b][s] += v,
                );
                if let Some(w) = w {
                    let w_origin = w[*origin];
                    accumulate_choice(
                        &tulip.order,
                        parent,
                        |s| if s > *origin { w_origin * w[s] } else { 0.0 },
                        &mut scratch,
                        |s, v| wchoice[b][s] += v,
                    );
                }
            }
        }
    }

    for (b, band) in bands.iter().enumerate() {
        for slot in &slots {
            let Some(key) = map.ref_of(*slot) else {
                continue;
            };
            if let Some(c) = band.choice {
                map.attributes.set_value(key, c, choice[b][*slot]);
            }
            if let Some(c) = band.weighted.as_ref().and_then(|wc| wc.choice) {
                map.attributes.set_value(key, c, wchoice[b][*slot]);
            }
        }
    }
    Ok(())
}

fn ratio(a: f64, b: f64) -> f64 {
    if b > 0.0 { a / b } else { NOT_COMPUTED }
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    state: usize,
    prev: Option<usize>,
    metric: f64,
    steps: usize,
}

/// Reusable bucket-queue search state.
#[derive(Debug)]
struct Tulip {
    buckets: Vec<Vec<Entry>>,
    /// Units per right angle.
    unit: f64,
    settled: Visited,
    reached: Visited,
    parent: Vec<Option<usize>>,
    depth: Vec<f64>,
    order: Vec<usize>,
}

impl Tulip {
    fn new(slots: usize, bins: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); bins],
            unit: level(bins) / 4.0,
            settled: Visited::new(2 * slots),
            reached: Visited::new(slots),
            parent: vec![None; slots],
            depth: vec![0.0; slots],
            order: Vec::new(),
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "turn weights lie in [0, 2], so units stay below the bin count"
    )]
    fn units(&self, weight: f64) -> usize {
        (weight * self.unit).round() as usize
    }

    /// Settle every segment reachable from `origin` within `radius`.
    fn run(
        &mut self,
        map: &ShapeMap,
        lengths: &[f64],
        origin: usize,
        radius: f64,
        radius_type: RadiusType,
        rng: &mut StdRng,
    ) {
        self.settled.reset();
        self.reached.reset();
        self.order.clear();
        for b in &mut self.buckets {
            b.clear();
        }
        let bins = self.buckets.len();
        for dir in [Dir::Forward, Dir::Backward] {
            self.buckets[0].push(Entry {
                state: state(origin, dir),
                prev: None,
                metric: 0.0,
                steps: 0,
            });
        }
        let mut pending = 2_usize;
        let mut current = 0_usize;
        while pending > 0 {
            let bucket = &mut self.buckets[current % bins];
            if bucket.is_empty() {
                current += 1;
                continue;
            }
            let e = bucket.swap_remove(rng.gen_range(0..bucket.len()));
            pending -= 1;
            if !self.settled.visit(e.state) {
                continue;
            }
            let slot = state_slot(e.state);
            if self.reached.visit(slot) {
                self.parent[slot] = e.prev;
                self.depth[slot] = level(current) / self.unit;
                self.order.push(slot);
            }
            for step in map.connector_at(slot).exits(state_dir(e.state)) {
                let next = state(step.slot, step.dir);
                if self.settled.contains(next) {
                    continue;
                }
                let units = current + self.units(step.weight);
                let metric = e.metric + 0.5 * (lengths[slot] + lengths[step.slot]);
                let steps = e.steps + 1;
                let cost = match radius_type {
                    RadiusType::Angular => level(units) / self.unit,
                    RadiusType::Metric => metric,
                    RadiusType::Topological => level(steps),
                };
                if within(radius, cost) {
                    self.buckets[units % bins].push(Entry {
                        state: next,
                        prev: Some(slot),
                        metric,
                        steps,
                    });
                    pending += 1;
                }
            }
        }
    }
}
