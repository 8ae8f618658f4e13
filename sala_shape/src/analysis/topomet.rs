// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::radius::{normalize_radii, typed_radius_suffix, within};
use sala_core::{
    AnalysisResult, AttributeTable, ColumnSet, Communicator, CostQueue, NOT_COMPUTED,
    ProgressPoller, RADIUS_N, RadiusType, Result, Visited,
};

use super::require_segments;
use super::traverse::{accumulate_choice, lengths};
use crate::connector::Dir;
use crate::graph::ShapeGraph;
use crate::shape_map::ShapeMap;

/// Cost of a step in [`segment_topomet`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TopoMetKind {
    /// One per segment crossed.
    #[default]
    Topological,
    /// Distance between segment midpoints.
    Metric,
}

impl TopoMetKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Topological => "Topological ",
            Self::Metric => "Metric ",
        }
    }
}

/// Settings for [`segment_topomet`].
#[derive(Clone, Debug, PartialEq)]
pub struct TopoMetOptions {
    /// Cost being minimised.
    pub kind: TopoMetKind,
    /// Metric radii; [`RADIUS_N`] is unbounded.
    pub radii: Vec<f64>,
    /// Also compute choice.
    pub choice: bool,
}

impl Default for TopoMetOptions {
    fn default() -> Self {
        Self {
            kind: TopoMetKind::Topological,
            radii: vec![RADIUS_N],
            choice: false,
        }
    }
}

/// A queued arrival at a segment.
#[derive(Copy, Clone, Debug)]
struct Record {
    slot: usize,
    dir: Dir,
    dist: f64,
    metric: f64,
    prev: Option<usize>,
}

/// Least-cost search over directed segment steps, settling each segment once.
///
/// Sources are expanded from both ends.
#[derive(Debug)]
pub(crate) struct TopoMet {
    records: Vec<Record>,
    queue: CostQueue<usize>,
    done: Visited,
    cost: Vec<f64>,
    parent: Vec<Option<usize>>,
    order: Vec<usize>,
}

impl TopoMet {
    pub(crate) fn new(map: &ShapeMap) -> Self {
        let n = map.slot_count();
        Self {
            records: Vec::new(),
            queue: CostQueue::new(),
            done: Visited::new(n),
            cost: vec![0.0; n],
            parent: vec![None; n],
            order: Vec::new(),
        }
    }

    /// Settle everything within metric `radius` of `sources`, cheapest first.
    pub(crate) fn run(
        &mut self,
        map: &ShapeMap,
        lengths: &[f64],
        sources: &[usize],
        kind: TopoMetKind,
        radius: f64,
    ) {
        self.records.clear();
        self.queue.clear();
        self.done.reset();
        self.order.clear();
        for s in sources {
            for dir in [Dir::Forward, Dir::Backward] {
                self.queue.push(0.0, self.records.len());
                self.records.push(Record {
                    slot: *s,
                    dir,
                    dist: 0.0,
                    metric: 0.0,
                    prev: None,
                });
            }
        }
        while let Some((_, i)) = self.queue.pop() {
            let r = self.records[i];
            // A source leaves through both of its ends.
            if self.done.visit(r.slot) {
                self.cost[r.slot] = r.dist;
                self.parent[r.slot] = r.prev;
                self.order.push(r.slot);
            } else if r.prev.is_some() {
                continue;
            }
            for step in map.connector_at(r.slot).exits(r.dir) {
                if self.done.contains(step.slot) {
                    continue;
                }
                let hop = 0.5 * (lengths[r.slot] + lengths[step.slot]);
                let metric = r.metric + hop;
                if !within(radius, metric) {
                    continue;
                }
                let dist = match kind {
                    TopoMetKind::Topological => r.dist + 1.0,
                    TopoMetKind::Metric => metric,
                };
                self.queue.push(dist, self.records.len());
                self.records.push(Record {
                    slot: step.slot,
                    dir: step.dir,
                    dist,
                    metric,
                    prev: Some(r.slot),
                });
            }
        }
    }

    /// Settled segments in order.
    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }

    /// Cost of a settled segment.
    pub(crate) fn cost(&self, slot: usize) -> f64 {
        self.cost[slot]
    }

    pub(crate) fn parent(&self, slot: usize) -> Option<usize> {
        self.parent[slot]
    }
}

#[derive(Debug)]
struct BandColumns {
    radius: f64,
    choice: Option<(usize, usize)>,
    integration: usize,
    mean_depth: usize,
    node_count: usize,
    total_length: usize,
}

impl BandColumns {
    fn insert(
        cols: &mut ColumnSet,
        table: &mut AttributeTable,
        radius: f64,
        options: &TopoMetOptions,
    ) -> Result<Self> {
        let prefix = options.kind.prefix();
        let suffix = typed_radius_suffix(radius, RadiusType::Metric);
        let mut col = |name: &str| cols.insert(table, &format!("{prefix}{name}{suffix}"));
        let choice = if options.choice {
            Some((col("Choice")?, col("Choice [SLW]")?))
        } else {
            None
        };
        Ok(Self {
            radius,
            choice,
            integration: col("Integration")?,
            mean_depth: col("Mean Depth")?,
            node_count: col("Node Count")?,
            total_length: col("Total Length")?,
        })
    }
}

/// Topological or metric integration and choice of every segment, within metric radii.
///
/// Depth is steps or midpoint distance along the cheapest route. "Choice [SLW]" weights
/// each pair of segments by the product of their lengths.
pub fn segment_topomet(
    graph: &mut ShapeGraph,
    options: &TopoMetOptions,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_segments(graph)?;
    let map = graph.map_mut();
    let mut cols = ColumnSet::new();
    let outcome = run(map, options, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(
    map: &mut ShapeMap,
    options: &TopoMetOptions,
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let radii = normalize_radii(&options.radii);
    let bands = radii
        .iter()
        .map(|r| BandColumns::insert(cols, &mut map.attributes, *r, options))
        .collect::<Result<Vec<_>>>()?;
    let slots = map.live_slots();
    tracing::info!(segments = slots.len(), kind = ?options.kind, radii = ?radii, "topo-metric analysis");

    let lengths = lengths(map);
    let n = map.slot_count();
    let mut search = TopoMet::new(map);
    let mut choice = vec![vec![0.0; n]; bands.len()];
    let mut slw = vec![vec![0.0; n]; bands.len()];
    let mut scratch = vec![0.0; n];
    let mut poller = ProgressPoller::new(comm, slots.len());
    for (i, origin) in slots.iter().enumerate() {
        poller.tick(i)?;
        let Some(key) = map.ref_of(*origin) else {
            continue;
        };
        for (b, band) in bands.iter().enumerate() {
            search.run(map, &lengths, &[*origin], options.kind, band.radius);
            let (mut count, mut total, mut length) = (0.0, 0.0, 0.0);
            for s in search.order() {
                count += 1.0;
                total += search.cost(*s);
                length += lengths[*s];
            }
            let t = &mut map.attributes;
            t.set_value(key, band.node_count, count);
            t.set_value(key, band.total_length, length);
            let (mean, integration) = if count > 1.0 && total > 0.0 {
                (total / (count - 1.0), count * count / total)
            } else {
                (NOT_COMPUTED, NOT_COMPUTED)
            };
            t.set_value(key, band.mean_depth, mean);
            t.set_value(key, band.integration, integration);

            if options.choice {
                let parent = |s: usize| search.parent(s);
                accumulate_choice(
                    search.order(),
                    parent,
                    |s| if s > *origin { 1.0 } else { 0.0 },
                    &mut scratch,
                    |s, v| choice[b][s] += v,
                );
                let own = lengths[*origin];
                accumulate_choice(
                    search.order(),
                    parent,
                    |s| if s > *origin { own * lengths[s] } else { 0.0 },
                    &mut scratch,
                    |s, v| slw[b][s] += v,
                );
            }
        }
    }

    for (b, band) in bands.iter().enumerate() {
        let Some((c, c_slw)) = band.choice else {
            continue;
        };
        for slot in &slots {
            if let Some(key) = map.ref_of(*slot) {
                map.attributes.set_value(key, c, choice[b][*slot]);
                map.attributes.set_value(key, c_slw, slw[b][*slot]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{comb_segments, value, zigzag};
    use sala_core::{CancelFlag, NoComm, SalaError};

    #[test]
    fn topological_steps_on_the_comb() {
        let mut g = comb_segments();
        let options = TopoMetOptions {
            choice: true,
            ..Default::default()
        };
        segment_topomet(&mut g, &options, &NoComm).unwrap();
        assert_eq!(value(&g, "Topological Node Count", 1), 5.0);
        assert_eq!(value(&g, "Topological Mean Depth", 1), 1.5);
        assert_eq!(value(&g, "Topological Integration", 1), 25.0 / 6.0);
        assert_eq!(value(&g, "Topological Total Length", 1), 18.0);
        assert_eq!(value(&g, "Topological Choice", 0), 4.0);
        assert_eq!(value(&g, "Topological Choice [SLW]", 0), 36.0);
        assert_eq!(value(&g, "Topological Choice", 3), 0.0);
    }

    #[test]
    fn crossbar_reaches_both_sides() {
        let mut g = comb_segments();
        segment_topomet(&mut g, &TopoMetOptions::default(), &NoComm).unwrap();
        assert_eq!(value(&g, "Topological Node Count", 0), 5.0);
        assert_eq!(value(&g, "Topological Mean Depth", 0), 1.0);
        assert_eq!(value(&g, "Topological Total Length", 0), 18.0);

        let lengths = lengths(g.map());
        let mut search = TopoMet::new(g.map());
        search.run(g.map(), &lengths, &[0], TopoMetKind::Metric, RADIUS_N);
        assert_eq!(search.order().len(), 5);
        assert_eq!(search.cost(1), 4.5);
        assert_eq!(search.cost(4), 4.5);
        assert_eq!(search.parent(1), Some(0));
        assert_eq!(search.parent(4), Some(0));
    }

    #[test]
    fn metric_depth_and_radius() {
        let mut g = comb_segments();
        let options = TopoMetOptions {
            kind: TopoMetKind::Metric,
            radii: vec![5.0, RADIUS_N],
            choice: false,
        };
        let r = segment_topomet(&mut g, &options, &NoComm).unwrap();
        assert!(r.new_columns.iter().any(|c| c == "Metric Node Count R5 metric"));
        assert_eq!(value(&g, "Metric Mean Depth", 1), 25.5 / 4.0);
        assert_eq!(value(&g, "Metric Node Count R5 metric", 1), 3.0);
        assert_eq!(value(&g, "Metric Total Length R5 metric", 1), 12.0);
    }

    #[test]
    fn search_settles_each_segment_once() {
        let g = comb_segments();
        let lengths = lengths(g.map());
        let mut search = TopoMet::new(g.map());
        search.run(g.map(), &lengths, &[1, 3], TopoMetKind::Metric, RADIUS_N);
        let mut order = search.order().to_vec();
        order.sort_unstable();
        assert_eq!(order, [0, 1, 2, 3, 4]);
        assert_eq!(search.cost(0), 4.5);
        assert_eq!(search.parent(4), Some(3));
    }

    #[test]
    fn axial_maps_are_rejected() {
        let mut g = zigzag(3);
        assert_eq!(
            segment_topomet(&mut g, &TopoMetOptions::default(), &NoComm),
            Err(SalaError::EmptyMap)
        );
    }

    #[test]
    fn cancellation_rolls_back() {
        let mut g = comb_segments();
        let flag = CancelFlag::new();
        flag.cancel();
        assert_eq!(
            segment_topomet(&mut g, &TopoMetOptions::default(), &flag),
            Err(SalaError::Cancelled)
        );
        assert!(g.attributes().column_index("Topological Integration").is_none());
    }
}
