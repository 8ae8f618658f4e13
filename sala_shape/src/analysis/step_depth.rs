// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::{
    AnalysisResult, ColumnSet, Communicator, ProgressPoller, RADIUS_N, RadiusType, Result,
    SalaError,
};

use super::require_shapes;
use super::topomet::{TopoMet, TopoMetKind};
use super::traverse::{AngularSearch, Bfs, lengths};
use crate::graph::{MapKind, ShapeGraph, level};
use crate::shape_map::ShapeMap;

/// Depth of every shape from the nearest selected shape.
///
/// Axial, convex and data maps count steps into "Step Depth" and ignore `kind`. Segment
/// maps write "Angular Step Depth", "Metric Step Depth" or "Topological Step Depth"
/// according to `kind`. Unreached shapes keep `-1`. Fails with
/// [`SalaError::NoSelection`] when nothing is selected.
pub fn step_depth(
    graph: &mut ShapeGraph,
    kind: RadiusType,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_shapes(graph)?;
    let segments = graph.kind() == MapKind::Segment;
    let map = graph.map_mut();
    let sources: Vec<usize> = map
        .selection()
        .into_iter()
        .filter_map(|r| map.slot_of(r))
        .collect();
    if sources.is_empty() {
        return Err(SalaError::NoSelection);
    }
    tracing::info!(sources = sources.len(), segments, ?kind, "shape step depth");
    let mut cols = ColumnSet::new();
    let outcome = run(map, segments, kind, &sources, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(
    map: &mut ShapeMap,
    segments: bool,
    kind: RadiusType,
    sources: &[usize],
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let mut poller = ProgressPoller::new(comm, map.len());
    let mut found: Vec<(usize, f64)> = Vec::new();
    let name = if !segments {
        let mut bfs = Bfs::new(map);
        bfs.run(map, sources, None);
        found.extend(bfs.order().iter().map(|s| (*s, level(bfs.depth(*s)))));
        "Step Depth"
    } else if kind == RadiusType::Angular {
        AngularSearch::new(map).run(map, sources, RADIUS_N, |s, c| found.push((s, c)));
        "Angular Step Depth"
    } else {
        let (topomet, name) = match kind {
            RadiusType::Metric => (TopoMetKind::Metric, "Metric Step Depth"),
            _ => (TopoMetKind::Topological, "Topological Step Depth"),
        };
        let mut search = TopoMet::new(map);
        search.run(map, &lengths(map), sources, topomet, RADIUS_N);
        found.extend(search.order().iter().map(|s| (*s, search.cost(*s))));
        name
    };
    let col = cols.insert(&mut map.attributes, name)?;
    for (i, (slot, depth)) in found.into_iter().enumerate() {
        poller.tick(i)?;
        if let Some(key) = map.ref_of(slot) {
            map.attributes.set_value(key, col, depth);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{comb_segments, linked, value};
    use sala_core::{CancelFlag, NOT_COMPUTED, NoComm};

    #[test]
    fn steps_from_the_selection() {
        let mut g = linked(5, &[(0, 1), (1, 2), (2, 3)]);
        g.map_mut().set_selected(0, true).unwrap();
        g.map_mut().set_selected(3, true).unwrap();
        let r = step_depth(&mut g, RadiusType::Angular, &NoComm).unwrap();
        assert_eq!(r.new_columns, ["Step Depth"]);
        let depths: Vec<f64> = (0..5).map(|k| value(&g, "Step Depth", k)).collect();
        assert_eq!(depths, [0.0, 1.0, 1.0, 0.0, NOT_COMPUTED]);
    }

    #[test]
    fn segment_kinds_name_their_columns() {
        let mut g = comb_segments();
        g.map_mut().set_selected(1, true).unwrap();

        step_depth(&mut g, RadiusType::Angular, &NoComm).unwrap();
        assert!((value(&g, "Angular Step Depth", 3) - 2.0).abs() < 1e-9);
        assert_eq!(value(&g, "Angular Step Depth", 2), 0.0);

        step_depth(&mut g, RadiusType::Metric, &NoComm).unwrap();
        assert_eq!(value(&g, "Metric Step Depth", 0), 4.5);
        assert_eq!(value(&g, "Metric Step Depth", 4), 9.0);

        step_depth(&mut g, RadiusType::Topological, &NoComm).unwrap();
        assert_eq!(value(&g, "Topological Step Depth", 4), 2.0);
    }

    #[test]
    fn crossbar_selection_spreads_both_ways() {
        let mut g = comb_segments();
        g.map_mut().set_selected(0, true).unwrap();
        step_depth(&mut g, RadiusType::Topological, &NoComm).unwrap();
        let depths: Vec<f64> = (0..5)
            .map(|k| value(&g, "Topological Step Depth", k))
            .collect();
        assert_eq!(depths, [0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn needs_a_selection() {
        let mut g = linked(2, &[(0, 1)]);
        assert_eq!(
            step_depth(&mut g, RadiusType::Angular, &NoComm),
            Err(SalaError::NoSelection)
        );
    }

    #[test]
    fn cancellation_rolls_back() {
        let mut g = linked(2, &[(0, 1)]);
        g.map_mut().set_selected(0, true).unwrap();
        let flag = CancelFlag::new();
        flag.cancel();
        assert_eq!(
            step_depth(&mut g, RadiusType::Angular, &flag),
            Err(SalaError::Cancelled)
        );
        assert!(g.attributes().column_index("Step Depth").is_none());
    }
}
