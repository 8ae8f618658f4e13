// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::{
    AnalysisResult, ColumnSet, Communicator, ProgressPoller, RADIUS_N, Result, SalaError,
};

use super::require_graph;
use super::traverse::{Traversal, level};
use crate::point_map::PointMap;

/// Cost model for [`step_depth`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StepDepthKind {
    /// Steps through the visibility graph: "Visual Step Depth".
    #[default]
    Visual,
    /// Shortest path length and the turn along it: "Metric Step Shortest-Path Length"
    /// and "Metric Step Shortest-Path Angle".
    Metric,
    /// Least cumulative turn: "Angular Step Depth".
    Angular,
}

/// Depth of every point from the nearest selected point.
///
/// Points the selection cannot reach keep `-1`. Fails with [`SalaError::NoSelection`]
/// when nothing is selected.
pub fn step_depth(
    map: &mut PointMap,
    kind: StepDepthKind,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_graph(map)?;
    let sources = map.selection();
    if sources.is_empty() {
        return Err(SalaError::NoSelection);
    }
    tracing::info!(sources = sources.len(), ?kind, "step depth");
    let mut cols = ColumnSet::new();
    let outcome = run(map, kind, &sources, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(
    map: &mut PointMap,
    kind: StepDepthKind,
    sources: &[crate::pixel::PixelRef],
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let mut poller = ProgressPoller::new(comm, map.filled_point_count());
    let mut traversal = Traversal::new(map);
    let mut found = Vec::new();
    match kind {
        StepDepthKind::Visual => {
            let col = cols.insert(&mut map.attributes, "Visual Step Depth")?;
            traversal.visual(map, sources, RADIUS_N, Some(&mut poller), |p, d| {
                found.push((p, level(d), 0.0));
            })?;
            for (p, d, _) in found {
                map.attributes.set_value(p.key(), col, d);
            }
        }
        StepDepthKind::Metric => {
            let length = cols.insert(&mut map.attributes, "Metric Step Shortest-Path Length")?;
            let angle = cols.insert(&mut map.attributes, "Metric Step Shortest-Path Angle")?;
            traversal.metric(map, sources, RADIUS_N, Some(&mut poller), |p, d, a| {
                found.push((p, d, a));
            })?;
            for (p, d, a) in found {
                map.attributes.set_value(p.key(), length, d);
                map.attributes.set_value(p.key(), angle, a);
            }
        }
        StepDepthKind::Angular => {
            let col = cols.insert(&mut map.attributes, "Angular Step Depth")?;
            traversal.angular(map, sources, RADIUS_N, Some(&mut poller), |p, c| {
                found.push((p, c, 0.0));
            })?;
            for (p, c, _) in found {
                map.attributes.set_value(p.key(), col, c);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelRef;
    use crate::test_util::graph_room;
    use kurbo::Line;
    use sala_core::{NOT_COMPUTED, NoComm};

    fn value(map: &PointMap, col: &str, p: (i16, i16)) -> f64 {
        let c = map.attributes().column_index(col).unwrap();
        map.attributes().value(PixelRef::new(p.0, p.1).key(), c)
    }

    #[test]
    fn visual_steps_round_a_partition() {
        let mut m = graph_room(&[Line::new((5.0, 0.0), (5.0, 6.0))]);
        m.set_selected(PixelRef::new(4, 1), true);
        step_depth(&mut m, StepDepthKind::Visual, &NoComm).unwrap();
        assert_eq!(value(&m, "Visual Step Depth", (4, 1)), 0.0);
        assert_eq!(value(&m, "Visual Step Depth", (1, 9)), 1.0);
        assert_eq!(value(&m, "Visual Step Depth", (6, 1)), 2.0);
    }

    #[test]
    fn metric_and_angular_steps() {
        let mut m = graph_room(&[]);
        m.set_selected(PixelRef::new(1, 1), true);
        step_depth(&mut m, StepDepthKind::Metric, &NoComm).unwrap();
        let d = value(&m, "Metric Step Shortest-Path Length", (4, 5));
        assert!((d - 5.0).abs() < 1e-9);
        step_depth(&mut m, StepDepthKind::Angular, &NoComm).unwrap();
        assert_eq!(value(&m, "Angular Step Depth", (9, 9)), 0.0);
    }

    #[test]
    fn several_sources_take_the_nearest() {
        let mut m = graph_room(&[Line::new((5.0, 0.0), (5.0, 6.0))]);
        m.set_selected(PixelRef::new(4, 1), true);
        m.set_selected(PixelRef::new(6, 1), true);
        step_depth(&mut m, StepDepthKind::Visual, &NoComm).unwrap();
        assert_eq!(value(&m, "Visual Step Depth", (9, 1)), 1.0);
        assert_eq!(value(&m, "Visual Step Depth", (1, 1)), 1.0);
    }

    #[test]
    fn unreachable_points_stay_uncomputed() {
        let mut m = graph_room(&[]);
        // A second, separate fill with no sight line to the first.
        m.block_lines(&[
            Line::new((0.0, 0.0), (10.0, 0.0)),
            Line::new((10.0, 0.0), (10.0, 10.0)),
            Line::new((10.0, 10.0), (0.0, 10.0)),
            Line::new((0.0, 10.0), (0.0, 0.0)),
            Line::new((5.0, 0.0), (5.0, 10.0)),
        ]);
        m.clear_points();
        m.make_points(kurbo::Point::new(2.0, 2.0), crate::FillType::Full)
            .unwrap();
        m.make_points(kurbo::Point::new(8.0, 2.0), crate::FillType::Full)
            .unwrap();
        m.make_graph(&crate::GraphOptions::default(), &NoComm).unwrap();
        m.set_selected(PixelRef::new(2, 2), true);
        step_depth(&mut m, StepDepthKind::Visual, &NoComm).unwrap();
        assert_eq!(value(&m, "Visual Step Depth", (3, 3)), 1.0);
        assert_eq!(value(&m, "Visual Step Depth", (8, 8)), NOT_COMPUTED);
    }

    #[test]
    fn needs_a_selection() {
        let mut m = graph_room(&[]);
        assert_eq!(
            step_depth(&mut m, StepDepthKind::Visual, &NoComm),
            Err(SalaError::NoSelection)
        );
    }
}
