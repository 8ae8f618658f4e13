// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::radius::{normalize_radii, radius_suffix, within};
use sala_core::{
    AnalysisResult, ColumnSet, Communicator, NOT_COMPUTED, ProgressPoller, RADIUS_N, Result,
};

use super::require_segments;
use super::traverse::AngularSearch;
use crate::graph::ShapeGraph;
use crate::shape_map::ShapeMap;

/// Exact angular depth of every segment, with radii in right angles.
///
/// Writes "Angular Mean Depth", "Angular Total Depth" and "Angular Node Count" per
/// radius. A single search out to the widest radius serves every band.
pub fn segment_angular(
    graph: &mut ShapeGraph,
    radii: &[f64],
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_segments(graph)?;
    let map = graph.map_mut();
    let mut cols = ColumnSet::new();
    let outcome = run(map, radii, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(map: &mut ShapeMap, radii: &[f64], comm: &dyn Communicator, cols: &mut ColumnSet) -> Result<()> {
    let radii = normalize_radii(radii);
    let mut bands = Vec::with_capacity(radii.len());
    for r in &radii {
        let suffix = radius_suffix(*r);
        bands.push((
            cols.insert(&mut map.attributes, &format!("Angular Mean Depth{suffix}"))?,
            cols.insert(&mut map.attributes, &format!("Angular Total Depth{suffix}"))?,
            cols.insert(&mut map.attributes, &format!("Angular Node Count{suffix}"))?,
        ));
    }
    let widest = radii.last().copied().unwrap_or(RADIUS_N);

    let slots = map.live_slots();
    tracing::info!(segments = slots.len(), radii = ?radii, "angular segment analysis");
    let mut search = AngularSearch::new(map);
    let mut totals = vec![(0.0, 0.0); radii.len()];
    let mut poller = ProgressPoller::new(comm, slots.len());
    for (i, origin) in slots.iter().enumerate() {
        poller.tick(i)?;
        let Some(key) = map.ref_of(*origin) else {
            continue;
        };
        totals.fill((0.0, 0.0));
        search.run(map, &[*origin], widest, |_, cost| {
            for (r, (count, depth)) in radii.iter().zip(totals.iter_mut()) {
                if within(*r, cost) {
                    *count += 1.0;
                    *depth += cost;
                }
            }
        });
        for ((mean_col, total_col, count_col), (count, depth)) in bands.iter().zip(&totals) {
            let mean = if *count > 1.0 { depth / (count - 1.0) } else { NOT_COMPUTED };
            map.attributes.set_value(key, *mean_col, mean);
            map.attributes.set_value(key, *total_col, *depth);
            map.attributes.set_value(key, *count_col, *count);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{comb_segments, value, zigzag};
    use sala_core::{CancelFlag, NoComm, SalaError};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn comb_angular_depth() {
        let mut g = comb_segments();
        let r = segment_angular(&mut g, &[RADIUS_N, 1.5], &NoComm).unwrap();
        assert_eq!(
            r.new_columns,
            [
                "Angular Mean Depth R1.5",
                "Angular Total Depth R1.5",
                "Angular Node Count R1.5",
                "Angular Mean Depth",
                "Angular Total Depth",
                "Angular Node Count",
            ]
        );
        assert_eq!(value(&g, "Angular Node Count", 1), 5.0);
        assert!(close(value(&g, "Angular Total Depth", 1), 5.0));
        assert!(close(value(&g, "Angular Mean Depth", 1), 1.25));
        assert_eq!(value(&g, "Angular Node Count R1.5", 1), 3.0);
        assert!(close(value(&g, "Angular Total Depth", 0), 4.0));
    }

    #[test]
    fn lone_segment_has_no_mean() {
        let mut g = ShapeGraph::segments_from_lines(
            "lone",
            &[crate::test_util::l(0.0, 0.0, 1.0, 0.0)],
            &NoComm,
        )
        .unwrap();
        segment_angular(&mut g, &[], &NoComm).unwrap();
        assert_eq!(value(&g, "Angular Node Count", 0), 1.0);
        assert_eq!(value(&g, "Angular Mean Depth", 0), NOT_COMPUTED);
    }

    #[test]
    fn rejects_axial_maps_and_cancels() {
        let mut g = zigzag(2);
        assert_eq!(segment_angular(&mut g, &[], &NoComm), Err(SalaError::EmptyMap));
        let mut g = comb_segments();
        let flag = CancelFlag::new();
        flag.cancel();
        assert_eq!(segment_angular(&mut g, &[], &flag), Err(SalaError::Cancelled));
        assert!(g.attributes().column_index("Angular Node Count").is_none());
    }
}
