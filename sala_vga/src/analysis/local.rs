// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::{
    AnalysisResult, ColumnSet, Communicator, NOT_COMPUTED, ProgressPoller, Result, Visited,
};

use super::traverse::level;
use super::{VgaOptions, origins, require_graph};
use crate::point_map::PointMap;

/// Neighbourhood measures of every point.
///
/// - "Visual Clustering Coefficient": share of ordered pairs of visible points that see
///   each other.
/// - "Visual Control": sum over visible points of one over their own connectivity.
/// - "Visual Controllability": visible points over points within two steps.
pub fn visual_local(
    map: &mut PointMap,
    options: &VgaOptions,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_graph(map)?;
    let mut cols = ColumnSet::new();
    let outcome = run(map, options, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(
    map: &mut PointMap,
    options: &VgaOptions,
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let cluster_col = cols.insert(&mut map.attributes, "Visual Clustering Coefficient")?;
    let control_col = cols.insert(&mut map.attributes, "Visual Control")?;
    let controllability_col = cols.insert(&mut map.attributes, "Visual Controllability")?;

    let origins = origins(map, options);
    tracing::info!(points = origins.len(), "visual local analysis");
    let mut poller = ProgressPoller::new(comm, origins.len());
    let mut near = Visited::new(map.points.len());
    let mut within_two = Visited::new(map.points.len());
    for (n, origin) in origins.iter().enumerate() {
        poller.tick(n)?;
        near.reset();
        within_two.reset();
        let Some(oi) = map.index_of(*origin) else {
            continue;
        };
        within_two.visit(oi);
        let mut k = 0_usize;
        for q in map.visible_from(*origin) {
            if let Some(j) = map.index_of(q) {
                near.visit(j);
                within_two.visit(j);
                k += 1;
            }
        }
        let mut links = 0_usize;
        let mut control = 0.0;
        let mut two_step = k;
        for q in map.visible_from(*origin) {
            let mut degree = 0_usize;
            for r in map.visible_from(q) {
                degree += 1;
                let Some(j) = map.index_of(r) else {
                    continue;
                };
                if near.contains(j) {
                    links += 1;
                }
                if within_two.visit(j) {
                    two_step += 1;
                }
            }
            if degree > 0 {
                control += 1.0 / level(degree);
            }
        }
        let key = origin.key();
        let t = &mut map.attributes;
        if k > 1 {
            t.set_value(key, cluster_col, level(links) / level(k * (k - 1)));
        }
        if k > 0 {
            t.set_value(key, control_col, control);
            t.set_value(key, controllability_col, level(k) / level(two_step));
        } else {
            t.set_value(key, control_col, NOT_COMPUTED);
        }
    }
    Ok(())
}
