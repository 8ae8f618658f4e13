// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::{
    AnalysisResult, ColumnSet, Communicator, NOT_COMPUTED, ProgressPoller, Result, Visited,
};

use super::require_shapes;
use crate::graph::{ShapeGraph, level};
use crate::shape_map::ShapeMap;

/// Neighbourhood measures of every shape.
///
/// - "Control": sum over neighbours of one over their own connectivity.
/// - "Controllability": neighbours over shapes within two steps.
pub fn axial_local(graph: &mut ShapeGraph, comm: &dyn Communicator) -> Result<AnalysisResult> {
    require_shapes(graph)?;
    let map = graph.map_mut();
    let mut cols = ColumnSet::new();
    let outcome = run(map, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(map: &mut ShapeMap, comm: &dyn Communicator, cols: &mut ColumnSet) -> Result<()> {
    let control_col = cols.insert(&mut map.attributes, "Control")?;
    let controllability_col = cols.insert(&mut map.attributes, "Controllability")?;

    let slots = map.live_slots();
    tracing::info!(shapes = slots.len(), "axial local analysis");
    let mut poller = ProgressPoller::new(comm, slots.len());
    let mut within_two = Visited::new(map.slot_count());
    for (i, slot) in slots.iter().enumerate() {
        poller.tick(i)?;
        let Some(key) = map.ref_of(*slot) else {
            continue;
        };
        within_two.reset();
        within_two.visit(*slot);
        let neighbours = &map.connector_at(*slot).connections;
        let mut control = 0.0;
        let mut reach = 0_usize;
        for n in neighbours {
            control += 1.0 / level(map.connector_at(*n).degree());
            if within_two.visit(*n) {
                reach += 1;
            }
        }
        for n in neighbours {
            for m in &map.connector_at(*n).connections {
                if within_two.visit(*m) {
                    reach += 1;
                }
            }
        }
        let controllability = if reach > 0 {
            level(neighbours.len()) / level(reach)
        } else {
            NOT_COMPUTED
        };
        map.attributes.set_value(key, control_col, control);
        map.attributes.set_value(key, controllability_col, controllability);
    }
    Ok(())
}
