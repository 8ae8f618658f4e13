// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::radius::radius_suffix;
use sala_core::{
    AnalysisResult, ColumnSet, Communicator, DepthHistogram, IntegrationMeasures,
    ProgressPoller, Result,
};

use super::traverse::Traversal;
use super::{VgaOptions, origins, require_graph};
use crate::point_map::PointMap;

/// Step-depth integration of every point, with `options.radius` in steps.
///
/// Writes "Visual Entropy", "Visual Integration [HH]", "Visual Integration [P-value]",
/// "Visual Integration [Tekl]", "Visual Mean Depth", "Visual Node Count" and
/// "Visual Relativised Entropy", each followed by the radius suffix.
pub fn visual_global(
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
    let suffix = radius_suffix(options.radius);
    let mut col = |name: &str| {
        cols.insert(&mut map.attributes, &format!("Visual {name}{suffix}"))
    };
    let entropy = col("Entropy")?;
    let hh = col("Integration [HH]")?;
    let pv = col("Integration [P-value]")?;
    let tekl = col("Integration [Tekl]")?;
    let mean_depth = col("Mean Depth")?;
    let count = col("Node Count")?;
    let rel_entropy = col("Relativised Entropy")?;

    let origins = origins(map, options);
    tracing::info!(
        points = origins.len(),
        radius = options.radius,
        "visual global analysis"
    );
    let mut poller = ProgressPoller::new(comm, origins.len());
    let mut traversal = Traversal::new(map);
    let mut h = DepthHistogram::new();
    for (n, origin) in origins.iter().enumerate() {
        poller.tick(n)?;
        h.clear();
        traversal.visual(map, &[*origin], options.radius, None, |_, d| h.add(d))?;
        let m = IntegrationMeasures::from_histogram(&h);
        let key = origin.key();
        let t = &mut map.attributes;
        t.set_value(key, entropy, m.entropy);
        t.set_value(key, hh, m.integration_hh);
        t.set_value(key, pv, m.integration_pv);
        t.set_value(key, tekl, m.integration_tekl);
        t.set_value(key, mean_depth, m.mean_depth);
        t.set_value(key, count, m.node_count);
        t.set_value(key, rel_entropy, m.rel_entropy);
    }
    Ok(())
}
