// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::{AnalysisResult, ColumnSet, Communicator, ProgressPoller, Result, SalaError};
use sala_isovist::{BspTree, Isovist, IsovistOptions};

use crate::node::{BIN_COUNT, bin_angle};
use crate::point_map::PointMap;

/// Isovist measures of every filled point, against the map's blocking lines.
///
/// Writes "Isovist Area", "Isovist Compactness", "Isovist Drift Angle" (degrees),
/// "Isovist Drift Magnitude", "Isovist Min Radial", "Isovist Max Radial",
/// "Isovist Occlusivity" and "Isovist Perimeter". When the visibility graph exists, each
/// bin's occlusion distance is set from the isovist along the bin's centre ray.
pub fn isovist_properties(
    map: &mut PointMap,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    if !map.lines_blocked() {
        return Err(SalaError::LinesNotBlocked);
    }
    if map.filled_point_count() == 0 {
        return Err(SalaError::NoFilledPoints);
    }
    let mut cols = ColumnSet::new();
    let outcome = run(map, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(map: &mut PointMap, comm: &dyn Communicator, cols: &mut ColumnSet) -> Result<()> {
    let mut col = |name: &str| cols.insert(&mut map.attributes, &format!("Isovist {name}"));
    let area = col("Area")?;
    let compactness = col("Compactness")?;
    let drift_angle = col("Drift Angle")?;
    let drift_magnitude = col("Drift Magnitude")?;
    let min_radial = col("Min Radial")?;
    let max_radial = col("Max Radial")?;
    let occlusivity = col("Occlusivity")?;
    let perimeter = col("Perimeter")?;

    let tree = BspTree::build(
        map.blocking_lines()
            .iter()
            .zip(0..)
            .map(|(line, tag)| (*line, tag)),
    );
    let pixels = map.filled_pixels();
    tracing::info!(points = pixels.len(), lines = tree.len(), "isovist properties");
    let options = IsovistOptions {
        bounds: Some(map.region()),
        ..Default::default()
    };
    let mut poller = ProgressPoller::new(comm, pixels.len());
    for (n, p) in pixels.iter().enumerate() {
        poller.tick(n)?;
        let iso = Isovist::compute(&tree, map.depixelate(*p), &options);
        let s = iso.stats();
        let key = p.key();
        let t = &mut map.attributes;
        t.set_value(key, area, s.area);
        t.set_value(key, compactness, s.compactness);
        t.set_value(key, drift_angle, s.drift_angle);
        t.set_value(key, drift_magnitude, s.drift_magnitude);
        t.set_value(key, min_radial, s.min_radial);
        t.set_value(key, max_radial, s.max_radial);
        t.set_value(key, occlusivity, s.occluded_perimeter);
        t.set_value(key, perimeter, s.perimeter);
        if let Some(node) = map.point_mut(*p).and_then(|pt| pt.node.as_mut()) {
            for k in 0..BIN_COUNT {
                node.bin_mut(k).occ_distance = iso.distance_at(bin_angle(k)).unwrap_or(-1.0);
            }
        }
    }
    Ok(())
}
