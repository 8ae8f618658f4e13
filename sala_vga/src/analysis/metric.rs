// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::radius::radius_suffix;
use sala_core::{
    AnalysisResult, ColumnSet, Communicator, NOT_COMPUTED, ProgressPoller, Result,
};

use super::traverse::{Traversal, level};
use super::{VgaOptions, origins, require_graph};
use crate::point_map::PointMap;

/// Shortest paths by length from every point, with `options.radius` in map units.
///
/// Writes "Metric Mean Shortest-Path Angle" (total turn along each path, in right
/// angles), "Metric Mean Shortest-Path Distance", "Metric Mean Straight-Line Distance"
/// and "Metric Node Count", each followed by the radius suffix.
pub fn metric_global(
    map: &mut PointMap,
    options: &VgaOptions,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_graph(map)?;
    let mut cols = ColumnSet::new();
    let outcome = run_metric(map, options, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run_metric(
    map: &mut PointMap,
    options: &VgaOptions,
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let suffix = radius_suffix(options.radius);
    let mut col = |name: &str| {
        cols.insert(&mut map.attributes, &format!("Metric {name}{suffix}"))
    };
    let angle_col = col("Mean Shortest-Path Angle")?;
    let path_col = col("Mean Shortest-Path Distance")?;
    let euclid_col = col("Mean Straight-Line Distance")?;
    let count_col = col("Node Count")?;

    let origins = origins(map, options);
    tracing::info!(points = origins.len(), radius = options.radius, "metric analysis");
    let mut poller = ProgressPoller::new(comm, origins.len());
    let mut traversal = Traversal::new(map);
    for (n, origin) in origins.iter().enumerate() {
        poller.tick(n)?;
        let centre = map.depixelate(*origin);
        let (mut count, mut angle, mut path, mut euclid) = (0_usize, 0.0, 0.0, 0.0);
        traversal.metric(map, &[*origin], options.radius, None, |p, d, a| {
            count += 1;
            path += d;
            angle += a;
            euclid += (map.depixelate(p) - centre).hypot();
        })?;
        let key = origin.key();
        let t = &mut map.attributes;
        t.set_value(key, count_col, level(count));
        if count > 1 {
            let others = level(count - 1);
            t.set_value(key, angle_col, angle / others);
            t.set_value(key, path_col, path / others);
            t.set_value(key, euclid_col, euclid / others);
        }
    }
    Ok(())
}

/// Least-turn paths from every point, with `options.radius` in right angles.
///
/// Writes "Angular Mean Depth", "Angular Total Depth" and "Angular Node Count", each
/// followed by the radius suffix.
pub fn angular_global(
    map: &mut PointMap,
    options: &VgaOptions,
    comm: &dyn Communicator,
) -> Result<AnalysisResult> {
    require_graph(map)?;
    let mut cols = ColumnSet::new();
    let outcome = run_angular(map, options, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run_angular(
    map: &mut PointMap,
    options: &VgaOptions,
    comm: &dyn Communicator,
    cols: &mut ColumnSet,
) -> Result<()> {
    let suffix = radius_suffix(options.radius);
    let mut col = |name: &str| {
        cols.insert(&mut map.attributes, &format!("Angular {name}{suffix}"))
    };
    let mean_col = col("Mean Depth")?;
    let total_col = col("Total Depth")?;
    let count_col = col("Node Count")?;

    let origins = origins(map, options);
    tracing::info!(points = origins.len(), radius = options.radius, "angular analysis");
    let mut poller = ProgressPoller::new(comm, origins.len());
    let mut traversal = Traversal::new(map);
    for (n, origin) in origins.iter().enumerate() {
        poller.tick(n)?;
        let (mut count, mut total) = (0_usize, 0.0);
        traversal.angular(map, &[*origin], options.radius, None, |_, c| {
            count += 1;
            total += c;
        })?;
        let key = origin.key();
        let t = &mut map.attributes;
        t.set_value(key, count_col, level(count));
        if count > 1 {
            t.set_value(key, total_col, total);
            t.set_value(key, mean_col, total / level(count - 1));
        } else {
            t.set_value(key, mean_col, NOT_COMPUTED);
        }
    }
    Ok(())
}
