// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use sala_core::{AnalysisResult, ColumnSet, Communicator, ProgressPoller, Result};
use sala_index::Segment;

use super::require_graph;
use super::traverse::level;
use crate::pixel::PixelRef;
use crate::point_map::PointMap;

/// Number of sight lines between other points that pass over each point: "Through vision".
///
/// Each visible pair is counted once, along the cells its sight line crosses.
pub fn through_vision(map: &mut PointMap, comm: &dyn Communicator) -> Result<AnalysisResult> {
    require_graph(map)?;
    let mut cols = ColumnSet::new();
    let outcome = run(map, comm, &mut cols);
    cols.settle(&mut map.attributes, outcome)
}

fn run(map: &mut PointMap, comm: &dyn Communicator, cols: &mut ColumnSet) -> Result<()> {
    let col = cols.insert(&mut map.attributes, "Through vision")?;
    let pixels = map.filled_pixels();
    tracing::info!(points = pixels.len(), "through vision");
    let grid = map.raster();
    let mut counts = vec![0_usize; map.points.len()];
    let mut poller = ProgressPoller::new(comm, pixels.len());
    for (n, a) in pixels.iter().enumerate() {
        poller.tick(n)?;
        let pa = map.depixelate(*a);
        for b in map.visible_from(*a) {
            if b <= *a {
                continue;
            }
            let pb = map.depixelate(b);
            for (x, y) in grid.cells_on_segment(Segment::new(pa.x, pa.y, pb.x, pb.y)) {
                let (Ok(x), Ok(y)) = (i16::try_from(x), i16::try_from(y)) else {
                    continue;
                };
                let c = PixelRef::new(x, y);
                if c == *a || c == b {
                    continue;
                }
                if let Some(i) = map.index_of(c)
                    && map.points[i].filled()
                {
                    counts[i] += 1;
                }
            }
        }
    }
    for p in pixels {
        if let Some(i) = map.index_of(p) {
            map.attributes.set_value(p.key(), col, level(counts[i]));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FillType, GraphOptions};
    use kurbo::{Line, Point, Rect};
    use sala_core::NoComm;

    #[test]
    fn corridor_counts_pairs_either_side() {
        let mut m = PointMap::new("corridor", Rect::new(-0.5, -0.5, 6.5, 2.5), 1.0).unwrap();
        m.block_lines(&[
            Line::new((0.0, 0.0), (6.0, 0.0)),
            Line::new((6.0, 0.0), (6.0, 2.0)),
            Line::new((6.0, 2.0), (0.0, 2.0)),
            Line::new((0.0, 2.0), (0.0, 0.0)),
        ]);
        assert_eq!(m.make_points(Point::new(3.0, 1.0), FillType::Full), Ok(5));
        m.make_graph(&GraphOptions::default(), &NoComm).unwrap();
        through_vision(&mut m, &NoComm).unwrap();
        let col = m.attributes().column_index("Through vision").unwrap();
        let got: Vec<f64> = (1..=5)
            .map(|x| m.attributes().value(PixelRef::new(x, 1).key(), col))
            .collect();
        assert_eq!(got, [0.0, 3.0, 4.0, 3.0, 0.0]);
    }
}
