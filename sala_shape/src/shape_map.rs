// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape storage: a slot arena keyed by shape reference, with a spatial index.

use std::collections::BTreeMap;

use kurbo::{Line, Point, Rect};
use sala_core::{AttributeTable, Result, SalaError, ShapeRef};
use sala_index::backends::Grid;
use sala_index::{Extent, Index, IndexGeneric, Key};

use crate::connector::Connector;
use crate::shape::{SalaShape, ShapeKinds, rect_to_aabb};

/// Index cell side used when the extent of the map is not known up front.
pub const DEFAULT_CELL_SIZE: f64 = 10.0;

/// Relative tolerance for geometric matching, scaled by the map's extent.
const RELATIVE_TOLERANCE: f64 = 1e-9;

static NO_CONNECTIONS: Connector = Connector {
    connections: Vec::new(),
    forward: Vec::new(),
    backward: Vec::new(),
};

#[derive(Clone, Debug)]
struct Slot {
    shape_ref: ShapeRef,
    shape: SalaShape,
    connector: Connector,
    key: Key,
}

/// A collection of shapes with per-shape connectors and attribute rows.
///
/// Shapes live in slots that are reused after removal. Slot numbers stay stable while a
/// shape is alive, so connectors refer to neighbours by slot and removing a shape only
/// touches its neighbours. Attribute rows are keyed by shape reference.
pub struct ShapeMap {
    name: String,
    slots: Vec<Option<Slot>>,
    free_list: Vec<usize>,
    refs: BTreeMap<ShapeRef, usize>,
    next_ref: ShapeRef,
    kinds: ShapeKinds,
    bounds: Option<Rect>,
    cell_size: f64,
    index: IndexGeneric<usize, Grid>,
    pub(crate) attributes: AttributeTable,
}

impl core::fmt::Debug for ShapeMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShapeMap")
            .field("name", &self.name)
            .field("slots_total", &self.slots.len())
            .field("shapes", &self.refs.len())
            .field("free_list", &self.free_list.len())
            .field("kinds", &self.kinds)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl ShapeMap {
    /// Empty map with the default index cell size.
    pub fn new(name: &str) -> Self {
        Self::build(name, DEFAULT_CELL_SIZE)
    }

    /// Empty map whose spatial index uses square cells of side `cell_size`.
    pub fn with_cell_size(name: &str, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SalaError::InvalidGrid("cell size must be positive"));
        }
        Ok(Self::build(name, cell_size))
    }

    fn build(name: &str, cell_size: f64) -> Self {
        Self {
            name: name.to_owned(),
            slots: Vec::new(),
            free_list: Vec::new(),
            refs: BTreeMap::new(),
            next_ref: 0,
            kinds: ShapeKinds::empty(),
            bounds: None,
            cell_size,
            index: Index::<usize>::with_uniform_grid(cell_size, cell_size, 0.0, 0.0),
            attributes: AttributeTable::new(),
        }
    }

    /// Map name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live shapes.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether the map holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Kinds of shape added since the map was created or cleared.
    pub fn kinds(&self) -> ShapeKinds {
        self.kinds
    }

    /// Side of the spatial index cells.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Union of the bounds of every shape added; [`Rect::ZERO`] when none has been.
    pub fn bounds(&self) -> Rect {
        self.bounds.unwrap_or(Rect::ZERO)
    }

    /// Matching tolerance for this map: a billionth of its larger side.
    pub fn tolerance(&self) -> f64 {
        let b = self.bounds();
        b.width().max(b.height()).max(1.0) * RELATIVE_TOLERANCE
    }

    /// The attribute table, one row per shape.
    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Mutable access to the attribute table, e.g. to load a weighting column.
    pub fn attributes_mut(&mut self) -> &mut AttributeTable {
        &mut self.attributes
    }

    /// Add a shape. With `shape_ref` of `None` the next free reference is used.
    ///
    /// Fails with [`SalaError::DuplicateShape`] if the requested reference is taken.
    pub fn make_shape(&mut self, shape: SalaShape, shape_ref: Option<ShapeRef>) -> Result<ShapeRef> {
        let shape_ref = shape_ref.unwrap_or(self.next_ref);
        if self.refs.contains_key(&shape_ref) {
            return Err(SalaError::DuplicateShape(shape_ref));
        }
        self.next_ref = self.next_ref.max(shape_ref.saturating_add(1));

        let slot = if let Some(slot) = self.free_list.pop() {
            slot
        } else {
            self.slots.push(None);
            self.slots.len() - 1
        };
        let key = match shape.extent() {
            Extent::Box(b) => self.index.insert(b, slot),
            Extent::Segment(s) => self.index.insert_segment(s, slot),
        };
        let b = shape.bounds();
        self.bounds = Some(self.bounds.map_or(b, |r| r.union(b)));
        self.kinds |= shape.kind();
        self.slots[slot] = Some(Slot {
            shape_ref,
            shape,
            connector: Connector::default(),
            key,
        });
        self.refs.insert(shape_ref, slot);
        self.attributes.add_row(shape_ref);
        Ok(shape_ref)
    }

    /// Remove a shape and every connection to it.
    pub fn remove_shape(&mut self, shape_ref: ShapeRef) -> Result<SalaShape> {
        let slot = self
            .slot_of(shape_ref)
            .ok_or(SalaError::ShapeNotFound(shape_ref))?;
        self.remove_slot(slot)
            .map(|(shape, _)| shape)
            .ok_or(SalaError::ShapeNotFound(shape_ref))
    }

    /// Remove the shape in `slot`, returning it with the neighbours it was detached from.
    pub(crate) fn remove_slot(&mut self, slot: usize) -> Option<(SalaShape, Vec<usize>)> {
        let removed = self.slots.get_mut(slot)?.take()?;
        let mut neighbours: Vec<usize> = removed.connector.neighbours().collect();
        neighbours.sort_unstable();
        neighbours.dedup();
        neighbours.retain(|n| *n != slot);
        for n in &neighbours {
            if let Some(Some(other)) = self.slots.get_mut(*n) {
                other.connector.detach(slot);
            }
        }
        self.index.remove(removed.key);
        self.refs.remove(&removed.shape_ref);
        self.attributes.remove_row(removed.shape_ref);
        self.free_list.push(slot);
        Some((removed.shape, neighbours))
    }

    /// Remove every shape and attribute.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.refs.clear();
        self.next_ref = 0;
        self.kinds = ShapeKinds::empty();
        self.bounds = None;
        self.index.clear();
        self.attributes = AttributeTable::new();
    }

    /// The shape with this reference.
    pub fn shape(&self, shape_ref: ShapeRef) -> Option<&SalaShape> {
        self.slot_of(shape_ref).and_then(|s| self.shape_at(s))
    }

    /// The connector of the shape with this reference.
    pub fn connector(&self, shape_ref: ShapeRef) -> Option<&Connector> {
        self.slot_of(shape_ref).map(|s| self.connector_at(s))
    }

    /// References of the shapes connected to `shape_ref`, in slot order.
    pub fn neighbours(&self, shape_ref: ShapeRef) -> Vec<ShapeRef> {
        self.connector(shape_ref)
            .map(|c| c.connections.iter().filter_map(|s| self.ref_of(*s)).collect())
            .unwrap_or_default()
    }

    /// Shapes in reference order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeRef, &SalaShape)> + '_ {
        self.refs
            .iter()
            .filter_map(|(r, s)| Some((*r, &self.slots[*s].as_ref()?.shape)))
    }

    /// Shapes touching `p`, in reference order.
    pub fn shapes_at_point(&self, p: Point) -> Vec<ShapeRef> {
        let tol = self.tolerance();
        let probe = Rect::new(p.x - tol, p.y - tol, p.x + tol, p.y + tol);
        self.matching(probe, |s| s.touches_point(p, tol))
    }

    /// Shapes meeting the rectangle, in reference order.
    pub fn shapes_in_rect(&self, r: Rect) -> Vec<ShapeRef> {
        self.matching(r, |s| s.touches_rect(r))
    }

    /// Shapes meeting the line, in reference order.
    pub fn shapes_on_line(&self, line: Line) -> Vec<ShapeRef> {
        let tol = self.tolerance();
        let probe = sala_core::geom::line_bounds(line).inflate(tol, tol);
        self.matching(probe, |s| s.touches_line(line, tol))
    }

    fn matching(&self, probe: Rect, keep: impl Fn(&SalaShape) -> bool) -> Vec<ShapeRef> {
        let mut out: Vec<ShapeRef> = self
            .candidates(probe)
            .filter_map(|slot| {
                let s = self.slots[slot].as_ref()?;
                keep(&s.shape).then_some(s.shape_ref)
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Live slots whose index extent meets `probe`.
    pub(crate) fn candidates(&self, probe: Rect) -> impl Iterator<Item = usize> + '_ {
        self.index.query_rect(rect_to_aabb(probe)).map(|(_, slot)| slot)
    }

    /// Select or deselect a shape.
    pub fn set_selected(&mut self, shape_ref: ShapeRef, selected: bool) -> Result<()> {
        if !self.refs.contains_key(&shape_ref) {
            return Err(SalaError::ShapeNotFound(shape_ref));
        }
        self.attributes.set_selected(shape_ref, selected);
        Ok(())
    }

    /// Selected shape references, ascending.
    pub fn selection(&self) -> Vec<ShapeRef> {
        self.attributes.selected_keys()
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.attributes.clear_selection();
    }

    pub(crate) fn slot_of(&self, shape_ref: ShapeRef) -> Option<usize> {
        self.refs.get(&shape_ref).copied()
    }

    pub(crate) fn ref_of(&self, slot: usize) -> Option<ShapeRef> {
        Some(self.slots.get(slot)?.as_ref()?.shape_ref)
    }

    pub(crate) fn shape_at(&self, slot: usize) -> Option<&SalaShape> {
        Some(&self.slots.get(slot)?.as_ref()?.shape)
    }

    /// Connector of a slot; empty for a vacant one.
    pub(crate) fn connector_at(&self, slot: usize) -> &Connector {
        match self.slots.get(slot) {
            Some(Some(s)) => &s.connector,
            _ => &NO_CONNECTIONS,
        }
    }

    pub(crate) fn connector_mut(&mut self, slot: usize) -> Option<&mut Connector> {
        Some(&mut self.slots.get_mut(slot)?.as_mut()?.connector)
    }

    /// Live slots in reference order.
    pub(crate) fn live_slots(&self) -> Vec<usize> {
        self.refs.values().copied().collect()
    }

    /// Slot capacity, vacant slots included.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(feature = "serde")]
mod persist {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    // Saved shapes are written in reference order and reloaded into dense slots, so
    // connectors are stored against that order rather than the live slot numbers.
    #[derive(Serialize, Deserialize)]
    struct SavedShape {
        shape_ref: ShapeRef,
        shape: SalaShape,
        connector: Connector,
    }

    #[derive(Serialize, Deserialize)]
    struct SavedShapeMap {
        name: String,
        cell_size: f64,
        next_ref: ShapeRef,
        shapes: Vec<SavedShape>,
        attributes: AttributeTable,
    }

    impl Serialize for ShapeMap {
        fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
            let order = self.live_slots();
            let mut position = vec![usize::MAX; self.slot_count()];
            for (i, slot) in order.iter().enumerate() {
                position[*slot] = i;
            }
            let shapes = order
                .iter()
                .filter_map(|slot| {
                    let s = self.slots[*slot].as_ref()?;
                    let mut connector = s.connector.clone();
                    connector.remap(|n| position[n]);
                    Some(SavedShape {
                        shape_ref: s.shape_ref,
                        shape: s.shape.clone(),
                        connector,
                    })
                })
                .collect();
            SavedShapeMap {
                name: self.name.clone(),
                cell_size: self.cell_size,
                next_ref: self.next_ref,
                shapes,
                attributes: self.attributes.clone(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for ShapeMap {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
            let saved = SavedShapeMap::deserialize(deserializer)?;
            let mut map = Self::with_cell_size(&saved.name, saved.cell_size).map_err(D::Error::custom)?;
            let count = saved.shapes.len();
            let mut connectors = Vec::with_capacity(count);
            for s in saved.shapes {
                map.make_shape(s.shape, Some(s.shape_ref))
                    .map_err(D::Error::custom)?;
                connectors.push(s.connector);
            }
            for (slot, connector) in connectors.into_iter().enumerate() {
                if connector.neighbours().any(|n| n >= count) {
                    return Err(D::Error::custom("connector refers past the last shape"));
                }
                if let Some(c) = map.connector_mut(slot) {
                    *c = connector;
                }
            }
            map.next_ref = map.next_ref.max(saved.next_ref);
            map.attributes = saved.attributes;
            Ok(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> SalaShape {
        SalaShape::Line(Line::new((x0, y0), (x1, y1)))
    }

    #[test]
    fn references_are_assigned_in_order() {
        let mut m = ShapeMap::new("lines");
        assert_eq!(m.make_shape(line(0.0, 0.0, 1.0, 0.0), None), Ok(0));
        assert_eq!(m.make_shape(line(0.0, 1.0, 1.0, 1.0), Some(10)), Ok(10));
        assert_eq!(m.make_shape(line(0.0, 2.0, 1.0, 2.0), None), Ok(11));
        assert_eq!(
            m.make_shape(line(0.0, 3.0, 1.0, 3.0), Some(10)),
            Err(SalaError::DuplicateShape(10))
        );
        assert_eq!(m.len(), 3);
        assert!(m.attributes().has_row(10));
        let refs: Vec<_> = m.iter().map(|(r, _)| r).collect();
        assert_eq!(refs, [0, 10, 11]);
        assert_eq!(m.kinds(), ShapeKinds::LINES);
    }

    #[test]
    fn removal_detaches_neighbours_and_reuses_the_slot() {
        let mut m = ShapeMap::new("lines");
        let a = m.make_shape(line(0.0, 0.0, 2.0, 0.0), None).unwrap();
        let b = m.make_shape(line(1.0, -1.0, 1.0, 1.0), None).unwrap();
        let c = m.make_shape(line(1.5, -1.0, 1.5, 1.0), None).unwrap();
        let (sa, sb, sc) = (m.slot_of(a).unwrap(), m.slot_of(b).unwrap(), m.slot_of(c).unwrap());
        for (x, y) in [(sa, sb), (sa, sc)] {
            m.connector_mut(x).unwrap().connect(y);
            m.connector_mut(y).unwrap().connect(x);
        }

        assert!(m.remove_shape(b).is_ok());
        assert_eq!(m.neighbours(a), [c]);
        assert!(m.shape(b).is_none());
        assert!(!m.attributes().has_row(b));
        assert_eq!(m.remove_shape(b), Err(SalaError::ShapeNotFound(b)));

        // The vacated slot is reused; the survivors keep theirs.
        let d = m.make_shape(line(5.0, 5.0, 6.0, 6.0), None).unwrap();
        assert_eq!(m.slot_of(d), Some(sb));
        assert_eq!(m.slot_of(c), Some(sc));
        assert!(m.neighbours(d).is_empty());
    }

    #[test]
    fn spatial_queries() {
        let mut m = ShapeMap::with_cell_size("mixed", 2.0).unwrap();
        let h = m.make_shape(line(0.0, 0.0, 10.0, 0.0), None).unwrap();
        let v = m.make_shape(line(5.0, -5.0, 5.0, 5.0), None).unwrap();
        let room = m
            .make_shape(
                SalaShape::Polygon(vec![
                    Point::new(20.0, 0.0),
                    Point::new(24.0, 0.0),
                    Point::new(24.0, 4.0),
                    Point::new(20.0, 4.0),
                ]),
                None,
            )
            .unwrap();
        let spot = m.make_shape(SalaShape::Point(Point::new(30.0, 30.0)), None).unwrap();

        assert_eq!(m.shapes_at_point(Point::new(5.0, 0.0)), [h, v]);
        assert_eq!(m.shapes_at_point(Point::new(22.0, 2.0)), [room]);
        assert_eq!(m.shapes_at_point(Point::new(30.0, 30.0)), [spot]);
        assert!(m.shapes_at_point(Point::new(7.0, 3.0)).is_empty());

        assert_eq!(m.shapes_in_rect(Rect::new(4.0, 2.0, 6.0, 3.0)), [v]);
        assert_eq!(m.shapes_in_rect(Rect::new(21.0, 1.0, 22.0, 2.0)), [room]);

        assert_eq!(m.shapes_on_line(Line::new((3.0, -1.0), (3.0, 1.0))), [h]);
        assert_eq!(m.shapes_on_line(Line::new((0.0, 3.0), (21.0, 3.0))), [v, room]);
        assert_eq!(
            m.kinds(),
            ShapeKinds::LINES | ShapeKinds::POLYGONS | ShapeKinds::POINTS
        );
    }

    #[test]
    fn selection_needs_a_live_shape() {
        let mut m = ShapeMap::new("lines");
        let a = m.make_shape(line(0.0, 0.0, 1.0, 0.0), None).unwrap();
        assert!(m.set_selected(a, true).is_ok());
        assert_eq!(m.set_selected(7, true), Err(SalaError::ShapeNotFound(7)));
        assert_eq!(m.selection(), [a]);
        m.clear_selection();
        assert!(m.selection().is_empty());
    }

    #[test]
    fn rejects_bad_cell_size() {
        assert!(ShapeMap::with_cell_size("m", 0.0).is_err());
        assert!(ShapeMap::with_cell_size("m", f64::NAN).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn reload_compacts_slots_and_keeps_links() {
        let mut m = ShapeMap::new("lines");
        let a = m.make_shape(line(0.0, 0.0, 2.0, 0.0), None).unwrap();
        let gone = m.make_shape(line(9.0, 9.0, 9.5, 9.5), None).unwrap();
        let b = m.make_shape(line(1.0, -1.0, 1.0, 1.0), None).unwrap();
        let (sa, sb) = (m.slot_of(a).unwrap(), m.slot_of(b).unwrap());
        m.connector_mut(sa).unwrap().connect(sb);
        m.connector_mut(sb).unwrap().connect(sa);
        m.remove_shape(gone).unwrap();

        let json = serde_json::to_string(&m).unwrap();
        let back: ShapeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.neighbours(a), [b]);
        assert_eq!(back.neighbours(b), [a]);
        assert_eq!(back.shape(b), m.shape(b));
        assert_eq!(back.shapes_at_point(Point::new(1.0, 0.0)), [a, b]);
    }
}
