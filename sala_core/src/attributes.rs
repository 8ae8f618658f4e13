// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sparse columnar attribute table keyed by integer row keys.
//!
//! Rows iterate in key order. Every column value defaults to `-1`, which downstream
//! code reads as "not computed". Locked columns (for example `"Connectivity"`) reject
//! [`AttributeTable::insert_or_reset_column`] so that an unrelated analysis cannot
//! clobber them.

use std::collections::BTreeMap;

use crate::error::{Result, SalaError};

/// Value written into fresh or reset columns.
pub const NOT_COMPUTED: f64 = -1.0;

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Column {
    name: String,
    locked: bool,
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Row {
    values: Vec<f64>,
    selected: bool,
}

/// Summary statistics over the computed values of one column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnStats {
    /// Smallest computed value.
    pub min: f64,
    /// Largest computed value.
    pub max: f64,
    /// Mean of computed values.
    pub mean: f64,
    /// Number of rows holding a computed value.
    pub count: usize,
}

/// Columnar table of `f64` values, keyed by `i32` row keys.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeTable {
    columns: Vec<Column>,
    rows: BTreeMap<i32, Row>,
}

impl AttributeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row with every column at the default value. Existing rows are left untouched.
    pub fn add_row(&mut self, key: i32) {
        let width = self.columns.len();
        self.rows.entry(key).or_insert_with(|| Row {
            values: vec![NOT_COMPUTED; width],
            selected: false,
        });
    }

    /// Remove a row; returns whether it existed.
    pub fn remove_row(&mut self, key: i32) -> bool {
        self.rows.remove(&key).is_some()
    }

    /// Remove all rows, keeping columns.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// Whether a row exists.
    pub fn has_row(&self, key: i32) -> bool {
        self.rows.contains_key(&key)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.keys().copied()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Index of a named column, as an error if missing.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| SalaError::ColumnNotFound(name.to_owned()))
    }

    /// Name of a column.
    pub fn column_name(&self, col: usize) -> &str {
        &self.columns[col].name
    }

    /// Column names in creation order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Whether a column is locked.
    pub fn is_locked(&self, col: usize) -> bool {
        self.columns[col].locked
    }

    /// Create a column, or reset an existing unlocked column to the default value.
    pub fn insert_or_reset_column(&mut self, name: &str) -> Result<usize> {
        if let Some(col) = self.column_index(name) {
            if self.columns[col].locked {
                return Err(SalaError::LockedColumn(name.to_owned()));
            }
            self.reset_column(col);
            return Ok(col);
        }
        Ok(self.push_column(name, false))
    }

    /// Create or reset a column and lock it against later unlocked resets.
    pub fn insert_or_reset_locked_column(&mut self, name: &str) -> usize {
        let col = match self.column_index(name) {
            Some(col) => {
                self.reset_column(col);
                col
            }
            None => self.push_column(name, true),
        };
        self.columns[col].locked = true;
        col
    }

    /// Remove a column by name. Column indices above it shift down by one.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(col);
        for row in self.rows.values_mut() {
            row.values.remove(col);
        }
        true
    }

    fn push_column(&mut self, name: &str, locked: bool) -> usize {
        self.columns.push(Column {
            name: name.to_owned(),
            locked,
        });
        for row in self.rows.values_mut() {
            row.values.push(NOT_COMPUTED);
        }
        self.columns.len() - 1
    }

    fn reset_column(&mut self, col: usize) {
        for row in self.rows.values_mut() {
            row.values[col] = NOT_COMPUTED;
        }
    }

    /// Value at `(key, col)`; the default for missing rows.
    pub fn value(&self, key: i32, col: usize) -> f64 {
        self.rows
            .get(&key)
            .map_or(NOT_COMPUTED, |r| r.values[col])
    }

    /// Set a value. Missing rows are ignored.
    pub fn set_value(&mut self, key: i32, col: usize, v: f64) {
        if let Some(r) = self.rows.get_mut(&key) {
            r.values[col] = v;
        }
    }

    /// Add `delta` to a value. Missing rows are ignored.
    pub fn incr_value(&mut self, key: i32, col: usize, delta: f64) {
        if let Some(r) = self.rows.get_mut(&key) {
            r.values[col] += delta;
        }
    }

    /// Set the selection flag of a row.
    pub fn set_selected(&mut self, key: i32, selected: bool) {
        if let Some(r) = self.rows.get_mut(&key) {
            r.selected = selected;
        }
    }

    /// Whether a row is selected.
    pub fn is_selected(&self, key: i32) -> bool {
        self.rows.get(&key).is_some_and(|r| r.selected)
    }

    /// Selected keys in ascending order.
    pub fn selected_keys(&self) -> Vec<i32> {
        self.rows
            .iter()
            .filter(|(_, r)| r.selected)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Deselect every row.
    pub fn clear_selection(&mut self) {
        for r in self.rows.values_mut() {
            r.selected = false;
        }
    }

    /// Min, max and mean over rows whose value is computed (not `-1`).
    pub fn column_stats(&self, col: usize) -> Option<ColumnStats> {
        let mut count = 0_usize;
        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for r in self.rows.values() {
            let v = r.values[col];
            if v == NOT_COMPUTED {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        #[allow(clippy::cast_precision_loss, reason = "row counts fit in f64 mantissa")]
        let mean = sum / count as f64;
        (count > 0).then_some(ColumnStats {
            min,
            max,
            mean,
            count,
        })
    }

    /// Keys ordered by ascending column value; ties keep key order.
    pub fn sorted_keys(&self, col: usize) -> Vec<i32> {
        let mut keys: Vec<(i32, f64)> = self.rows.iter().map(|(k, r)| (*k, r.values[col])).collect();
        keys.sort_by(|a, b| a.1.total_cmp(&b.1));
        keys.into_iter().map(|(k, _)| k).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_default_to_not_computed() {
        let mut t = AttributeTable::new();
        t.add_row(3);
        t.add_row(1);
        let c = t.insert_or_reset_column("Depth").unwrap();
        assert_eq!(t.value(1, c), NOT_COMPUTED);
        t.set_value(1, c, 2.0);
        t.incr_value(1, c, 0.5);
        assert_eq!(t.value(1, c), 2.5);
        assert_eq!(t.keys().collect::<Vec<_>>(), [1, 3]);
        // A row added after the column still gets a slot.
        t.add_row(2);
        assert_eq!(t.value(2, c), NOT_COMPUTED);
    }

    #[test]
    fn locked_columns_reject_plain_reset() {
        let mut t = AttributeTable::new();
        t.add_row(0);
        let c = t.insert_or_reset_locked_column("Connectivity");
        t.set_value(0, c, 4.0);
        assert_eq!(
            t.insert_or_reset_column("Connectivity"),
            Err(SalaError::LockedColumn("Connectivity".into()))
        );
        assert_eq!(t.value(0, c), 4.0);
        assert!(t.is_locked(c));
    }

    #[test]
    fn remove_column_shifts_indices() {
        let mut t = AttributeTable::new();
        t.add_row(0);
        let a = t.insert_or_reset_column("A").unwrap();
        let b = t.insert_or_reset_column("B").unwrap();
        t.set_value(0, b, 9.0);
        assert!(t.remove_column("A"));
        assert_eq!(a, 0);
        assert_eq!(t.column_index("B"), Some(0));
        assert_eq!(t.value(0, 0), 9.0);
    }

    #[test]
    fn stats_skip_uncomputed_rows() {
        let mut t = AttributeTable::new();
        for k in 0..4 {
            t.add_row(k);
        }
        let c = t.insert_or_reset_column("V").unwrap();
        t.set_value(0, c, 1.0);
        t.set_value(2, c, 3.0);
        let s = t.column_stats(c).unwrap();
        assert_eq!((s.min, s.max, s.mean, s.count), (1.0, 3.0, 2.0, 2));
        assert_eq!(t.sorted_keys(c), [1, 3, 0, 2]);
    }

    #[test]
    fn selection_round_trip() {
        let mut t = AttributeTable::new();
        t.add_row(5);
        t.add_row(7);
        t.set_selected(7, true);
        assert_eq!(t.selected_keys(), [7]);
        t.clear_selection();
        assert!(t.selected_keys().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_keeps_locks_and_values() {
        let mut t = AttributeTable::new();
        t.add_row(-4);
        let c = t.insert_or_reset_locked_column("Connectivity");
        t.set_value(-4, c, 12.0);
        let json = serde_json::to_string(&t).unwrap();
        let back: AttributeTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(-4, c), 12.0);
        assert!(back.is_locked(c));
    }
}
