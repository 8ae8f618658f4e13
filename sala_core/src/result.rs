// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Analysis outcomes and column bookkeeping for rollback.

use crate::attributes::AttributeTable;
use crate::error::{Result, SalaError};

/// What an analysis did to its attribute table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Whether the analysis ran to completion.
    pub completed: bool,
    /// Columns created or reset, in creation order.
    pub new_columns: Vec<String>,
}

/// Columns an analysis is writing, remembering which of them it created.
///
/// On error, [`ColumnSet::rollback`] removes created columns and resets the ones that
/// already existed, so no partial result survives a cancelled run.
#[derive(Debug, Default)]
pub struct ColumnSet {
    touched: Vec<(String, bool)>,
}

impl ColumnSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reset a column and record it.
    pub fn insert(&mut self, table: &mut AttributeTable, name: &str) -> Result<usize> {
        let existed = table.column_index(name).is_some();
        let col = table.insert_or_reset_column(name)?;
        if !self.touched.iter().any(|(n, _)| n == name) {
            self.touched.push((name.to_owned(), !existed));
        }
        Ok(col)
    }

    /// Create or reset a locked column and record it.
    pub fn insert_locked(&mut self, table: &mut AttributeTable, name: &str) -> usize {
        let existed = table.column_index(name).is_some();
        let col = table.insert_or_reset_locked_column(name);
        if !self.touched.iter().any(|(n, _)| n == name) {
            self.touched.push((name.to_owned(), !existed));
        }
        col
    }

    /// Finish successfully.
    pub fn finish(self) -> AnalysisResult {
        AnalysisResult {
            completed: true,
            new_columns: self.touched.into_iter().map(|(n, _)| n).collect(),
        }
    }

    /// Undo every column change.
    pub fn rollback(self, table: &mut AttributeTable) {
        for (name, created) in self.touched {
            if created {
                table.remove_column(&name);
            } else if let Some(col) = table.column_index(&name) {
                for key in table.keys().collect::<Vec<_>>() {
                    table.set_value(key, col, crate::NOT_COMPUTED);
                }
            }
        }
    }

    /// Finish or roll back depending on `outcome`.
    pub fn settle(self, table: &mut AttributeTable, outcome: Result<()>) -> Result<AnalysisResult> {
        match outcome {
            Ok(()) => Ok(self.finish()),
            Err(e) => {
                if let SalaError::Cancelled = e {
                    tracing::info!("analysis cancelled, rolling back columns");
                }
                self.rollback(table);
                Err(e)
            }
        }
    }
}
