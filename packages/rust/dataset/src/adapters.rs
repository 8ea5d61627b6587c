//! Tactic sheet adapters.
//!
//! Two workbook layouts exist for the same tactic data. Each adapter turns
//! one of them into the canonical [`TacticTable`] and resolves every
//! imperative's tactic rows up front, so lookups never do row arithmetic.

use std::collections::HashMap;

use tracing::{debug, info};

use brandplanner_shared::{DatasetLayout, PlannerError, Result, TacticLayout};

use crate::tables::{LifecycleTable, TacticRow, TacticTable};
use crate::workbook::SheetGrid;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Converts one tactic sheet layout into a [`TacticTable`].
pub trait TacticAdapter: Send + Sync {
    /// Build the table, linking each imperative of `lifecycle` to its rows.
    fn adapt(&self, sheet: &SheetGrid, lifecycle: &LifecycleTable) -> Result<TacticTable>;

    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;
}

/// Pick the adapter configured for this workbook.
pub fn adapter_for(layout: &DatasetLayout) -> Box<dyn TacticAdapter> {
    match layout.tactic_layout {
        TacticLayout::Grid => Box::new(GridTacticAdapter {
            header_row: layout.objective_header_row,
            first_column: layout.objective_first_column,
            column_count: layout.objective_column_count,
            row_offset: layout.tactic_row_offset,
        }),
        TacticLayout::Normalized => Box::new(NormalizedTacticAdapter {
            challenge_column: layout.challenge_column.clone(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Grid layout
// ---------------------------------------------------------------------------

/// Objectives across a header span; the tactic row for an imperative is its
/// lifecycle-sheet row plus a fixed offset.
#[derive(Debug, Clone)]
pub struct GridTacticAdapter {
    pub header_row: usize,
    pub first_column: usize,
    pub column_count: usize,
    pub row_offset: isize,
}

impl TacticAdapter for GridTacticAdapter {
    fn adapt(&self, sheet: &SheetGrid, lifecycle: &LifecycleTable) -> Result<TacticTable> {
        let header = sheet.row_span(self.header_row, self.first_column, self.column_count);
        if header.is_empty() {
            return Err(PlannerError::data_unavailable(format!(
                "sheet '{}' has no objectives in row {}",
                sheet.name(),
                self.header_row + 1
            )));
        }

        let mut rows = Vec::with_capacity(lifecycle.imperatives().len());
        let mut links = HashMap::new();

        for imperative in lifecycle.imperatives() {
            let target = imperative.id.0 as isize + self.row_offset;
            // Rows past the used range are blank rows: the imperative has no tactics.
            if target <= self.header_row as isize {
                return Err(PlannerError::data_unavailable(format!(
                    "imperative '{}' ({}) maps to tactic row {}, at or above the header of sheet '{}' (row {})",
                    imperative.name,
                    imperative.id,
                    target + 1,
                    sheet.name(),
                    self.header_row + 1
                )));
            }
            let target = target as usize;

            let tactics = header
                .iter()
                .map(|(col, _)| sheet.cell(target, *col).map(String::from))
                .collect();

            links.insert(imperative.id, vec![rows.len()]);
            rows.push(TacticRow {
                imperative: imperative.name.clone(),
                tactics,
            });
        }

        let objectives = header.into_iter().map(|(_, name)| name).collect::<Vec<_>>();
        info!(
            adapter = self.name(),
            objectives = objectives.len(),
            rows = rows.len(),
            "tactic table built"
        );

        Ok(TacticTable::new(objectives, rows, links))
    }

    fn name(&self) -> &str {
        "grid"
    }
}

// ---------------------------------------------------------------------------
// Normalized layout
// ---------------------------------------------------------------------------

/// Header row with a strategic-challenge column and one column per objective;
/// rows are linked to imperatives by name.
#[derive(Debug, Clone)]
pub struct NormalizedTacticAdapter {
    pub challenge_column: String,
}

impl TacticAdapter for NormalizedTacticAdapter {
    fn adapt(&self, sheet: &SheetGrid, lifecycle: &LifecycleTable) -> Result<TacticTable> {
        let header = sheet.row_span(0, 0, sheet.width());
        let challenge_col = header
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(self.challenge_column.trim()))
            .map(|(col, _)| *col)
            .ok_or_else(|| {
                PlannerError::data_unavailable(format!(
                    "sheet '{}' has no '{}' column",
                    sheet.name(),
                    self.challenge_column
                ))
            })?;

        let objective_cols: Vec<(usize, String)> = header
            .into_iter()
            .filter(|(col, _)| *col != challenge_col)
            .collect();

        let rows: Vec<TacticRow> = (1..sheet.height())
            .filter_map(|row| {
                let imperative = sheet.cell(row, challenge_col)?;
                Some(TacticRow {
                    imperative: imperative.to_string(),
                    tactics: objective_cols
                        .iter()
                        .map(|(col, _)| sheet.cell(row, *col).map(String::from))
                        .collect(),
                })
            })
            .collect();

        let mut links = HashMap::new();
        for imperative in lifecycle.imperatives() {
            let matching: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.imperative == imperative.name)
                .map(|(i, _)| i)
                .collect();
            if matching.is_empty() {
                debug!(imperative = %imperative.name, "no tactic rows for imperative");
            }
            links.insert(imperative.id, matching);
        }

        let objectives = objective_cols.into_iter().map(|(_, name)| name).collect::<Vec<_>>();
        info!(
            adapter = self.name(),
            objectives = objectives.len(),
            rows = rows.len(),
            "tactic table built"
        );

        Ok(TacticTable::new(objectives, rows, links))
    }

    fn name(&self) -> &str {
        "normalized"
    }
}
