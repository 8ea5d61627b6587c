//! The four immutable tables the questionnaire draws its options from.

use std::collections::HashMap;

use tracing::debug;

use brandplanner_shared::{ImperativeId, PlannerError, Result};

use crate::workbook::SheetGrid;

// ---------------------------------------------------------------------------
// Lifecycle / strategic imperative matrix
// ---------------------------------------------------------------------------

/// A lifecycle stage and the sheet column holding its markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageColumn {
    pub name: String,
    pub column: usize,
}

/// One named row of the lifecycle sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImperativeRow {
    pub id: ImperativeId,
    pub name: String,
    /// Applicability per stage, aligned with [`LifecycleTable::stages`].
    pub applies: Vec<bool>,
}

/// Lifecycle stages across the header span, imperatives down column A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTable {
    stages: Vec<StageColumn>,
    imperatives: Vec<ImperativeRow>,
}

impl LifecycleTable {
    /// Read the stage names from `header_row` across `[first_col, first_col + width)`
    /// and every named row below it.
    pub fn from_grid(
        grid: &SheetGrid,
        header_row: usize,
        first_col: usize,
        width: usize,
        marker: &str,
    ) -> Result<Self> {
        let stages: Vec<StageColumn> = grid
            .row_span(header_row, first_col, width)
            .into_iter()
            .map(|(column, name)| StageColumn { name, column })
            .collect();

        if stages.is_empty() {
            return Err(PlannerError::data_unavailable(format!(
                "sheet '{}' has no lifecycle stages in row {}",
                grid.name(),
                header_row + 1
            )));
        }

        let imperatives = (header_row + 1..grid.height())
            .filter_map(|row| {
                let name = grid.cell(row, 0)?;
                let applies = stages
                    .iter()
                    .map(|stage| {
                        grid.cell(row, stage.column)
                            .is_some_and(|cell| cell.eq_ignore_ascii_case(marker))
                    })
                    .collect();
                Some(ImperativeRow {
                    id: ImperativeId(row),
                    name: name.to_string(),
                    applies,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            stages = stages.len(),
            imperatives = imperatives.len(),
            "lifecycle table built"
        );

        Ok(Self {
            stages,
            imperatives,
        })
    }

    pub fn stages(&self) -> &[StageColumn] {
        &self.stages
    }

    pub fn imperatives(&self) -> &[ImperativeRow] {
        &self.imperatives
    }

    /// Position of `stage` in the header span.
    pub fn stage_index(&self, stage: &str) -> Option<usize> {
        let stage = stage.trim();
        self.stages.iter().position(|s| s.name == stage)
    }

    pub fn imperative(&self, id: ImperativeId) -> Option<&ImperativeRow> {
        self.imperatives.iter().find(|row| row.id == id)
    }
}

// ---------------------------------------------------------------------------
// Differentiators
// ---------------------------------------------------------------------------

/// Column headers are categories; each column is an independent list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferentiatorTable {
    categories: Vec<(String, Vec<String>)>,
}

impl DifferentiatorTable {
    /// Headers in row 0, values below. Columns without a header are ignored.
    pub fn from_grid(grid: &SheetGrid) -> Self {
        let categories = grid
            .row_span(0, 0, grid.width())
            .into_iter()
            .map(|(col, header)| (header, grid.column_values(col, 1)))
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self, category: &str) -> Option<&[String]> {
        let category = category.trim();
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, values)| values.as_slice())
    }
}

// ---------------------------------------------------------------------------
// Tones
// ---------------------------------------------------------------------------

/// A single headerless column of tone labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneTable {
    tones: Vec<String>,
}

impl ToneTable {
    pub fn from_grid(grid: &SheetGrid) -> Self {
        Self {
            tones: grid.column_values(0, 0),
        }
    }

    pub fn tones(&self) -> &[String] {
        &self.tones
    }
}

// ---------------------------------------------------------------------------
// Tactics (canonical normalized form)
// ---------------------------------------------------------------------------

/// One row of tactics for an imperative, aligned with [`TacticTable::objectives`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TacticRow {
    pub imperative: String,
    pub tactics: Vec<Option<String>>,
}

/// Imperative × objective → tactic text.
///
/// Built by a [`crate::adapters::TacticAdapter`]; the link from each
/// imperative to its rows is resolved once, at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TacticTable {
    objectives: Vec<String>,
    rows: Vec<TacticRow>,
    links: HashMap<ImperativeId, Vec<usize>>,
}

impl TacticTable {
    pub fn new(
        objectives: Vec<String>,
        rows: Vec<TacticRow>,
        links: HashMap<ImperativeId, Vec<usize>>,
    ) -> Self {
        Self {
            objectives,
            rows,
            links,
        }
    }

    pub fn objectives(&self) -> &[String] {
        &self.objectives
    }

    pub fn objective_index(&self, objective: &str) -> Option<usize> {
        let objective = objective.trim();
        self.objectives.iter().position(|o| o == objective)
    }

    pub fn rows(&self) -> &[TacticRow] {
        &self.rows
    }

    /// Rows linked to an imperative; empty when it has none.
    pub fn rows_for(&self, id: ImperativeId) -> impl Iterator<Item = &TacticRow> {
        self.links
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|&i| self.rows.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle_grid() -> SheetGrid {
        SheetGrid::from_rows(
            "Lifecycle_SI",
            &[
                &["Lifecycle matrix"],
                &["", "Pre-launch", "Launch", "", "Growth"],
                &["Awareness", "X", "x", "", ""],
                &["", "X", "X", "", "X"],
                &["Access", "", "X", "", "X"],
                &["Loyalty", "", "yes", "", "X"],
            ],
        )
    }

    #[test]
    fn stages_keep_order_and_drop_empties() {
        let table = LifecycleTable::from_grid(&lifecycle_grid(), 1, 1, 5, "X").unwrap();
        let names: Vec<_> = table.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Pre-launch", "Launch", "Growth"]);
        assert_eq!(table.stages()[2].column, 4);
    }

    #[test]
    fn unnamed_rows_are_not_imperatives() {
        let table = LifecycleTable::from_grid(&lifecycle_grid(), 1, 1, 5, "X").unwrap();
        let names: Vec<_> = table.imperatives().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Awareness", "Access", "Loyalty"]);
        assert_eq!(table.imperatives()[0].id, ImperativeId(2));
        assert_eq!(table.imperatives()[1].id, ImperativeId(4));
    }

    #[test]
    fn marker_is_case_insensitive_and_exact() {
        let table = LifecycleTable::from_grid(&lifecycle_grid(), 1, 1, 5, "X").unwrap();
        let awareness = table.imperative(ImperativeId(2)).unwrap();
        assert_eq!(awareness.applies, vec![true, true, false]);
        let loyalty = table.imperative(ImperativeId(5)).unwrap();
        assert_eq!(loyalty.applies, vec![false, false, true]);
    }

    #[test]
    fn empty_header_span_is_data_unavailable() {
        let grid = SheetGrid::from_rows("s", &[&["only column A"], &["Awareness"]]);
        let err = LifecycleTable::from_grid(&grid, 0, 1, 5, "X").unwrap_err();
        assert!(matches!(err, PlannerError::DataUnavailable { .. }));
    }

    #[test]
    fn differentiator_columns_are_independent_lists() {
        let grid = SheetGrid::from_rows(
            "Differentiators",
            &[
                &["Efficacy", "", " Safety "],
                &["Faster onset", "ignored", "Few side effects"],
                &["", "", "No black box"],
                &["Longer duration", "", ""],
            ],
        );
        let table = DifferentiatorTable::from_grid(&grid);
        assert_eq!(table.categories().collect::<Vec<_>>(), vec!["Efficacy", "Safety"]);
        assert_eq!(
            table.values("Efficacy").unwrap(),
            &["Faster onset".to_string(), "Longer duration".to_string()]
        );
        assert_eq!(table.values("Safety").unwrap().len(), 2);
        assert!(table.values("Cost").is_none());
    }

    #[test]
    fn tones_are_first_column_without_blanks() {
        let grid = SheetGrid::from_rows("Tone", &[&["Empathetic"], &[""], &["Bold", "x"]]);
        assert_eq!(ToneTable::from_grid(&grid).tones(), &["Empathetic", "Bold"]);
    }
}
