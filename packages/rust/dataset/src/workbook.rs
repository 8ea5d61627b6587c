//! Workbook reading: every sheet becomes a [`SheetGrid`] of trimmed text cells.
//!
//! Cells are addressed by absolute zero-based (row, column), so `B2` is
//! `(1, 1)` regardless of where the first non-empty cell of a sheet sits.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use tracing::{debug, info, instrument};

use brandplanner_shared::{PlannerError, Result, SheetRef};

// ---------------------------------------------------------------------------
// SheetGrid
// ---------------------------------------------------------------------------

/// One sheet as a dense grid of optional cell text.
///
/// Empty, whitespace-only, and error cells are `None`; everything else is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<Option<String>>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.and_then(|s| normalize(&s))).collect())
            .collect();
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a grid from string literals; `""` is an empty cell.
    pub fn from_rows(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| normalize(c)).collect())
            .collect();
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows, up to and including the last non-empty one read.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell text at (row, col); `None` when empty or out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// Non-empty cells of `col` from `first_row` down, top to bottom.
    pub fn column_values(&self, col: usize, first_row: usize) -> Vec<String> {
        (first_row..self.height())
            .filter_map(|row| self.cell(row, col))
            .map(String::from)
            .collect()
    }

    /// Non-empty cells of `row` in `[first_col, first_col + width)`, with their column.
    pub fn row_span(&self, row: usize, first_col: usize, width: usize) -> Vec<(usize, String)> {
        (first_col..first_col + width)
            .filter_map(|col| self.cell(row, col).map(|text| (col, text.to_string())))
            .collect()
    }
}

fn normalize(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

/// All sheets of a workbook, in tab order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<SheetGrid>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<SheetGrid>) -> Self {
        Self { sheets }
    }

    /// Read every sheet of an `.xlsx`/`.xlsm`/`.xls`/`.ods` file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PlannerError::data_unavailable(format!(
                "workbook '{}' not found",
                path.display()
            )));
        }

        let mut workbook = open_workbook_auto(path).map_err(|e| {
            PlannerError::data_unavailable(format!("cannot open '{}': {e}", path.display()))
        })?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                PlannerError::data_unavailable(format!("cannot read sheet '{name}': {e}"))
            })?;
            let grid = grid_from_range(name, &range);
            debug!(sheet = grid.name(), rows = grid.height(), cols = grid.width(), "sheet read");
            sheets.push(grid);
        }

        info!(sheets = sheets.len(), "workbook loaded");
        Ok(Self { sheets })
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Look a sheet up by position or name.
    pub fn sheet(&self, sheet: &SheetRef) -> Result<&SheetGrid> {
        let found = match sheet {
            SheetRef::Index(i) => self.sheets.get(*i),
            SheetRef::Name(name) => self.sheets.iter().find(|s| s.name() == name),
        };
        found.ok_or_else(|| {
            PlannerError::data_unavailable(format!(
                "{sheet} missing (workbook has {} sheets)",
                self.sheets.len()
            ))
        })
    }
}

fn grid_from_range(name: String, range: &Range<Data>) -> SheetGrid {
    let Some((end_row, end_col)) = range.end() else {
        return SheetGrid {
            name,
            rows: Vec::new(),
        };
    };

    let rows = (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).and_then(cell_text))
                .collect()
        })
        .collect();

    SheetGrid { name, rows }
}

fn cell_text(data: &Data) -> Option<String> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => normalize(s),
        // Whole numbers read back as floats; drop the ".0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => normalize(&other.to_string()),
    }
}
