//! The selection filter: option lists for every questionnaire step and the
//! final tactic lookup.
//!
//! A [`Catalog`] is built once per process and never mutated. Every query is
//! a pure function of the tables and the selections passed in.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info, instrument};

use brandplanner_shared::{
    DatasetLayout, ImperativeId, ImperativeOption, PlannerError, Result, Selection, TacticMatch,
};

use crate::adapters::adapter_for;
use crate::tables::{DifferentiatorTable, LifecycleTable, TacticTable, ToneTable};
use crate::workbook::Workbook;

/// The four dataset tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    lifecycle: LifecycleTable,
    differentiators: DifferentiatorTable,
    tones: ToneTable,
    tactics: TacticTable,
}

impl Catalog {
    /// Read the workbook at `layout.path` and build every table.
    #[instrument(skip_all, fields(path = %layout.path.display()))]
    pub fn load(layout: &DatasetLayout) -> Result<Self> {
        let workbook = Workbook::open(&layout.path)?;
        Self::from_workbook(&workbook, layout)
    }

    /// Build the tables from already-read sheets.
    pub fn from_workbook(workbook: &Workbook, layout: &DatasetLayout) -> Result<Self> {
        let lifecycle = LifecycleTable::from_grid(
            workbook.sheet(&layout.lifecycle_sheet)?,
            layout.lifecycle_header_row,
            layout.stage_first_column,
            layout.stage_column_count,
            &layout.marker,
        )?;
        let differentiators =
            DifferentiatorTable::from_grid(workbook.sheet(&layout.differentiator_sheet)?);
        let tones = ToneTable::from_grid(workbook.sheet(&layout.tone_sheet)?);
        let tactics = adapter_for(layout).adapt(workbook.sheet(&layout.tactic_sheet)?, &lifecycle)?;

        info!(
            stages = lifecycle.stages().len(),
            imperatives = lifecycle.imperatives().len(),
            tones = tones.tones().len(),
            objectives = tactics.objectives().len(),
            "catalog ready"
        );

        Ok(Self {
            lifecycle,
            differentiators,
            tones,
            tactics,
        })
    }

    // -----------------------------------------------------------------------
    // Option lists
    // -----------------------------------------------------------------------

    /// Lifecycle stage names, left to right.
    pub fn lifecycle_options(&self) -> Vec<String> {
        self.lifecycle.stages().iter().map(|s| s.name.clone()).collect()
    }

    /// Imperatives marked as applicable under `stage`, top to bottom.
    pub fn imperatives_for_lifecycle(&self, stage: &str) -> Result<Vec<ImperativeOption>> {
        let index = self.stage_index(stage)?;
        Ok(self
            .lifecycle
            .imperatives()
            .iter()
            .filter(|row| row.applies[index])
            .map(|row| ImperativeOption {
                id: row.id,
                name: row.name.clone(),
            })
            .collect())
    }

    /// Differentiator categories in sheet order.
    pub fn differentiator_categories(&self) -> Vec<String> {
        self.differentiators.categories().map(String::from).collect()
    }

    /// Differentiators listed under `category`, top to bottom.
    pub fn differentiators_for(&self, category: &str) -> Result<Vec<String>> {
        self.differentiators
            .values(category)
            .map(<[String]>::to_vec)
            .ok_or_else(|| {
                PlannerError::invalid_selection(format!(
                    "unknown differentiator category '{category}'"
                ))
            })
    }

    pub fn tones(&self) -> &[String] {
        self.tones.tones()
    }

    pub fn objectives(&self) -> &[String] {
        self.tactics.objectives()
    }

    // -----------------------------------------------------------------------
    // Tactic lookup
    // -----------------------------------------------------------------------

    /// Tactics for the chosen imperatives and objectives.
    ///
    /// Outer order follows `imperatives`, inner order follows `objectives`.
    /// Blank cells are skipped; identical tactic text under different
    /// imperatives or objectives is kept as separate matches. No matches is
    /// an empty list, not an error.
    #[instrument(skip_all, fields(stage = %stage, imperatives = imperatives.len(), objectives = objectives.len()))]
    pub fn tactics_for(
        &self,
        stage: &str,
        imperatives: &[ImperativeId],
        objectives: &[String],
    ) -> Result<Vec<TacticMatch>> {
        self.stage_index(stage)?;

        let objective_indices = objectives
            .iter()
            .map(|objective| {
                self.tactics
                    .objective_index(objective)
                    .map(|i| (i, objective.trim()))
                    .ok_or_else(|| {
                        PlannerError::invalid_selection(format!("unknown objective '{objective}'"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut matches = Vec::new();
        for &id in imperatives {
            let imperative = self.lifecycle.imperative(id).ok_or_else(|| {
                PlannerError::invalid_selection(format!("no strategic imperative at {id}"))
            })?;

            for &(index, objective) in &objective_indices {
                for row in self.tactics.rows_for(id) {
                    if let Some(Some(tactic)) = row.tactics.get(index) {
                        matches.push(TacticMatch::new(&imperative.name, objective, tactic));
                    }
                }
            }
        }

        debug!(matches = matches.len(), "tactics resolved");
        Ok(matches)
    }

    /// [`Self::tactics_for`] driven by a whole [`Selection`].
    pub fn tactics_for_selection(&self, selection: &Selection) -> Result<Vec<TacticMatch>> {
        self.tactics_for(
            &selection.stage,
            &selection.imperative_ids(),
            &selection.objectives,
        )
    }

    // -----------------------------------------------------------------------
    // Selection checks (scripted runs)
    // -----------------------------------------------------------------------

    /// Resolve imperative names (case-insensitive) against the stage's options.
    pub fn resolve_imperatives(
        &self,
        stage: &str,
        names: &[String],
    ) -> Result<Vec<ImperativeOption>> {
        let options = self.imperatives_for_lifecycle(stage)?;
        names
            .iter()
            .map(|name| {
                options
                    .iter()
                    .find(|o| o.name.eq_ignore_ascii_case(name.trim()))
                    .cloned()
                    .ok_or_else(|| {
                        PlannerError::invalid_selection(format!(
                            "'{name}' is not a strategic imperative for stage '{stage}'"
                        ))
                    })
            })
            .collect()
    }

    /// Check that every part of `selection` resolves against the tables.
    pub fn validate(&self, selection: &Selection) -> Result<()> {
        let offered = self.imperatives_for_lifecycle(&selection.stage)?;
        for chosen in &selection.imperatives {
            if !offered.contains(chosen) {
                return Err(PlannerError::invalid_selection(format!(
                    "'{}' does not apply to stage '{}'",
                    chosen.name, selection.stage
                )));
            }
        }

        match &selection.differentiator_category {
            Some(category) => {
                let allowed = self.differentiators_for(category)?;
                if let Some(unknown) = selection
                    .differentiators
                    .iter()
                    .find(|d| !allowed.contains(d))
                {
                    return Err(PlannerError::invalid_selection(format!(
                        "'{unknown}' is not a differentiator under '{category}'"
                    )));
                }
            }
            None if !selection.differentiators.is_empty() => {
                return Err(PlannerError::invalid_selection(
                    "differentiators chosen without a category",
                ));
            }
            None => {}
        }

        if let Some(unknown) = selection.tones.iter().find(|t| !self.tones().contains(t)) {
            return Err(PlannerError::invalid_selection(format!(
                "unknown brand tone '{unknown}'"
            )));
        }

        if let Some(unknown) = selection
            .objectives
            .iter()
            .find(|o| self.tactics.objective_index(o).is_none())
        {
            return Err(PlannerError::invalid_selection(format!(
                "unknown objective '{unknown}'"
            )));
        }

        Ok(())
    }

    fn stage_index(&self, stage: &str) -> Result<usize> {
        self.lifecycle.stage_index(stage).ok_or_else(|| {
            PlannerError::invalid_selection(format!("unknown lifecycle stage '{stage}'"))
        })
    }
}

// ---------------------------------------------------------------------------
// Process-wide memo
// ---------------------------------------------------------------------------

type CatalogCache = Mutex<HashMap<DatasetLayout, Arc<Catalog>>>;

fn cache() -> &'static CatalogCache {
    static CACHE: OnceLock<CatalogCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Load a catalog once per (canonical path, layout) for the life of the process.
pub fn load_cached(layout: &DatasetLayout) -> Result<Arc<Catalog>> {
    let mut key = layout.clone();
    key.path = canonical(&layout.path);

    let mut cached = cache()
        .lock()
        .map_err(|_| PlannerError::data_unavailable("catalog cache poisoned"))?;

    if let Some(catalog) = cached.get(&key) {
        debug!(path = %key.path.display(), "catalog cache hit");
        return Ok(Arc::clone(catalog));
    }

    let catalog = Arc::new(Catalog::load(&key)?);
    cached.insert(key, Arc::clone(&catalog));
    Ok(catalog)
}

fn canonical(path: &std::path::Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
