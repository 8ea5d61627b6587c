//! The questionnaire: one step per choice list, each answerable by flag.

use color_eyre::eyre::{Result, eyre};
use dialoguer::{MultiSelect, Select, Sort, theme::ColorfulTheme};
use tracing::debug;

use brandplanner_dataset::Catalog;
use brandplanner_shared::{ImperativeOption, Selection};

/// Answers given on the command line. Any step left empty is asked
/// interactively, or defaulted when running without prompts.
#[derive(clap::Args, Debug, Default, Clone)]
pub(crate) struct SelectionFlags {
    /// Lifecycle stage.
    #[arg(long)]
    pub stage: Option<String>,

    /// Strategic imperative (repeatable).
    #[arg(long = "imperative")]
    pub imperatives: Vec<String>,

    /// Differentiator category.
    #[arg(long)]
    pub category: Option<String>,

    /// Differentiator within the category (repeatable).
    #[arg(long = "differentiator")]
    pub differentiators: Vec<String>,

    /// Brand tone (repeatable, optional).
    #[arg(long = "tone")]
    pub tones: Vec<String>,

    /// Objective (repeatable).
    #[arg(long = "objective")]
    pub objectives: Vec<String>,
}

/// Runs the questionnaire steps against a loaded catalog.
pub(crate) struct Questionnaire<'a> {
    catalog: &'a Catalog,
    theme: Option<ColorfulTheme>,
}

impl<'a> Questionnaire<'a> {
    pub fn interactive(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            theme: Some(ColorfulTheme::default()),
        }
    }

    pub fn scripted(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            theme: None,
        }
    }

    /// Build a validated selection from flags plus any prompts needed.
    pub fn collect(&self, flags: &SelectionFlags) -> Result<Selection> {
        let stage = self.stage(flags.stage.as_deref())?;
        let imperatives = self.imperatives(&stage, &flags.imperatives)?;
        let differentiator_category = self.category(flags.category.as_deref())?;
        let differentiators =
            self.differentiators(differentiator_category.as_deref(), &flags.differentiators)?;
        let tones = self.tones(&flags.tones)?;
        let objectives = self.objectives(&flags.objectives)?;

        let selection = Selection {
            stage,
            imperatives,
            differentiator_category,
            differentiators,
            tones,
            objectives,
        };
        self.catalog.validate(&selection)?;
        debug!(?selection, "selection complete");
        Ok(selection)
    }

    fn stage(&self, flag: Option<&str>) -> Result<String> {
        let options = self.catalog.lifecycle_options();
        if let Some(stage) = flag {
            return Ok(canonical(&options, stage));
        }
        let Some(theme) = &self.theme else {
            return Err(eyre!("--stage is required when not running interactively"));
        };
        if options.is_empty() {
            return Err(eyre!("the workbook lists no lifecycle stages"));
        }

        let index = Select::with_theme(theme)
            .with_prompt("Step 1: Select a lifecycle stage")
            .items(&options)
            .default(0)
            .interact()?;
        Ok(options[index].clone())
    }

    fn imperatives(&self, stage: &str, flags: &[String]) -> Result<Vec<ImperativeOption>> {
        if !flags.is_empty() {
            return Ok(self.catalog.resolve_imperatives(stage, flags)?);
        }
        let options = self.catalog.imperatives_for_lifecycle(stage)?;
        let Some(theme) = &self.theme else {
            return Err(eyre!("at least one --imperative is required when not running interactively"));
        };
        if options.is_empty() {
            eprintln!(
                "  No strategic imperatives found for stage '{stage}'. Please check the workbook data."
            );
            return Ok(Vec::new());
        }

        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        let picked = MultiSelect::with_theme(theme)
            .with_prompt("Step 2: Select strategic imperatives (space to toggle)")
            .items(&names)
            .interact()?;
        let picked = in_chosen_order(theme, "Order the imperatives", &names, picked)?;
        Ok(picked.into_iter().map(|i| options[i].clone()).collect())
    }

    fn category(&self, flag: Option<&str>) -> Result<Option<String>> {
        let options = self.catalog.differentiator_categories();
        if let Some(category) = flag {
            return Ok(Some(canonical(&options, category)));
        }
        let Some(theme) = &self.theme else {
            return Ok(None);
        };
        if options.is_empty() {
            return Ok(None);
        }

        let index = Select::with_theme(theme)
            .with_prompt("Step 3: Select a differentiator category")
            .items(&options)
            .default(0)
            .interact()?;
        Ok(Some(options[index].clone()))
    }

    fn differentiators(&self, category: Option<&str>, flags: &[String]) -> Result<Vec<String>> {
        let Some(category) = category else {
            return Ok(flags.to_vec());
        };
        let options = self.catalog.differentiators_for(category)?;
        if !flags.is_empty() {
            return Ok(flags.iter().map(|d| canonical(&options, d)).collect());
        }
        let Some(theme) = &self.theme else {
            return Ok(Vec::new());
        };

        let picked = MultiSelect::with_theme(theme)
            .with_prompt("Select differentiators")
            .items(&options)
            .interact()?;
        Ok(picked.into_iter().map(|i| options[i].clone()).collect())
    }

    fn tones(&self, flags: &[String]) -> Result<Vec<String>> {
        let options = self.catalog.tones();
        if !flags.is_empty() {
            return Ok(flags.iter().map(|t| canonical(options, t)).collect());
        }
        let Some(theme) = &self.theme else {
            return Ok(Vec::new());
        };

        let picked = MultiSelect::with_theme(theme)
            .with_prompt("Step 4 (optional): Select brand tone")
            .items(options)
            .interact()?;
        Ok(picked.into_iter().map(|i| options[i].clone()).collect())
    }

    fn objectives(&self, flags: &[String]) -> Result<Vec<String>> {
        let options = self.catalog.objectives();
        if !flags.is_empty() {
            return Ok(flags.iter().map(|o| canonical(options, o)).collect());
        }
        let Some(theme) = &self.theme else {
            return Err(eyre!("at least one --objective is required when not running interactively"));
        };

        let picked = MultiSelect::with_theme(theme)
            .with_prompt("Step 5: Select objectives")
            .items(options)
            .interact()?;
        let names: Vec<&str> = options.iter().map(String::as_str).collect();
        let picked = in_chosen_order(theme, "Order the objectives", &names, picked)?;
        Ok(picked.into_iter().map(|i| options[i].clone()).collect())
    }
}

/// `MultiSelect` reports picks in list order; with two or more, ask for the
/// order plans should follow.
fn in_chosen_order(
    theme: &ColorfulTheme,
    prompt: &str,
    labels: &[&str],
    picked: Vec<usize>,
) -> Result<Vec<usize>> {
    if picked.len() < 2 {
        return Ok(picked);
    }
    let names: Vec<&str> = picked.iter().map(|&i| labels[i]).collect();
    let order = Sort::with_theme(theme)
        .with_prompt(prompt)
        .items(&names)
        .interact()?;
    Ok(reorder(&picked, &order))
}

/// Picked option indices rearranged by `order`, which indexes into `picked`.
fn reorder(picked: &[usize], order: &[usize]) -> Vec<usize> {
    order.iter().filter_map(|&i| picked.get(i).copied()).collect()
}

/// The option spelled like `value` ignoring case, or `value` unchanged.
fn canonical(options: &[String], value: &str) -> String {
    let value = value.trim();
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(value))
        .cloned()
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandplanner_dataset::{SheetGrid, Workbook};
    use brandplanner_shared::{DatasetLayout, PlannerError};

    fn catalog() -> Catalog {
        let workbook = Workbook::from_sheets(vec![
            SheetGrid::from_rows(
                "Lifecycle_SI",
                &[
                    &[""],
                    &["", "Pre-launch", "Launch"],
                    &["Awareness", "", "X"],
                    &["Access", "x", ""],
                ],
            ),
            SheetGrid::from_rows("Differentiators", &[&["Efficacy"], &["Faster onset"]]),
            SheetGrid::from_rows("Brand Tone", &[&["Empathetic"], &["Bold"]]),
            SheetGrid::from_rows(
                "Objectives_Tactics",
                &[
                    &["", "Engagement", "Trial"],
                    &["Awareness", "Host a webinar", ""],
                    &["Access", "Payer deck", "Co-pay card"],
                ],
            ),
        ]);
        Catalog::from_workbook(&workbook, &DatasetLayout::default()).unwrap()
    }

    #[test]
    fn flags_are_matched_case_insensitively() {
        let catalog = catalog();
        let flags = SelectionFlags {
            stage: Some("launch".into()),
            imperatives: vec!["awareness".into()],
            category: Some("efficacy".into()),
            differentiators: vec!["faster onset".into()],
            tones: vec!["bold".into()],
            objectives: vec!["engagement".into()],
        };

        let selection = Questionnaire::scripted(&catalog).collect(&flags).unwrap();
        assert_eq!(selection.stage, "Launch");
        assert_eq!(selection.imperative_names(), vec!["Awareness"]);
        assert_eq!(selection.differentiators, vec!["Faster onset"]);
        assert_eq!(selection.tones, vec!["Bold"]);
        assert_eq!(selection.objectives, vec!["Engagement"]);
    }

    #[test]
    fn flag_order_is_kept_for_objectives() {
        let catalog = catalog();
        let flags = SelectionFlags {
            stage: Some("Launch".into()),
            imperatives: vec!["Awareness".into()],
            objectives: vec!["Trial".into(), "Engagement".into()],
            ..SelectionFlags::default()
        };

        let selection = Questionnaire::scripted(&catalog).collect(&flags).unwrap();
        assert_eq!(selection.objectives, vec!["Trial", "Engagement"]);
    }

    #[test]
    fn sorted_picks_follow_the_chosen_order() {
        // Picked options 1, 3, 4 in list order; the user moved the last one first.
        assert_eq!(reorder(&[1, 3, 4], &[2, 0, 1]), vec![4, 1, 3]);
        assert_eq!(reorder(&[2], &[0]), vec![2]);
    }

    #[test]
    fn optional_steps_default_to_empty() {
        let catalog = catalog();
        let flags = SelectionFlags {
            stage: Some("Launch".into()),
            imperatives: vec!["Awareness".into()],
            objectives: vec!["Trial".into()],
            ..SelectionFlags::default()
        };

        let selection = Questionnaire::scripted(&catalog).collect(&flags).unwrap();
        assert!(selection.differentiator_category.is_none());
        assert!(selection.differentiators.is_empty());
        assert!(selection.tones.is_empty());
    }

    #[test]
    fn imperative_outside_stage_is_invalid_selection() {
        let catalog = catalog();
        let flags = SelectionFlags {
            stage: Some("Launch".into()),
            imperatives: vec!["Access".into()],
            objectives: vec!["Trial".into()],
            ..SelectionFlags::default()
        };

        let err = Questionnaire::scripted(&catalog).collect(&flags).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlannerError>(),
            Some(PlannerError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn scripted_run_requires_stage() {
        let catalog = catalog();
        let err = Questionnaire::scripted(&catalog)
            .collect(&SelectionFlags::default())
            .unwrap_err();
        assert!(err.to_string().contains("--stage"));
    }
}
