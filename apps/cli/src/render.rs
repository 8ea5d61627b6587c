//! Markdown rendering of plans, option lists, and competitive insights.

use std::fmt::{self, Write};

use brandplanner_competitors::Competitor;
use brandplanner_core::BrandPlan;
use brandplanner_shared::{Generated, Selection, UNAVAILABLE};

const NO_TACTICS: &str =
    "No tactics were found based on your selections. Please review your inputs and the workbook data.";

/// Render a full plan as Markdown.
pub(crate) fn plan_markdown(plan: &BrandPlan) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "# Brand Plan")?;
    writeln!(out)?;
    write_selection(&mut out, &plan.selection)?;

    if plan.is_empty() {
        writeln!(out)?;
        writeln!(out, "{NO_TACTICS}")?;
        return Ok(out);
    }

    writeln!(out)?;
    writeln!(out, "## Tactical Recommendations")?;
    for rec in &plan.tactics {
        writeln!(out)?;
        writeln!(out, "### {}", rec.tactic.tactic)?;
        writeln!(out)?;
        writeln!(
            out,
            "*{} / {}*",
            rec.tactic.imperative, rec.tactic.objective
        )?;
        writeln!(out)?;
        writeln!(out, "**Description:** {}", text_or_sentinel(&rec.description, |d| d.clone()))?;
        writeln!(out)?;
        match &rec.estimate {
            Generated::Ready { value } => {
                writeln!(out, "**Estimate & Timing:** {}", value.summary)?;
                writeln!(out)?;
                writeln!(out, "- Timeline: {}", value.timeline)?;
                writeln!(out, "- Cost: {}", value.cost)?;
            }
            Generated::Unavailable { .. } => {
                writeln!(out, "**Estimate & Timing:** {UNAVAILABLE}")?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "## Key Messaging")?;
    writeln!(out)?;
    match &plan.messaging {
        Some(Generated::Ready { value }) if !value.is_empty() => {
            for idea in value {
                writeln!(out, "- {idea}")?;
            }
        }
        Some(Generated::Ready { .. }) => writeln!(out, "_No messaging ideas returned._")?,
        _ => writeln!(out, "{UNAVAILABLE}")?,
    }

    writeln!(out)?;
    writeln!(out, "## Campaign Concept")?;
    writeln!(out)?;
    match &plan.concept {
        Some(Generated::Ready { value }) => {
            writeln!(out, "**Headline:** {}", value.headline)?;
            writeln!(out, "**Subhead:** {}", value.subhead)?;
        }
        _ => writeln!(out, "{UNAVAILABLE}")?,
    }

    Ok(out)
}

fn write_selection(out: &mut String, selection: &Selection) -> fmt::Result {
    writeln!(out, "- **Lifecycle stage:** {}", selection.stage)?;
    writeln!(
        out,
        "- **Strategic imperatives:** {}",
        list_or(&selection.imperative_names(), "none")
    )?;
    let differentiators = list_or(&selection.differentiators, "none");
    match &selection.differentiator_category {
        Some(category) => writeln!(out, "- **Differentiators ({category}):** {differentiators}")?,
        None => writeln!(out, "- **Differentiators:** {differentiators}")?,
    }
    writeln!(out, "- **Brand tone:** {}", list_or(&selection.tones, "default"))?;
    writeln!(out, "- **Objectives:** {}", list_or(&selection.objectives, "none"))
}

/// Render competitors found and the generated insights.
pub(crate) fn insights_markdown(
    drug: &str,
    competitors: &[Competitor],
    insights: &Generated<String>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "# Competitive Insights: {}", drug.trim())?;
    if !competitors.is_empty() {
        writeln!(out)?;
        write_competitors(&mut out, competitors)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", text_or_sentinel(insights, |text| text.trim().to_string()))?;
    Ok(out)
}

pub(crate) fn competitors_markdown(drug: &str, competitors: &[Competitor]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if competitors.is_empty() {
        writeln!(out, "No competitors found for '{}'.", drug.trim())?;
        return Ok(out);
    }
    write_competitors(&mut out, competitors)?;
    Ok(out)
}

fn write_competitors(out: &mut String, competitors: &[Competitor]) -> fmt::Result {
    writeln!(out, "## Competitors")?;
    writeln!(out)?;
    for competitor in competitors {
        writeln!(out, "- [{}]({})", competitor.name, competitor.url)?;
    }
    Ok(())
}

/// A titled bullet list; empty lists print a placeholder.
pub(crate) fn option_list(title: &str, items: &[String]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{title}:")?;
    if items.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for item in items {
        writeln!(out, "  - {item}")?;
    }
    Ok(out)
}

fn text_or_sentinel<T>(value: &Generated<T>, render: impl Fn(&T) -> String) -> String {
    value.as_ready().map_or_else(|| UNAVAILABLE.to_string(), render)
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}
