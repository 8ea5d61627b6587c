//! Extraction of structured fields from free-text completions.

use brandplanner_shared::{CampaignConcept, Estimate};

/// Timeline shown when an estimate cannot be split.
pub const TIMELINE_FALLBACK: &str = "TBD";

/// Cost shown when an estimate cannot be split.
pub const COST_FALLBACK: &str = "Estimation failed";

pub fn description(response: &str) -> String {
    response.trim().to_string()
}

/// Split `"Timeline: <t>, Cost: <c>"` into its parts.
///
/// Anything other than exactly one `", "` separator falls back to
/// [`TIMELINE_FALLBACK`] and [`COST_FALLBACK`]; the summary always keeps the
/// full trimmed text.
pub fn estimate(response: &str) -> Estimate {
    let summary = response.trim().to_string();
    let parts: Vec<&str> = summary.split(", ").collect();

    let (timeline, cost) = match parts.as_slice() {
        [time, cost] => (
            strip_label(time, "Timeline:"),
            strip_label(cost, "Cost:"),
        ),
        _ => (TIMELINE_FALLBACK.to_string(), COST_FALLBACK.to_string()),
    };

    Estimate {
        summary,
        timeline,
        cost,
    }
}

fn strip_label(part: &str, label: &str) -> String {
    let part = part.trim();
    part.strip_prefix(label).unwrap_or(part).trim().to_string()
}

/// One idea per non-blank line, in order.
pub fn messaging(response: &str) -> Vec<String> {
    non_blank_lines(response).map(String::from).collect()
}

/// First non-blank line is the headline, second the subhead. With fewer than
/// two lines the whole response is the headline.
pub fn campaign_concept(response: &str) -> CampaignConcept {
    let lines: Vec<&str> = non_blank_lines(response).collect();
    match lines.as_slice() {
        [headline, subhead, ..] => CampaignConcept {
            headline: (*headline).to_string(),
            subhead: (*subhead).to_string(),
        },
        _ => CampaignConcept {
            headline: response.trim().to_string(),
            subhead: String::new(),
        },
    }
}

pub fn competitive_insights(response: &str) -> String {
    response.to_string()
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}
