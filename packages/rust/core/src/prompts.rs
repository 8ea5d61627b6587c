//! Prompt templates.

use brandplanner_shared::{Selection, TacticMatch};

const NO_DIFFERENTIATORS: &str = "no differentiators provided";
const DEFAULT_TONE: &str = "a default";
const NO_IMPERATIVES: &str = "no strategic imperatives provided";
const NO_OBJECTIVES: &str = "no objectives provided";

/// Selection fields rendered once for interpolation into every prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub differentiators: String,
    pub tone: String,
    pub objectives: String,
    pub imperatives: String,
}

impl PromptContext {
    pub fn from_selection(selection: &Selection) -> Self {
        Self {
            differentiators: join_or(&selection.differentiators, NO_DIFFERENTIATORS),
            tone: join_or(&selection.tones, DEFAULT_TONE),
            objectives: join_or(&selection.objectives, NO_OBJECTIVES),
            imperatives: join_or(&selection.imperative_names(), NO_IMPERATIVES),
        }
    }
}

fn join_or(items: &[String], fallback: &str) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

pub fn description(tactic: &TacticMatch, ctx: &PromptContext) -> String {
    format!(
        "Generate a 3-4 sentence description for the tactic: '{}'. Explain how it aligns with \
         the objective '{}', leverages the differentiators: {}, and reflects {} brand tone.",
        tactic.tactic, tactic.objective, ctx.differentiators, ctx.tone
    )
}

/// The trailing format instruction lets the reply split into timeline and cost.
pub fn estimate(tactic: &TacticMatch) -> String {
    format!(
        "Provide an industry-standard budget estimate and high-level timing for executing the \
         tactic: '{}'. Include a budget range (e.g., $50K - $100K) and expected duration in \
         months. Respond on one line exactly as: Timeline: <duration>, Cost: <budget range>",
        tactic.tactic
    )
}

fn strategy_lead_in(ctx: &PromptContext) -> String {
    format!(
        "Based on the differentiators ({}), brand tone ({}), objective ({}), and strategic \
         imperatives ({}),",
        ctx.differentiators, ctx.tone, ctx.objectives, ctx.imperatives
    )
}

pub fn messaging(ctx: &PromptContext) -> String {
    format!(
        "{} generate 5 key messaging ideas for a pharmaceutical brand campaign. List each idea \
         on a new line.",
        strategy_lead_in(ctx)
    )
}

pub fn campaign_concept(ctx: &PromptContext) -> String {
    format!(
        "{} generate a campaign concept for a pharma brand. Provide a headline on the first line \
         and a subheadline on the second line.",
        strategy_lead_in(ctx)
    )
}

/// `competitors` are names found by the competitor search, if it ran.
pub fn competitive_insights(drug: &str, competitors: &[String]) -> String {
    let mut prompt = format!(
        "Provide competitive insights for the drug '{}'. List at least three competitors, \
         including for each competitor a key website headline, subheadline, and a short \
         assumption about their brand positioning.",
        drug.trim()
    );
    if !competitors.is_empty() {
        prompt.push_str(&format!(
            " Known competitors include: {}.",
            competitors.join(", ")
        ));
    }
    prompt.push_str(" Return the results in a clear and concise format.");
    prompt
}
