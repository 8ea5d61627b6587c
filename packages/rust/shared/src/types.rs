//! Core domain types for brand plans.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PlannerError;

/// Sentinel shown in place of any generated text that could not be produced.
pub const UNAVAILABLE: &str = "[generation unavailable]";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque identity of a strategic imperative: its source row in the lifecycle sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImperativeId(pub usize);

impl std::fmt::Display for ImperativeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}", self.0 + 1)
    }
}

/// A UUID v7 wrapper for generated plans (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// A strategic imperative offered for a lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImperativeOption {
    pub id: ImperativeId,
    pub name: String,
}

/// Everything the user picked during one questionnaire run.
///
/// Rebuilt from scratch on every run; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Lifecycle stage.
    pub stage: String,
    /// Chosen imperatives, in the order the user picked them.
    pub imperatives: Vec<ImperativeOption>,
    /// Differentiator category the differentiators were drawn from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiator_category: Option<String>,
    pub differentiators: Vec<String>,
    /// Brand tones; empty means "a default" tone.
    #[serde(default)]
    pub tones: Vec<String>,
    /// Objectives, in selection order.
    pub objectives: Vec<String>,
}

impl Selection {
    pub fn imperative_ids(&self) -> Vec<ImperativeId> {
        self.imperatives.iter().map(|i| i.id).collect()
    }

    pub fn imperative_names(&self) -> Vec<String> {
        self.imperatives.iter().map(|i| i.name.clone()).collect()
    }
}

/// One (imperative, objective, tactic) triple, the unit of generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticMatch {
    pub imperative: String,
    pub objective: String,
    pub tactic: String,
}

impl TacticMatch {
    pub fn new(
        imperative: impl Into<String>,
        objective: impl Into<String>,
        tactic: impl Into<String>,
    ) -> Self {
        Self {
            imperative: imperative.into(),
            objective: objective.into(),
            tactic: tactic.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generated output
// ---------------------------------------------------------------------------

/// Result of one generation call: the parsed value, or the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Generated<T> {
    Ready { value: T },
    Unavailable { reason: String },
}

impl<T> Generated<T> {
    pub fn ready(value: T) -> Self {
        Self::Ready { value }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Self::Ready { value } => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generated<U> {
        match self {
            Self::Ready { value } => Generated::Ready { value: f(value) },
            Self::Unavailable { reason } => Generated::Unavailable { reason },
        }
    }
}

/// A failed call keeps the error text as its reason.
impl<T> From<PlannerError> for Generated<T> {
    fn from(err: PlannerError) -> Self {
        Self::unavailable(err.to_string())
    }
}

/// Budget and timing estimate for one tactic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    /// Full response text, trimmed.
    pub summary: String,
    /// Time component, or `"TBD"` when the response could not be split.
    pub timeline: String,
    /// Cost component, or `"Estimation failed"` when the response could not be split.
    pub cost: String,
}

/// Headline and subhead of the campaign concept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConcept {
    pub headline: String,
    pub subhead: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_roundtrip() {
        let id = PlanId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: PlanId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn imperative_id_is_one_based_in_display() {
        assert_eq!(ImperativeId(2).to_string(), "row 3");
    }

    #[test]
    fn generated_serializes_with_status_tag() {
        let ok: Generated<String> = Generated::ready("text".into());
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["value"], "text");

        let failed: Generated<String> = Generated::unavailable("rate limited");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "rate limited");
    }

    #[test]
    fn generation_error_becomes_unavailable_reason() {
        let failed: Generated<String> =
            PlannerError::GenerationUnavailable("estimate: rate limited".into()).into();
        assert_eq!(
            failed,
            Generated::unavailable("generation unavailable: estimate: rate limited")
        );
    }

    #[test]
    fn generated_map_keeps_sentinel() {
        let failed: Generated<&str> = Generated::unavailable("down");
        let mapped = failed.map(str::len);
        assert!(!mapped.is_ready());
        assert_eq!(Generated::ready("abc").map(str::len).as_ready(), Some(&3));
    }

    #[test]
    fn selection_helpers_preserve_order() {
        let selection = Selection {
            stage: "Launch".into(),
            imperatives: vec![
                ImperativeOption {
                    id: ImperativeId(4),
                    name: "Access".into(),
                },
                ImperativeOption {
                    id: ImperativeId(2),
                    name: "Awareness".into(),
                },
            ],
            ..Selection::default()
        };
        assert_eq!(selection.imperative_ids(), vec![ImperativeId(4), ImperativeId(2)]);
        assert_eq!(selection.imperative_names(), vec!["Access", "Awareness"]);
    }
}
