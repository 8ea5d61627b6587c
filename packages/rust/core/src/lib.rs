//! Brand plan generation for the brand planner.
//!
//! This crate provides:
//! - [`llm`] — the text-generation seam and an OpenRouter-compatible client
//! - [`prompts`] — prompt templates built from a selection
//! - [`parse`] — structured fields from free-text completions
//! - [`orchestrator`] — per-tactic and aggregate generation into a [`BrandPlan`]

pub mod llm;
pub mod orchestrator;
pub mod parse;
pub mod prompts;

pub use llm::{GenerationFailure, GenerationRequest, OpenRouterClient, TextGenerator};
pub use orchestrator::{
    BrandPlan, PlanGenerator, PlanProgress, SilentPlanProgress, TacticRecommendation,
};
pub use prompts::PromptContext;
