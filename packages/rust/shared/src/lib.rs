//! Shared types, error model, and configuration for the brand planner.
//!
//! This crate is the foundation depended on by all other brandplanner crates.
//! It provides:
//! - [`PlannerError`] — the unified error type
//! - Domain types ([`Selection`], [`TacticMatch`], [`ImperativeId`], [`Generated`])
//! - Configuration ([`AppConfig`], [`DatasetLayout`], config loading)
//! - [`call_with_retry`] — the bounded-retry helper used by every network collaborator

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CallBudget, DatasetLayout, GenerationBudgets, LlmConfig, RetryConfig,
    ScraperConfig, SheetRef, TacticLayout, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{PlannerError, Result};
pub use retry::{RetryPolicy, Retryable, call_with_retry};
pub use types::{
    CampaignConcept, Estimate, Generated, ImperativeId, ImperativeOption, PlanId, Selection,
    TacticMatch, UNAVAILABLE,
};
