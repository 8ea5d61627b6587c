//! Application configuration for the brand planner.
//!
//! User config lives at `~/.brandplanner/brandplanner.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::retry::RetryPolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "brandplanner.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".brandplanner";

// ---------------------------------------------------------------------------
// Config structs (matching brandplanner.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workbook location and layout.
    #[serde(default)]
    pub dataset: DatasetLayout,

    /// Text-generation backend.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Per-call token budgets and temperatures.
    #[serde(default)]
    pub generation: GenerationBudgets,

    /// Retry policy for generation calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Competitor search settings.
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// Which layout the tactic sheet uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticLayout {
    /// Objectives in a header row; tactic rows aligned by offset to imperative rows.
    #[default]
    Grid,
    /// A "Strategic Challenge" column plus one column per objective.
    Normalized,
}

/// A sheet addressed by zero-based position or by tab name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl std::fmt::Display for SheetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "sheet #{i}"),
            Self::Name(name) => write!(f, "sheet '{name}'"),
        }
    }
}

/// `[dataset]` section: where the workbook lives and how its sheets are laid out.
///
/// Rows and columns are zero-based (`B2` is row 1, column 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Workbook path.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    /// Tactic sheet layout.
    #[serde(default)]
    pub tactic_layout: TacticLayout,

    #[serde(default = "default_lifecycle_sheet")]
    pub lifecycle_sheet: SheetRef,
    #[serde(default = "default_differentiator_sheet")]
    pub differentiator_sheet: SheetRef,
    #[serde(default = "default_tone_sheet")]
    pub tone_sheet: SheetRef,
    #[serde(default = "default_tactic_sheet")]
    pub tactic_sheet: SheetRef,

    /// Row holding the lifecycle stage names.
    #[serde(default = "default_lifecycle_header_row")]
    pub lifecycle_header_row: usize,

    /// First column of the lifecycle stage span.
    #[serde(default = "default_first_column")]
    pub stage_first_column: usize,

    /// Width of the lifecycle stage span.
    #[serde(default = "default_span_width")]
    pub stage_column_count: usize,

    /// Row holding objective names (grid layout only).
    #[serde(default)]
    pub objective_header_row: usize,

    /// First column of the objective span (grid layout only).
    #[serde(default = "default_first_column")]
    pub objective_first_column: usize,

    /// Width of the objective span (grid layout only).
    #[serde(default = "default_span_width")]
    pub objective_column_count: usize,

    /// Tactic row = imperative row + offset (grid layout only).
    #[serde(default = "default_tactic_row_offset")]
    pub tactic_row_offset: isize,

    /// Applicability marker, compared case-insensitively.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Imperative column label (normalized layout only).
    #[serde(default = "default_challenge_column")]
    pub challenge_column: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            tactic_layout: TacticLayout::default(),
            lifecycle_sheet: default_lifecycle_sheet(),
            differentiator_sheet: default_differentiator_sheet(),
            tone_sheet: default_tone_sheet(),
            tactic_sheet: default_tactic_sheet(),
            lifecycle_header_row: default_lifecycle_header_row(),
            stage_first_column: default_first_column(),
            stage_column_count: default_span_width(),
            objective_header_row: 0,
            objective_first_column: default_first_column(),
            objective_column_count: default_span_width(),
            tactic_row_offset: default_tactic_row_offset(),
            marker: default_marker(),
            challenge_column: default_challenge_column(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("pharma_brand_planner.xlsx")
}
fn default_lifecycle_sheet() -> SheetRef {
    SheetRef::Index(0)
}
fn default_differentiator_sheet() -> SheetRef {
    SheetRef::Index(1)
}
fn default_tone_sheet() -> SheetRef {
    SheetRef::Index(2)
}
fn default_tactic_sheet() -> SheetRef {
    SheetRef::Index(3)
}
fn default_lifecycle_header_row() -> usize {
    1
}
fn default_first_column() -> usize {
    1
}
fn default_span_width() -> usize {
    5
}
fn default_tactic_row_offset() -> isize {
    -1
}
fn default_marker() -> String {
    "X".into()
}
fn default_challenge_column() -> String {
    "Strategic Challenge".into()
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (`/chat/completions` is appended).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for every call.
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used on retry attempts; falls back to `model` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_model: Option<String>,

    /// System message sent ahead of every prompt.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Per-request timeout.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            fallback_model: None,
            system_prompt: default_system_prompt(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-3.5-turbo".into()
}
fn default_system_prompt() -> String {
    "You are a helpful marketing strategist.".into()
}
fn default_llm_timeout() -> u64 {
    60
}

/// Token budget and sampling temperature for one call type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallBudget {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl CallBudget {
    const fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: 0.7,
        }
    }
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationBudgets {
    #[serde(default = "default_description_budget")]
    pub description: CallBudget,
    #[serde(default = "default_estimate_budget")]
    pub estimate: CallBudget,
    #[serde(default = "default_messaging_budget")]
    pub messaging: CallBudget,
    #[serde(default = "default_concept_budget")]
    pub concept: CallBudget,
    #[serde(default = "default_insights_budget")]
    pub competitive_insights: CallBudget,
}

impl Default for GenerationBudgets {
    fn default() -> Self {
        Self {
            description: default_description_budget(),
            estimate: default_estimate_budget(),
            messaging: default_messaging_budget(),
            concept: default_concept_budget(),
            competitive_insights: default_insights_budget(),
        }
    }
}

fn default_description_budget() -> CallBudget {
    CallBudget::new(300)
}
fn default_estimate_budget() -> CallBudget {
    CallBudget::new(150)
}
fn default_messaging_budget() -> CallBudget {
    CallBudget::new(300)
}
fn default_concept_budget() -> CallBudget {
    CallBudget::new(300)
}
fn default_insights_budget() -> CallBudget {
    CallBudget::new(400)
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between attempts.
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }
}

fn default_max_attempts() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    2_000
}

/// `[scraper]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Search endpoint receiving the `q` parameter.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Site the query is restricted to.
    #[serde(default = "default_target_site")]
    pub target_site: String,

    /// Only links whose path contains this marker are kept.
    #[serde(default = "default_path_marker")]
    pub path_marker: String,

    /// Maximum number of competitors returned.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Total attempts (1 means no retry).
    #[serde(default = "default_scrape_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between attempts.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Request timeout.
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            target_site: default_target_site(),
            path_marker: default_path_marker(),
            max_results: default_max_results(),
            max_attempts: default_scrape_attempts(),
            retry_delay_ms: default_retry_delay(),
            timeout_secs: default_scrape_timeout(),
        }
    }
}

impl ScraperConfig {
    /// Retry policy for search requests.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

fn default_search_url() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_target_site() -> String {
    "drugs.com".into()
}
fn default_path_marker() -> String {
    "/compare/".into()
}
fn default_max_results() -> usize {
    3
}
fn default_scrape_attempts() -> u32 {
    1
}
fn default_scrape_timeout() -> u64 {
    15
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.brandplanner/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PlannerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.brandplanner/brandplanner.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PlannerError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PlannerError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PlannerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PlannerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PlannerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key from the env var named in `[llm]`.
pub fn resolve_api_key(config: &LlmConfig) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(PlannerError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("pharma_brand_planner.xlsx"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("Strategic Challenge"));
    }

    #[test]
    fn empty_file_yields_source_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.dataset.lifecycle_header_row, 1);
        assert_eq!(config.dataset.stage_first_column, 1);
        assert_eq!(config.dataset.stage_column_count, 5);
        assert_eq!(config.dataset.tactic_row_offset, -1);
        assert_eq!(config.dataset.tactic_layout, TacticLayout::Grid);
        assert_eq!(config.generation.estimate.max_tokens, 150);
        assert_eq!(config.generation.competitive_insights.max_tokens, 400);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.scraper.max_attempts, 1);
    }

    #[test]
    fn sheets_by_name_or_index() {
        let toml_str = r#"
[dataset]
path = "/data/plan.xlsx"
tactic_layout = "normalized"
lifecycle_sheet = "Lifecycle_SI"
tactic_sheet = 5

[llm]
model = "anthropic/claude-3-haiku"
fallback_model = "openai/gpt-4o-mini"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.dataset.tactic_layout, TacticLayout::Normalized);
        assert_eq!(
            config.dataset.lifecycle_sheet,
            SheetRef::Name("Lifecycle_SI".into())
        );
        assert_eq!(config.dataset.tactic_sheet, SheetRef::Index(5));
        assert_eq!(config.dataset.tone_sheet, SheetRef::Index(2));
        assert_eq!(config.llm.fallback_model.as_deref(), Some("openai/gpt-4o-mini"));
    }

    #[test]
    fn retry_policy_from_config() {
        let config = RetryConfig {
            max_attempts: 3,
            delay_ms: 250,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_millis(250));
    }

    #[test]
    fn api_key_resolution() {
        let config = LlmConfig {
            // Use a unique env var name to avoid interfering with other tests
            api_key_env: "BP_TEST_NONEXISTENT_KEY_12345".into(),
            ..LlmConfig::default()
        };
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
