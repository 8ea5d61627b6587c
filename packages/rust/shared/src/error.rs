//! Error types for the brand planner.
//!
//! Library crates use [`PlannerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all brand planner operations.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Dataset file or sheet missing or malformed. Fatal: nothing can be asked
    /// of the user without the tables.
    #[error("dataset unavailable: {message}")]
    DataUnavailable { message: String },

    /// A user selection does not resolve against the loaded tables.
    #[error("invalid selection: {message}")]
    InvalidSelection { message: String },

    /// The text-generation backend failed after retries.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The competitor search could not be fetched or parsed.
    #[error("competitor search failed: {0}")]
    ScrapeFailed(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside of the retry-aware collaborators.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Create a dataset error from any displayable message.
    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable {
            message: msg.into(),
        }
    }

    /// Create a selection error from any displayable message.
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must stop all further processing.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::Config { .. } | Self::Io { .. }
        )
    }
}
