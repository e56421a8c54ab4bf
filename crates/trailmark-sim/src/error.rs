//! Trailmark replay — error types.

use thiserror::Error;
use trailmark_core::error::DomainError;

/// Startup and replay errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stage or script file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The stage file is not valid YAML for stage definitions.
    #[error("stage file error: {0}")]
    Stages(#[from] serde_yaml::Error),

    /// A script line is not a valid step.
    #[error("script line {line}: {source}")]
    Script {
        /// 1-based line number.
        line: usize,
        /// The JSON error.
        source: serde_json::Error,
    },

    /// The run could not be started.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
