//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// None of these are fatal: a rejected observation leaves run state
/// untouched, and a rejected stage definition is skipped while the rest of
/// the definitions load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A discovery named a landmark that is not tracked in this run.
    #[error("unknown structure: {0}")]
    UnknownStructure(String),

    /// An already-assigned landmark may not be overwritten under the
    /// current policy.
    #[error("reassignment disabled for {0}")]
    ReassignmentDisabled(String),

    /// A stage definition was malformed and has been skipped.
    #[error("invalid stage {stage}: {reason}")]
    Config {
        /// Key of the offending stage (may be empty if the key itself was missing).
        stage: String,
        /// Why the stage was rejected.
        reason: String,
    },

    /// Any other malformed input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Builds a [`DomainError::Config`] for `stage`.
    pub fn config(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
