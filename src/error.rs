//! Error types for the jointq crate

use thiserror::Error;

/// Main error type for the jointq crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "Q-table shape mismatch: expected ({expected_states}, {expected_actions}), found ({found_states}, {found_actions})"
    )]
    ShapeMismatch {
        expected_states: usize,
        expected_actions: usize,
        found_states: usize,
        found_actions: usize,
    },

    #[error("actuator unavailable for joint '{joint}': {reason}")]
    Unavailable { joint: String, reason: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("action {action} is out of range (must be < {n_actions})")]
    InvalidAction { action: usize, n_actions: usize },

    #[error("state {state} is out of range (must be < {n_states})")]
    InvalidState { state: usize, n_states: usize },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfiguration`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Unavailable`].
    pub fn unavailable(joint: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unavailable {
            joint: joint.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
