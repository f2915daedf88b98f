//! CLI error type.

use thiserror::Error;

use untical_untis::error::UntisError;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration problems (missing credentials, unknown account id).
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors from the upstream client.
    #[error(transparent)]
    Untis(#[from] UntisError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// The cleaned document could not be serialized.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
