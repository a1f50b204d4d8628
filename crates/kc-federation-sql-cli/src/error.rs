//! CLI error types.

use kc_federation::FederationError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error reported by the federation provider.
    #[error(transparent)]
    Federation(#[from] FederationError),

    /// Lookup returned no user.
    #[error("user not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
