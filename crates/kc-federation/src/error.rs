//! Federation error types.
//!
//! ## NIST 800-53 Rev5: AU-2 (Event Logging)
//!
//! Error types carry enough context for audit logging of lookup failures
//! while never embedding credential material.

use thiserror::Error;

/// Errors that can occur during federation operations.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Configuration error, including rejected component validation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error to the external store.
    #[error("Connection error: {0}")]
    Connection(String),

    /// User lookup error.
    #[error("User lookup error: {0}")]
    UserLookup(String),

    /// Attribute mapping error.
    #[error("Attribute mapping error: {0}")]
    AttributeMapping(String),

    /// Operation not supported by this provider.
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

impl FederationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a user lookup error.
    #[must_use]
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::UserLookup(msg.into())
    }

    /// Creates a not supported error.
    #[must_use]
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported(operation.into())
    }

    /// Checks if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Checks if this is a connection error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert!(FederationError::config("missing jdbcUrl").is_config_error());
        assert!(FederationError::connection("refused").is_connection_error());
        assert!(!FederationError::lookup("bad column").is_connection_error());
    }

    #[test]
    fn error_messages() {
        let err = FederationError::not_supported("user creation");
        assert_eq!(err.to_string(), "Operation not supported: user creation");
    }
}
