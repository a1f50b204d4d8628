//! SQL federation error types.
//!
//! ## Security Note
//!
//! Error messages must not carry the database password or any user
//! secret. Driver errors are kept as sources so the root cause can be
//! reported without formatting the connection settings.

use std::error::Error as StdError;
use std::time::Duration;

use kc_federation::FederationError;
use thiserror::Error;

/// Boxed driver error kept as the cause of a [`SqlStorageError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by the SQL federation core.
#[derive(Debug, Error)]
pub enum SqlStorageError {
    /// A required configuration key is absent or blank.
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// A configuration value could not be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The password encoding name is not a known strategy.
    #[error("Invalid password encode type: {0}")]
    InvalidEncoding(String),

    /// Opening a database connection failed.
    #[error("Error acquiring database connection")]
    Connection {
        /// Driver error.
        #[source]
        source: BoxError,
    },

    /// Opening a database connection took longer than the configured timeout.
    #[error("Timed out after {0:?} acquiring database connection")]
    ConnectTimeout(Duration),

    /// A statement failed to execute.
    #[error("Error executing query: {context}")]
    Query {
        /// What was being looked up.
        context: String,
        /// Driver error.
        #[source]
        source: BoxError,
    },

    /// A result row could not be mapped to an entity.
    #[error("Error mapping result row: {0}")]
    Mapping(String),

    /// Closing a database connection failed.
    #[error("Error closing connection")]
    Release {
        /// Driver error.
        #[source]
        source: BoxError,
    },
}

impl SqlStorageError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(source: impl Into<BoxError>) -> Self {
        Self::Connection {
            source: source.into(),
        }
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Query {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Creates a mapping error.
    #[must_use]
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Creates a release error.
    #[must_use]
    pub fn release(source: impl Into<BoxError>) -> Self {
        Self::Release {
            source: source.into(),
        }
    }

    /// Checks if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingConfig(_) | Self::InvalidConfig(_) | Self::InvalidEncoding(_)
        )
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectTimeout(_) | Self::Release { .. }
        )
    }

    /// Returns the message of the deepest error in the source chain.
    #[must_use]
    pub fn root_cause(&self) -> String {
        root_cause(self)
    }
}

/// Walks `Error::source()` to the end of the chain and returns its message.
#[must_use]
pub fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

/// Result type for SQL federation operations.
pub type SqlStorageResult<T> = Result<T, SqlStorageError>;

impl From<SqlStorageError> for FederationError {
    fn from(err: SqlStorageError) -> Self {
        match err {
            SqlStorageError::MissingConfig(_)
            | SqlStorageError::InvalidConfig(_)
            | SqlStorageError::InvalidEncoding(_) => Self::config(err.to_string()),
            SqlStorageError::Connection { .. }
            | SqlStorageError::ConnectTimeout(_)
            | SqlStorageError::Release { .. } => {
                Self::connection(format!("{err}: {}", err.root_cause()))
            }
            SqlStorageError::Query { .. } => {
                Self::lookup(format!("{err}: {}", err.root_cause()))
            }
            SqlStorageError::Mapping(msg) => Self::AttributeMapping(msg),
        }
    }
}
