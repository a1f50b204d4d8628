//! # kc-federation-sql
//!
//! SQL user federation provider for Keycloak Rust.
//!
//! Users, passwords and roles are read from an existing relational schema
//! through administrator-supplied base queries and column names. The
//! provider is read-only against the store.
//!
//! ## Flow
//!
//! ```text
//! ComponentModel ─► SqlStorageConfig ─► SqlUserStorageProvider
//!                                        ├─ UserRepository ─┐
//!                                        ├─ RoleRepository ─┴─► StatementExecutor ─► ConnectionProvider
//!                                        └─ CredentialVerifier
//! ```
//!
//! ## Security
//!
//! - Searched values are always bound parameters
//! - Credential checks fail closed
//! - Secrets are never logged

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod password;
pub mod provider;
pub mod query;
pub mod role;
pub mod user;

#[cfg(test)]
mod testing;

pub use config::{PasswordEncoding, SqlStorageConfig};
pub use connection::{
    ConnectionProvider, DbConnection, ResultRow, SqlxConnectionProvider, StatementExecutor,
};
pub use error::{SqlStorageError, SqlStorageResult};
pub use model::{Role, User, UserWithRoles};
pub use password::CredentialVerifier;
pub use provider::{SqlUserStorageProvider, SqlUserStorageProviderFactory, PROVIDER_ID};
pub use query::{FilteredQuery, Placeholder};
