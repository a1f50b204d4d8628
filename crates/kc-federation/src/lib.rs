//! # kc-federation
//!
//! User federation contract for Keycloak Rust.
//!
//! This crate defines the host side of user federation: the component
//! model a provider is configured from, the user/role/credential shapes the
//! host consumes, and the provider and factory traits a federation backend
//! implements.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{ComponentModel, ConfigProperty, ConfigPropertyType};
pub use error::{FederationError, FederationResult};
pub use model::{CredentialInput, FederatedRole, FederatedUser, StorageId};
pub use provider::{
    CredentialInputValidator, UserLookupProvider, UserStorageProvider, UserStorageProviderFactory,
};
