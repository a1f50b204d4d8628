//! User storage provider traits.
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - IA-2: Identification and Authentication (Organizational Users)
//! - IA-5: Authenticator Management
//!
//! These traits let the host look users up in, and validate credentials
//! against, stores it does not own.

use crate::config::{ComponentModel, ConfigProperty};
use crate::error::FederationResult;
use crate::model::{CredentialInput, FederatedUser};

// ============================================================================
// User Storage Provider
// ============================================================================

/// Base trait for federation providers.
///
/// A provider instance lives for one host session; `close` is called when
/// the session ends.
pub trait UserStorageProvider: Send + Sync {
    /// Returns the provider type identifier.
    fn provider_type(&self) -> &'static str;

    /// Releases any resources held by the provider.
    fn close(&self) {}
}

/// Looks users up in the external store.
///
/// Lookups return `Ok(None)` when the store has no such user and `Err` only
/// when the store could not be queried.
#[allow(async_fn_in_trait)]
pub trait UserLookupProvider: UserStorageProvider {
    /// Gets a user by host id (see [`crate::StorageId`]).
    async fn get_user_by_id(&self, id: &str) -> FederationResult<Option<FederatedUser>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str)
        -> FederationResult<Option<FederatedUser>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> FederationResult<Option<FederatedUser>>;
}

// ============================================================================
// Credential Validator
// ============================================================================

/// Validates credentials against the external store.
///
/// ## NIST 800-53 Rev5: IA-5
///
/// Implementations must not log or store plaintext secrets, and must fail
/// closed: any fault while validating is reported as an invalid credential.
#[allow(async_fn_in_trait)]
pub trait CredentialInputValidator: Send + Sync {
    /// Checks if the provider can validate credentials of this type.
    fn supports_credential_type(&self, credential_type: &str) -> bool;

    /// Checks if the user has a credential of this type configured.
    fn is_configured_for(&self, _user: &FederatedUser, credential_type: &str) -> bool {
        self.supports_credential_type(credential_type)
    }

    /// Validates a credential for the user with the given host id.
    async fn is_valid(&self, user_id: &str, input: &CredentialInput) -> bool;
}

// ============================================================================
// Provider Factory
// ============================================================================

/// Creates provider instances from saved component configuration.
///
/// ## Lifecycle
///
/// 1. `validate_configuration()` - called whenever an admin saves the component
/// 2. `create()` - called for each host session that needs the provider
#[allow(async_fn_in_trait)]
pub trait UserStorageProviderFactory: Send + Sync {
    /// Provider type created by this factory.
    type Provider: UserStorageProvider;

    /// Returns the unique identifier for this factory.
    fn id(&self) -> &'static str;

    /// Returns help text shown next to the provider in the admin console.
    fn help_text(&self) -> &'static str {
        ""
    }

    /// Describes the configuration keys the provider understands.
    fn config_properties(&self) -> &[ConfigProperty];

    /// Validates a component before it is saved.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::Configuration` with a message suitable for
    /// the admin console when the component cannot be used.
    async fn validate_configuration(&self, component: &ComponentModel) -> FederationResult<()>;

    /// Creates a provider for the component.
    ///
    /// ## Errors
    ///
    /// Returns an error if the component configuration is unusable.
    fn create(&self, component: &ComponentModel) -> FederationResult<Self::Provider>;
}
