//! Shapes the host consumes from federation providers.
//!
//! Federated users are never persisted by the host; providers build them
//! on every lookup and identify them with a [`StorageId`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking an id as owned by a federation provider.
const FEDERATED_PREFIX: &str = "f:";

/// Host-facing identifier of a federated user.
///
/// Rendered as `f:<provider-id>:<external-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageId {
    provider_id: Option<String>,
    external_id: String,
}

impl StorageId {
    /// Creates a storage id for a user owned by the given provider.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            external_id: external_id.into(),
        }
    }

    /// Parses a host id.
    ///
    /// Accepts `f:<provider>:<external>` and a bare external id. The
    /// provider part ends at the first `:`, so external ids may themselves
    /// contain colons. Anything without the `f:` prefix is a bare id.
    #[must_use]
    pub fn parse(id: &str) -> Self {
        match id
            .strip_prefix(FEDERATED_PREFIX)
            .and_then(|rest| rest.split_once(':'))
        {
            Some((provider, external)) => Self::new(provider, external),
            None => Self::bare(id),
        }
    }

    /// Parses a host id on behalf of the given provider.
    ///
    /// Like [`StorageId::parse`], but also accepts `<provider>:<external>`
    /// when the prefix is exactly `provider_id`. Other colon-separated ids
    /// are taken as bare external ids.
    #[must_use]
    pub fn parse_for(id: &str, provider_id: &str) -> Self {
        if id.starts_with(FEDERATED_PREFIX) {
            return Self::parse(id);
        }
        match id.split_once(':') {
            Some((provider, external)) if provider == provider_id => Self::new(provider, external),
            _ => Self::bare(id),
        }
    }

    fn bare(external_id: &str) -> Self {
        Self {
            provider_id: None,
            external_id: external_id.to_string(),
        }
    }

    /// Returns the provider part, if the id carried one.
    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    /// Returns the id of the user inside the external store.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider_id {
            Some(provider) => write!(f, "{FEDERATED_PREFIX}{provider}:{}", self.external_id),
            None => f.write_str(&self.external_id),
        }
    }
}

/// A role granted to a federated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedRole {
    /// Role id in the external store.
    pub id: String,
    /// Role name.
    pub name: String,
    /// Role description.
    pub description: Option<String>,
    /// Id of the provider component the role came from.
    pub container_id: String,
}

/// A user served by a federation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedUser {
    /// Host id (`f:<provider>:<external>`).
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: Option<String>,
    /// Id of the provider component that owns the user.
    pub federation_link: String,
    /// Roles granted by the external store.
    pub roles: Vec<FederatedRole>,
}

impl FederatedUser {
    /// Returns the parsed storage id.
    #[must_use]
    pub fn storage_id(&self) -> StorageId {
        StorageId::parse(&self.id)
    }

    /// Checks whether the user has a role with the given name.
    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}

/// A credential presented for validation.
#[derive(Clone)]
pub struct CredentialInput {
    /// Credential type (e.g. [`CredentialInput::PASSWORD`]).
    pub credential_type: String,
    challenge_response: String,
}

impl CredentialInput {
    /// Credential type of plain passwords.
    pub const PASSWORD: &'static str = "password";

    /// Creates a password credential.
    #[must_use]
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            credential_type: Self::PASSWORD.to_string(),
            challenge_response: value.into(),
        }
    }

    /// Creates a credential of an arbitrary type.
    #[must_use]
    pub fn new(credential_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            credential_type: credential_type.into(),
            challenge_response: value.into(),
        }
    }

    /// Returns the secret value.
    #[must_use]
    pub fn challenge_response(&self) -> &str {
        &self.challenge_response
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("credential_type", &self.credential_type)
            .field("challenge_response", &"***")
            .finish()
    }
}
