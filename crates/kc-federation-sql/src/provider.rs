//! SQL user storage provider.
//!
//! ## Security Requirements
//!
//! - Credential checks fail closed: any error reads as an invalid credential
//! - Supplied secrets, stored passwords and the database password are
//!   never logged
//! - Searched values are bound, never spliced into SQL

use kc_federation::config::{ComponentModel, ConfigProperty};
use kc_federation::error::{FederationError, FederationResult};
use kc_federation::model::{CredentialInput, FederatedUser, StorageId};
use kc_federation::provider::{
    CredentialInputValidator, UserLookupProvider, UserStorageProvider, UserStorageProviderFactory,
};

use crate::adapter::to_federated_user;
use crate::config::{keys, PasswordEncoding, SqlStorageConfig};
use crate::connection::{
    ConnectionProvider, DbConnection, SqlxConnectionProvider, StatementExecutor,
};
use crate::error::SqlStorageResult;
use crate::model::{User, UserWithRoles};
use crate::password::CredentialVerifier;
use crate::role::RoleRepository;
use crate::user::UserRepository;

/// Factory id of the provider.
pub const PROVIDER_ID: &str = "jdbc-user-storage";

// ============================================================================
// Provider
// ============================================================================

/// Read-only user federation over an SQL database.
///
/// Every lookup opens and closes its own connection; the only state shared
/// between calls is the verifier cache.
pub struct SqlUserStorageProvider<P = SqlxConnectionProvider> {
    component_id: String,
    config: SqlStorageConfig,
    users: UserRepository<P>,
    roles: RoleRepository<P>,
    verifier: CredentialVerifier,
}

impl SqlUserStorageProvider {
    /// Creates a provider for a component, connecting with `sqlx`.
    ///
    /// ## Errors
    ///
    /// Returns a configuration error if a required key is missing or a
    /// value is invalid. No connection is opened.
    pub fn from_component(component: &ComponentModel) -> SqlStorageResult<Self> {
        let config = SqlStorageConfig::from_component(component)?;
        let connections = SqlxConnectionProvider::new(&config.connection)?;
        Ok(Self::with_connections(component.id.clone(), config, connections))
    }
}

impl<P: ConnectionProvider> SqlUserStorageProvider<P> {
    /// Creates a provider over any connection provider.
    #[must_use]
    pub fn with_connections(
        component_id: impl Into<String>,
        config: SqlStorageConfig,
        connections: P,
    ) -> Self {
        let executor = StatementExecutor::new(connections);
        Self {
            component_id: component_id.into(),
            users: UserRepository::new(executor.clone(), &config.user),
            roles: RoleRepository::new(executor, &config.role),
            verifier: CredentialVerifier::new(),
            config,
        }
    }

    /// Returns the id of the component this provider serves.
    #[must_use]
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Returns the provider configuration.
    #[must_use]
    pub const fn config(&self) -> &SqlStorageConfig {
        &self.config
    }

    /// Finds a user and its roles by host storage id or bare external id.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors.
    pub async fn find_user_by_id(&self, id: &str) -> SqlStorageResult<Option<UserWithRoles>> {
        let id = StorageId::parse_for(id, &self.component_id);
        let user = self.users.find_by_id(id.external_id()).await?;
        self.with_roles(user).await
    }

    /// Finds a user and its roles by username.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors.
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> SqlStorageResult<Option<UserWithRoles>> {
        let user = self.users.find_by_username(username).await?;
        self.with_roles(user).await
    }

    /// Finds a user and its roles by email.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors.
    pub async fn find_user_by_email(&self, email: &str) -> SqlStorageResult<Option<UserWithRoles>> {
        let user = self.users.find_by_email(email).await?;
        self.with_roles(user).await
    }

    async fn with_roles(&self, user: Option<User>) -> SqlStorageResult<Option<UserWithRoles>> {
        match user {
            Some(user) => {
                let roles = self.roles.get_roles_by_user_id(&user.id).await?;
                Ok(Some(UserWithRoles { user, roles }))
            }
            None => Ok(None),
        }
    }

    /// Checks a password for the user with the given id.
    ///
    /// Never fails: unknown users, missing passwords and any error while
    /// checking all read as `false`.
    pub async fn is_credential_valid(&self, user_id: &str, secret: &str) -> bool {
        match self.check_password(user_id, secret).await {
            Ok(valid) => valid,
            Err(err) => {
                tracing::error!(error = %err, "Credential validation failed");
                false
            }
        }
    }

    async fn check_password(&self, user_id: &str, secret: &str) -> SqlStorageResult<bool> {
        let id = StorageId::parse_for(user_id, &self.component_id);
        let Some(stored) = self.users.find_password_by_id(id.external_id()).await? else {
            tracing::debug!("No stored password for user");
            return Ok(false);
        };

        let verifier = self.verifier.resolve(self.config.password_encoding);
        let secret = secret.to_string();

        // bcrypt is CPU-bound
        match tokio::task::spawn_blocking(move || verifier.matches(&secret, &stored)).await {
            Ok(valid) => Ok(valid),
            Err(err) => {
                tracing::error!(error = %err, "Password verification task failed");
                Ok(false)
            }
        }
    }

    /// Checks if the provider validates credentials of this type.
    #[must_use]
    pub fn supports_credential_type(&self, credential_type: &str) -> bool {
        credential_type == CredentialInput::PASSWORD
    }
}

impl<P: ConnectionProvider> UserStorageProvider for SqlUserStorageProvider<P> {
    fn provider_type(&self) -> &'static str {
        PROVIDER_ID
    }

    fn close(&self) {}
}

impl<P: ConnectionProvider> UserLookupProvider for SqlUserStorageProvider<P> {
    async fn get_user_by_id(&self, id: &str) -> FederationResult<Option<FederatedUser>> {
        let found = self.find_user_by_id(id).await?;
        Ok(found.map(|u| to_federated_user(u, &self.component_id)))
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> FederationResult<Option<FederatedUser>> {
        let found = self.find_user_by_username(username).await?;
        Ok(found.map(|u| to_federated_user(u, &self.component_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> FederationResult<Option<FederatedUser>> {
        let found = self.find_user_by_email(email).await?;
        Ok(found.map(|u| to_federated_user(u, &self.component_id)))
    }
}

impl<P: ConnectionProvider> CredentialInputValidator for SqlUserStorageProvider<P> {
    fn supports_credential_type(&self, credential_type: &str) -> bool {
        Self::supports_credential_type(self, credential_type)
    }

    // The store cannot tell which users have a password.
    fn is_configured_for(&self, _user: &FederatedUser, _credential_type: &str) -> bool {
        true
    }

    async fn is_valid(&self, user_id: &str, input: &CredentialInput) -> bool {
        if !Self::supports_credential_type(self, &input.credential_type) {
            return false;
        }
        self.is_credential_valid(user_id, input.challenge_response())
            .await
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Opens and closes one connection to prove the settings work.
///
/// A failure to close is logged and otherwise ignored.
///
/// ## Errors
///
/// Returns the error raised while opening the connection.
pub async fn check_connection<P: ConnectionProvider>(connections: &P) -> SqlStorageResult<()> {
    let conn = connections.open().await?;
    if let Err(err) = conn.close().await {
        tracing::warn!(error = %err, "Error closing validation connection");
    }
    Ok(())
}

/// Builds the admin console descriptors of every configuration key.
#[must_use]
pub fn config_properties() -> Vec<ConfigProperty> {
    let encodings = PasswordEncoding::ALL.iter().map(PasswordEncoding::as_str).collect();

    vec![
        ConfigProperty::string(
            keys::JDBC_URL,
            "JDBC URL Connection",
            "URL to connect database with JDBC",
        ),
        ConfigProperty::string(keys::DB_USER, "Database user", "Database user"),
        ConfigProperty::password(keys::DB_PASSWORD, "Database password", "Database password"),
        ConfigProperty::string(
            keys::USER_QUERY,
            "User query",
            "Query to get users in database. It must contain the fields referring to the id, \
             username, email and password. It should not contain the WHERE clause. \
             Columns other than text, number, boolean or UTF-8 binary (for example \
             PostgreSQL uuid, numeric or timestamp) must be cast to text.",
        ),
        ConfigProperty::string(keys::USER_ID_FIELD, "User id field", "Name of id field in user query"),
        ConfigProperty::string(
            keys::USER_USERNAME_FIELD,
            "Username field",
            "Name of username field in user query",
        ),
        ConfigProperty::string(keys::USER_EMAIL_FIELD, "Email field", "Name of email field in user query"),
        ConfigProperty::string(
            keys::USER_PASSWORD_FIELD,
            "Password field",
            "Name of password field in user query",
        ),
        ConfigProperty::list(
            keys::PASSWORD_ENCODE_TYPE,
            "Password encode type",
            "If password is encoded in database, select the encode type",
            PasswordEncoding::Plain.as_str(),
            encodings,
        ),
        ConfigProperty::string(
            keys::ROLE_QUERY,
            "Role query",
            "Query to get user roles. It must contain the fields referring to id, name and \
             description. It should not contain the WHERE clause. Columns other than \
             text, number, boolean or UTF-8 binary must be cast to text.",
        ),
        ConfigProperty::string(keys::ROLE_ID_FIELD, "Role id field", "Name of id field in role query"),
        ConfigProperty::string(
            keys::ROLE_NAME_FIELD,
            "Role name field",
            "Name of name field in role query",
        ),
        ConfigProperty::string(
            keys::ROLE_DESCRIPTION_FIELD,
            "Role description field",
            "Name of description field in role query",
        ),
        ConfigProperty::string(
            keys::ROLE_USER_ID_FIELD,
            "Role user id field",
            "Name of user id field in role query",
        ),
        ConfigProperty::string(
            keys::CONNECTION_TIMEOUT,
            "Connection timeout",
            "Seconds to wait for a database connection",
        )
        .with_default("30"),
    ]
}

/// Creates [`SqlUserStorageProvider`]s for the host.
pub struct SqlUserStorageProviderFactory {
    properties: Vec<ConfigProperty>,
}

impl SqlUserStorageProviderFactory {
    /// Creates the factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties: config_properties(),
        }
    }
}

impl Default for SqlUserStorageProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStorageProviderFactory for SqlUserStorageProviderFactory {
    type Provider = SqlUserStorageProvider;

    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn help_text(&self) -> &'static str {
        "Users, passwords and roles read from an SQL database"
    }

    fn config_properties(&self) -> &[ConfigProperty] {
        &self.properties
    }

    async fn validate_configuration(&self, component: &ComponentModel) -> FederationResult<()> {
        let checked = async {
            let config = SqlStorageConfig::from_component(component)?;
            let connections = SqlxConnectionProvider::new(&config.connection)?;
            check_connection(&connections).await
        };

        checked.await.map_err(|err| {
            tracing::warn!(component = %component.id, error = %err, "Rejected component configuration");
            FederationError::config(format!(
                "Database properties are invalid: {}",
                err.root_cause()
            ))
        })
    }

    fn create(&self, component: &ComponentModel) -> FederationResult<Self::Provider> {
        Ok(SqlUserStorageProvider::from_component(component)?)
    }
}
