//! SQL provider configuration.
//!
//! The admin console saves a flat string map on the component; this module
//! turns it into a typed, validated [`SqlStorageConfig`]. Every key below is
//! required and non-blank except [`keys::PASSWORD_ENCODE_TYPE`] and
//! [`keys::CONNECTION_TIMEOUT`].
//!
//! ## Security
//!
//! The database password is never logged and never serialized.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use kc_federation::ComponentModel;
use serde::{Deserialize, Serialize};

use crate::error::{SqlStorageError, SqlStorageResult};

/// Configuration keys understood by the provider.
pub mod keys {
    /// Connection URL. A leading `jdbc:` is accepted.
    pub const JDBC_URL: &str = "jdbcUrl";
    /// Database user.
    pub const DB_USER: &str = "dataSource.user";
    /// Database password.
    pub const DB_PASSWORD: &str = "dataSource.password";

    /// Base query returning user rows.
    pub const USER_QUERY: &str = "user.query.value";
    /// User id column.
    pub const USER_ID_FIELD: &str = "user.id.field";
    /// Username column.
    pub const USER_USERNAME_FIELD: &str = "user.username.field";
    /// Email column.
    pub const USER_EMAIL_FIELD: &str = "user.email.field";
    /// Password column.
    pub const USER_PASSWORD_FIELD: &str = "user.password.field";
    /// Password encoding strategy.
    pub const PASSWORD_ENCODE_TYPE: &str = "password.encode.type";

    /// Base query returning role rows.
    pub const ROLE_QUERY: &str = "role.query.value";
    /// Role id column.
    pub const ROLE_ID_FIELD: &str = "role.id.field";
    /// Role name column.
    pub const ROLE_NAME_FIELD: &str = "role.name.field";
    /// Role description column.
    pub const ROLE_DESCRIPTION_FIELD: &str = "role.description.field";
    /// Column holding the id of the user a role belongs to.
    pub const ROLE_USER_ID_FIELD: &str = "role.user.id.field";

    /// Seconds to wait for a connection to open.
    pub const CONNECTION_TIMEOUT: &str = "connection.timeout";
}

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Password Encoding
// ============================================================================

/// How stored passwords are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PasswordEncoding {
    /// Stored as clear text.
    #[default]
    #[serde(rename = "NONE")]
    Plain,
    /// Hex MD5 digest, optionally with a `{salt}` prefix.
    #[serde(rename = "MD5")]
    Md5,
    /// bcrypt hash.
    #[serde(rename = "BCRYPT")]
    Bcrypt,
}

impl PasswordEncoding {
    /// Every strategy, in the order the admin console lists them.
    pub const ALL: [Self; 3] = [Self::Bcrypt, Self::Md5, Self::Plain];

    /// Returns the configuration name of the strategy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "NONE",
            Self::Md5 => "MD5",
            Self::Bcrypt => "BCRYPT",
        }
    }
}

impl fmt::Display for PasswordEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PasswordEncoding {
    type Err = SqlStorageError;

    /// Names are matched exactly; `md5` is not `MD5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::Plain),
            "MD5" => Ok(Self::Md5),
            "BCRYPT" => Ok(Self::Bcrypt),
            other => Err(SqlStorageError::InvalidEncoding(other.to_string())),
        }
    }
}

// ============================================================================
// Typed configuration
// ============================================================================

/// Database connection settings.
#[derive(Clone, Serialize)]
pub struct ConnectionSettings {
    /// Connection URL as configured.
    pub url: String,
    /// Database user.
    pub user: String,
    #[serde(skip)]
    password: String,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl ConnectionSettings {
    /// Creates connection settings with the default timeout.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the database password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// User query and column mapping.
#[derive(Debug, Clone, Serialize)]
pub struct UserQueryConfig {
    /// Base SELECT without a WHERE clause.
    pub query: String,
    /// Id column.
    pub id_field: String,
    /// Username column.
    pub username_field: String,
    /// Email column.
    pub email_field: String,
    /// Password column.
    pub password_field: String,
}

/// Role query and column mapping.
#[derive(Debug, Clone, Serialize)]
pub struct RoleQueryConfig {
    /// Base SELECT without a WHERE clause.
    pub query: String,
    /// Id column.
    pub id_field: String,
    /// Name column.
    pub name_field: String,
    /// Description column.
    pub description_field: String,
    /// Owning user id column.
    pub user_id_field: String,
}

/// Validated provider configuration.
///
/// Immutable once built; a configuration change means building a new
/// provider.
#[derive(Debug, Clone, Serialize)]
pub struct SqlStorageConfig {
    /// Connection settings.
    pub connection: ConnectionSettings,
    /// User lookups.
    pub user: UserQueryConfig,
    /// Role lookups.
    pub role: RoleQueryConfig,
    /// Stored password encoding.
    pub password_encoding: PasswordEncoding,
}

impl SqlStorageConfig {
    /// Reads and validates the configuration of a component.
    ///
    /// ## Errors
    ///
    /// - `MissingConfig` if a required key is absent or blank
    /// - `InvalidEncoding` if `password.encode.type` names no known strategy
    /// - `InvalidConfig` if `connection.timeout` is not a whole number of seconds
    pub fn from_component(component: &ComponentModel) -> SqlStorageResult<Self> {
        let required = |key: &'static str| {
            component
                .get_non_empty(key)
                .map(str::to_string)
                .ok_or(SqlStorageError::MissingConfig(key))
        };

        let connect_timeout = match component.get_non_empty(keys::CONNECTION_TIMEOUT) {
            None => DEFAULT_CONNECT_TIMEOUT,
            Some(_) => component
                .get_u64(keys::CONNECTION_TIMEOUT)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    SqlStorageError::InvalidConfig(format!(
                        "{} must be a number of seconds",
                        keys::CONNECTION_TIMEOUT
                    ))
                })?,
        };

        let password_encoding = match component.get_non_empty(keys::PASSWORD_ENCODE_TYPE) {
            None => PasswordEncoding::default(),
            Some(name) => name.parse()?,
        };

        Ok(Self {
            connection: ConnectionSettings::new(
                required(keys::JDBC_URL)?,
                required(keys::DB_USER)?,
                required(keys::DB_PASSWORD)?,
            )
            .connect_timeout(connect_timeout),
            user: UserQueryConfig {
                query: required(keys::USER_QUERY)?,
                id_field: required(keys::USER_ID_FIELD)?,
                username_field: required(keys::USER_USERNAME_FIELD)?,
                email_field: required(keys::USER_EMAIL_FIELD)?,
                password_field: required(keys::USER_PASSWORD_FIELD)?,
            },
            role: RoleQueryConfig {
                query: required(keys::ROLE_QUERY)?,
                id_field: required(keys::ROLE_ID_FIELD)?,
                name_field: required(keys::ROLE_NAME_FIELD)?,
                description_field: required(keys::ROLE_DESCRIPTION_FIELD)?,
                user_id_field: required(keys::ROLE_USER_ID_FIELD)?,
            },
            password_encoding,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A complete component configuration used across the crate's tests.
    pub(crate) fn component() -> kc_federation::config::ComponentModelBuilder {
        ComponentModel::builder()
            .id("provider")
            .provider_type("jdbc-user-storage")
            .config(keys::JDBC_URL, "jdbc:postgresql://db.example.com:5432/legacy")
            .config(keys::DB_USER, "keycloak")
            .config(keys::DB_PASSWORD, "db-secret")
            .config(keys::USER_QUERY, "SELECT id, login, mail, pass FROM users")
            .config(keys::USER_ID_FIELD, "id")
            .config(keys::USER_USERNAME_FIELD, "login")
            .config(keys::USER_EMAIL_FIELD, "mail")
            .config(keys::USER_PASSWORD_FIELD, "pass")
            .config(keys::ROLE_QUERY, "SELECT rid, rname, rdesc, uid FROM roles")
            .config(keys::ROLE_ID_FIELD, "rid")
            .config(keys::ROLE_NAME_FIELD, "rname")
            .config(keys::ROLE_DESCRIPTION_FIELD, "rdesc")
            .config(keys::ROLE_USER_ID_FIELD, "uid")
    }

    #[test]
    fn parses_complete_configuration() {
        let config = SqlStorageConfig::from_component(&component().build()).unwrap();

        assert_eq!(config.connection.user, "keycloak");
        assert_eq!(config.connection.password(), "db-secret");
        assert_eq!(config.connection.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.user.username_field, "login");
        assert_eq!(config.role.user_id_field, "uid");
        assert_eq!(config.password_encoding, PasswordEncoding::Plain);
    }

    #[test]
    fn missing_or_blank_key_is_rejected() {
        let mut component = component().build();
        component.config.remove(keys::ROLE_NAME_FIELD);
        let err = SqlStorageConfig::from_component(&component).unwrap_err();
        assert!(matches!(err, SqlStorageError::MissingConfig(keys::ROLE_NAME_FIELD)));

        let component = self::component().config(keys::JDBC_URL, "  ").build();
        let err = SqlStorageConfig::from_component(&component).unwrap_err();
        assert!(matches!(err, SqlStorageError::MissingConfig(keys::JDBC_URL)));
    }

    #[test]
    fn encoding_names_are_exact() {
        assert_eq!("BCRYPT".parse::<PasswordEncoding>().unwrap(), PasswordEncoding::Bcrypt);
        assert_eq!("MD5".parse::<PasswordEncoding>().unwrap(), PasswordEncoding::Md5);
        assert_eq!("NONE".parse::<PasswordEncoding>().unwrap(), PasswordEncoding::Plain);
        assert!("md5".parse::<PasswordEncoding>().is_err());

        let component = component()
            .config(keys::PASSWORD_ENCODE_TYPE, "SHA1")
            .build();
        let err = SqlStorageConfig::from_component(&component).unwrap_err();
        assert_eq!(err.to_string(), "Invalid password encode type: SHA1");
    }

    #[test]
    fn blank_encoding_defaults_to_none() {
        let component = component().config(keys::PASSWORD_ENCODE_TYPE, "").build();
        let config = SqlStorageConfig::from_component(&component).unwrap();
        assert_eq!(config.password_encoding, PasswordEncoding::Plain);
    }

    #[test]
    fn connection_timeout() {
        let component = component().config(keys::CONNECTION_TIMEOUT, "5").build();
        let config = SqlStorageConfig::from_component(&component).unwrap();
        assert_eq!(config.connection.connect_timeout, Duration::from_secs(5));

        let component = self::component()
            .config(keys::CONNECTION_TIMEOUT, "soon")
            .build();
        let err = SqlStorageConfig::from_component(&component).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn password_is_hidden() {
        let config = SqlStorageConfig::from_component(&component().build()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("db-secret"));
    }
}
