//! Provider configuration file.
//!
//! ```toml
//! id = "legacy"
//! name = "Legacy users"
//!
//! [config]
//! jdbcUrl = "jdbc:postgresql://db.example.com:5432/legacy"
//! "dataSource.user" = "keycloak"
//! "user.query.value" = "SELECT id, login, mail, pass FROM users"
//! ```
//!
//! The database password may be left out of the file and supplied through
//! `KC_SQL_FEDERATION_DB_PASSWORD` (a `.env` file is honoured).

use std::collections::HashMap;
use std::path::Path;

use kc_federation::ComponentModel;
use kc_federation_sql::config::keys;
use kc_federation_sql::PROVIDER_ID;
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Environment variable overriding the database password.
pub const DB_PASSWORD_ENV: &str = "KC_SQL_FEDERATION_DB_PASSWORD";

const DEFAULT_COMPONENT_ID: &str = "sql-users";

/// Contents of a provider configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderFile {
    /// Component id; becomes the provider part of storage ids.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Provider configuration keys.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl ProviderFile {
    /// Reads a configuration file.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration file contents.
    ///
    /// ## Errors
    ///
    /// Returns an error if the contents are not valid TOML.
    pub fn parse(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Builds the component, applying the database password override.
    #[must_use]
    pub fn into_component(self, db_password: Option<String>) -> ComponentModel {
        let mut builder = ComponentModel::builder()
            .id(self.id.unwrap_or_else(|| DEFAULT_COMPONENT_ID.to_string()))
            .provider_type(PROVIDER_ID)
            .configs(self.config);
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(password) = db_password {
            builder = builder.config(keys::DB_PASSWORD, password);
        }
        builder.build()
    }
}

/// Loads `.env`, reads the file at `path` and builds the component.
///
/// ## Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_component(path: &Path) -> CliResult<ComponentModel> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            tracing::warn!(error = %err, "Ignoring unreadable .env file");
        }
    }

    let file = ProviderFile::load(path)?;
    Ok(file.into_component(std::env::var(DB_PASSWORD_ENV).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"
id = "legacy"

[config]
jdbcUrl = "jdbc:mysql://db.example.com/legacy"
"dataSource.user" = "keycloak"
"dataSource.password" = "from-file"
"password.encode.type" = "BCRYPT"
"#;

    #[test]
    fn parses_component_file() {
        let component = ProviderFile::parse(FILE).unwrap().into_component(None);

        assert_eq!(component.id, "legacy");
        assert_eq!(component.provider_type, PROVIDER_ID);
        assert_eq!(component.get(keys::PASSWORD_ENCODE_TYPE), Some("BCRYPT"));
        assert_eq!(component.get(keys::DB_PASSWORD), Some("from-file"));
    }

    #[test]
    fn password_override_wins() {
        let component = ProviderFile::parse(FILE)
            .unwrap()
            .into_component(Some("from-env".to_string()));
        assert_eq!(component.get(keys::DB_PASSWORD), Some("from-env"));
    }

    #[test]
    fn defaults_component_id() {
        let component = ProviderFile::parse("[config]\n").unwrap().into_component(None);
        assert_eq!(component.id, DEFAULT_COMPONENT_ID);
        assert_eq!(component.name, PROVIDER_ID);
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(matches!(
            ProviderFile::parse("config = 3"),
            Err(CliError::Toml(_))
        ));
    }
}
