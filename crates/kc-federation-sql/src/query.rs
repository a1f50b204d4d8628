//! Lookup statements and row mapping.
//!
//! A lookup is the configured base query with a single equality filter
//! appended. Only the column name (trusted configuration) is concatenated
//! into the statement; the searched value is always bound.

use std::borrow::Cow;

use crate::config::{RoleQueryConfig, UserQueryConfig};
use crate::connection::ResultRow;
use crate::error::{SqlStorageError, SqlStorageResult};
use crate::model::{Role, User};

/// Bind parameter syntax of a database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `?` (MySQL, SQLite).
    #[default]
    Question,
    /// `$1` (PostgreSQL).
    Dollar,
}

impl Placeholder {
    /// Picks the placeholder style for a backend name as reported by the driver.
    #[must_use]
    pub fn for_backend(backend: &str) -> Self {
        if backend.eq_ignore_ascii_case("postgresql") || backend.eq_ignore_ascii_case("postgres") {
            Self::Dollar
        } else {
            Self::Question
        }
    }
}

/// A base query filtered on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredQuery {
    column: String,
    sql: String,
}

impl FilteredQuery {
    /// Appends `WHERE <column> = ?` to the base query.
    ///
    /// The base query must not carry its own WHERE clause.
    #[must_use]
    pub fn new(base: &str, column: &str) -> Self {
        Self {
            column: column.to_string(),
            sql: format!("{base} WHERE {column} = ?"),
        }
    }

    /// Returns the statement with a `?` placeholder.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the filter column.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the statement in the given placeholder style.
    #[must_use]
    pub fn render(&self, placeholder: Placeholder) -> Cow<'_, str> {
        match placeholder {
            Placeholder::Question => Cow::Borrowed(&self.sql),
            Placeholder::Dollar => {
                let base = self.sql.strip_suffix('?').unwrap_or(&self.sql);
                Cow::Owned(format!("{base}$1"))
            }
        }
    }
}

fn required<R: ResultRow>(row: &R, column: &str) -> SqlStorageResult<String> {
    row.get_string(column)?
        .ok_or_else(|| SqlStorageError::mapping(format!("column {column} is NULL")))
}

// ============================================================================
// Mappers
// ============================================================================

/// Maps user rows using the configured column names.
#[derive(Debug, Clone)]
pub struct UserMapper {
    id: String,
    username: String,
    email: String,
}

impl UserMapper {
    /// Creates a mapper for the configured user columns.
    #[must_use]
    pub fn new(config: &UserQueryConfig) -> Self {
        Self {
            id: config.id_field.clone(),
            username: config.username_field.clone(),
            email: config.email_field.clone(),
        }
    }

    /// Maps one row.
    ///
    /// ## Errors
    ///
    /// Returns `Mapping` if the id or username column is NULL, or the row
    /// error if a column cannot be read.
    pub fn map<R: ResultRow>(&self, row: &R) -> SqlStorageResult<User> {
        Ok(User {
            id: required(row, &self.id)?,
            username: required(row, &self.username)?,
            email: row.get_string(&self.email)?,
        })
    }
}

/// Maps role rows using the configured column names.
#[derive(Debug, Clone)]
pub struct RoleMapper {
    id: String,
    name: String,
    description: String,
}

impl RoleMapper {
    /// Creates a mapper for the configured role columns.
    #[must_use]
    pub fn new(config: &RoleQueryConfig) -> Self {
        Self {
            id: config.id_field.clone(),
            name: config.name_field.clone(),
            description: config.description_field.clone(),
        }
    }

    /// Maps one row.
    ///
    /// ## Errors
    ///
    /// Returns `Mapping` if the id or name column is NULL, or the row error
    /// if a column cannot be read.
    pub fn map<R: ResultRow>(&self, row: &R) -> SqlStorageResult<Role> {
        Ok(Role {
            id: required(row, &self.id)?,
            name: required(row, &self.name)?,
            description: row.get_string(&self.description)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Row(HashMap<&'static str, Option<&'static str>>);

    impl ResultRow for Row {
        fn get_string(&self, column: &str) -> SqlStorageResult<Option<String>> {
            self.0
                .get(column)
                .map(|v| v.map(str::to_string))
                .ok_or_else(|| SqlStorageError::mapping(format!("no column {column}")))
        }
    }

    fn user_config() -> UserQueryConfig {
        UserQueryConfig {
            query: "SELECT * FROM users".into(),
            id_field: "uid".into(),
            username_field: "login".into(),
            email_field: "mail".into(),
            password_field: "pass".into(),
        }
    }

    #[test]
    fn filtered_query_text() {
        let query = FilteredQuery::new("SELECT id, email, pass FROM users", "email");
        assert_eq!(
            query.sql(),
            "SELECT id, email, pass FROM users WHERE email = ?"
        );
        assert_eq!(query.column(), "email");
        assert_eq!(query.render(Placeholder::Question), query.sql());
        assert_eq!(
            query.render(Placeholder::Dollar),
            "SELECT id, email, pass FROM users WHERE email = $1"
        );
    }

    #[test]
    fn placeholder_for_backend() {
        assert_eq!(Placeholder::for_backend("PostgreSQL"), Placeholder::Dollar);
        assert_eq!(Placeholder::for_backend("MySQL"), Placeholder::Question);
        assert_eq!(Placeholder::for_backend("SQLite"), Placeholder::Question);
    }

    #[test]
    fn user_mapper_reads_configured_columns() {
        let row = Row(HashMap::from([
            ("uid", Some("id-sentinel")),
            ("login", Some("username-sentinel")),
            ("mail", Some("email-sentinel")),
            ("id", Some("wrong")),
        ]));

        let user = UserMapper::new(&user_config()).map(&row).unwrap();
        assert_eq!(user.id, "id-sentinel");
        assert_eq!(user.username, "username-sentinel");
        assert_eq!(user.email.as_deref(), Some("email-sentinel"));
    }

    #[test]
    fn user_mapper_nullability() {
        let mapper = UserMapper::new(&user_config());

        let row = Row(HashMap::from([
            ("uid", Some("1")),
            ("login", Some("jdoe")),
            ("mail", None),
        ]));
        assert_eq!(mapper.map(&row).unwrap().email, None);

        let row = Row(HashMap::from([
            ("uid", None),
            ("login", Some("jdoe")),
            ("mail", None),
        ]));
        assert!(matches!(mapper.map(&row), Err(SqlStorageError::Mapping(_))));
    }

    #[test]
    fn role_mapper_reads_configured_columns() {
        let config = RoleQueryConfig {
            query: "SELECT * FROM roles".into(),
            id_field: "rid".into(),
            name_field: "rname".into(),
            description_field: "rdesc".into(),
            user_id_field: "uid".into(),
        };
        let row = Row(HashMap::from([
            ("rid", Some("r1")),
            ("rname", Some("admin")),
            ("rdesc", None),
        ]));

        let role = RoleMapper::new(&config).map(&row).unwrap();
        assert_eq!(role.id, "r1");
        assert_eq!(role.name, "admin");
        assert_eq!(role.description, None);
    }
}
