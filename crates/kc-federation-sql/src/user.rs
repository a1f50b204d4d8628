//! User lookups against the external store.

use std::sync::Arc;

use crate::config::UserQueryConfig;
use crate::connection::{ConnectionProvider, DbConnection, ResultRow, StatementExecutor};
use crate::error::SqlStorageResult;
use crate::model::User;
use crate::query::{FilteredQuery, UserMapper};

type RowOf<P> = <<P as ConnectionProvider>::Connection as DbConnection>::Row;

/// Finds users with the configured user query.
pub struct UserRepository<P> {
    executor: StatementExecutor<P>,
    mapper: UserMapper,
    by_id: Arc<FilteredQuery>,
    by_username: Arc<FilteredQuery>,
    by_email: Arc<FilteredQuery>,
    password_field: String,
}

impl<P: ConnectionProvider> UserRepository<P> {
    /// Builds the lookup statements for the configured query and columns.
    #[must_use]
    pub fn new(executor: StatementExecutor<P>, config: &UserQueryConfig) -> Self {
        Self {
            executor,
            mapper: UserMapper::new(config),
            by_id: Arc::new(FilteredQuery::new(&config.query, &config.id_field)),
            by_username: Arc::new(FilteredQuery::new(&config.query, &config.username_field)),
            by_email: Arc::new(FilteredQuery::new(&config.query, &config.email_field)),
            password_field: config.password_field.clone(),
        }
    }

    /// Finds a user by its id in the external store.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors unchanged.
    pub async fn find_by_id(&self, id: &str) -> SqlStorageResult<Option<User>> {
        self.find_one(&self.by_id, id).await
    }

    /// Finds a user by username.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors unchanged.
    pub async fn find_by_username(&self, username: &str) -> SqlStorageResult<Option<User>> {
        self.find_one(&self.by_username, username).await
    }

    /// Finds a user by email.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors unchanged.
    pub async fn find_by_email(&self, email: &str) -> SqlStorageResult<Option<User>> {
        self.find_one(&self.by_email, email).await
    }

    /// Reads the stored password of a user. A NULL password reads as absent.
    ///
    /// ## Errors
    ///
    /// Returns connection, query and release errors unchanged.
    pub async fn find_password_by_id(&self, id: &str) -> SqlStorageResult<Option<String>> {
        match self.first_row(&self.by_id, id).await? {
            Some(row) => row.get_string(&self.password_field),
            None => Ok(None),
        }
    }

    async fn find_one(&self, query: &Arc<FilteredQuery>, value: &str) -> SqlStorageResult<Option<User>> {
        let row = self.first_row(query, value).await?;
        tracing::debug!(field = query.column(), found = row.is_some(), "User lookup");
        row.map(|row| self.mapper.map(&row)).transpose()
    }

    async fn first_row(
        &self,
        query: &Arc<FilteredQuery>,
        value: &str,
    ) -> SqlStorageResult<Option<RowOf<P>>> {
        let query = Arc::clone(query);
        let value = value.to_string();
        self.executor
            .execute(move |conn| Box::pin(async move { conn.fetch_optional(&query, &value).await }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::error::SqlStorageError;
    use crate::testing::{FakeProvider, FakeRow};

    const BASE: &str = "SELECT uid, login, mail, pass FROM users";

    fn config() -> UserQueryConfig {
        UserQueryConfig {
            query: BASE.to_string(),
            id_field: "uid".to_string(),
            username_field: "login".to_string(),
            email_field: "mail".to_string(),
            password_field: "pass".to_string(),
        }
    }

    fn jdoe() -> FakeRow {
        FakeRow::new([
            ("uid", Some("42")),
            ("login", Some("jdoe")),
            ("mail", Some("jdoe@example.com")),
            ("pass", Some("secret")),
        ])
    }

    fn repository(provider: FakeProvider) -> UserRepository<FakeProvider> {
        UserRepository::new(StatementExecutor::new(provider), &config())
    }

    #[tokio::test]
    async fn finds_by_each_configured_field() {
        let repo = repository(FakeProvider::default().with_table(BASE, vec![jdoe()]));

        let by_id = repo.find_by_id("42").await.unwrap().unwrap();
        let by_username = repo.find_by_username("jdoe").await.unwrap().unwrap();
        let by_email = repo.find_by_email("jdoe@example.com").await.unwrap().unwrap();

        assert_eq!(by_id, by_username);
        assert_eq!(by_id, by_email);
        assert_eq!(by_id.username, "jdoe");

        let statements = repo.executor.provider().statements();
        assert_eq!(
            statements,
            vec![
                (format!("{BASE} WHERE uid = ?"), "42".to_string()),
                (format!("{BASE} WHERE login = ?"), "jdoe".to_string()),
                (format!("{BASE} WHERE mail = ?"), "jdoe@example.com".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn no_rows_is_absent() {
        let repo = repository(FakeProvider::default().with_table(BASE, vec![]));

        assert!(repo.find_by_id("42").await.unwrap().is_none());
        assert!(repo.find_by_username("jdoe").await.unwrap().is_none());
        assert!(repo.find_by_email("jdoe@example.com").await.unwrap().is_none());
        assert!(repo.find_password_by_id("42").await.unwrap().is_none());
        assert_eq!(repo.executor.provider().closed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn first_row_wins() {
        let twin = FakeRow::new([
            ("uid", Some("42")),
            ("login", Some("jdoe-2")),
            ("mail", None),
            ("pass", None),
        ]);
        let repo = repository(FakeProvider::default().with_table(BASE, vec![jdoe(), twin]));

        let user = repo.find_by_id("42").await.unwrap().unwrap();
        assert_eq!(user.username, "jdoe");
    }

    #[tokio::test]
    async fn reads_password_column() {
        let no_password = FakeRow::new([
            ("uid", Some("7")),
            ("login", Some("svc")),
            ("mail", None),
            ("pass", None),
        ]);
        let repo = repository(FakeProvider::default().with_table(BASE, vec![jdoe(), no_password]));

        assert_eq!(
            repo.find_password_by_id("42").await.unwrap().as_deref(),
            Some("secret")
        );
        assert_eq!(repo.find_password_by_id("7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_errors_propagate() {
        let provider = FakeProvider {
            fail_query: true,
            ..FakeProvider::default()
        };
        let repo = repository(provider);

        let err = repo.find_by_username("jdoe").await.unwrap_err();
        assert!(matches!(err, SqlStorageError::Query { .. }));
        assert_eq!(repo.executor.provider().closed.load(Ordering::SeqCst), 1);
    }
}
