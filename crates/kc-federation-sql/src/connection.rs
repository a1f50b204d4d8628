//! Database connections.
//!
//! Every repository call opens its own short-lived connection through a
//! [`ConnectionProvider`] and releases it before returning. The
//! [`StatementExecutor`] owns that open/run/close sequence.
//!
//! The production provider, [`SqlxConnectionProvider`], uses the `sqlx`
//! `Any` driver so one build serves PostgreSQL, MySQL/MariaDB and SQLite
//! stores.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::any::{AnyConnectOptions, AnyRow};
use sqlx::{AnyConnection, ConnectOptions, Connection, Row};
use url::Url;

use crate::config::ConnectionSettings;
use crate::error::{SqlStorageError, SqlStorageResult};
use crate::query::{FilteredQuery, Placeholder};

// ============================================================================
// Connection traits
// ============================================================================

/// A result row.
pub trait ResultRow: Send {
    /// Reads a column as text. `Ok(None)` means SQL NULL.
    ///
    /// ## Errors
    ///
    /// Returns an error if the column does not exist or cannot be read as text.
    fn get_string(&self, column: &str) -> SqlStorageResult<Option<String>>;
}

/// An open database connection.
#[async_trait]
pub trait DbConnection: Send + Sized {
    /// Row type produced by this connection.
    type Row: ResultRow;

    /// Runs the query with `value` bound to its filter and returns the first row.
    async fn fetch_optional(
        &mut self,
        query: &FilteredQuery,
        value: &str,
    ) -> SqlStorageResult<Option<Self::Row>>;

    /// Runs the query with `value` bound to its filter and returns every row.
    async fn fetch_all(
        &mut self,
        query: &FilteredQuery,
        value: &str,
    ) -> SqlStorageResult<Vec<Self::Row>>;

    /// Closes the connection.
    async fn close(self) -> SqlStorageResult<()>;
}

/// Opens database connections.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Connection type.
    type Connection: DbConnection;

    /// Opens a new connection.
    ///
    /// ## Errors
    ///
    /// Returns `Connection` (with the driver error as source) or
    /// `ConnectTimeout`.
    async fn open(&self) -> SqlStorageResult<Self::Connection>;
}

// ============================================================================
// Statement Executor
// ============================================================================

/// Runs an operation against a connection that is released on every path.
///
/// - If opening fails, the operation is not run and nothing is released.
/// - If the operation fails, the connection is still closed before the
///   error is returned.
/// - If closing fails, the close error is returned, replacing any
///   operation error.
pub struct StatementExecutor<P> {
    provider: Arc<P>,
}

impl<P> Clone for StatementExecutor<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: ConnectionProvider> StatementExecutor<P> {
    /// Creates an executor over the provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Returns the connection provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Opens a connection, runs `op` with it and closes it.
    ///
    /// ## Errors
    ///
    /// Returns the open error, the close error, or the operation error, in
    /// that order of precedence.
    pub async fn execute<T, F>(&self, op: F) -> SqlStorageResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut P::Connection) -> BoxFuture<'c, SqlStorageResult<T>> + Send,
    {
        let mut conn = self.provider.open().await?;
        let result = op(&mut conn).await;

        match conn.close().await {
            Ok(()) => result,
            Err(release) => {
                if let Err(err) = &result {
                    tracing::warn!(
                        error = %err,
                        "Discarding operation error after connection close failed"
                    );
                }
                Err(release)
            }
        }
    }
}

// ============================================================================
// sqlx provider
// ============================================================================

const JDBC_PREFIX: &str = "jdbc:";

const SUPPORTED_SCHEMES: [&str; 5] = ["postgres", "postgresql", "mysql", "mariadb", "sqlite"];

/// Opens connections with the `sqlx` `Any` driver.
pub struct SqlxConnectionProvider {
    options: AnyConnectOptions,
    scheme: String,
    connect_timeout: Duration,
}

impl SqlxConnectionProvider {
    /// Creates a provider from connection settings.
    ///
    /// A leading `jdbc:` is stripped from the URL. The configured user and
    /// password are applied when the URL names a network host; SQLite URLs
    /// are used as-is.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidConfig` if the URL cannot be parsed or names an
    /// unsupported backend.
    pub fn new(settings: &ConnectionSettings) -> SqlStorageResult<Self> {
        sqlx::any::install_default_drivers();

        let raw = settings
            .url
            .strip_prefix(JDBC_PREFIX)
            .unwrap_or(&settings.url);

        let mut url = Url::parse(raw)
            .map_err(|e| SqlStorageError::InvalidConfig(format!("invalid jdbcUrl: {e}")))?;
        let scheme = url.scheme().to_string();
        if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
            return Err(SqlStorageError::InvalidConfig(format!(
                "unsupported database in jdbcUrl: {scheme}"
            )));
        }

        let connect_url = if scheme != "sqlite" && url.host_str().is_some_and(|h| !h.is_empty()) {
            url.set_username(&settings.user)
                .and_then(|()| url.set_password(Some(settings.password())))
                .map_err(|()| {
                    SqlStorageError::InvalidConfig("jdbcUrl cannot carry credentials".to_string())
                })?;
            url.to_string()
        } else {
            raw.to_string()
        };

        let options = AnyConnectOptions::from_str(&connect_url).map_err(|e| {
            SqlStorageError::InvalidConfig(format!("invalid jdbcUrl for {scheme}: {e}"))
        })?;

        Ok(Self {
            options,
            scheme,
            connect_timeout: settings.connect_timeout,
        })
    }
}

impl fmt::Debug for SqlxConnectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlxConnectionProvider")
            .field("scheme", &self.scheme)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ConnectionProvider for SqlxConnectionProvider {
    type Connection = SqlxConnection;

    async fn open(&self) -> SqlStorageResult<SqlxConnection> {
        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| SqlStorageError::ConnectTimeout(self.connect_timeout))?
            .map_err(SqlStorageError::connection)?;

        let placeholder = Placeholder::for_backend(conn.backend_name());
        tracing::debug!(backend = conn.backend_name(), "Opened database connection");

        Ok(SqlxConnection { conn, placeholder })
    }
}

/// A connection opened by [`SqlxConnectionProvider`].
pub struct SqlxConnection {
    conn: AnyConnection,
    placeholder: Placeholder,
}

#[async_trait]
impl DbConnection for SqlxConnection {
    type Row = SqlxRow;

    async fn fetch_optional(
        &mut self,
        query: &FilteredQuery,
        value: &str,
    ) -> SqlStorageResult<Option<SqlxRow>> {
        let sql = query.render(self.placeholder);
        tracing::debug!(sql = %sql, "Executing lookup");

        sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&mut self.conn)
            .await
            .map(|row| row.map(SqlxRow))
            .map_err(|e| SqlStorageError::query(query.sql(), e))
    }

    async fn fetch_all(
        &mut self,
        query: &FilteredQuery,
        value: &str,
    ) -> SqlStorageResult<Vec<SqlxRow>> {
        let sql = query.render(self.placeholder);
        tracing::debug!(sql = %sql, "Executing lookup");

        sqlx::query(&sql)
            .bind(value)
            .fetch_all(&mut self.conn)
            .await
            .map(|rows| rows.into_iter().map(SqlxRow).collect())
            .map_err(|e| SqlStorageError::query(query.sql(), e))
    }

    async fn close(self) -> SqlStorageResult<()> {
        self.conn.close().await.map_err(SqlStorageError::release)
    }
}

/// A row read by [`SqlxConnection`].
pub struct SqlxRow(AnyRow);

type ScalarReader = fn(&AnyRow, &str) -> Result<Option<String>, sqlx::Error>;

/// Readers tried in order until one accepts the column's type.
const SCALAR_READERS: [ScalarReader; 7] = [
    read_as::<String>,
    read_as::<i64>,
    read_as::<i32>,
    read_as::<i16>,
    read_as::<f64>,
    read_as::<f32>,
    read_as::<bool>,
];

fn read_as<T>(row: &AnyRow, column: &str) -> Result<Option<String>, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any> + ToString,
{
    row.try_get::<Option<T>, _>(column)
        .map(|value| value.map(|v| v.to_string()))
}

impl ResultRow for SqlxRow {
    /// Text columns are read as-is. Numbers and booleans are read in their
    /// decimal or `true`/`false` form, binary columns as UTF-8.
    fn get_string(&self, column: &str) -> SqlStorageResult<Option<String>> {
        for read in SCALAR_READERS {
            match read(&self.0, column) {
                Ok(value) => return Ok(value),
                Err(sqlx::Error::ColumnDecode { .. }) => {}
                Err(e) => return Err(SqlStorageError::query(format!("reading column {column}"), e)),
            }
        }

        match self.0.try_get::<Option<Vec<u8>>, _>(column) {
            Ok(None) => Ok(None),
            Ok(Some(bytes)) => String::from_utf8(bytes).map(Some).map_err(|_| {
                SqlStorageError::mapping(format!("column {column}: binary value is not UTF-8"))
            }),
            Err(e) => Err(SqlStorageError::mapping(format!("column {column}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::FakeProvider;

    fn query() -> FilteredQuery {
        FilteredQuery::new("SELECT id FROM users", "id")
    }

    #[tokio::test]
    async fn releases_connection_after_success() {
        let provider = FakeProvider::default();
        let executor = StatementExecutor::new(provider);

        let value = executor
            .execute(|_conn| Box::pin(async { Ok(7) }))
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(executor.provider().opened.load(Ordering::SeqCst), 1);
        assert_eq!(executor.provider().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_operation_still_releases_once() {
        let executor = StatementExecutor::new(FakeProvider::default());

        let err = executor
            .execute::<(), _>(|_conn| {
                Box::pin(async { Err(SqlStorageError::mapping("boom")) })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SqlStorageError::Mapping(_)));
        assert_eq!(executor.provider().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_failure_takes_precedence() {
        let provider = FakeProvider {
            fail_close: true,
            ..FakeProvider::default()
        };
        let executor = StatementExecutor::new(provider);

        let err = executor
            .execute::<(), _>(|_conn| {
                Box::pin(async { Err(SqlStorageError::mapping("boom")) })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SqlStorageError::Release { .. }));
        assert_eq!(executor.provider().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn open_failure_skips_operation() {
        let provider = FakeProvider {
            fail_open: true,
            ..FakeProvider::default()
        };
        let executor = StatementExecutor::new(provider);
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        let err = executor
            .execute(move |conn| {
                Box::pin(async move {
                    flag.store(true, Ordering::SeqCst);
                    conn.fetch_optional(&query(), "1").await
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SqlStorageError::Connection { .. }));
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(executor.provider().closed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sqlx_provider_rejects_bad_urls() {
        let settings = ConnectionSettings::new("not a url", "u", "p");
        let err = SqlxConnectionProvider::new(&settings).unwrap_err();
        assert!(err.is_config_error());

        let settings = ConnectionSettings::new("jdbc:oracle:thin:@db:1521/x", "u", "p");
        assert!(SqlxConnectionProvider::new(&settings).is_err());
    }

    #[test]
    fn sqlx_provider_hides_credentials() {
        let settings = ConnectionSettings::new(
            "jdbc:postgresql://db.example.com:5432/legacy",
            "keycloak",
            "db-secret",
        );
        let provider = SqlxConnectionProvider::new(&settings).unwrap();
        assert_eq!(provider.scheme, "postgresql");
        assert!(!format!("{provider:?}").contains("db-secret"));
    }
}
