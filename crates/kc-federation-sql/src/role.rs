//! Role lookups against the external store.

use std::sync::Arc;

use crate::config::RoleQueryConfig;
use crate::connection::{ConnectionProvider, DbConnection, StatementExecutor};
use crate::error::SqlStorageResult;
use crate::model::Role;
use crate::query::{FilteredQuery, RoleMapper};

/// Finds the roles granted to a user with the configured role query.
pub struct RoleRepository<P> {
    executor: StatementExecutor<P>,
    mapper: RoleMapper,
    by_user_id: Arc<FilteredQuery>,
}

impl<P: ConnectionProvider> RoleRepository<P> {
    /// Builds the lookup statement for the configured query and columns.
    #[must_use]
    pub fn new(executor: StatementExecutor<P>, config: &RoleQueryConfig) -> Self {
        Self {
            executor,
            mapper: RoleMapper::new(config),
            by_user_id: Arc::new(FilteredQuery::new(&config.query, &config.user_id_field)),
        }
    }

    /// Returns the roles of a user, in result-set order.
    ///
    /// ## Errors
    ///
    /// Returns connection, query, release and mapping errors unchanged.
    pub async fn get_roles_by_user_id(&self, user_id: &str) -> SqlStorageResult<Vec<Role>> {
        let query = Arc::clone(&self.by_user_id);
        let value = user_id.to_string();
        let rows = self
            .executor
            .execute(move |conn| Box::pin(async move { conn.fetch_all(&query, &value).await }))
            .await?;

        tracing::debug!(count = rows.len(), "Role lookup");
        rows.iter().map(|row| self.mapper.map(row)).collect()
    }
}
