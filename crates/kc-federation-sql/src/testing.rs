//! In-memory connection fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::connection::{ConnectionProvider, DbConnection, ResultRow};
use crate::error::{SqlStorageError, SqlStorageResult};
use crate::query::FilteredQuery;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct FakeDriverError(pub(crate) &'static str);

/// A row keyed by column name; `None` is SQL NULL.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRow(HashMap<String, Option<String>>);

impl FakeRow {
    pub(crate) fn new<const N: usize>(columns: [(&str, Option<&str>); N]) -> Self {
        Self(
            columns
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        )
    }
}

impl ResultRow for FakeRow {
    fn get_string(&self, column: &str) -> SqlStorageResult<Option<String>> {
        self.0.get(column).cloned().ok_or_else(|| {
            SqlStorageError::query(format!("reading column {column}"), FakeDriverError("no such column"))
        })
    }
}

/// Connection provider over in-memory tables.
///
/// A statement is served by the table whose base query it starts with; rows
/// are filtered on the statement's filter column.
#[derive(Default)]
pub(crate) struct FakeProvider {
    pub(crate) tables: Vec<(String, Vec<FakeRow>)>,
    pub(crate) fail_open: bool,
    pub(crate) fail_query: bool,
    pub(crate) fail_close: bool,
    pub(crate) opened: Arc<AtomicUsize>,
    pub(crate) closed: Arc<AtomicUsize>,
    pub(crate) statements: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeProvider {
    pub(crate) fn with_table(mut self, base_query: &str, rows: Vec<FakeRow>) -> Self {
        self.tables.push((base_query.to_string(), rows));
        self
    }

    pub(crate) fn statements(&self) -> Vec<(String, String)> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionProvider for FakeProvider {
    type Connection = FakeConnection;

    async fn open(&self) -> SqlStorageResult<FakeConnection> {
        if self.fail_open {
            return Err(SqlStorageError::connection(FakeDriverError("connection refused")));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConnection {
            tables: self.tables.clone(),
            fail_query: self.fail_query,
            fail_close: self.fail_close,
            closed: Arc::clone(&self.closed),
            statements: Arc::clone(&self.statements),
        })
    }
}

pub(crate) struct FakeConnection {
    tables: Vec<(String, Vec<FakeRow>)>,
    fail_query: bool,
    fail_close: bool,
    closed: Arc<AtomicUsize>,
    statements: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeConnection {
    fn select(&self, query: &FilteredQuery, value: &str) -> SqlStorageResult<Vec<FakeRow>> {
        self.statements
            .lock()
            .unwrap()
            .push((query.sql().to_string(), value.to_string()));

        if self.fail_query {
            return Err(SqlStorageError::query(
                query.sql(),
                FakeDriverError("syntax error"),
            ));
        }

        let rows = self
            .tables
            .iter()
            .find(|(base, _)| query.sql().starts_with(base.as_str()))
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or_default();

        rows.iter()
            .filter_map(|row| match row.get_string(query.column()) {
                Ok(Some(v)) if v == value => Some(Ok(row.clone())),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect()
    }
}

#[async_trait]
impl DbConnection for FakeConnection {
    type Row = FakeRow;

    async fn fetch_optional(
        &mut self,
        query: &FilteredQuery,
        value: &str,
    ) -> SqlStorageResult<Option<FakeRow>> {
        Ok(self.select(query, value)?.into_iter().next())
    }

    async fn fetch_all(
        &mut self,
        query: &FilteredQuery,
        value: &str,
    ) -> SqlStorageResult<Vec<FakeRow>> {
        self.select(query, value)
    }

    async fn close(self) -> SqlStorageResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(SqlStorageError::release(FakeDriverError("socket closed")));
        }
        Ok(())
    }
}
