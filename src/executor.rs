//! Database execution abstraction over `may_postgres`.
//!
//! Every repository and report function takes a `DbExecutor` rather than a
//! concrete client, so the same code runs against a pooled connection, a
//! dedicated client, or an open transaction.

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;
use std::time::Instant;

/// Database error type.
///
/// Driver errors are logged where they occur; the message that propagates
/// upward never contains credentials or connection strings.
#[derive(Debug)]
pub enum DbError {
    /// `PostgreSQL` error from `may_postgres`
    Postgres(PostgresError),
    /// Query execution error
    Query(String),
    /// Row parsing/conversion error
    Parse(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            DbError::Query(s) => write!(f, "Query error: {s}"),
            DbError::Parse(s) => write!(f, "Parse error: {s}"),
            DbError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<PostgresError> for DbError {
    fn from(err: PostgresError) -> Self {
        DbError::Postgres(err)
    }
}

/// Trait for executing database operations.
///
/// Implemented by [`ClientExecutor`], [`crate::pool::PooledClient`] and
/// [`crate::transaction::Transaction`] so callers never care which one they
/// hold.
pub trait DbExecutor {
    /// Execute a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query execution fails.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError>;

    /// Execute a query expected to return exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if execution fails or zero/multiple rows come back.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError>;

    /// Execute a query and return all rows.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query execution fails.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError>;

    /// Execute a query and return the first row, or `None` when nothing
    /// matches. Lookups by primary key go through this so that "not found"
    /// is a value, not an error.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query execution fails.
    fn query_opt(&self, query: &str, params: &[&dyn ToSql]) -> Result<Option<Row>, DbError> {
        let mut rows = self.query_all(query, params)?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }
}

/// Primary executor implementation wrapping a `may_postgres::Client`.
pub struct ClientExecutor {
    client: Client,
}

impl ClientExecutor {
    /// Create a new executor from a `may_postgres::Client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client.
    pub fn into_client(self) -> Client {
        self.client
    }

    /// Start a transaction on this connection.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError` if BEGIN fails.
    pub fn begin(
        &self,
    ) -> Result<
        crate::transaction::Transaction<ClientExecutor>,
        crate::transaction::TransactionError,
    > {
        crate::transaction::Transaction::begin(ClientExecutor::new(self.client.clone()))
    }
}

pub(crate) fn run_query<T>(
    client: &Client,
    query: &str,
    op: impl FnOnce(&Client) -> Result<T, PostgresError>,
) -> Result<T, DbError> {
    let start = Instant::now();
    let result = op(client).map_err(|e| {
        log::error!("query failed: {e}");
        DbError::Postgres(e)
    });
    log::debug!(
        "query executed in {:?}: {}",
        start.elapsed(),
        query.split_whitespace().take(8).collect::<Vec<_>>().join(" ")
    );
    result
}

impl DbExecutor for ClientExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        run_query(&self.client, query, |c| c.execute(query, params))
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        run_query(&self.client, query, |c| c.query_one(query, params))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        run_query(&self.client, query, |c| c.query(query, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_display() {
        let err = DbError::Query("bad predicate".to_string());
        assert!(err.to_string().contains("Query error"));
        assert!(err.to_string().contains("bad predicate"));
    }

    #[test]
    fn test_db_error_all_variants() {
        let err = DbError::Parse("column type".to_string());
        assert!(err.to_string().contains("Parse error"));

        let err = DbError::Other("boom".to_string());
        assert!(err.to_string().contains("Execution error"));
    }
}
