//! Unit-test helpers.

use crate::executor::{DbError, DbExecutor};
use may_postgres::types::ToSql;
use may_postgres::Row;

/// Executor that panics on any use.
///
/// Validation-order tests pass this to repository functions to prove that
/// input checks fire before any database call.
pub(crate) struct PanicExecutor;

impl DbExecutor for PanicExecutor {
    fn execute(&self, query: &str, _params: &[&dyn ToSql]) -> Result<u64, DbError> {
        panic!("unexpected database call: {query}");
    }

    fn query_one(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Row, DbError> {
        panic!("unexpected database call: {query}");
    }

    fn query_all(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        panic!("unexpected database call: {query}");
    }
}
