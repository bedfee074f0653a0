//! Transaction support.
//!
//! Only the attendance save path runs inside an explicit transaction
//! (delete-then-insert, all or nothing). Every other multi-statement
//! sequence in this crate, including the count-then-page pairs used by
//! list endpoints and reports, is intentionally non-transactional; the
//! database's own row locking is the only coordination.

use crate::executor::{DbError, DbExecutor};
use may_postgres::types::ToSql;
use may_postgres::{Error as PostgresError, Row};
use std::fmt;

/// Transaction error type
#[derive(Debug)]
pub enum TransactionError {
    /// `PostgreSQL` error from `may_postgres`
    Postgres(PostgresError),
    /// Transaction already committed or rolled back
    Closed,
    /// Other transaction errors
    Other(String),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            TransactionError::Closed => {
                write!(f, "Transaction has already been committed or rolled back")
            }
            TransactionError::Other(s) => write!(f, "Transaction error: {s}"),
        }
    }
}

impl std::error::Error for TransactionError {}

impl From<PostgresError> for TransactionError {
    fn from(err: PostgresError) -> Self {
        TransactionError::Postgres(err)
    }
}

impl From<DbError> for TransactionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Postgres(e) => TransactionError::Postgres(e),
            other => TransactionError::Other(other.to_string()),
        }
    }
}

impl From<TransactionError> for DbError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Postgres(e) => DbError::Postgres(e),
            TransactionError::Closed => DbError::Other("Transaction closed".to_string()),
            TransactionError::Other(s) => DbError::Other(s),
        }
    }
}

/// An open database transaction.
///
/// Implements [`DbExecutor`], so repository functions can run inside it
/// unchanged. A transaction that is dropped without [`Transaction::commit`]
/// or [`Transaction::rollback`], including when `COMMIT` itself fails,
/// issues a `ROLLBACK` from `Drop`. Pooled connections are recycled rather
/// than reset, so the connection must leave the transaction before its slot
/// goes back to the pool.
pub struct Transaction<E: DbExecutor> {
    executor: E,
    closed: bool,
}

impl<E: DbExecutor> Transaction<E> {
    /// Begin a transaction on the given executor.
    pub(crate) fn begin(executor: E) -> Result<Self, TransactionError> {
        executor
            .execute("BEGIN", &[])
            .map_err(TransactionError::from)?;
        Ok(Self {
            executor,
            closed: false,
        })
    }

    /// Commit the transaction.
    ///
    /// If `COMMIT` fails the transaction is left aborted on the server and
    /// the drop rollback clears it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::Closed` if already committed or rolled
    /// back, or the driver error if COMMIT fails.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::Closed);
        }
        self.executor
            .execute("COMMIT", &[])
            .map_err(TransactionError::from)?;
        self.closed = true;
        Ok(())
    }

    /// Roll back the transaction, discarding all changes made within it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::Closed` if already committed or rolled
    /// back, or the driver error if ROLLBACK fails.
    pub fn rollback(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::Closed);
        }
        self.executor
            .execute("ROLLBACK", &[])
            .map_err(TransactionError::from)?;
        self.closed = true;
        Ok(())
    }

    /// Check if the transaction is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<E: DbExecutor> Drop for Transaction<E> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.executor.execute("ROLLBACK", &[]) {
                log::warn!("rollback of abandoned transaction failed: {e}");
            }
        }
    }
}

impl<E: DbExecutor> DbExecutor for Transaction<E> {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
        self.executor.execute(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
        self.executor.query_one(query, params)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
        self.executor.query_all(query, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every statement so the BEGIN/COMMIT/ROLLBACK sequence can be
    /// asserted.
    struct Recorder {
        statements: Rc<RefCell<Vec<String>>>,
    }

    impl DbExecutor for Recorder {
        fn execute(&self, query: &str, _params: &[&dyn ToSql]) -> Result<u64, DbError> {
            self.statements.borrow_mut().push(query.to_string());
            Ok(0)
        }

        fn query_one(&self, _query: &str, _params: &[&dyn ToSql]) -> Result<Row, DbError> {
            Err(DbError::Other("recorder has no rows".into()))
        }

        fn query_all(&self, _query: &str, _params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
            Ok(Vec::new())
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, Recorder) {
        let statements = Rc::new(RefCell::new(Vec::new()));
        let exec = Recorder {
            statements: statements.clone(),
        };
        (statements, exec)
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let (statements, exec) = recorder();
        {
            let tx = Transaction::begin(exec).unwrap();
            tx.execute("DELETE FROM attendance WHERE hospital_id = $1", &[])
                .unwrap();
        }
        assert_eq!(
            *statements.borrow(),
            vec![
                "BEGIN",
                "DELETE FROM attendance WHERE hospital_id = $1",
                "ROLLBACK"
            ]
        );
    }

    #[test]
    fn test_commit_suppresses_drop_rollback() {
        let (statements, exec) = recorder();
        let tx = Transaction::begin(exec).unwrap();
        tx.commit().unwrap();
        assert_eq!(*statements.borrow(), vec!["BEGIN", "COMMIT"]);
    }

    #[test]
    fn test_explicit_rollback_runs_once() {
        let (statements, exec) = recorder();
        let tx = Transaction::begin(exec).unwrap();
        tx.rollback().unwrap();
        assert_eq!(*statements.borrow(), vec!["BEGIN", "ROLLBACK"]);
    }

    #[test]
    fn test_statements_refused_after_close_marker() {
        let (_, exec) = recorder();
        let mut tx = Transaction::begin(exec).unwrap();
        tx.closed = true;
        assert!(tx.execute("DELETE FROM attendance", &[]).is_err());
        assert!(tx.is_closed());
    }

    #[test]
    fn test_transaction_error_display() {
        let err = TransactionError::Closed;
        assert!(err
            .to_string()
            .contains("Transaction has already been committed"));

        let err = TransactionError::Other("test error".to_string());
        assert!(err.to_string().contains("Transaction error"));
    }

    #[test]
    fn test_transaction_error_conversion() {
        let err = TransactionError::Closed;
        let db_err: DbError = err.into();
        assert!(db_err.to_string().contains("Transaction closed"));

        let err: TransactionError = DbError::Other("slot gone".to_string()).into();
        assert!(err.to_string().contains("slot gone"));
    }
}
