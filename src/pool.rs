//! Connection pool.
//!
//! The pool is an explicitly constructed object owned by the application's
//! composition root; there is no module-level singleton. Callers create it
//! once with [`DbPool::connect`], hand references to repository code, and
//! call [`DbPool::close`] on shutdown.
//!
//! Slots are pre-opened `may_postgres` clients parked in a bounded
//! crossbeam channel; acquisition blocks the calling coroutine until a slot
//! frees up or the configured timeout elapses. No connection is ever held
//! across user interactions: repository functions acquire, run, and drop.

use crate::config::DatabaseConfig;
use crate::connection::{connect, ConnectionError};
use crate::executor::{run_query, ClientExecutor, DbError, DbExecutor};
use crate::transaction::{Transaction, TransactionError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use may_postgres::types::ToSql;
use may_postgres::{Client, Row};
use std::fmt;
use std::time::Duration;

/// Pool error type
#[derive(Debug)]
pub enum PoolError {
    /// Failure while opening one of the pooled connections
    Connect(ConnectionError),
    /// No slot became available within the acquire timeout
    AcquireTimeout(Duration),
    /// The pool has been closed
    Closed,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Connect(e) => write!(f, "Pool connection error: {e}"),
            PoolError::AcquireTimeout(d) => {
                write!(f, "Timed out after {d:?} waiting for a pooled connection")
            }
            PoolError::Closed => write!(f, "Pool is closed"),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<ConnectionError> for PoolError {
    fn from(err: ConnectionError) -> Self {
        PoolError::Connect(err)
    }
}

impl From<PoolError> for DbError {
    fn from(err: PoolError) -> Self {
        DbError::Other(err.to_string())
    }
}

/// A fixed-size pool of PostgreSQL connections.
///
/// # Examples
///
/// ```no_run
/// use claimbase::config::DatabaseConfig;
/// use claimbase::pool::DbPool;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cfg = DatabaseConfig::load()?;
/// let pool = DbPool::connect(&cfg)?;
/// may::go!(move || {
///     let conn = pool.acquire().expect("pool exhausted");
///     // run repository calls against `conn`
///     drop(conn);
///     pool.close();
/// })
/// .join()
/// .unwrap();
/// # Ok(())
/// # }
/// ```
pub struct DbPool {
    slots: Receiver<Client>,
    returns: Sender<Client>,
    size: usize,
    acquire_timeout: Duration,
}

impl DbPool {
    /// Open `max_connections` clients and park them in the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Connect` if any of the connections fails to open;
    /// already-opened slots are dropped.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, PoolError> {
        let size = config.max_connections.max(1) as usize;
        let (returns, slots) = bounded(size);
        for _ in 0..size {
            let client = connect(&config.url)?;
            // Channel capacity equals the slot count, send cannot block here.
            returns
                .send(client)
                .map_err(|_| PoolError::Closed)?;
        }
        log::info!("database pool ready with {size} connections");
        Ok(Self {
            slots,
            returns,
            size,
            acquire_timeout: Duration::from_secs(config.pool_timeout_seconds),
        })
    }

    /// Check out a connection, waiting up to the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::AcquireTimeout` when every slot stays busy for
    /// the whole wait, or `PoolError::Closed` after [`DbPool::close`].
    pub fn acquire(&self) -> Result<PooledClient, PoolError> {
        match self.slots.recv_timeout(self.acquire_timeout) {
            Ok(client) => Ok(PooledClient {
                client: Some(client),
                returns: self.returns.clone(),
            }),
            Err(RecvTimeoutError::Timeout) => Err(PoolError::AcquireTimeout(self.acquire_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::Closed),
        }
    }

    /// Number of slots the pool was created with.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Drain and drop every pooled connection.
    ///
    /// Connections currently checked out are dropped when their guards go
    /// out of scope; subsequent `acquire` calls fail with `Closed`.
    pub fn close(self) {
        drop(self.returns);
        while self.slots.try_recv().is_ok() {}
        log::info!("database pool closed");
    }
}

/// A checked-out pool slot.
///
/// Returns its connection to the pool on drop and implements
/// [`DbExecutor`], so it can be passed directly to repository functions.
pub struct PooledClient {
    client: Option<Client>,
    returns: Sender<Client>,
}

impl PooledClient {
    fn client(&self) -> &Client {
        // Only `drop` takes the client out, so it is always present here.
        self.client.as_ref().expect("pooled client already returned")
    }

    /// Begin a transaction on this slot's connection.
    ///
    /// The slot stays checked out until the guard is dropped, so the
    /// transaction has the connection to itself. The transaction rolls
    /// back on drop if left open, so the slot is never recycled with a
    /// transaction still pending on it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError` if BEGIN fails.
    pub fn begin(&self) -> Result<Transaction<ClientExecutor>, TransactionError> {
        Transaction::begin(ClientExecutor::new(self.client().clone()))
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            // If the pool is gone the connection just closes.
            let _ = self.returns.send(client);
        }
    }
}

impl DbExecutor for PooledClient {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        run_query(self.client(), query, |c| c.execute(query, params))
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        run_query(self.client(), query, |c| c.query_one(query, params))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        run_query(self.client(), query, |c| c.query(query, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::AcquireTimeout(Duration::from_secs(30));
        assert!(err.to_string().contains("Timed out"));

        let err = PoolError::Closed;
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_pool_error_to_db_error() {
        let err: DbError = PoolError::Closed.into();
        assert!(err.to_string().contains("Pool is closed"));
    }
}
