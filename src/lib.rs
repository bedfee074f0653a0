//! # claimbase
//!
//! Data-access layer for a hospital/insurance claims administration
//! system, built on the [`may`] coroutine runtime and `may_postgres`.
//!
//! The crate owns the PostgreSQL schema, a fixed-size connection pool,
//! per-entity repositories (companies, hospitals, TPAs, patients,
//! pre-auths, claims, users, staff attendance), the claim status
//! vocabulary with its aggregation buckets, reporting queries with CSV
//! export, an append-only activity log, signed login tokens and the
//! upload-URL contract. Callers are request handlers: they acquire a
//! pooled connection, invoke repository or report functions against it,
//! and translate `RepoError` / `Option` results into their own response
//! envelopes.
//!
//! ```no_run
//! use claimbase::config::DatabaseConfig;
//! use claimbase::pool::DbPool;
//! use claimbase::repo::company;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::connect(&DatabaseConfig::load()?)?;
//! may::go!(move || {
//!     let conn = pool.acquire().expect("pool exhausted");
//!     let companies = company::list(&conn, None, None).expect("query failed");
//!     println!("{} insurers", companies.total);
//! })
//! .join()
//! .unwrap();
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod auth;
pub mod config;
pub mod connection;
pub mod executor;
pub mod media;
pub mod models;
pub mod patch;
pub mod pool;
pub mod repo;
pub mod reports;
pub mod schema;
pub mod sql;
pub mod status;
pub mod storage;
pub mod transaction;
pub mod values;

#[cfg(test)]
mod test_support;

pub use executor::{ClientExecutor, DbError, DbExecutor};
pub use pool::{DbPool, PoolError, PooledClient};
pub use repo::{Page, Pagination, RepoError};
pub use status::{ClaimStatus, InvalidStatus, PreAuthStatus};
