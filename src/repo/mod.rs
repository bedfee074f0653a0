//! Entity repositories.
//!
//! One module per entity. Shared conventions:
//!
//! - every operation parameterizes user input, never concatenates it;
//! - lookups return `Ok(None)` and deletes/updates return rows-affected
//!   (`0` = not found) rather than erroring; the caller translates;
//! - list endpoints page with `offset = (page - 1) * limit` and take their
//!   `total` from a separate COUNT query with the same predicate (the two
//!   are not snapshot-consistent, which is accepted documented behavior);
//! - validation happens before any database call.

pub mod attendance;
pub mod claim;
pub mod company;
pub mod field;
pub mod hospital;
pub mod patient;
pub mod preauth;
pub mod tpa;
pub mod user;

use crate::executor::DbError;
use crate::patch::EmptyPatch;
use crate::status::InvalidStatus;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository error type.
#[derive(Debug)]
pub enum RepoError {
    /// Malformed or missing input, detected before any database call.
    Validation(String),
    /// Database/connectivity fault.
    Db(DbError),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::Validation(s) => write!(f, "Validation error: {s}"),
            RepoError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for RepoError {}

impl From<DbError> for RepoError {
    fn from(err: DbError) -> Self {
        RepoError::Db(err)
    }
}

impl From<EmptyPatch> for RepoError {
    fn from(err: EmptyPatch) -> Self {
        RepoError::Validation(err.to_string())
    }
}

impl From<InvalidStatus> for RepoError {
    fn from(err: InvalidStatus) -> Self {
        RepoError::Validation(err.to_string())
    }
}

/// One page of a list endpoint plus the un-paginated total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Page/limit pair with the shared defaults (page 1, 10 rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub(crate) fn require_nonempty(field: &str, value: &str) -> Result<(), RepoError> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn validate_email_opt(value: Option<&str>) -> Result<(), RepoError> {
    match value {
        Some(v) if !v.is_empty() && !EMAIL_RE.is_match(v) => Err(RepoError::Validation(format!(
            "Invalid email address: {v}"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn validate_url_opt(field: &str, value: Option<&str>) -> Result<(), RepoError> {
    match value {
        Some(v)
            if !v.is_empty() && !(v.starts_with("http://") || v.starts_with("https://")) =>
        {
            Err(RepoError::Validation(format!(
                "{field} must be a valid http(s) URL"
            )))
        }
        _ => Ok(()),
    }
}

/// Generate an entity id as `<prefix>-<millisecond timestamp>`.
pub(crate) fn gen_id(prefix: &str) -> String {
    format!("{prefix}-{}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::new(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination::new(Some(3), Some(25));
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_pagination_zero_page_clamped() {
        let p = Pagination::new(Some(0), Some(10));
        assert_eq!(p.page, 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email_opt(Some("a@acme.com")).is_ok());
        assert!(validate_email_opt(None).is_ok());
        assert!(validate_email_opt(Some("not-an-email")).is_err());
        assert!(validate_email_opt(Some("a b@x.com")).is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url_opt("portal_link", Some("https://portal.acme.com")).is_ok());
        assert!(validate_url_opt("portal_link", Some("ftp://acme.com")).is_err());
        assert!(validate_url_opt("portal_link", None).is_ok());
    }

    #[test]
    fn test_gen_id_prefix() {
        let id = gen_id("comp");
        assert!(id.starts_with("comp-"));
        assert!(id["comp-".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_repo_error_display() {
        let err = RepoError::Validation("name is required".into());
        assert!(err.to_string().contains("Validation error"));
    }
}
