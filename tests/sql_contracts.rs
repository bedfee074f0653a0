//! Contract tests over the generated SQL.
//!
//! A recording executor captures the statement text and bind count each
//! repository call produces, so the wire contract is asserted without a
//! database.

use std::cell::RefCell;

use claimbase::executor::{DbError, DbExecutor};
use claimbase::repo::{claim, company, tpa};
use may_postgres::types::ToSql;
use may_postgres::Row;
use rust_decimal::Decimal;

/// Records every `execute` call and reports the given rows-affected.
struct RecordingExecutor {
    calls: RefCell<Vec<(String, usize)>>,
    rows_affected: u64,
}

impl RecordingExecutor {
    fn new(rows_affected: u64) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            rows_affected,
        }
    }

    fn calls(&self) -> Vec<(String, usize)> {
        self.calls.borrow().clone()
    }
}

impl DbExecutor for RecordingExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.calls
            .borrow_mut()
            .push((query.to_string(), params.len()));
        Ok(self.rows_affected)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        self.calls
            .borrow_mut()
            .push((query.to_string(), params.len()));
        Err(DbError::Other("recording executor has no rows".into()))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        self.calls
            .borrow_mut()
            .push((query.to_string(), params.len()));
        Ok(Vec::new())
    }
}

#[test]
fn update_status_sets_all_fields_and_bumps_updated_at() {
    let exec = RecordingExecutor::new(1);
    let affected = claim::update_status(
        &exec,
        42,
        &claim::StatusUpdate {
            status: "Settled".into(),
            reason: Some("closed after reconciliation".into()),
            paid_amount: Some(Decimal::new(125_000, 2)),
            claim_ref: Some("TPA/2025/0042".into()),
        },
    )
    .unwrap();

    assert_eq!(affected, 1);
    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    let (sql, params) = &calls[0];
    assert_eq!(
        sql,
        "UPDATE claims SET status = $1, reason = $2, paid_amount = $3, \
         claim_ref = $4, updated_at = now() WHERE id = $5"
    );
    assert_eq!(*params, 5);
}

#[test]
fn update_status_with_status_only_still_bumps_updated_at() {
    let exec = RecordingExecutor::new(1);
    claim::update_status(
        &exec,
        7,
        &claim::StatusUpdate {
            status: "Query Raised".into(),
            ..Default::default()
        },
    )
    .unwrap();

    let (sql, params) = &exec.calls()[0];
    assert_eq!(
        sql,
        "UPDATE claims SET status = $1, updated_at = now() WHERE id = $2"
    );
    assert_eq!(*params, 2);
}

#[test]
fn update_status_of_missing_claim_reports_zero_rows() {
    let exec = RecordingExecutor::new(0);
    let affected = claim::update_status(
        &exec,
        999,
        &claim::StatusUpdate {
            status: "Rejected".into(),
            reason: Some("policy lapsed".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn unknown_status_never_reaches_the_database() {
    let exec = RecordingExecutor::new(1);
    let err = claim::update_status(
        &exec,
        42,
        &claim::StatusUpdate {
            status: "pre auth sent".into(), // wrong case
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("pre auth sent"));
    assert!(exec.calls().is_empty());
}

#[test]
fn delete_of_nonexistent_tpa_is_not_an_error() {
    let exec = RecordingExecutor::new(0);
    let affected = tpa::delete(&exec, "tpa-does-not-exist").unwrap();
    assert_eq!(affected, 0);
    let (sql, params) = &exec.calls()[0];
    assert_eq!(sql, "DELETE FROM tpas WHERE id = $1");
    assert_eq!(*params, 1);
}

#[test]
fn company_create_binds_every_column() {
    let exec = RecordingExecutor::new(1);
    let id = company::create(
        &exec,
        &company::NewCompany {
            name: "Acme Insurance".into(),
            email: Some("claims@acme.example".into()),
            phone: None,
            address: None,
            portal_link: Some("https://portal.acme.example".into()),
        },
    )
    .unwrap();

    assert!(id.starts_with("comp-"));
    let (sql, params) = &exec.calls()[0];
    assert!(sql.starts_with("INSERT INTO"));
    assert!(sql.contains("companies"));
    // id, name, email, phone, address, portal_link: all bound, none inlined.
    assert_eq!(*params, 6);
    assert!(!sql.contains("Acme"));
}

#[test]
fn junction_link_is_idempotent() {
    let exec = RecordingExecutor::new(1);
    company::link_hospital(&exec, "comp-1", "hosp-1").unwrap();
    let (sql, _) = &exec.calls()[0];
    assert!(sql.contains("ON CONFLICT DO NOTHING"));
}
