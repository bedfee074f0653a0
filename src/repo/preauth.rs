//! Pre-authorization repository.
//!
//! A pre-auth correlates to at most one claim through `admission_id`. The
//! correlation is loose: claim lookups are LEFT JOINs and an orphaned
//! pre-auth (no claim yet) is an ordinary state, not an error.
//!
//! Pre-auth rows are never hard-deleted; a rejected or abandoned request
//! keeps its row and moves through `status` instead, so reports over
//! `admission_id` stay complete. There is deliberately no `delete` here.

use crate::executor::DbExecutor;
use crate::models::{FromRow, PreAuthRequest};
use crate::patch::Patch;
use crate::repo::{gen_id, require_nonempty, Page, Pagination, RepoError};
use crate::sql::{query_value, Args, SqlArg};
use crate::status::PreAuthStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Input for [`create`]. `admission_id` is generated when not supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPreAuth {
    pub patient_id: i64,
    pub hospital_id: String,
    pub tpa_id: Option<String>,
    pub company_id: Option<String>,
    pub total_expected_cost: Option<Decimal>,
    pub admission_id: Option<String>,
}

/// Input for [`update_status`]. `status` arrives as the raw request string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreAuthStatusUpdate {
    pub status: String,
    pub amount_sanctioned: Option<Decimal>,
}

/// Create a pre-auth in `Pending` status. Returns `(id, admission_id)`.
///
/// # Errors
///
/// Returns `RepoError::Validation` for a missing hospital id;
/// `RepoError::Db` on driver failure.
pub fn create<E: DbExecutor>(
    executor: &E,
    new: &NewPreAuth,
) -> Result<(i64, String), RepoError> {
    require_nonempty("hospital_id", &new.hospital_id)?;

    let admission_id = match &new.admission_id {
        Some(id) if !id.trim().is_empty() => id.clone(),
        _ => gen_id("adm"),
    };
    let status = PreAuthStatus::Pending.as_str();
    let row = executor.query_one(
        "INSERT INTO preauth_request \
         (patient_id, hospital_id, tpa_id, company_id, status, total_expected_cost, admission_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        &[
            &new.patient_id,
            &new.hospital_id,
            &new.tpa_id,
            &new.company_id,
            &status,
            &new.total_expected_cost,
            &admission_id,
        ],
    )?;
    let id: i64 = row
        .try_get(0)
        .map_err(|e| crate::executor::DbError::Parse(format!("returned id: {e}")))?;
    Ok((id, admission_id))
}

/// Fetch one pre-auth, or `Ok(None)` when no row matches.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: i64) -> Result<Option<PreAuthRequest>, RepoError> {
    let row = executor.query_opt("SELECT * FROM preauth_request WHERE id = $1", &[&id])?;
    row.map(|row| PreAuthRequest::from_row(&row))
        .transpose()
        .map_err(Into::into)
}

/// Fetch the pre-auth behind an admission, or `Ok(None)`.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get_by_admission<E: DbExecutor>(
    executor: &E,
    admission_id: &str,
) -> Result<Option<PreAuthRequest>, RepoError> {
    let row = executor.query_opt(
        "SELECT * FROM preauth_request WHERE admission_id = $1 ORDER BY id LIMIT 1",
        &[&admission_id],
    )?;
    row.map(|row| PreAuthRequest::from_row(&row))
        .transpose()
        .map_err(Into::into)
}

/// List pre-auths newest first, optionally scoped to one hospital and/or
/// one status.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an unknown status string;
/// `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    hospital_id: Option<&str>,
    status: Option<&str>,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<PreAuthRequest>, RepoError> {
    let p = Pagination::new(page, limit);
    let status: Option<PreAuthStatus> = status.map(str::parse).transpose()?;

    let mut args = Args::new();
    let mut clauses = Vec::new();
    if let Some(hospital_id) = hospital_id {
        let ph = args.add(SqlArg::Text(hospital_id.to_string()));
        clauses.push(format!("hospital_id = {ph}"));
    }
    if let Some(status) = status {
        let ph = args.add(SqlArg::Text(status.as_str().to_string()));
        clauses.push(format!("status = {ph}"));
    }
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM preauth_request{where_clause}");
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let limit_ph = args.add(SqlArg::BigInt(p.limit as i64));
    let offset_ph = args.add(SqlArg::BigInt(p.offset() as i64));
    let sql = format!(
        "SELECT * FROM preauth_request{where_clause} ORDER BY created_at DESC \
         LIMIT {limit_ph} OFFSET {offset_ph}"
    );
    let rows = executor.query_all(&sql, &args.params())?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(PreAuthRequest::from_row(row)?);
    }
    Ok(Page { items, total })
}

/// Update a pre-auth's status; bumps `updated_at`. Returns rows affected.
///
/// # Errors
///
/// Returns `RepoError::Validation` when `status` is empty or unknown;
/// `RepoError::Db` on driver failure.
pub fn update_status<E: DbExecutor>(
    executor: &E,
    id: i64,
    update: &PreAuthStatusUpdate,
) -> Result<u64, RepoError> {
    require_nonempty("status", &update.status)?;
    let status: PreAuthStatus = update.status.parse()?;

    let mut patch = Patch::new("preauth_request");
    patch.set("status", SqlArg::Text(status.as_str().to_string()));
    patch.set_opt(
        "amount_sanctioned",
        update.amount_sanctioned.map(SqlArg::Numeric),
    );
    patch.set_now("updated_at");

    let (sql, args) = patch.build("id", SqlArg::BigInt(id))?;
    Ok(executor.execute(&sql, &args.params())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_hospital() {
        let err = create(&crate::test_support::PanicExecutor, &NewPreAuth::default())
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_update_status_rejects_claim_only_value() {
        // "Pre auth Sent" belongs to the claim vocabulary, not pre-auth.
        let update = PreAuthStatusUpdate {
            status: "Pre auth Sent".into(),
            amount_sanctioned: None,
        };
        let err =
            update_status(&crate::test_support::PanicExecutor, 9, &update).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_list_rejects_unknown_status() {
        let err = list(
            &crate::test_support::PanicExecutor,
            None,
            Some("Done"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
