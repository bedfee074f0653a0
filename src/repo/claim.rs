//! Claim repository.
//!
//! The status update is the workhorse of the claims workflow: any
//! authorized caller may set any enumerated status; reachability from the
//! current status is deliberately not validated. Unknown status strings are
//! rejected before the database is touched.

use crate::executor::DbExecutor;
use crate::models::{Claim, FromRow};
use crate::patch::Patch;
use crate::repo::{require_nonempty, Page, Pagination, RepoError};
use crate::sql::{query_value, Args, SqlArg};
use crate::status::ClaimStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Input for [`create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaim {
    /// Correlation key back to the pre-authorization/admission.
    pub admission_id: String,
    pub status: ClaimStatus,
    pub amount: Option<Decimal>,
}

/// Input for [`update_status`]. `status` arrives as the raw request string
/// and must parse to a [`ClaimStatus`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    pub reason: Option<String>,
    pub paid_amount: Option<Decimal>,
    /// External reference number assigned by the TPA/insurer.
    pub claim_ref: Option<String>,
}

/// Create a claim and return the generated numeric id.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an empty admission id;
/// `RepoError::Db` on driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewClaim) -> Result<i64, RepoError> {
    require_nonempty("admission_id", &new.admission_id)?;

    let status = new.status.as_str();
    let row = executor.query_one(
        "INSERT INTO claims (admission_id, status, amount) VALUES ($1, $2, $3) RETURNING id",
        &[&new.admission_id, &status, &new.amount],
    )?;
    let id: i64 = row
        .try_get(0)
        .map_err(|e| crate::executor::DbError::Parse(format!("returned id: {e}")))?;
    Ok(id)
}

/// Fetch one claim, or `Ok(None)` when no row matches.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: i64) -> Result<Option<Claim>, RepoError> {
    let row = executor.query_opt("SELECT * FROM claims WHERE id = $1", &[&id])?;
    row.map(|row| Claim::from_row(&row)).transpose().map_err(Into::into)
}

/// Fetch the claim correlated to an admission, or `Ok(None)`.
///
/// The correlation is not enforced by a foreign key in all paths; an
/// admission may have no claim at all.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get_by_admission<E: DbExecutor>(
    executor: &E,
    admission_id: &str,
) -> Result<Option<Claim>, RepoError> {
    let row = executor.query_opt(
        "SELECT * FROM claims WHERE admission_id = $1 ORDER BY id LIMIT 1",
        &[&admission_id],
    )?;
    row.map(|row| Claim::from_row(&row)).transpose().map_err(Into::into)
}

/// List claims newest first, optionally filtered to one status.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an unknown status string;
/// `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    status: Option<&str>,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<Claim>, RepoError> {
    let p = Pagination::new(page, limit);
    let status: Option<ClaimStatus> = status.map(str::parse).transpose()?;

    let mut args = Args::new();
    let mut where_clause = String::new();
    if let Some(status) = status {
        let ph = args.add(SqlArg::Text(status.as_str().to_string()));
        where_clause = format!(" WHERE status = {ph}");
    }

    let count_sql = format!("SELECT COUNT(*) FROM claims{where_clause}");
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let limit_ph = args.add(SqlArg::BigInt(p.limit as i64));
    let offset_ph = args.add(SqlArg::BigInt(p.offset() as i64));
    let sql = format!(
        "SELECT * FROM claims{where_clause} ORDER BY created_at DESC \
         LIMIT {limit_ph} OFFSET {offset_ph}"
    );
    let rows = executor.query_all(&sql, &args.params())?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(Claim::from_row(row)?);
    }
    Ok(Page { items, total })
}

/// Update a claim's status and the optional accompanying fields.
///
/// `updated_at` is always bumped to the current server timestamp. Returns
/// rows affected: `0` means no claim with that id exists, reported without
/// raising; callers translate it into their own not-found outcome.
///
/// # Errors
///
/// Returns `RepoError::Validation` when `status` is empty or not one of
/// the enumerated values; `RepoError::Db` on driver failure.
pub fn update_status<E: DbExecutor>(
    executor: &E,
    id: i64,
    update: &StatusUpdate,
) -> Result<u64, RepoError> {
    require_nonempty("status", &update.status)?;
    let status: ClaimStatus = update.status.parse()?;

    let mut patch = Patch::new("claims");
    patch.set("status", SqlArg::Text(status.as_str().to_string()));
    patch.set_opt("reason", update.reason.clone().map(SqlArg::Text));
    patch.set_opt("paid_amount", update.paid_amount.map(SqlArg::Numeric));
    patch.set_opt("claim_ref", update.claim_ref.clone().map(SqlArg::Text));
    patch.set_now("updated_at");

    let (sql, args) = patch.build("id", SqlArg::BigInt(id))?;
    Ok(executor.execute(&sql, &args.params())?)
}

/// Update settlement figures on a claim. Returns rows affected.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an empty field set;
/// `RepoError::Db` on driver failure.
pub fn update_settlement<E: DbExecutor>(
    executor: &E,
    id: i64,
    update: &SettlementUpdate,
) -> Result<u64, RepoError> {
    let mut patch = Patch::new("claims");
    patch.set_opt("final_bill", update.final_bill.map(SqlArg::Numeric));
    patch.set_opt(
        "hospital_discount",
        update.hospital_discount.map(SqlArg::Numeric),
    );
    patch.set_opt("nm_deductions", update.nm_deductions.map(SqlArg::Numeric));
    patch.set_opt("co_pay", update.co_pay.map(SqlArg::Numeric));
    patch.set_opt("final_amount", update.final_amount.map(SqlArg::Numeric));
    patch.set_opt("tds", update.tds.map(SqlArg::Numeric));
    patch.set_opt(
        "final_settle_amount",
        update.final_settle_amount.map(SqlArg::Numeric),
    );
    patch.set_now("updated_at");

    let (sql, args) = patch.build("id", SqlArg::BigInt(id))?;
    Ok(executor.execute(&sql, &args.params())?)
}

/// Partial settlement figures for [`update_settlement`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementUpdate {
    pub final_bill: Option<Decimal>,
    pub hospital_discount: Option<Decimal>,
    pub nm_deductions: Option<Decimal>,
    pub co_pay: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub tds: Option<Decimal>,
    pub final_settle_amount: Option<Decimal>,
}

/// Unconditional delete by primary key; `0` rows affected means not found.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn delete<E: DbExecutor>(executor: &E, id: i64) -> Result<u64, RepoError> {
    Ok(executor.execute("DELETE FROM claims WHERE id = $1", &[&id])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_status_rejects_empty() {
        let err = update_status(
            &crate::test_support::PanicExecutor,
            42,
            &StatusUpdate::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_update_status_rejects_unknown_value() {
        let update = StatusUpdate {
            status: "Shipped".into(),
            ..Default::default()
        };
        let err =
            update_status(&crate::test_support::PanicExecutor, 42, &update).unwrap_err();
        assert!(err.to_string().contains("Shipped"));
    }

    #[test]
    fn test_list_rejects_unknown_status_filter() {
        let err = list(
            &crate::test_support::PanicExecutor,
            Some("Nonsense"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_settlement_update_no_op_guard() {
        let err = update_settlement(
            &crate::test_support::PanicExecutor,
            42,
            &SettlementUpdate::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("No fields"));
    }
}
