//! Patient repository.
//!
//! The photo column is stored exactly as submitted (historically either a
//! JSON blob or a bare URL) and decoded on read via [`crate::media`].

use crate::executor::DbExecutor;
use crate::models::{FromRow, Patient};
use crate::patch::Patch;
use crate::repo::{require_nonempty, Page, Pagination, RepoError};
use crate::sql::{query_value, SqlArg};
use crate::values::with_converted_params;
use sea_query::{Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub hospital_id: Option<String>,
    /// Raw photo column value; both the JSON-blob and bare-URL shapes are
    /// accepted and stored untouched.
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub hospital_id: Option<String>,
    pub photo: Option<String>,
}

/// List patients, optionally scoped to one hospital, ordered by name.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    hospital_id: Option<&str>,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<Patient>, RepoError> {
    let p = Pagination::new(page, limit);

    let mut select = Query::select();
    select
        .column(Asterisk)
        .from(Alias::new("patients"))
        .order_by(Alias::new("name"), Order::Asc)
        .limit(p.limit)
        .offset(p.offset());
    if let Some(hospital_id) = hospital_id {
        select.and_where(Expr::col(Alias::new("hospital_id")).eq(hospital_id));
    }
    let (sql, values) = select.build(PostgresQueryBuilder);

    let rows = with_converted_params(&values, |params| executor.query_all(&sql, params))?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(Patient::from_row(row)?);
    }

    // Same predicate, separate query; total and page may straddle a write.
    let total: i64 = match hospital_id {
        Some(hospital_id) => query_value(
            executor,
            "SELECT COUNT(*) FROM patients WHERE hospital_id = $1",
            &[&hospital_id],
        )?,
        None => query_value(executor, "SELECT COUNT(*) FROM patients", &[])?,
    };
    Ok(Page { items, total })
}

/// Fetch one patient, or `Ok(None)` when no row matches.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: i64) -> Result<Option<Patient>, RepoError> {
    let row = executor.query_opt("SELECT * FROM patients WHERE id = $1", &[&id])?;
    row.map(|row| Patient::from_row(&row)).transpose().map_err(Into::into)
}

/// Create a patient and return the generated numeric id.
///
/// # Errors
///
/// Returns `RepoError::Validation` for a missing name; `RepoError::Db` on
/// driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewPatient) -> Result<i64, RepoError> {
    require_nonempty("name", &new.name)?;

    let row = executor.query_one(
        "INSERT INTO patients (name, hospital_id, photo) VALUES ($1, $2, $3) RETURNING id",
        &[&new.name, &new.hospital_id, &new.photo],
    )?;
    let id: i64 = row
        .try_get(0)
        .map_err(|e| crate::executor::DbError::Parse(format!("returned id: {e}")))?;
    Ok(id)
}

/// Apply a partial update. Returns rows affected; `0` means not found.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an empty field set; `RepoError::Db`
/// on driver failure.
pub fn update<E: DbExecutor>(
    executor: &E,
    id: i64,
    update: &PatientUpdate,
) -> Result<u64, RepoError> {
    let mut patch = Patch::new("patients");
    patch.set_opt("name", update.name.clone().map(SqlArg::Text));
    patch.set_opt("hospital_id", update.hospital_id.clone().map(SqlArg::Text));
    patch.set_opt("photo", update.photo.clone().map(SqlArg::Text));

    let (sql, args) = patch.build("id", SqlArg::BigInt(id))?;
    Ok(executor.execute(&sql, &args.params())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let err = create(&crate::test_support::PanicExecutor, &NewPatient::default())
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_update_no_op_guard() {
        let err = update(
            &crate::test_support::PanicExecutor,
            7,
            &PatientUpdate::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_list_sql_includes_hospital_filter_only_when_present() {
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from(Alias::new("patients"))
            .and_where(Expr::col(Alias::new("hospital_id")).eq("hosp-1"));
        let (sql, values) = select.build(PostgresQueryBuilder);
        assert!(sql.contains("hospital_id"));
        assert_eq!(values.iter().count(), 1);
    }
}
