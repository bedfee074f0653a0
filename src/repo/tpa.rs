//! Third-Party Administrator repository.

use crate::executor::DbExecutor;
use crate::models::{Company, FromRow, Hospital, Tpa};
use crate::patch::Patch;
use crate::repo::{
    gen_id, require_nonempty, validate_email_opt, Page, Pagination, RepoError,
};
use crate::sql::{query_value, SqlArg};
use crate::values::with_converted_params;
use sea_query::{Alias, Asterisk, Order, PostgresQueryBuilder, Query};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTpa {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TpaUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A TPA plus its associated hospitals and insurers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TpaDetail {
    pub tpa: Tpa,
    pub hospitals: Vec<Hospital>,
    pub companies: Vec<Company>,
}

/// List TPAs ordered by name, with a separate COUNT total.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<Tpa>, RepoError> {
    let p = Pagination::new(page, limit);
    let (sql, values) = Query::select()
        .column(Asterisk)
        .from(Alias::new("tpas"))
        .order_by(Alias::new("name"), Order::Asc)
        .limit(p.limit)
        .offset(p.offset())
        .build(PostgresQueryBuilder);

    let rows = with_converted_params(&values, |params| executor.query_all(&sql, params))?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(Tpa::from_row(row)?);
    }

    let total: i64 = query_value(executor, "SELECT COUNT(*) FROM tpas", &[])?;
    Ok(Page { items, total })
}

/// Fetch one TPA with its junction-table associations, or `Ok(None)`.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: &str) -> Result<Option<TpaDetail>, RepoError> {
    let row = executor.query_opt("SELECT * FROM tpas WHERE id = $1", &[&id])?;
    let Some(row) = row else {
        return Ok(None);
    };
    let tpa = Tpa::from_row(&row)?;

    let hospital_rows = executor.query_all(
        "SELECT h.* FROM hospitals h \
         JOIN hospital_tpas ht ON ht.hospital_id = h.id \
         WHERE ht.tpa_id = $1 ORDER BY h.name",
        &[&id],
    )?;
    let mut hospitals = Vec::with_capacity(hospital_rows.len());
    for row in &hospital_rows {
        hospitals.push(Hospital::from_row(row)?);
    }

    let company_rows = executor.query_all(
        "SELECT DISTINCT c.* FROM companies c \
         JOIN hospital_companies hc ON hc.company_id = c.id \
         JOIN hospital_tpas ht ON ht.hospital_id = hc.hospital_id \
         WHERE ht.tpa_id = $1 ORDER BY c.name",
        &[&id],
    )?;
    let mut companies = Vec::with_capacity(company_rows.len());
    for row in &company_rows {
        companies.push(Company::from_row(row)?);
    }

    Ok(Some(TpaDetail {
        tpa,
        hospitals,
        companies,
    }))
}

/// Create a TPA and return its generated id (`tpa-<timestamp>`).
///
/// # Errors
///
/// Returns `RepoError::Validation` for missing name or malformed email;
/// `RepoError::Db` on driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewTpa) -> Result<String, RepoError> {
    require_nonempty("name", &new.name)?;
    validate_email_opt(new.email.as_deref())?;

    let id = gen_id("tpa");
    let (sql, values) = Query::insert()
        .into_table(Alias::new("tpas"))
        .columns([
            Alias::new("id"),
            Alias::new("name"),
            Alias::new("email"),
            Alias::new("phone"),
            Alias::new("address"),
        ])
        .values_panic([
            id.clone().into(),
            new.name.clone().into(),
            new.email.clone().into(),
            new.phone.clone().into(),
            new.address.clone().into(),
        ])
        .build(PostgresQueryBuilder);

    with_converted_params(&values, |params| executor.execute(&sql, params))?;
    Ok(id)
}

/// Apply a partial update. Returns rows affected; `0` means not found.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an empty field set or malformed
/// email; `RepoError::Db` on driver failure.
pub fn update<E: DbExecutor>(executor: &E, id: &str, update: &TpaUpdate) -> Result<u64, RepoError> {
    validate_email_opt(update.email.as_deref())?;

    let mut patch = Patch::new("tpas");
    patch.set_opt("name", update.name.clone().map(SqlArg::Text));
    patch.set_opt("email", update.email.clone().map(SqlArg::Text));
    patch.set_opt("phone", update.phone.clone().map(SqlArg::Text));
    patch.set_opt("address", update.address.clone().map(SqlArg::Text));
    patch.set_now("updated_at");

    let (sql, args) = patch.build("id", SqlArg::Text(id.to_string()))?;
    Ok(executor.execute(&sql, &args.params())?)
}

/// Unconditional delete by primary key; `0` rows affected means not found
/// and is reported without raising.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn delete<E: DbExecutor>(executor: &E, id: &str) -> Result<u64, RepoError> {
    Ok(executor.execute("DELETE FROM tpas WHERE id = $1", &[&id])?)
}

/// Associate a hospital with a TPA.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn link_hospital<E: DbExecutor>(
    executor: &E,
    tpa_id: &str,
    hospital_id: &str,
) -> Result<u64, RepoError> {
    Ok(executor.execute(
        "INSERT INTO hospital_tpas (hospital_id, tpa_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
        &[&hospital_id, &tpa_id],
    )?)
}

/// Remove a hospital association; `0` rows affected means it did not exist.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn unlink_hospital<E: DbExecutor>(
    executor: &E,
    tpa_id: &str,
    hospital_id: &str,
) -> Result<u64, RepoError> {
    Ok(executor.execute(
        "DELETE FROM hospital_tpas WHERE hospital_id = $1 AND tpa_id = $2",
        &[&hospital_id, &tpa_id],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let err = create(&crate::test_support::PanicExecutor, &NewTpa::default()).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_update_no_op_guard() {
        let err = update(
            &crate::test_support::PanicExecutor,
            "tpa-1",
            &TpaUpdate::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
