//! Hospital repository.

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
pub struct NewHospital {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A hospital plus its associated TPAs and insurers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalDetail {
    pub hospital: Hospital,
    pub tpas: Vec<Tpa>,
    pub companies: Vec<Company>,
}

/// List hospitals ordered by name, with a separate COUNT total.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<Hospital>, RepoError> {
    let p = Pagination::new(page, limit);
    let (sql, values) = Query::select()
        .column(Asterisk)
        .from(Alias::new("hospitals"))
        .order_by(Alias::new("name"), Order::Asc)
        .limit(p.limit)
        .offset(p.offset())
        .build(PostgresQueryBuilder);

    let rows = with_converted_params(&values, |params| executor.query_all(&sql, params))?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(Hospital::from_row(row)?);
    }

    let total: i64 = query_value(executor, "SELECT COUNT(*) FROM hospitals", &[])?;
    Ok(Page { items, total })
}

/// Fetch one hospital with its junction-table associations, or `Ok(None)`.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: &str) -> Result<Option<HospitalDetail>, RepoError> {
    let row = executor.query_opt("SELECT * FROM hospitals WHERE id = $1", &[&id])?;
    let Some(row) = row else {
        return Ok(None);
    };
    let hospital = Hospital::from_row(&row)?;

    let tpa_rows = executor.query_all(
        "SELECT t.* FROM tpas t \
         JOIN hospital_tpas ht ON ht.tpa_id = t.id \
         WHERE ht.hospital_id = $1 ORDER BY t.name",
        &[&id],
    )?;
    let mut tpas = Vec::with_capacity(tpa_rows.len());
    for row in &tpa_rows {
        tpas.push(Tpa::from_row(row)?);
    }

    let company_rows = executor.query_all(
        "SELECT c.* FROM companies c \
         JOIN hospital_companies hc ON hc.company_id = c.id \
         WHERE hc.hospital_id = $1 ORDER BY c.name",
        &[&id],
    )?;
    let mut companies = Vec::with_capacity(company_rows.len());
    for row in &company_rows {
        companies.push(Company::from_row(row)?);
    }

    Ok(Some(HospitalDetail {
        hospital,
        tpas,
        companies,
    }))
}

/// Create a hospital and return its generated id (`hosp-<timestamp>`).
///
/// # Errors
///
/// Returns `RepoError::Validation` for missing name or malformed email;
/// `RepoError::Db` on driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewHospital) -> Result<String, RepoError> {
    require_nonempty("name", &new.name)?;
    validate_email_opt(new.email.as_deref())?;

    let id = gen_id("hosp");
    let (sql, values) = Query::insert()
        .into_table(Alias::new("hospitals"))
        .columns([
            Alias::new("id"),
            Alias::new("name"),
            Alias::new("address"),
            Alias::new("city"),
            Alias::new("phone"),
            Alias::new("email"),
        ])
        .values_panic([
            id.clone().into(),
            new.name.clone().into(),
            new.address.clone().into(),
            new.city.clone().into(),
            new.phone.clone().into(),
            new.email.clone().into(),
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
pub fn update<E: DbExecutor>(
    executor: &E,
    id: &str,
    update: &HospitalUpdate,
) -> Result<u64, RepoError> {
    validate_email_opt(update.email.as_deref())?;

    let mut patch = Patch::new("hospitals");
    patch.set_opt("name", update.name.clone().map(SqlArg::Text));
    patch.set_opt("address", update.address.clone().map(SqlArg::Text));
    patch.set_opt("city", update.city.clone().map(SqlArg::Text));
    patch.set_opt("phone", update.phone.clone().map(SqlArg::Text));
    patch.set_opt("email", update.email.clone().map(SqlArg::Text));
    patch.set_now("updated_at");

    let (sql, args) = patch.build("id", SqlArg::Text(id.to_string()))?;
    Ok(executor.execute(&sql, &args.params())?)
}

/// Unconditional delete by primary key; `0` rows affected means not found.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn delete<E: DbExecutor>(executor: &E, id: &str) -> Result<u64, RepoError> {
    Ok(executor.execute("DELETE FROM hospitals WHERE id = $1", &[&id])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let err = create(&crate::test_support::PanicExecutor, &NewHospital::default())
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_update_no_op_guard() {
        let err = update(
            &crate::test_support::PanicExecutor,
            "hosp-1",
            &HospitalUpdate::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("No fields"));
    }
}
