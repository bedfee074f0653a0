//! Insurance-company repository.

use crate::executor::DbExecutor;
use crate::models::{Company, FromRow, Hospital};
use crate::patch::Patch;
use crate::repo::{
    gen_id, require_nonempty, validate_email_opt, validate_url_opt, Page, Pagination, RepoError,
};
use crate::sql::{query_value, SqlArg};
use crate::values::with_converted_params;
use sea_query::{Alias, Asterisk, Order, PostgresQueryBuilder, Query};
use serde::{Deserialize, Serialize};

/// Input for [`create`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub portal_link: Option<String>,
}

/// Partial input for [`update`]; absent fields stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub portal_link: Option<String>,
}

/// A company plus its associated hospitals (via `hospital_companies`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDetail {
    pub company: Company,
    pub hospitals: Vec<Hospital>,
}

/// List companies ordered by name.
///
/// `total` comes from a separate COUNT over the same predicate.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<Company>, RepoError> {
    let p = Pagination::new(page, limit);
    let (sql, values) = Query::select()
        .column(Asterisk)
        .from(Alias::new("companies"))
        .order_by(Alias::new("name"), Order::Asc)
        .limit(p.limit)
        .offset(p.offset())
        .build(PostgresQueryBuilder);

    let rows = with_converted_params(&values, |params| executor.query_all(&sql, params))?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(Company::from_row(row)?);
    }

    let total: i64 = query_value(executor, "SELECT COUNT(*) FROM companies", &[])?;
    Ok(Page { items, total })
}

/// Fetch one company with its associated hospitals.
///
/// Returns `Ok(None)` (not an error) when no row matches.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: &str) -> Result<Option<CompanyDetail>, RepoError> {
    let row = executor.query_opt("SELECT * FROM companies WHERE id = $1", &[&id])?;
    let Some(row) = row else {
        return Ok(None);
    };
    let company = Company::from_row(&row)?;

    let rows = executor.query_all(
        "SELECT h.* FROM hospitals h \
         JOIN hospital_companies hc ON hc.hospital_id = h.id \
         WHERE hc.company_id = $1 ORDER BY h.name",
        &[&id],
    )?;
    let mut hospitals = Vec::with_capacity(rows.len());
    for row in &rows {
        hospitals.push(Hospital::from_row(row)?);
    }

    Ok(Some(CompanyDetail { company, hospitals }))
}

/// Create a company and return its generated id (`comp-<timestamp>`).
///
/// Duplicate names are allowed; there is no uniqueness constraint.
///
/// # Errors
///
/// Returns `RepoError::Validation` for a missing name, malformed email, or
/// non-http(s) portal link; `RepoError::Db` on driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewCompany) -> Result<String, RepoError> {
    require_nonempty("name", &new.name)?;
    validate_email_opt(new.email.as_deref())?;
    validate_url_opt("portal_link", new.portal_link.as_deref())?;

    let id = gen_id("comp");
    let (sql, values) = Query::insert()
        .into_table(Alias::new("companies"))
        .columns([
            Alias::new("id"),
            Alias::new("name"),
            Alias::new("email"),
            Alias::new("phone"),
            Alias::new("address"),
            Alias::new("portal_link"),
        ])
        .values_panic([
            id.clone().into(),
            new.name.clone().into(),
            new.email.clone().into(),
            new.phone.clone().into(),
            new.address.clone().into(),
            new.portal_link.clone().into(),
        ])
        .build(PostgresQueryBuilder);

    with_converted_params(&values, |params| executor.execute(&sql, params))?;
    Ok(id)
}

/// Apply a partial update. Returns rows affected; `0` means not found.
///
/// # Errors
///
/// Returns `RepoError::Validation` when every field is absent (no-op
/// guard) or a present field is malformed; `RepoError::Db` on driver
/// failure.
pub fn update<E: DbExecutor>(
    executor: &E,
    id: &str,
    update: &CompanyUpdate,
) -> Result<u64, RepoError> {
    validate_email_opt(update.email.as_deref())?;
    validate_url_opt("portal_link", update.portal_link.as_deref())?;

    let mut patch = Patch::new("companies");
    patch.set_opt("name", update.name.clone().map(SqlArg::Text));
    patch.set_opt("email", update.email.clone().map(SqlArg::Text));
    patch.set_opt("phone", update.phone.clone().map(SqlArg::Text));
    patch.set_opt("address", update.address.clone().map(SqlArg::Text));
    patch.set_opt("portal_link", update.portal_link.clone().map(SqlArg::Text));
    patch.set_now("updated_at");

    let (sql, args) = patch.build("id", SqlArg::Text(id.to_string()))?;
    Ok(executor.execute(&sql, &args.params())?)
}

/// Unconditional delete by primary key. Returns rows affected; `0` means
/// not found and is not an error.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn delete<E: DbExecutor>(executor: &E, id: &str) -> Result<u64, RepoError> {
    Ok(executor.execute("DELETE FROM companies WHERE id = $1", &[&id])?)
}

/// Associate a hospital with a company.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn link_hospital<E: DbExecutor>(
    executor: &E,
    company_id: &str,
    hospital_id: &str,
) -> Result<u64, RepoError> {
    Ok(executor.execute(
        "INSERT INTO hospital_companies (hospital_id, company_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
        &[&hospital_id, &company_id],
    )?)
}

/// Remove a hospital association. `0` rows affected means it did not exist.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn unlink_hospital<E: DbExecutor>(
    executor: &E,
    company_id: &str,
    hospital_id: &str,
) -> Result<u64, RepoError> {
    Ok(executor.execute(
        "DELETE FROM hospital_companies WHERE hospital_id = $1 AND company_id = $2",
        &[&hospital_id, &company_id],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let new = NewCompany {
            name: "  ".into(),
            ..Default::default()
        };
        // Validation fires before any executor call, so a panicking executor
        // proves the guard ordering.
        let err = create(&crate::test_support::PanicExecutor, &new).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let new = NewCompany {
            name: "Acme Insurance".into(),
            email: Some("nope".into()),
            ..Default::default()
        };
        let err = create(&crate::test_support::PanicExecutor, &new).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_create_rejects_bad_portal_link() {
        let new = NewCompany {
            name: "Acme Insurance".into(),
            portal_link: Some("portal.acme.com".into()),
            ..Default::default()
        };
        let err = create(&crate::test_support::PanicExecutor, &new).unwrap_err();
        assert!(err.to_string().contains("portal_link"));
    }

    #[test]
    fn test_update_with_no_fields_rejected() {
        let err = update(
            &crate::test_support::PanicExecutor,
            "comp-1",
            &CompanyUpdate::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_list_sql_orders_by_name() {
        let (sql, _) = Query::select()
            .column(Asterisk)
            .from(Alias::new("companies"))
            .order_by(Alias::new("name"), Order::Asc)
            .limit(10)
            .offset(0)
            .build(PostgresQueryBuilder);
        assert!(sql.contains("ORDER BY"));
        assert!(sql.contains("name"));
    }
}
