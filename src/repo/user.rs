//! User repository.
//!
//! Users carry a role plus an optional hospital or company scope. Password
//! handling lives with the caller; this module stores only the identity
//! fields a token is later minted from.

use crate::executor::DbExecutor;
use crate::models::{FromRow, Role, User};
use crate::patch::Patch;
use crate::repo::{require_nonempty, validate_email_opt, Page, Pagination, RepoError};
use crate::sql::{query_value, SqlArg};
use crate::values::with_converted_params;
use sea_query::{Alias, Asterisk, Order, PostgresQueryBuilder, Query};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub hospital_id: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub hospital_id: Option<String>,
    pub company_id: Option<String>,
}

/// List users ordered by name, with a separate COUNT total.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(
    executor: &E,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<User>, RepoError> {
    let p = Pagination::new(page, limit);
    let (sql, values) = Query::select()
        .column(Asterisk)
        .from(Alias::new("users"))
        .order_by(Alias::new("name"), Order::Asc)
        .limit(p.limit)
        .offset(p.offset())
        .build(PostgresQueryBuilder);

    let rows = with_converted_params(&values, |params| executor.query_all(&sql, params))?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(User::from_row(row)?);
    }

    let total: i64 = query_value(executor, "SELECT COUNT(*) FROM users", &[])?;
    Ok(Page { items, total })
}

/// Fetch one user by id, or `Ok(None)`.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get<E: DbExecutor>(executor: &E, id: i64) -> Result<Option<User>, RepoError> {
    let row = executor.query_opt("SELECT * FROM users WHERE id = $1", &[&id])?;
    row.map(|row| User::from_row(&row)).transpose().map_err(Into::into)
}

/// Fetch one user by email (the login key), or `Ok(None)`.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn get_by_email<E: DbExecutor>(executor: &E, email: &str) -> Result<Option<User>, RepoError> {
    let row = executor.query_opt("SELECT * FROM users WHERE email = $1", &[&email])?;
    row.map(|row| User::from_row(&row)).transpose().map_err(Into::into)
}

/// Create a user and return the generated numeric id.
///
/// # Errors
///
/// Returns `RepoError::Validation` for missing name/email or a malformed
/// email; `RepoError::Db` on driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewUser) -> Result<i64, RepoError> {
    require_nonempty("name", &new.name)?;
    require_nonempty("email", &new.email)?;
    validate_email_opt(Some(&new.email))?;

    let role = new.role.as_str();
    let row = executor.query_one(
        "INSERT INTO users (name, email, role, hospital_id, company_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
        &[
            &new.name,
            &new.email,
            &role,
            &new.hospital_id,
            &new.company_id,
        ],
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
/// Returns `RepoError::Validation` for an empty field set or malformed
/// email; `RepoError::Db` on driver failure.
pub fn update<E: DbExecutor>(executor: &E, id: i64, update: &UserUpdate) -> Result<u64, RepoError> {
    validate_email_opt(update.email.as_deref())?;

    let mut patch = Patch::new("users");
    patch.set_opt("name", update.name.clone().map(SqlArg::Text));
    patch.set_opt("email", update.email.clone().map(SqlArg::Text));
    patch.set_opt(
        "role",
        update.role.map(|r| SqlArg::Text(r.as_str().to_string())),
    );
    patch.set_opt("hospital_id", update.hospital_id.clone().map(SqlArg::Text));
    patch.set_opt("company_id", update.company_id.clone().map(SqlArg::Text));

    let (sql, args) = patch.build("id", SqlArg::BigInt(id))?;
    Ok(executor.execute(&sql, &args.params())?)
}

/// Unconditional delete by primary key; `0` rows affected means not found.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn delete<E: DbExecutor>(executor: &E, id: i64) -> Result<u64, RepoError> {
    Ok(executor.execute("DELETE FROM users WHERE id = $1", &[&id])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            name: "Asha".into(),
            email: "asha@clinic.example".into(),
            role: Role::HospitalStaff,
            hospital_id: Some("hosp-1".into()),
            company_id: None,
        }
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let mut user = new_user();
        user.email = "not-an-email".into();
        let err = create(&crate::test_support::PanicExecutor, &user).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn test_create_requires_name() {
        let mut user = new_user();
        user.name = "  ".into();
        let err = create(&crate::test_support::PanicExecutor, &user).unwrap_err();
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn test_update_no_op_guard() {
        let err = update(
            &crate::test_support::PanicExecutor,
            3,
            &UserUpdate::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
