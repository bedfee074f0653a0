//! Custom form-field definitions, managed by admins.

use crate::executor::DbExecutor;
use crate::models::{FieldDef, FromRow};
use crate::repo::{require_nonempty, RepoError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    pub label: Option<String>,
    pub field_type: Option<String>,
}

/// List all field definitions in creation order. The set is small and
/// admin-curated, so this endpoint does not paginate.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn list<E: DbExecutor>(executor: &E) -> Result<Vec<FieldDef>, RepoError> {
    let rows = executor.query_all("SELECT * FROM fields ORDER BY id", &[])?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(FieldDef::from_row(row)?);
    }
    Ok(items)
}

/// Create a field definition and return the generated numeric id.
///
/// # Errors
///
/// Returns `RepoError::Validation` for a missing name; `RepoError::Db` on
/// driver failure.
pub fn create<E: DbExecutor>(executor: &E, new: &NewField) -> Result<i64, RepoError> {
    require_nonempty("name", &new.name)?;

    let row = executor.query_one(
        "INSERT INTO fields (name, label, field_type) VALUES ($1, $2, $3) RETURNING id",
        &[&new.name, &new.label, &new.field_type],
    )?;
    let id: i64 = row
        .try_get(0)
        .map_err(|e| crate::executor::DbError::Parse(format!("returned id: {e}")))?;
    Ok(id)
}

/// Unconditional delete by primary key; `0` rows affected means not found.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn delete<E: DbExecutor>(executor: &E, id: i64) -> Result<u64, RepoError> {
    Ok(executor.execute("DELETE FROM fields WHERE id = $1", &[&id])?)
}
