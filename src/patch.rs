//! Partial-update builder.
//!
//! Update endpoints accept partial input; only the columns actually present
//! become SET assignments. An empty patch is rejected before any database
//! call. Column names are compile-time constants; only values are bound.

use crate::sql::{Args, SqlArg};
use std::fmt;

/// Error for a patch with no assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyPatch;

impl fmt::Display for EmptyPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("No fields provided to update")
    }
}

impl std::error::Error for EmptyPatch {}

/// Builder collecting SET assignments for one UPDATE statement.
///
/// # Examples
///
/// ```
/// use claimbase::patch::Patch;
/// use claimbase::sql::SqlArg;
///
/// let mut patch = Patch::new("companies");
/// patch.set("name", SqlArg::Text("Acme Insurance".into()));
/// patch.set_now("updated_at");
/// let (sql, args) = patch.build("id", SqlArg::Text("comp-1".into())).unwrap();
/// assert_eq!(sql, "UPDATE companies SET name = $1, updated_at = now() WHERE id = $2");
/// assert_eq!(args.len(), 2);
/// ```
pub struct Patch {
    table: &'static str,
    assignments: Vec<String>,
    args: Args,
    touched: usize,
}

impl Patch {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            args: Args::new(),
            touched: 0,
        }
    }

    /// Assign a bound value to a column.
    pub fn set(&mut self, column: &'static str, value: SqlArg) -> &mut Self {
        let placeholder = self.args.add(value);
        self.assignments.push(format!("{column} = {placeholder}"));
        self.touched += 1;
        self
    }

    /// Assign only when the value is present; absent fields stay untouched.
    pub fn set_opt(&mut self, column: &'static str, value: Option<SqlArg>) -> &mut Self {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    /// Assign the server-side current timestamp.
    ///
    /// Does not count toward the no-op guard: `updated_at = now()` alone is
    /// still an empty patch.
    pub fn set_now(&mut self, column: &'static str) -> &mut Self {
        self.assignments.push(format!("{column} = now()"));
        self
    }

    /// True when no caller-supplied field has been assigned.
    pub fn is_empty(&self) -> bool {
        self.touched == 0
    }

    /// Produce the UPDATE statement and its bind values.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyPatch`] when no caller-supplied field was assigned;
    /// callers surface this as a validation error without touching the
    /// database.
    pub fn build(mut self, id_column: &'static str, id: SqlArg) -> Result<(String, Args), EmptyPatch> {
        if self.is_empty() {
            return Err(EmptyPatch);
        }
        let id_placeholder = self.args.add(id);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table,
            self.assignments.join(", "),
            id_column,
            id_placeholder
        );
        Ok((sql, self.args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_only_present_fields_are_assigned() {
        let mut patch = Patch::new("hospitals");
        patch.set_opt("name", Some(SqlArg::Text("City Care".into())));
        patch.set_opt("address", None);
        patch.set_opt("phone", Some(SqlArg::Text("12345".into())));
        let (sql, args) = patch.build("id", SqlArg::Text("hosp-1".into())).unwrap();
        assert_eq!(
            sql,
            "UPDATE hospitals SET name = $1, phone = $2 WHERE id = $3"
        );
        assert_eq!(args.len(), 3);
        assert!(!sql.contains("address"));
    }

    #[test]
    fn test_empty_patch_rejected() {
        let patch = Patch::new("companies");
        let err = patch.build("id", SqlArg::Text("comp-1".into())).unwrap_err();
        assert_eq!(err, EmptyPatch);
        assert!(err.to_string().contains("No fields"));
    }

    #[test]
    fn test_set_now_alone_is_still_empty() {
        let mut patch = Patch::new("claims");
        patch.set_now("updated_at");
        assert!(patch.is_empty());
        assert!(patch.build("id", SqlArg::BigInt(1)).is_err());
    }

    #[test]
    fn test_numeric_assignment() {
        let mut patch = Patch::new("claims");
        patch.set("paid_amount", SqlArg::Numeric(Decimal::new(450000, 2)));
        patch.set_now("updated_at");
        let (sql, args) = patch.build("id", SqlArg::BigInt(42)).unwrap();
        assert_eq!(
            sql,
            "UPDATE claims SET paid_amount = $1, updated_at = now() WHERE id = $2"
        );
        assert_eq!(args.len(), 2);
    }
}
