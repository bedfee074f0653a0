//! Raw-SQL helpers.
//!
//! Reports and the money-carrying mutations are written as raw parameterized
//! SQL (`$1`, `$2`, ...) rather than built statements: the aggregation
//! queries lean on correlated subqueries and `COALESCE` shapes that are
//! clearer spelled out. [`Args`] owns the bind values so the borrow for the
//! driver's `&[&dyn ToSql]` slice stays valid for the call.
//!
//! User input is only ever bound, never concatenated into the SQL text.

use crate::executor::{DbError, DbExecutor};
use chrono::{DateTime, Utc};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;

/// An owned SQL bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Text(String),
    OptText(Option<String>),
    Int(i32),
    BigInt(i64),
    Bool(bool),
    Numeric(Decimal),
    OptNumeric(Option<Decimal>),
    Timestamp(DateTime<Utc>),
}

impl SqlArg {
    fn as_dyn(&self) -> &dyn ToSql {
        match self {
            SqlArg::Text(v) => v,
            SqlArg::OptText(v) => v,
            SqlArg::Int(v) => v,
            SqlArg::BigInt(v) => v,
            SqlArg::Bool(v) => v,
            SqlArg::Numeric(v) => v,
            SqlArg::OptNumeric(v) => v,
            SqlArg::Timestamp(v) => v,
        }
    }
}

/// An ordered list of bind values with `$n` placeholder bookkeeping.
#[derive(Debug, Default)]
pub struct Args {
    values: Vec<SqlArg>,
}

impl Args {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value and return its placeholder (`"$1"`, `"$2"`, ...).
    pub fn add(&mut self, value: SqlArg) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[SqlArg] {
        &self.values
    }

    /// Borrow the values as a driver-ready parameter slice.
    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(SqlArg::as_dyn).collect()
    }
}

/// Query a single value from the first column of the first row.
///
/// Used for the separate `COUNT(*)` queries that back list/report totals.
///
/// # Errors
///
/// Returns `DbError` if execution fails, no row comes back, or the value
/// cannot be converted to `T`.
pub fn query_value<T, E: DbExecutor>(
    executor: &E,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<T, DbError>
where
    T: for<'a> may_postgres::types::FromSql<'a>,
{
    let row = executor.query_one(sql, params)?;
    row.try_get::<usize, T>(0)
        .map_err(|e| DbError::Parse(format!("Failed to extract value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_placeholders_are_ordinal() {
        let mut args = Args::new();
        assert_eq!(args.add(SqlArg::Text("h1".into())), "$1");
        assert_eq!(args.add(SqlArg::Int(5)), "$2");
        assert_eq!(args.add(SqlArg::Bool(true)), "$3");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_args_params_len_matches() {
        let mut args = Args::new();
        args.add(SqlArg::Numeric(Decimal::new(5000, 0)));
        args.add(SqlArg::OptText(None));
        assert_eq!(args.params().len(), 2);
    }

    #[test]
    fn test_args_empty() {
        let args = Args::new();
        assert!(args.is_empty());
        assert!(args.params().is_empty());
    }
}
