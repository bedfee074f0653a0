//! SeaQuery value binding for `may_postgres`.
//!
//! Statements built with `sea-query` come back as `(sql, Values)`; the
//! driver wants `&[&dyn ToSql]`. Conversion is two passes: collect owned
//! values into typed vectors first, then build the reference slice, so the
//! borrows stay valid for the closure that runs the query.

use crate::executor::DbError;
use may_postgres::types::ToSql;
use sea_query::Value;

/// Convert SeaQuery values into driver parameters and run `f` with them.
///
/// # Errors
///
/// Returns `DbError::Other` for value types this crate never binds through
/// SeaQuery (timestamps and decimals go through [`crate::sql::Args`]
/// instead).
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, DbError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, DbError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut doubles: Vec<f64> = Vec::new();
    let mut nulls: Vec<Option<String>> = Vec::new();

    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::Int(Some(i)) => ints.push(*i),
            Value::TinyInt(Some(i)) => ints.push(*i as i32),
            Value::SmallInt(Some(i)) => ints.push(*i as i32),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::Unsigned(Some(u)) => big_ints.push(i64::from(*u)),
            Value::BigUnsigned(Some(u)) => big_ints.push(*u as i64),
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::Double(Some(d)) => doubles.push(*d),
            Value::Json(Some(j)) => {
                strings.push(
                    serde_json::to_string(j)
                        .map_err(|e| DbError::Other(format!("Failed to serialize JSON: {e}")))?,
                );
            }
            Value::Bool(None)
            | Value::Int(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::BigInt(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::String(None)
            | Value::Double(None)
            | Value::Json(None) => nulls.push(None),
            other => {
                return Err(DbError::Other(format!(
                    "Unsupported value type in query: {other:?}"
                )));
            }
        }
    }

    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut double_idx = 0;
    let mut null_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::new();

    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::Int(Some(_)) | Value::TinyInt(Some(_)) | Value::SmallInt(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) | Value::BigUnsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::String(Some(_)) | Value::Json(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Double(Some(_)) => {
                params.push(&doubles[double_idx] as &dyn ToSql);
                double_idx += 1;
            }
            Value::Bool(None)
            | Value::Int(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::BigInt(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::String(None)
            | Value::Double(None)
            | Value::Json(None) => {
                params.push(&nulls[null_idx] as &dyn ToSql);
                null_idx += 1;
            }
            other => {
                return Err(DbError::Other(format!(
                    "Unsupported value type in query: {other:?}"
                )));
            }
        }
    }

    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::Values;

    #[test]
    fn test_converts_basic_values() {
        let values = Values(vec![
            Value::String(Some("comp-1".into())),
            Value::Int(Some(7)),
            Value::Bool(Some(true)),
            Value::String(None),
        ]);
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_empty_values() {
        let values = Values(vec![]);
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 0);
    }
}
