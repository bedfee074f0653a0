//! Staff attendance and payroll helpers.
//!
//! Attendance is stored sparsely: a row exists only for a present day
//! (`status = 'present'`); absence is the absence of a row. Saving a month
//! is the one transactional path in the crate: the month's rows are
//! deleted and the truthy marks re-inserted atomically, so a failure
//! midway never leaves a half-written month.

use crate::executor::DbExecutor;
use crate::models::{AttendanceRow, FromRow, StaffMember};
use crate::pool::PooledClient;
use crate::repo::RepoError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Per-staff map of day-of-month to present flag.
pub type MonthMap = HashMap<i64, HashMap<u32, bool>>;

fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate), RepoError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| RepoError::Validation(format!("Invalid month: {month}/{year}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| RepoError::Validation(format!("Invalid month: {month}/{year}")))?;
    Ok((start, next.pred_opt().unwrap_or(start)))
}

/// Number of days in the given month.
pub fn days_in_month(month: u32, year: i32) -> Result<u32, RepoError> {
    let (start, end) = month_bounds(month, year)?;
    Ok((end - start).num_days() as u32 + 1)
}

/// List a hospital's staff ordered by name.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn staff_list<E: DbExecutor>(
    executor: &E,
    hospital_id: &str,
) -> Result<Vec<StaffMember>, RepoError> {
    let rows = executor.query_all(
        "SELECT * FROM hospital_staff WHERE hospital_id = $1 ORDER BY name",
        &[&hospital_id],
    )?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(StaffMember::from_row(row)?);
    }
    Ok(items)
}

/// Load a month of attendance as `staff_id -> day -> present`.
///
/// Only present days appear in the result; callers treat a missing day as
/// absent.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an impossible month;
/// `RepoError::Db` on driver failure.
pub fn month_map<E: DbExecutor>(
    executor: &E,
    month: u32,
    year: i32,
    hospital_id: &str,
) -> Result<MonthMap, RepoError> {
    let (start, end) = month_bounds(month, year)?;
    let rows = executor.query_all(
        "SELECT staff_id, att_date, status, hospital_id FROM attendance \
         WHERE hospital_id = $1 AND att_date BETWEEN $2 AND $3 AND status = 'present'",
        &[&hospital_id, &start, &end],
    )?;

    let mut map: MonthMap = HashMap::new();
    for row in &rows {
        let rec = AttendanceRow::from_row(row)?;
        map.entry(rec.staff_id)
            .or_default()
            .insert(rec.att_date.day(), true);
    }
    Ok(map)
}

/// Replace a hospital's attendance for one month.
///
/// Runs in a single transaction: deletes every row for the (hospital,
/// month) pair, then inserts one `'present'` row per truthy (staff, day)
/// entry. Falsy entries are dropped before insert. Any failure rolls the
/// whole month back.
///
/// # Errors
///
/// Returns `RepoError::Validation` for an impossible month or a day
/// outside it; `RepoError::Db` on driver or transaction failure.
pub fn save(
    conn: &PooledClient,
    month: u32,
    year: i32,
    hospital_id: &str,
    data: &MonthMap,
) -> Result<(), RepoError> {
    let (start, end) = month_bounds(month, year)?;
    let marks = collect_marks(month, year, data)?;

    let tx = conn.begin().map_err(crate::executor::DbError::from)?;
    let result = (|| -> Result<(), RepoError> {
        tx.execute(
            "DELETE FROM attendance \
             WHERE hospital_id = $1 AND att_date BETWEEN $2 AND $3",
            &[&hospital_id, &start, &end],
        )?;
        for (staff_id, date) in &marks {
            tx.execute(
                "INSERT INTO attendance (staff_id, att_date, status, hospital_id) \
                 VALUES ($1, $2, 'present', $3)",
                &[staff_id, date, &hospital_id],
            )?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            tx.commit().map_err(crate::executor::DbError::from)?;
            Ok(())
        }
        Err(e) => {
            if let Err(rb) = tx.rollback() {
                log::warn!("attendance rollback failed: {rb}");
            }
            Err(e)
        }
    }
}

/// Flatten the month map into insertable (staff, date) marks.
///
/// Falsy entries are dropped here, before the transaction opens; a day
/// outside the month fails the whole save.
fn collect_marks(
    month: u32,
    year: i32,
    data: &MonthMap,
) -> Result<Vec<(i64, NaiveDate)>, RepoError> {
    let mut marks = Vec::new();
    for (&staff_id, days) in data {
        for (&day, &present) in days {
            if !present {
                continue;
            }
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                RepoError::Validation(format!("Day {day} does not exist in {month}/{year}"))
            })?;
            marks.push((staff_id, date));
        }
    }
    Ok(marks)
}

/// Salary owed for the month, prorated by present days.
///
/// Pure computation, recomputed per view and never stored.
pub fn payable_salary(monthly_salary: Decimal, days_in_month: u32, present_days: u32) -> Decimal {
    if days_in_month == 0 {
        return Decimal::ZERO;
    }
    monthly_salary / Decimal::from(days_in_month) * Decimal::from(present_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2, 2024).unwrap(), 29);
        assert_eq!(days_in_month(2, 2025).unwrap(), 28);
        assert_eq!(days_in_month(12, 2025).unwrap(), 31);
        assert!(days_in_month(13, 2025).is_err());
    }

    #[test]
    fn test_payable_salary_proration() {
        let salary = Decimal::from(30_000);
        assert_eq!(payable_salary(salary, 30, 30), salary);
        assert_eq!(payable_salary(salary, 30, 15), Decimal::from(15_000));
        assert_eq!(payable_salary(salary, 30, 0), Decimal::ZERO);
    }

    #[test]
    fn test_payable_salary_zero_days_in_month() {
        assert_eq!(payable_salary(Decimal::from(1000), 0, 5), Decimal::ZERO);
    }

    #[test]
    fn test_collect_marks_keeps_only_truthy_pairs() {
        let mut days = HashMap::new();
        days.insert(1, true);
        days.insert(2, false);
        days.insert(15, true);
        let mut data: MonthMap = HashMap::new();
        data.insert(7, days);

        let mut marks = collect_marks(3, 2025, &data).unwrap();
        marks.sort();
        assert_eq!(
            marks,
            vec![
                (7, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
                (7, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()),
            ]
        );
    }

    #[test]
    fn test_collect_marks_rejects_day_outside_month() {
        let mut days = HashMap::new();
        days.insert(30, true);
        let mut data: MonthMap = HashMap::new();
        data.insert(7, days);
        let err = collect_marks(2, 2025, &data).unwrap_err();
        assert!(err.to_string().contains("Day 30"));
    }

    #[test]
    fn test_month_map_validates_month() {
        let err = month_map(&crate::test_support::PanicExecutor, 0, 2025, "hosp-1")
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
