//! Report SQL.
//!
//! Claims reach their patient, hospital and TPA context through the
//! pre-auth row sharing their `admission_id`; those joins stay LEFT JOINs
//! so an orphaned claim still shows up with blank context rather than
//! disappearing from a report.

use crate::executor::DbExecutor;
use crate::models::col;
use crate::repo::{Page, Pagination, RepoError};
use crate::sql::{query_value, Args, SqlArg};
use crate::status::{BILLED_STATUSES, RECEIVED_STATUSES};
use rust_decimal::Decimal;

use super::{
    rows_to, where_sql, BreakdownReport, ClaimBreakdownRow, HospitalBusinessRow,
    PatientBilledRow, RejectedCaseRow, ReportFilter, Totals, TpaCollectionRow,
};

/// Render a crate-constant status list as a SQL IN-list.
///
/// The literals come from the closed status vocabulary, never from user
/// input, and contain no quote characters.
fn status_in_list(statuses: &[&str]) -> String {
    statuses
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn paging(args: &mut Args, p: Pagination) -> String {
    let limit_ph = args.add(SqlArg::BigInt(p.limit as i64));
    let offset_ph = args.add(SqlArg::BigInt(p.offset() as i64));
    format!(" LIMIT {limit_ph} OFFSET {offset_ph}")
}

/// Per-patient billed vs sanctioned amounts.
///
/// Billed sums `amount` over the billed bucket; sanctioned sums
/// `paid_amount` over the received bucket. Patients with admissions but no
/// matching claims report zeros.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn patient_billed_stats<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<Page<PatientBilledRow>, RepoError> {
    let p = Pagination::new(filter.page, filter.limit);
    let billed = status_in_list(&BILLED_STATUSES);
    let received = status_in_list(&RECEIVED_STATUSES);

    let mut args = Args::new();
    let mut clauses = Vec::new();
    filter.push_clauses(
        &mut args,
        &mut clauses,
        "pr.created_at",
        "pr.hospital_id",
        "pr.tpa_id",
    );
    let where_clause = where_sql(&clauses);

    let count_sql = format!(
        "SELECT COUNT(DISTINCT p.id) FROM patients p \
         JOIN preauth_request pr ON pr.patient_id = p.id{where_clause}"
    );
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let page_sql = paging(&mut args, p);
    let sql = format!(
        "SELECT p.id AS patient_id, p.name AS patient_name, \
         COALESCE(SUM(CASE WHEN c.status IN ({billed}) THEN c.amount ELSE 0 END), 0) AS billed, \
         COALESCE(SUM(CASE WHEN c.status IN ({received}) THEN c.paid_amount ELSE 0 END), 0) AS sanctioned \
         FROM patients p \
         JOIN preauth_request pr ON pr.patient_id = p.id \
         LEFT JOIN claims c ON c.admission_id = pr.admission_id\
         {where_clause} \
         GROUP BY p.id, p.name ORDER BY p.name{page_sql}"
    );
    let rows = executor.query_all(&sql, &args.params())?;
    let items = rows_to(&rows, PatientBilledRow::from_row)?;
    Ok(Page { items, total })
}

/// Per-TPA billed/received/deductions.
///
/// Deductions are `billed - received`, computed after the query and left
/// negative when a TPA paid out more than it was billed.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn tpa_collection<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<Page<TpaCollectionRow>, RepoError> {
    let p = Pagination::new(filter.page, filter.limit);
    let billed = status_in_list(&BILLED_STATUSES);
    let received = status_in_list(&RECEIVED_STATUSES);

    let mut args = Args::new();
    let mut clauses = Vec::new();
    filter.push_clauses(
        &mut args,
        &mut clauses,
        "pr.created_at",
        "pr.hospital_id",
        "t.id",
    );
    let where_clause = where_sql(&clauses);

    let count_sql = format!(
        "SELECT COUNT(DISTINCT t.id) FROM tpas t \
         JOIN preauth_request pr ON pr.tpa_id = t.id{where_clause}"
    );
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let page_sql = paging(&mut args, p);
    let sql = format!(
        "SELECT t.id AS tpa_id, t.name AS tpa_name, \
         COALESCE(SUM(CASE WHEN c.status IN ({billed}) THEN c.amount ELSE 0 END), 0) AS billed, \
         COALESCE(SUM(CASE WHEN c.status IN ({received}) THEN c.paid_amount ELSE 0 END), 0) AS received \
         FROM tpas t \
         JOIN preauth_request pr ON pr.tpa_id = t.id \
         LEFT JOIN claims c ON c.admission_id = pr.admission_id\
         {where_clause} \
         GROUP BY t.id, t.name ORDER BY t.name{page_sql}"
    );
    let rows = executor.query_all(&sql, &args.params())?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(tpa_collection_row(
            col(row, "tpa_id")?,
            col(row, "tpa_name")?,
            col(row, "billed")?,
            col(row, "received")?,
        ));
    }
    Ok(Page { items, total })
}

/// Deductions are `billed - received`, reported as-is even below zero.
fn tpa_collection_row(
    tpa_id: String,
    tpa_name: String,
    billed: Decimal,
    received: Decimal,
) -> TpaCollectionRow {
    TpaCollectionRow {
        tpa_id,
        tpa_name,
        billed,
        received,
        deductions: billed - received,
    }
}

/// Per-hospital business summary via correlated subqueries.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn hospital_business_summary<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<Page<HospitalBusinessRow>, RepoError> {
    let p = Pagination::new(filter.page, filter.limit);
    let billed = status_in_list(&BILLED_STATUSES);
    let received = status_in_list(&RECEIVED_STATUSES);

    // Count first so its bind list carries only the hospital filter; the
    // date binds join the arg list afterwards for the main query.
    let mut args = Args::new();
    let mut hospital_clause = String::new();
    if let Some(hospital_id) = &filter.hospital_id {
        let ph = args.add(SqlArg::Text(hospital_id.clone()));
        hospital_clause = format!(" WHERE h.id = {ph}");
    }
    let count_sql = format!("SELECT COUNT(*) FROM hospitals h{hospital_clause}");
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let mut date_clause = String::new();
    if let Some(range) = &filter.date_range {
        let (from, to) = range.bounds();
        let from_ph = args.add(SqlArg::Timestamp(from));
        let to_ph = args.add(SqlArg::Timestamp(to));
        date_clause = format!(" AND pr.created_at BETWEEN {from_ph} AND {to_ph}");
    }

    let page_sql = paging(&mut args, p);
    let sql = format!(
        "SELECT h.id AS hospital_id, h.name AS hospital_name, \
         (SELECT COUNT(*) FROM preauth_request pr \
            WHERE pr.hospital_id = h.id{date_clause} \
            AND NOT EXISTS (SELECT 1 FROM claims c \
                WHERE c.admission_id = pr.admission_id AND c.status = 'Settled')) \
            AS active_admissions, \
         (SELECT COUNT(*) FROM preauth_request pr \
            WHERE pr.hospital_id = h.id AND pr.status = 'Approval'{date_clause}) \
            AS preauth_approved, \
         (SELECT COUNT(*) FROM preauth_request pr \
            WHERE pr.hospital_id = h.id AND pr.status = 'Pending'{date_clause}) \
            AS preauth_pending, \
         (SELECT COALESCE(SUM(c.amount), 0) FROM claims c \
            JOIN preauth_request pr ON pr.admission_id = c.admission_id \
            WHERE pr.hospital_id = h.id AND c.status IN ({billed}){date_clause}) \
            AS billed, \
         (SELECT COALESCE(SUM(c.paid_amount), 0) FROM claims c \
            JOIN preauth_request pr ON pr.admission_id = c.admission_id \
            WHERE pr.hospital_id = h.id AND c.status IN ({received}){date_clause}) \
            AS collection \
         FROM hospitals h{hospital_clause} ORDER BY h.name{page_sql}"
    );
    let rows = executor.query_all(&sql, &args.params())?;
    let items = rows_to(&rows, HospitalBusinessRow::from_row)?;
    Ok(Page { items, total })
}

/// Rejected claims, newest first, with patient/TPA context and reason.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn rejected_cases<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<Page<RejectedCaseRow>, RepoError> {
    let p = Pagination::new(filter.page, filter.limit);

    let mut args = Args::new();
    let mut clauses = vec!["c.status = 'Rejected'".to_string()];
    filter.push_clauses(
        &mut args,
        &mut clauses,
        "c.created_at",
        "pr.hospital_id",
        "pr.tpa_id",
    );
    let where_clause = where_sql(&clauses);

    let count_sql = format!(
        "SELECT COUNT(*) FROM claims c \
         LEFT JOIN preauth_request pr ON pr.admission_id = c.admission_id{where_clause}"
    );
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let page_sql = paging(&mut args, p);
    let sql = format!(
        "SELECT c.id AS claim_id, p.name AS patient_name, t.name AS tpa_name, \
         c.reason, COALESCE(c.amount, 0) AS amount, c.created_at \
         FROM claims c \
         LEFT JOIN preauth_request pr ON pr.admission_id = c.admission_id \
         LEFT JOIN patients p ON p.id = pr.patient_id \
         LEFT JOIN tpas t ON t.id = pr.tpa_id\
         {where_clause} \
         ORDER BY c.created_at DESC{page_sql}"
    );
    let rows = executor.query_all(&sql, &args.params())?;
    let items = rows_to(&rows, RejectedCaseRow::from_row)?;
    Ok(Page { items, total })
}

fn breakdown<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
    status_predicate: &str,
) -> Result<BreakdownReport, RepoError> {
    let p = Pagination::new(filter.page, filter.limit);

    let mut args = Args::new();
    let mut clauses = vec![status_predicate.to_string()];
    filter.push_clauses(
        &mut args,
        &mut clauses,
        "c.updated_at",
        "pr.hospital_id",
        "pr.tpa_id",
    );
    let where_clause = where_sql(&clauses);

    let count_sql = format!(
        "SELECT COUNT(*) FROM claims c \
         LEFT JOIN preauth_request pr ON pr.admission_id = c.admission_id{where_clause}"
    );
    let total: i64 = query_value(executor, &count_sql, &args.params())?;

    let page_sql = paging(&mut args, p);
    let sql = format!(
        "SELECT c.id AS claim_id, p.name AS patient_name, t.name AS tpa_name, \
         COALESCE(c.amount, 0) AS amount, \
         COALESCE(c.final_amount, 0) AS final_amount, \
         COALESCE(c.nm_deductions, 0) AS nm_deductions, \
         COALESCE(c.tds, 0) AS tds, \
         COALESCE(c.final_settle_amount, 0) AS final_settle_amount, \
         c.updated_at \
         FROM claims c \
         LEFT JOIN preauth_request pr ON pr.admission_id = c.admission_id \
         LEFT JOIN patients p ON p.id = pr.patient_id \
         LEFT JOIN tpas t ON t.id = pr.tpa_id\
         {where_clause} \
         ORDER BY c.updated_at DESC{page_sql}"
    );
    let rows = executor.query_all(&sql, &args.params())?;
    let items = rows_to(&rows, ClaimBreakdownRow::from_row)?;

    let totals = Totals::over(&items);
    Ok(BreakdownReport {
        page: Page { items, total },
        totals,
    })
}

/// Settled claims with their full monetary breakdown. Totals cover the
/// returned page only.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn settled_claims<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<BreakdownReport, RepoError> {
    breakdown(executor, filter, "c.status = 'Settled'")
}

/// Claims in the received bucket (Final Approval / Final Amount
/// Sanctioned). Totals cover the returned page only.
///
/// # Errors
///
/// Returns `RepoError::Db` on driver failure.
pub fn final_approval_claims<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<BreakdownReport, RepoError> {
    let predicate = format!("c.status IN ({})", status_in_list(&RECEIVED_STATUSES));
    breakdown(executor, filter, &predicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_in_list_quotes_each_literal() {
        assert_eq!(
            status_in_list(&BILLED_STATUSES),
            "'Pre auth Sent', 'Enhancement Request'"
        );
    }

    #[test]
    fn test_deductions_stay_negative_when_received_exceeds_billed() {
        let row = tpa_collection_row(
            "tpa-1".into(),
            "Acme Assist".into(),
            Decimal::from(1_000),
            Decimal::from(1_500),
        );
        assert_eq!(row.deductions, Decimal::from(-500));

        let row = tpa_collection_row(
            "tpa-2".into(),
            "Medicover".into(),
            Decimal::from(2_000),
            Decimal::from(750),
        );
        assert_eq!(row.deductions, Decimal::from(1_250));
    }

    #[test]
    fn test_paging_placeholders_follow_existing_args() {
        let mut args = Args::new();
        args.add(SqlArg::Text("hosp-1".into()));
        let sql = paging(&mut args, Pagination::new(Some(2), Some(10)));
        assert_eq!(sql, " LIMIT $2 OFFSET $3");
        assert_eq!(args.len(), 3);
    }
}
