//! Reporting and aggregation.
//!
//! Every report accepts the same [`ReportFilter`] and is callable with an
//! empty filter (no dates, no scoping) to mean "everything". Monetary sums
//! COALESCE to zero inside the SQL so a patient or TPA with no matching
//! claims still reports 0 rather than NULL.
//!
//! Totals for paginated reports are page-local: they sum the rows on the
//! returned page, and the CSV export path re-runs the query effectively
//! unbounded to total the full result set.

pub mod export;
mod queries;

pub use queries::{
    final_approval_claims, hospital_business_summary, patient_billed_stats, rejected_cases,
    settled_claims, tpa_collection,
};

use crate::executor::DbError;
use crate::models::col;
use crate::repo::{Page, RepoError};
use crate::sql::{Args, SqlArg};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inclusive reporting window.
///
/// The lower bound is midnight of `from`; the upper bound is normalized to
/// 23:59:59.999 of `to`'s day, or of today when `to` is omitted, so a
/// same-day range still catches the whole day's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = Utc.from_utc_datetime(
            &self.from.and_hms_opt(0, 0, 0).expect("midnight exists"),
        );
        let to_day = self.to.unwrap_or_else(|| Utc::now().date_naive());
        let to = Utc.from_utc_datetime(
            &to_day
                .and_hms_milli_opt(23, 59, 59, 999)
                .expect("end of day exists"),
        );
        (from, to)
    }
}

/// Common report filter; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    pub date_range: Option<DateRange>,
    pub hospital_id: Option<String>,
    pub tpa_id: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ReportFilter {
    /// Append WHERE fragments for the populated filter fields.
    ///
    /// `date_column`, `hospital_column` and `tpa_column` are crate-chosen
    /// qualified column names, never user input.
    pub(crate) fn push_clauses(
        &self,
        args: &mut Args,
        clauses: &mut Vec<String>,
        date_column: &str,
        hospital_column: &str,
        tpa_column: &str,
    ) {
        if let Some(range) = &self.date_range {
            let (from, to) = range.bounds();
            let from_ph = args.add(SqlArg::Timestamp(from));
            let to_ph = args.add(SqlArg::Timestamp(to));
            clauses.push(format!("{date_column} BETWEEN {from_ph} AND {to_ph}"));
        }
        if let Some(hospital_id) = &self.hospital_id {
            let ph = args.add(SqlArg::Text(hospital_id.clone()));
            clauses.push(format!("{hospital_column} = {ph}"));
        }
        if let Some(tpa_id) = &self.tpa_id {
            let ph = args.add(SqlArg::Text(tpa_id.clone()));
            clauses.push(format!("{tpa_column} = {ph}"));
        }
    }
}

pub(crate) fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

/// Per-patient billed/sanctioned aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientBilledRow {
    pub patient_id: i64,
    pub patient_name: String,
    /// SUM(amount) over the billed bucket.
    pub billed: Decimal,
    /// SUM(paid_amount) over the received bucket.
    pub sanctioned: Decimal,
}

impl PatientBilledRow {
    pub(crate) fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            patient_id: col(row, "patient_id")?,
            patient_name: col(row, "patient_name")?,
            billed: col(row, "billed")?,
            sanctioned: col(row, "sanctioned")?,
        })
    }
}

/// Per-TPA collection aggregate.
///
/// `deductions = billed - received`, computed after the fact and never
/// clamped: a TPA that received more than it was billed reports a negative
/// deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TpaCollectionRow {
    pub tpa_id: String,
    pub tpa_name: String,
    pub billed: Decimal,
    pub received: Decimal,
    pub deductions: Decimal,
}

/// Per-hospital business summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalBusinessRow {
    pub hospital_id: String,
    pub hospital_name: String,
    /// Admissions whose claim has not reached `Settled` (or has no claim).
    pub active_admissions: i64,
    pub preauth_approved: i64,
    pub preauth_pending: i64,
    pub billed: Decimal,
    pub collection: Decimal,
}

impl HospitalBusinessRow {
    pub(crate) fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            hospital_id: col(row, "hospital_id")?,
            hospital_name: col(row, "hospital_name")?,
            active_admissions: col(row, "active_admissions")?,
            preauth_approved: col(row, "preauth_approved")?,
            preauth_pending: col(row, "preauth_pending")?,
            billed: col(row, "billed")?,
            collection: col(row, "collection")?,
        })
    }
}

/// One rejected claim with its context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedCaseRow {
    pub claim_id: i64,
    pub patient_name: Option<String>,
    pub tpa_name: Option<String>,
    pub reason: Option<String>,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl RejectedCaseRow {
    pub(crate) fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            claim_id: col(row, "claim_id")?,
            patient_name: col(row, "patient_name")?,
            tpa_name: col(row, "tpa_name")?,
            reason: col(row, "reason")?,
            amount: col(row, "amount")?,
            created_at: col(row, "created_at")?,
        })
    }
}

/// One settled (or final-approval) claim's monetary breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimBreakdownRow {
    pub claim_id: i64,
    pub patient_name: Option<String>,
    pub tpa_name: Option<String>,
    pub amount: Decimal,
    pub final_amount: Decimal,
    pub nm_deductions: Decimal,
    pub tds: Decimal,
    pub final_settle_amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl ClaimBreakdownRow {
    pub(crate) fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            claim_id: col(row, "claim_id")?,
            patient_name: col(row, "patient_name")?,
            tpa_name: col(row, "tpa_name")?,
            amount: col(row, "amount")?,
            final_amount: col(row, "final_amount")?,
            nm_deductions: col(row, "nm_deductions")?,
            tds: col(row, "tds")?,
            final_settle_amount: col(row, "final_settle_amount")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

/// Column sums over one page of [`ClaimBreakdownRow`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub amount: Decimal,
    pub final_amount: Decimal,
    pub nm_deductions: Decimal,
    pub tds: Decimal,
    pub final_settle_amount: Decimal,
}

impl Totals {
    pub fn over(rows: &[ClaimBreakdownRow]) -> Self {
        let mut t = Totals::default();
        for row in rows {
            t.amount += row.amount;
            t.final_amount += row.final_amount;
            t.nm_deductions += row.nm_deductions;
            t.tds += row.tds;
            t.final_settle_amount += row.final_settle_amount;
        }
        t
    }
}

/// A paginated breakdown report plus its page-local totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownReport {
    pub page: Page<ClaimBreakdownRow>,
    pub totals: Totals,
}

pub(crate) fn rows_to<T, F>(rows: &[Row], f: F) -> Result<Vec<T>, RepoError>
where
    F: Fn(&Row) -> Result<T, DbError>,
{
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(f(row)?);
    }
    Ok(items)
}
