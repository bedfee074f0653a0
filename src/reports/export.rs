//! CSV export for reports.
//!
//! Fixed column order, a header row, string fields double-quoted
//! (`QuoteStyle::NonNumeric`), numbers written without locale formatting,
//! and a trailing `TOTAL` row for the monetary reports. Export re-runs the
//! underlying query with an effectively unbounded page so totals cover the
//! full result set, not one page.

use crate::executor::DbExecutor;
use crate::repo::RepoError;
use csv::{QuoteStyle, WriterBuilder};
use std::fmt;

use super::{
    final_approval_claims, rejected_cases, settled_claims, tpa_collection, ReportFilter, Totals,
};

// Large enough to cover any realistic result set in one page.
const EXPORT_LIMIT: u64 = 1_000_000_000;

/// CSV export error type
#[derive(Debug)]
pub enum ExportError {
    /// Underlying report query failed
    Report(RepoError),
    /// CSV serialization failed
    Csv(csv::Error),
    /// Writer produced invalid UTF-8
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Report(e) => write!(f, "Report error: {e}"),
            ExportError::Csv(e) => write!(f, "CSV error: {e}"),
            ExportError::Utf8(e) => write!(f, "CSV output is not UTF-8: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<RepoError> for ExportError {
    fn from(err: RepoError) -> Self {
        ExportError::Report(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

fn unbounded(filter: &ReportFilter) -> ReportFilter {
    ReportFilter {
        page: Some(1),
        limit: Some(EXPORT_LIMIT),
        ..filter.clone()
    }
}

fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error()))?;
    String::from_utf8(bytes).map_err(ExportError::Utf8)
}

/// Export the TPA collection report.
///
/// # Errors
///
/// Returns `ExportError` when the query or serialization fails.
pub fn tpa_collection_csv<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<String, ExportError> {
    let page = tpa_collection(executor, &unbounded(filter))?;

    let mut wtr = writer();
    wtr.write_record(["TPA", "Billed", "Received", "Deductions"])?;
    let mut billed = rust_decimal::Decimal::ZERO;
    let mut received = rust_decimal::Decimal::ZERO;
    for row in &page.items {
        billed += row.billed;
        received += row.received;
        wtr.write_record([
            row.tpa_name.clone(),
            row.billed.to_string(),
            row.received.to_string(),
            row.deductions.to_string(),
        ])?;
    }
    wtr.write_record([
        "TOTAL".to_string(),
        billed.to_string(),
        received.to_string(),
        (billed - received).to_string(),
    ])?;
    finish(wtr)
}

/// Export the rejected-cases report. No TOTAL row: the report is a flat
/// case list, not a monetary breakdown.
///
/// # Errors
///
/// Returns `ExportError` when the query or serialization fails.
pub fn rejected_cases_csv<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<String, ExportError> {
    let page = rejected_cases(executor, &unbounded(filter))?;

    let mut wtr = writer();
    wtr.write_record(["Claim", "Patient", "TPA", "Reason", "Amount", "Date"])?;
    for row in &page.items {
        wtr.write_record([
            row.claim_id.to_string(),
            row.patient_name.clone().unwrap_or_default(),
            row.tpa_name.clone().unwrap_or_default(),
            row.reason.clone().unwrap_or_default(),
            row.amount.to_string(),
            row.created_at.format("%Y-%m-%d").to_string(),
        ])?;
    }
    finish(wtr)
}

fn breakdown_csv(
    items: &[super::ClaimBreakdownRow],
    totals: &Totals,
) -> Result<String, ExportError> {
    let mut wtr = writer();
    wtr.write_record([
        "Claim",
        "Patient",
        "TPA",
        "Amount",
        "Final Amount",
        "NM Deductions",
        "TDS",
        "Final Settle Amount",
    ])?;
    for row in items {
        wtr.write_record([
            row.claim_id.to_string(),
            row.patient_name.clone().unwrap_or_default(),
            row.tpa_name.clone().unwrap_or_default(),
            row.amount.to_string(),
            row.final_amount.to_string(),
            row.nm_deductions.to_string(),
            row.tds.to_string(),
            row.final_settle_amount.to_string(),
        ])?;
    }
    wtr.write_record([
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        totals.amount.to_string(),
        totals.final_amount.to_string(),
        totals.nm_deductions.to_string(),
        totals.tds.to_string(),
        totals.final_settle_amount.to_string(),
    ])?;
    finish(wtr)
}

/// Export the settled-claims breakdown with a trailing TOTAL row over the
/// full (unpaginated) result set.
///
/// # Errors
///
/// Returns `ExportError` when the query or serialization fails.
pub fn settled_claims_csv<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<String, ExportError> {
    let report = settled_claims(executor, &unbounded(filter))?;
    breakdown_csv(&report.page.items, &report.totals)
}

/// Export the final-approval breakdown with a trailing TOTAL row over the
/// full (unpaginated) result set.
///
/// # Errors
///
/// Returns `ExportError` when the query or serialization fails.
pub fn final_approval_claims_csv<E: DbExecutor>(
    executor: &E,
    filter: &ReportFilter,
) -> Result<String, ExportError> {
    let report = final_approval_claims(executor, &unbounded(filter))?;
    breakdown_csv(&report.page.items, &report.totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn test_breakdown_csv_header_rows_and_total() {
        let rows = vec![super::super::ClaimBreakdownRow {
            claim_id: 7,
            patient_name: Some("Ravi".into()),
            tpa_name: None,
            amount: Decimal::from(1200),
            final_amount: Decimal::from(1000),
            nm_deductions: Decimal::from(-50),
            tds: Decimal::from(10),
            final_settle_amount: Decimal::from(1040),
            updated_at: Utc::now(),
        }];
        let totals = Totals::over(&rows);
        let csv = breakdown_csv(&rows, &totals).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("\"Claim\","));
        // String fields quoted, numeric fields bare, negatives preserved.
        assert!(lines[1].contains("\"Ravi\""));
        assert!(lines[1].contains(",-50,"));
        assert!(lines[2].starts_with("\"TOTAL\""));
        assert!(lines[2].ends_with("1040"));
    }
}
