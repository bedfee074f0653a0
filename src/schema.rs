//! Schema bootstrap.
//!
//! No migration framework: [`bootstrap`] runs idempotent
//! `CREATE TABLE IF NOT EXISTS` statements and is invoked manually when a
//! database is first provisioned. Columns added later are applied by hand.

use crate::executor::{DbError, DbExecutor};

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS companies (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        portal_link TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS hospitals (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        address TEXT,
        city TEXT,
        phone TEXT,
        email TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS tpas (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS hospital_tpas (
        hospital_id TEXT NOT NULL REFERENCES hospitals(id) ON DELETE CASCADE,
        tpa_id TEXT NOT NULL REFERENCES tpas(id) ON DELETE CASCADE,
        PRIMARY KEY (hospital_id, tpa_id)
    )",
    "CREATE TABLE IF NOT EXISTS hospital_companies (
        hospital_id TEXT NOT NULL REFERENCES hospitals(id) ON DELETE CASCADE,
        company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
        PRIMARY KEY (hospital_id, company_id)
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL,
        hospital_id TEXT REFERENCES hospitals(id),
        company_id TEXT REFERENCES companies(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS patients (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        hospital_id TEXT REFERENCES hospitals(id),
        photo TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS preauth_request (
        id BIGSERIAL PRIMARY KEY,
        patient_id BIGINT NOT NULL,
        hospital_id TEXT NOT NULL,
        tpa_id TEXT,
        company_id TEXT,
        status TEXT NOT NULL,
        total_expected_cost NUMERIC,
        amount_sanctioned NUMERIC,
        admission_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS admissions (
        id TEXT PRIMARY KEY,
        patient_id BIGINT,
        hospital_id TEXT,
        admitted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        discharged_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS claims (
        id BIGSERIAL PRIMARY KEY,
        admission_id TEXT NOT NULL,
        claim_ref TEXT,
        status TEXT NOT NULL,
        amount NUMERIC,
        paid_amount NUMERIC,
        final_bill NUMERIC,
        hospital_discount NUMERIC,
        nm_deductions NUMERIC,
        co_pay NUMERIC,
        final_amount NUMERIC,
        tds NUMERIC,
        final_settle_amount NUMERIC,
        reason TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS hospital_staff (
        id BIGSERIAL PRIMARY KEY,
        hospital_id TEXT NOT NULL REFERENCES hospitals(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        monthly_salary NUMERIC,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS attendance (
        staff_id BIGINT NOT NULL,
        att_date DATE NOT NULL,
        status TEXT NOT NULL,
        hospital_id TEXT NOT NULL,
        PRIMARY KEY (staff_id, att_date)
    )",
    "CREATE TABLE IF NOT EXISTS activity_log (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        user_name TEXT NOT NULL,
        action_type TEXT NOT NULL,
        details TEXT NOT NULL,
        target_id TEXT,
        target_type TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS company_settings (
        company_id TEXT PRIMARY KEY REFERENCES companies(id) ON DELETE CASCADE,
        settings JSONB NOT NULL DEFAULT '{}'::jsonb
    )",
    "CREATE TABLE IF NOT EXISTS fields (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        label TEXT,
        field_type TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_claims_admission ON claims (admission_id)",
    "CREATE INDEX IF NOT EXISTS idx_claims_status ON claims (status)",
    "CREATE INDEX IF NOT EXISTS idx_preauth_admission ON preauth_request (admission_id)",
    "CREATE INDEX IF NOT EXISTS idx_preauth_hospital ON preauth_request (hospital_id)",
    "CREATE INDEX IF NOT EXISTS idx_patients_hospital ON patients (hospital_id)",
    "CREATE INDEX IF NOT EXISTS idx_attendance_hospital_date ON attendance (hospital_id, att_date)",
    "CREATE INDEX IF NOT EXISTS idx_activity_created ON activity_log (created_at)",
];

/// Create every table and index the crate expects. Safe to re-run.
///
/// # Errors
///
/// Returns the first `DbError` encountered; earlier statements stay
/// applied (each is independently idempotent).
pub fn bootstrap<E: DbExecutor>(executor: &E) -> Result<(), DbError> {
    for sql in TABLES.iter().chain(INDEXES) {
        executor.execute(sql, &[])?;
    }
    log::info!(
        "schema bootstrap complete: {} tables, {} indexes",
        TABLES.len(),
        INDEXES.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_statement_is_idempotent() {
        for sql in TABLES.iter().chain(INDEXES) {
            assert!(sql.contains("IF NOT EXISTS"), "not idempotent: {sql}");
        }
    }

    #[test]
    fn test_claims_carries_all_monetary_columns() {
        let claims = TABLES
            .iter()
            .find(|s| s.contains("EXISTS claims"))
            .expect("claims table");
        for column in [
            "amount",
            "paid_amount",
            "final_bill",
            "hospital_discount",
            "nm_deductions",
            "co_pay",
            "final_amount",
            "tds",
            "final_settle_amount",
        ] {
            assert!(claims.contains(column), "missing column {column}");
        }
    }
}
