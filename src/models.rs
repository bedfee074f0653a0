//! Typed records for the claims-administration schema.
//!
//! One struct per table, mapped by hand from driver rows. Nullable columns
//! map to `Option`; monetary columns are NUMERIC and map to
//! `rust_decimal::Decimal`. COALESCE-to-zero happens only inside report
//! aggregates, never here.

use crate::executor::DbError;
use crate::media::decode_photo_field;
use crate::status::{ClaimStatus, PreAuthStatus};
use chrono::{DateTime, NaiveDate, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mapping from a driver row to a typed record.
pub trait FromRow: Sized {
    /// # Errors
    ///
    /// Returns `DbError::Parse` when a column is missing or has an
    /// unexpected type.
    fn from_row(row: &Row) -> Result<Self, DbError>;
}

/// Extract one column, converting driver errors to parse errors.
pub(crate) fn col<'a, T>(row: &'a Row, name: &str) -> Result<T, DbError>
where
    T: may_postgres::types::FromSql<'a>,
{
    row.try_get::<&str, T>(name)
        .map_err(|e| DbError::Parse(format!("column {name}: {e}")))
}

/// User role vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "Hospital Admin")]
    HospitalAdmin,
    #[serde(rename = "Hospital Staff")]
    HospitalStaff,
    #[serde(rename = "Company Admin")]
    CompanyAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::HospitalAdmin => "Hospital Admin",
            Role::HospitalStaff => "Hospital Staff",
            Role::CompanyAdmin => "Company Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Hospital Admin" => Ok(Role::HospitalAdmin),
            "Hospital Staff" => Ok(Role::HospitalStaff),
            "Company Admin" => Ok(Role::CompanyAdmin),
            other => Err(format!("Invalid role: {other:?}")),
        }
    }
}

/// Insurance company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub portal_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Company {
            id: col(row, "id")?,
            name: col(row, "name")?,
            email: col(row, "email")?,
            phone: col(row, "phone")?,
            address: col(row, "address")?,
            portal_link: col(row, "portal_link")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Hospital {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Hospital {
            id: col(row, "id")?,
            name: col(row, "name")?,
            address: col(row, "address")?,
            city: col(row, "city")?,
            phone: col(row, "phone")?,
            email: col(row, "email")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

/// Third-Party Administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tpa {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Tpa {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Tpa {
            id: col(row, "id")?,
            name: col(row, "name")?,
            email: col(row, "email")?,
            phone: col(row, "phone")?,
            address: col(row, "address")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub hospital_id: Option<String>,
    /// Decoded from the dual-shape photo column; `None` when absent or
    /// unreadable.
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for Patient {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let raw_photo: Option<String> = col(row, "photo")?;
        Ok(Patient {
            id: col(row, "id")?,
            name: col(row, "name")?,
            hospital_id: col(row, "hospital_id")?,
            photo_url: decode_photo_field(raw_photo.as_deref()),
            created_at: col(row, "created_at")?,
        })
    }
}

/// Pre-authorization request, submitted at/before admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreAuthRequest {
    pub id: i64,
    pub patient_id: i64,
    pub hospital_id: String,
    pub tpa_id: Option<String>,
    pub company_id: Option<String>,
    pub status: PreAuthStatus,
    pub total_expected_cost: Option<Decimal>,
    pub amount_sanctioned: Option<Decimal>,
    /// Correlation key to admissions/claims. Not enforced by a foreign key
    /// in all paths; claim joins stay LEFT JOINs.
    pub admission_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for PreAuthRequest {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status: String = col(row, "status")?;
        Ok(PreAuthRequest {
            id: col(row, "id")?,
            patient_id: col(row, "patient_id")?,
            hospital_id: col(row, "hospital_id")?,
            tpa_id: col(row, "tpa_id")?,
            company_id: col(row, "company_id")?,
            status: status
                .parse()
                .map_err(|e| DbError::Parse(format!("preauth status: {e}")))?,
            total_expected_cost: col(row, "total_expected_cost")?,
            amount_sanctioned: col(row, "amount_sanctioned")?,
            admission_id: col(row, "admission_id")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

/// Claim billing record, tracked from pre-auth through settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub admission_id: String,
    /// External reference number assigned by the TPA/insurer.
    pub claim_ref: Option<String>,
    pub status: ClaimStatus,
    pub amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub final_bill: Option<Decimal>,
    pub hospital_discount: Option<Decimal>,
    pub nm_deductions: Option<Decimal>,
    pub co_pay: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub tds: Option<Decimal>,
    pub final_settle_amount: Option<Decimal>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Claim {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status: String = col(row, "status")?;
        Ok(Claim {
            id: col(row, "id")?,
            admission_id: col(row, "admission_id")?,
            claim_ref: col(row, "claim_ref")?,
            status: status
                .parse()
                .map_err(|e| DbError::Parse(format!("claim status: {e}")))?,
            amount: col(row, "amount")?,
            paid_amount: col(row, "paid_amount")?,
            final_bill: col(row, "final_bill")?,
            hospital_discount: col(row, "hospital_discount")?,
            nm_deductions: col(row, "nm_deductions")?,
            co_pay: col(row, "co_pay")?,
            final_amount: col(row, "final_amount")?,
            tds: col(row, "tds")?,
            final_settle_amount: col(row, "final_settle_amount")?,
            reason: col(row, "reason")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Set for hospital-scoped roles.
    pub hospital_id: Option<String>,
    /// Set for insurer-scoped roles.
    pub company_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let role: String = col(row, "role")?;
        Ok(User {
            id: col(row, "id")?,
            name: col(row, "name")?,
            email: col(row, "email")?,
            role: role.parse().map_err(DbError::Parse)?,
            hospital_id: col(row, "hospital_id")?,
            company_id: col(row, "company_id")?,
            created_at: col(row, "created_at")?,
        })
    }
}

/// Hospital staff member (payroll subject of the attendance module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: i64,
    pub hospital_id: String,
    pub name: String,
    pub monthly_salary: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for StaffMember {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(StaffMember {
            id: col(row, "id")?,
            hospital_id: col(row, "hospital_id")?,
            name: col(row, "name")?,
            monthly_salary: col(row, "monthly_salary")?,
            created_at: col(row, "created_at")?,
        })
    }
}

/// One present-day marker. Absence is the absence of a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub staff_id: i64,
    pub att_date: NaiveDate,
    pub status: String,
    pub hospital_id: String,
}

impl FromRow for AttendanceRow {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(AttendanceRow {
            staff_id: col(row, "staff_id")?,
            att_date: col(row, "att_date")?,
            status: col(row, "status")?,
            hospital_id: col(row, "hospital_id")?,
        })
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub action_type: String,
    pub details: String,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for ActivityEntry {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(ActivityEntry {
            id: col(row, "id")?,
            user_id: col(row, "user_id")?,
            user_name: col(row, "user_name")?,
            action_type: col(row, "action_type")?,
            details: col(row, "details")?,
            target_id: col(row, "target_id")?,
            target_type: col(row, "target_type")?,
            created_at: col(row, "created_at")?,
        })
    }
}

/// Admin-managed custom form field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: i64,
    pub name: String,
    pub label: Option<String>,
    pub field_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromRow for FieldDef {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(FieldDef {
            id: col(row, "id")?,
            name: col(row, "name")?,
            label: col(row, "label")?,
            field_type: col(row, "field_type")?,
            created_at: col(row, "created_at")?,
        })
    }
}
