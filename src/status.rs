//! Claim and pre-authorization status vocabulary.
//!
//! Statuses are stored as their exact display strings and compared by exact
//! match. The enums exist for storage/comparison safety only: any authorized
//! update may set any status regardless of the current one; there is no
//! transition table, and several near-duplicate values (`Approval` vs
//! `Approved` vs `Amount Sanctioned` vs `Final Amount Sanctioned`) are kept
//! as distinct literals on purpose.
//!
//! Report aggregation keys off the bucket predicates below; report totals
//! depend on these groupings being exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error for an unrecognized status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus(pub String);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid status value: {:?}", self.0)
    }
}

impl std::error::Error for InvalidStatus {}

/// Claim status enumeration. Case-sensitive display strings are the wire
/// and storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Query Raised")]
    QueryRaised,
    #[serde(rename = "Query Answered")]
    QueryAnswered,
    #[serde(rename = "Initial Approval Amount")]
    InitialApprovalAmount,
    #[serde(rename = "Approval")]
    Approval,
    #[serde(rename = "Amount Sanctioned")]
    AmountSanctioned,
    #[serde(rename = "Initial Approval")]
    InitialApproval,
    #[serde(rename = "Settlement Done")]
    SettlementDone,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Appealed")]
    Appealed,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Pre auth Sent")]
    PreAuthSent,
    #[serde(rename = "Final Approval")]
    FinalApproval,
    #[serde(rename = "Settled")]
    Settled,
    #[serde(rename = "Amount Received")]
    AmountReceived,
    #[serde(rename = "Enhancement Request")]
    EnhancementRequest,
    #[serde(rename = "Final Amount Sanctioned")]
    FinalAmountSanctioned,
}

impl ClaimStatus {
    /// Every claim status, in workflow-roughly order.
    pub const ALL: [ClaimStatus; 19] = [
        ClaimStatus::Pending,
        ClaimStatus::Processing,
        ClaimStatus::QueryRaised,
        ClaimStatus::QueryAnswered,
        ClaimStatus::InitialApprovalAmount,
        ClaimStatus::Approval,
        ClaimStatus::AmountSanctioned,
        ClaimStatus::InitialApproval,
        ClaimStatus::SettlementDone,
        ClaimStatus::Rejected,
        ClaimStatus::Appealed,
        ClaimStatus::Paid,
        ClaimStatus::Approved,
        ClaimStatus::PreAuthSent,
        ClaimStatus::FinalApproval,
        ClaimStatus::Settled,
        ClaimStatus::AmountReceived,
        ClaimStatus::EnhancementRequest,
        ClaimStatus::FinalAmountSanctioned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Processing => "Processing",
            ClaimStatus::QueryRaised => "Query Raised",
            ClaimStatus::QueryAnswered => "Query Answered",
            ClaimStatus::InitialApprovalAmount => "Initial Approval Amount",
            ClaimStatus::Approval => "Approval",
            ClaimStatus::AmountSanctioned => "Amount Sanctioned",
            ClaimStatus::InitialApproval => "Initial Approval",
            ClaimStatus::SettlementDone => "Settlement Done",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Appealed => "Appealed",
            ClaimStatus::Paid => "Paid",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::PreAuthSent => "Pre auth Sent",
            ClaimStatus::FinalApproval => "Final Approval",
            ClaimStatus::Settled => "Settled",
            ClaimStatus::AmountReceived => "Amount Received",
            ClaimStatus::EnhancementRequest => "Enhancement Request",
            ClaimStatus::FinalAmountSanctioned => "Final Amount Sanctioned",
        }
    }

    /// Claims in these statuses contribute `amount` to "billed" totals.
    pub fn in_billed_bucket(&self) -> bool {
        matches!(self, ClaimStatus::PreAuthSent | ClaimStatus::EnhancementRequest)
    }

    /// Claims in these statuses contribute `paid_amount` to
    /// "received"/"collection" totals.
    pub fn in_received_bucket(&self) -> bool {
        matches!(
            self,
            ClaimStatus::FinalApproval | ClaimStatus::FinalAmountSanctioned
        )
    }

    /// Claims feeding the rejected-cases report (`reason`, `amount`).
    pub fn in_rejected_bucket(&self) -> bool {
        matches!(self, ClaimStatus::Rejected)
    }

    /// Claims feeding settlement reports (`final_amount`, `nm_deductions`,
    /// `tds`, `final_settle_amount`, `amount`).
    pub fn in_settled_bucket(&self) -> bool {
        matches!(self, ClaimStatus::Settled)
    }
}

/// Status strings whose claims count as billed.
pub const BILLED_STATUSES: [&str; 2] = ["Pre auth Sent", "Enhancement Request"];
/// Status strings whose claims count as received/collected.
pub const RECEIVED_STATUSES: [&str; 2] = ["Final Approval", "Final Amount Sanctioned"];

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// Pre-authorization status enumeration. Overlaps with [`ClaimStatus`] but
/// is not identical; the two vocabularies are kept separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreAuthStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Query Raised")]
    QueryRaised,
    #[serde(rename = "Query Answered")]
    QueryAnswered,
    #[serde(rename = "Initial Approval Amount")]
    InitialApprovalAmount,
    #[serde(rename = "Approval")]
    Approval,
    #[serde(rename = "Amount Sanctioned")]
    AmountSanctioned,
    #[serde(rename = "Initial Approval")]
    InitialApproval,
    #[serde(rename = "Settlement Done")]
    SettlementDone,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Appealed")]
    Appealed,
}

impl PreAuthStatus {
    pub const ALL: [PreAuthStatus; 12] = [
        PreAuthStatus::Pending,
        PreAuthStatus::Processing,
        PreAuthStatus::QueryRaised,
        PreAuthStatus::QueryAnswered,
        PreAuthStatus::InitialApprovalAmount,
        PreAuthStatus::Approval,
        PreAuthStatus::AmountSanctioned,
        PreAuthStatus::InitialApproval,
        PreAuthStatus::SettlementDone,
        PreAuthStatus::Paid,
        PreAuthStatus::Rejected,
        PreAuthStatus::Appealed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreAuthStatus::Pending => "Pending",
            PreAuthStatus::Processing => "Processing",
            PreAuthStatus::QueryRaised => "Query Raised",
            PreAuthStatus::QueryAnswered => "Query Answered",
            PreAuthStatus::InitialApprovalAmount => "Initial Approval Amount",
            PreAuthStatus::Approval => "Approval",
            PreAuthStatus::AmountSanctioned => "Amount Sanctioned",
            PreAuthStatus::InitialApproval => "Initial Approval",
            PreAuthStatus::SettlementDone => "Settlement Done",
            PreAuthStatus::Paid => "Paid",
            PreAuthStatus::Rejected => "Rejected",
            PreAuthStatus::Appealed => "Appealed",
        }
    }
}

impl fmt::Display for PreAuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreAuthStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreAuthStatus::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_status_round_trip() {
        for status in ClaimStatus::ALL {
            let parsed: ClaimStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_preauth_status_round_trip() {
        for status in PreAuthStatus::ALL {
            let parsed: PreAuthStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_strings_are_case_sensitive() {
        assert!("pending".parse::<ClaimStatus>().is_err());
        assert!("PRE AUTH SENT".parse::<ClaimStatus>().is_err());
        assert_eq!(
            "Pre auth Sent".parse::<ClaimStatus>().unwrap(),
            ClaimStatus::PreAuthSent
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "Shipped".parse::<ClaimStatus>().unwrap_err();
        assert!(err.to_string().contains("Shipped"));
    }

    #[test]
    fn test_near_duplicates_stay_distinct() {
        let approval: ClaimStatus = "Approval".parse().unwrap();
        let approved: ClaimStatus = "Approved".parse().unwrap();
        let sanctioned: ClaimStatus = "Amount Sanctioned".parse().unwrap();
        let final_sanctioned: ClaimStatus = "Final Amount Sanctioned".parse().unwrap();
        assert_ne!(approval, approved);
        assert_ne!(sanctioned, final_sanctioned);
    }

    #[test]
    fn test_billed_bucket() {
        assert!(ClaimStatus::PreAuthSent.in_billed_bucket());
        assert!(ClaimStatus::EnhancementRequest.in_billed_bucket());
        assert!(!ClaimStatus::FinalApproval.in_billed_bucket());
        assert!(!ClaimStatus::Pending.in_billed_bucket());
    }

    #[test]
    fn test_received_bucket() {
        assert!(ClaimStatus::FinalApproval.in_received_bucket());
        assert!(ClaimStatus::FinalAmountSanctioned.in_received_bucket());
        assert!(!ClaimStatus::Approval.in_received_bucket());
        assert!(!ClaimStatus::AmountSanctioned.in_received_bucket());
    }

    #[test]
    fn test_rejected_and_settled_buckets() {
        assert!(ClaimStatus::Rejected.in_rejected_bucket());
        assert!(!ClaimStatus::Appealed.in_rejected_bucket());
        assert!(ClaimStatus::Settled.in_settled_bucket());
        assert!(!ClaimStatus::SettlementDone.in_settled_bucket());
    }

    #[test]
    fn test_bucket_constants_match_predicates() {
        for s in BILLED_STATUSES {
            assert!(s.parse::<ClaimStatus>().unwrap().in_billed_bucket());
        }
        for s in RECEIVED_STATUSES {
            assert!(s.parse::<ClaimStatus>().unwrap().in_received_bucket());
        }
    }

    #[test]
    fn test_serde_uses_display_strings() {
        let json = serde_json::to_string(&ClaimStatus::PreAuthSent).unwrap();
        assert_eq!(json, "\"Pre auth Sent\"");
        let back: ClaimStatus = serde_json::from_str("\"Final Amount Sanctioned\"").unwrap();
        assert_eq!(back, ClaimStatus::FinalAmountSanctioned);
    }
}
