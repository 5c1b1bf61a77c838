use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ===== DONATIONS =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
}

impl DonationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DonationStatus::Pending => "PENDING",
            DonationStatus::Completed => "COMPLETED",
            DonationStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "PENDING" => DonationStatus::Pending,
            "COMPLETED" => DonationStatus::Completed,
            "FAILED" => DonationStatus::Failed,
            _ => DonationStatus::Pending,
        }
    }
}

/// A donor's pledge toward a cause. Never deleted, only transitioned.
///
/// `remaining_amount` tracks the unfilled portion of the pledge so a donation
/// partially disbursed in one batch cannot be double-counted by a later batch.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub donation_id: String,
    pub donor_id: String,
    pub cause_id: String,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    pub fn status(&self) -> DonationStatus {
        DonationStatus::from_str(&self.status)
    }
}

/// Donation intake request.
#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct NewDonation {
    #[validate(length(min = 1))]
    pub donation_id: String,
    #[validate(length(min = 1))]
    pub donor_id: String,
    #[validate(length(min = 1))]
    pub cause_id: String,
    pub amount: Decimal,
    #[validate(length(min = 1))]
    pub currency: String,
}

// ===== DISBURSEMENTS =====

/// One donor credit created by an allocation batch. Append-only; exactly one
/// record may exist per (donation_id, disbursement_ref) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DisbursementRecord {
    pub id: Uuid,
    pub donation_id: String,
    pub disbursement_ref: String,
    pub cause_id: String,
    pub donor_id: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A planned credit against one donation, produced by the allocator and
/// persisted atomically with its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDisbursement {
    pub donation_id: String,
    pub donor_id: String,
    pub amount: Decimal,
    pub remaining_after: Decimal,
    pub new_status: DonationStatus,
}

/// Outcome of one allocation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    pub cause_id: String,
    pub disbursement_ref: String,
    pub records: Vec<DisbursementRecord>,
    pub unallocated_surplus: Decimal,
    /// True when the ref was already committed and the stored batch was
    /// returned instead of allocating again.
    pub replayed: bool,
}

// ===== API REQUESTS =====

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct AllocateRequest {
    #[validate(length(min = 1))]
    pub cause_id: String,
    pub amount: Decimal,
    #[validate(length(min = 1))]
    pub disbursement_ref: String,
}

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct TraceRequest {
    #[validate(length(min = 1))]
    pub seed_address: String,
    pub max_depth: u32,
    /// Restrict the trace to one currency; omit to keep every currency.
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donation_status_round_trips() {
        for status in [
            DonationStatus::Pending,
            DonationStatus::Completed,
            DonationStatus::Failed,
        ] {
            assert_eq!(DonationStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_defaults_to_pending() {
        assert_eq!(DonationStatus::from_str("???"), DonationStatus::Pending);
    }
}
