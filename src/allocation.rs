// FIFO Disbursement Planner
// Splits one settlement amount across a cause's pending donations.

use crate::models::{Donation, DonationStatus, PlannedDisbursement};
use rust_decimal::Decimal;

/// Result of planning one allocation batch. Nothing is persisted here; the
/// caller commits the entries as a single transaction.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub entries: Vec<PlannedDisbursement>,
    pub unallocated_surplus: Decimal,
}

impl AllocationPlan {
    pub fn allocated_total(&self) -> Decimal {
        self.entries
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc + e.amount)
    }
}

/// Plan the disbursement of `total_amount` across `pending`, oldest donor
/// first. `pending` must already be ordered by `created_at` ascending.
///
/// Each donation is credited up to its remaining pledge; a donation whose
/// remaining balance is fully consumed transitions to Completed, otherwise it
/// stays Pending with the reduced balance. Whatever is left of `total_amount`
/// after the list is exhausted is returned as surplus, not carried forward.
pub fn plan_fifo(pending: &[Donation], total_amount: Decimal) -> AllocationPlan {
    let mut remaining = total_amount;
    let mut entries = Vec::new();

    for donation in pending {
        if remaining <= Decimal::ZERO {
            break;
        }
        if donation.remaining_amount <= Decimal::ZERO {
            continue;
        }

        let fulfillment = donation.remaining_amount.min(remaining);
        let remaining_after = donation.remaining_amount - fulfillment;

        entries.push(PlannedDisbursement {
            donation_id: donation.donation_id.clone(),
            donor_id: donation.donor_id.clone(),
            amount: fulfillment,
            remaining_after,
            new_status: if remaining_after == Decimal::ZERO {
                DonationStatus::Completed
            } else {
                DonationStatus::Pending
            },
        });

        remaining -= fulfillment;
    }

    AllocationPlan {
        entries,
        unallocated_surplus: remaining.max(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn donation(id: &str, amount: Decimal, day: u32) -> Donation {
        Donation {
            donation_id: id.to_string(),
            donor_id: format!("donor-{}", id),
            cause_id: "cause-1".to_string(),
            amount,
            remaining_amount: amount,
            currency: "RLUSD".to_string(),
            status: DonationStatus::Pending.as_str().to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn splits_across_oldest_donations_first() {
        // D1 2024-01-01 and D2 2024-01-02, both $500; settle $700.
        let pending = vec![donation("d1", dec!(500), 1), donation("d2", dec!(500), 2)];

        let plan = plan_fifo(&pending, dec!(700));

        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.entries[0].donation_id, "d1");
        assert_eq!(plan.entries[0].amount, dec!(500));
        assert_eq!(plan.entries[0].new_status, DonationStatus::Completed);
        assert_eq!(plan.entries[1].donation_id, "d2");
        assert_eq!(plan.entries[1].amount, dec!(200));
        assert_eq!(plan.entries[1].remaining_after, dec!(300));
        assert_eq!(plan.entries[1].new_status, DonationStatus::Pending);
        assert_eq!(plan.unallocated_surplus, Decimal::ZERO);
    }

    #[test]
    fn empty_pending_list_is_all_surplus() {
        let plan = plan_fifo(&[], dec!(100));
        assert!(plan.entries.is_empty());
        assert_eq!(plan.unallocated_surplus, dec!(100));
    }

    #[test]
    fn stops_once_payment_is_consumed() {
        let pending = vec![
            donation("d1", dec!(50), 1),
            donation("d2", dec!(50), 2),
            donation("d3", dec!(50), 3),
        ];

        let plan = plan_fifo(&pending, dec!(100));

        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.allocated_total(), dec!(100));
        assert_eq!(plan.unallocated_surplus, Decimal::ZERO);
    }

    #[test]
    fn exact_decimal_arithmetic() {
        let pending = vec![donation("d1", dec!(0.1), 1), donation("d2", dec!(0.2), 2)];

        let plan = plan_fifo(&pending, dec!(0.3));

        assert_eq!(plan.allocated_total(), dec!(0.3));
        assert_eq!(plan.unallocated_surplus, Decimal::ZERO);
        assert_eq!(plan.entries[1].new_status, DonationStatus::Completed);
    }

    #[test]
    fn partially_filled_donation_keeps_its_balance() {
        let mut partly_filled = donation("d1", dec!(500), 1);
        partly_filled.remaining_amount = dec!(300);

        let plan = plan_fifo(&[partly_filled], dec!(100));

        assert_eq!(plan.entries[0].amount, dec!(100));
        assert_eq!(plan.entries[0].remaining_after, dec!(200));
        assert_eq!(plan.entries[0].new_status, DonationStatus::Pending);
    }

    #[test]
    fn skips_donations_with_nothing_left() {
        let mut spent = donation("d1", dec!(500), 1);
        spent.remaining_amount = Decimal::ZERO;
        let pending = vec![spent, donation("d2", dec!(40), 2)];

        let plan = plan_fifo(&pending, dec!(100));

        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].donation_id, "d2");
        assert_eq!(plan.unallocated_surplus, dec!(60));
    }
}
