use crate::allocation;
use crate::database::DonationStore;
use crate::errors::{EngineError, Result};
use crate::metrics;
use crate::models::{AllocationResult, DisbursementRecord, Donation, NewDonation};
use crate::trace::{PaymentTracer, TraceReport};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Orchestrates the two core operations: settlement allocation against the
/// donation store and payment-network tracing against the ledger. All
/// collaborators are injected; the service holds no global state.
pub struct DisbursementService {
    store: Arc<dyn DonationStore>,
    tracer: PaymentTracer,
    /// One async mutex per cause. The lock spans the read-plan-commit
    /// sequence so two settlements for the same cause cannot allocate the
    /// same pending donation twice; distinct causes never contend.
    cause_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DisbursementService {
    pub fn new(store: Arc<dyn DonationStore>, tracer: PaymentTracer) -> Self {
        DisbursementService {
            store,
            tracer,
            cause_locks: DashMap::new(),
        }
    }

    /// Allocate one settlement payment across a cause's pending donations,
    /// oldest first. Idempotent per `disbursement_ref`: a retried call
    /// returns the committed batch instead of allocating again.
    pub async fn allocate_disbursement(
        &self,
        cause_id: &str,
        total_amount: Decimal,
        disbursement_ref: &str,
    ) -> Result<AllocationResult> {
        if cause_id.is_empty() {
            return Err(EngineError::Validation("cause_id must not be empty".to_string()));
        }
        if disbursement_ref.is_empty() {
            return Err(EngineError::Validation(
                "disbursement_ref must not be empty".to_string(),
            ));
        }
        if total_amount <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "settlement amount must be positive (cause {}, ref {}, amount {})",
                cause_id, disbursement_ref, total_amount
            )));
        }

        let lock = self.cause_lock(cause_id);
        let _guard = lock.lock().await;

        // The triggering payment is irrevocable, so a retried ref must not
        // create a second batch.
        let existing = self
            .store
            .find_disbursements(cause_id, disbursement_ref)
            .await?;
        if !existing.is_empty() {
            warn!(
                "Replaying committed disbursement batch for cause {} ref {}",
                cause_id, disbursement_ref
            );
            metrics::ALLOCATIONS_TOTAL.with_label_values(&["replayed"]).inc();
            return Ok(Self::replayed_result(
                cause_id,
                disbursement_ref,
                total_amount,
                existing,
            ));
        }

        if !self.store.cause_exists(cause_id).await? {
            return Err(EngineError::CauseNotFound(cause_id.to_string()));
        }

        let pending = self.store.get_pending(cause_id).await?;
        if pending.is_empty() {
            // A legitimate outcome, not an error: the whole payment is
            // surplus for the caller to log or alert on.
            warn!(
                "No pending donations for cause {} (ref {}); {} unallocated",
                cause_id, disbursement_ref, total_amount
            );
            metrics::ALLOCATIONS_TOTAL.with_label_values(&["empty"]).inc();
            return Ok(AllocationResult {
                cause_id: cause_id.to_string(),
                disbursement_ref: disbursement_ref.to_string(),
                records: Vec::new(),
                unallocated_surplus: total_amount,
                replayed: false,
            });
        }

        let plan = allocation::plan_fifo(&pending, total_amount);

        let records = self
            .store
            .commit_disbursement_batch(cause_id, disbursement_ref, &plan.entries)
            .await
            .map_err(|e| {
                metrics::ALLOCATIONS_TOTAL.with_label_values(&["failed"]).inc();
                e
            })?;

        metrics::ALLOCATIONS_TOTAL.with_label_values(&["committed"]).inc();
        metrics::DISBURSEMENT_RECORDS_CREATED.inc_by(records.len() as u64);

        info!(
            "Allocated {} across {} donations for cause {} (ref {}, surplus {})",
            plan.allocated_total(),
            records.len(),
            cause_id,
            disbursement_ref,
            plan.unallocated_surplus
        );

        Ok(AllocationResult {
            cause_id: cause_id.to_string(),
            disbursement_ref: disbursement_ref.to_string(),
            records,
            unallocated_surplus: plan.unallocated_surplus,
            replayed: false,
        })
    }

    /// Trace the payment network out of `seed_address`. Concurrent traces
    /// share no mutable state.
    pub async fn trace_payment_network(
        &self,
        seed_address: &str,
        max_depth: u32,
        currency_filter: Option<&str>,
    ) -> Result<TraceReport> {
        metrics::TRACE_REQUESTS_TOTAL.inc();

        let report = self
            .tracer
            .trace(seed_address, max_depth, currency_filter)
            .await?;

        metrics::TRACE_ADDRESSES_VISITED.observe(report.addresses_visited as f64);
        info!(
            "Traced {}: {} consolidated edges over {} addresses ({} skipped)",
            seed_address,
            report.edges.len(),
            report.addresses_visited,
            report.skipped.len()
        );

        Ok(report)
    }

    pub async fn register_donation(&self, donation: NewDonation) -> Result<Donation> {
        validator::Validate::validate(&donation)
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        if donation.amount <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "donation amount must be positive (donation {})",
                donation.donation_id
            )));
        }
        if !self.store.cause_exists(&donation.cause_id).await? {
            return Err(EngineError::CauseNotFound(donation.cause_id.clone()));
        }

        let created = self.store.insert_donation(&donation).await?;
        info!(
            "Registered donation {} of {} {} for cause {}",
            created.donation_id, created.amount, created.currency, created.cause_id
        );
        Ok(created)
    }

    pub async fn pending_donations(&self, cause_id: &str) -> Result<Vec<Donation>> {
        if !self.store.cause_exists(cause_id).await? {
            return Err(EngineError::CauseNotFound(cause_id.to_string()));
        }
        self.store.get_pending(cause_id).await
    }

    pub async fn committed_batch(
        &self,
        cause_id: &str,
        disbursement_ref: &str,
    ) -> Result<Vec<DisbursementRecord>> {
        self.store.find_disbursements(cause_id, disbursement_ref).await
    }

    fn cause_lock(&self, cause_id: &str) -> Arc<Mutex<()>> {
        self.cause_locks
            .entry(cause_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn replayed_result(
        cause_id: &str,
        disbursement_ref: &str,
        total_amount: Decimal,
        records: Vec<DisbursementRecord>,
    ) -> AllocationResult {
        let allocated = records
            .iter()
            .fold(Decimal::ZERO, |acc, r| acc + r.amount);
        AllocationResult {
            cause_id: cause_id.to_string(),
            disbursement_ref: disbursement_ref.to_string(),
            records,
            unallocated_surplus: (total_amount - allocated).max(Decimal::ZERO),
            replayed: true,
        }
    }
}
