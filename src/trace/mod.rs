// Payment tracing
// Reconstructs the transitive flow of funds out of a seed address from
// ledger history: bounded BFS -> edge consolidation -> flow summary.

pub mod consolidator;
pub mod flow;
pub mod traverser;

pub use consolidator::consolidate;
pub use flow::AddressFlow;
pub use traverser::PaymentTracer;

use crate::ledger::{LedgerTransaction, LedgerTxKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentKind {
    Payment,
    /// A counterparty cashing the origin's check; funds still leave the
    /// origin, so it is traced as an outgoing payment.
    CheckCashAsPayment,
}

/// One observed outgoing transfer. Derived from ledger data per trace and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEdge {
    pub sender: String,
    pub receiver: String,
    pub amount: Decimal,
    pub currency: String,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    pub fee: Decimal,
    pub kind: PaymentKind,
}

impl PaymentEdge {
    /// Derive an edge from a decoded ledger transfer, keeping it only when it
    /// moves funds *out of* `origin`.
    pub fn from_ledger_tx(tx: &LedgerTransaction, origin: &str) -> Option<PaymentEdge> {
        let (receiver, kind) = match &tx.kind {
            LedgerTxKind::Payment {
                source,
                destination,
            } => {
                if source != origin || destination == origin {
                    return None;
                }
                (destination.clone(), PaymentKind::Payment)
            }
            LedgerTxKind::CheckCash { casher } => {
                if casher == origin {
                    return None;
                }
                (casher.clone(), PaymentKind::CheckCashAsPayment)
            }
        };

        Some(PaymentEdge {
            sender: origin.to_string(),
            receiver,
            amount: tx.amount.value,
            currency: tx.amount.currency.clone(),
            tx_hash: tx.hash.clone(),
            timestamp: tx.timestamp,
            fee: tx.fee,
            kind,
        })
    }
}

/// Aggregate of every payment between one sender and receiver in one
/// currency. Member lists are ordered by timestamp ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedEdge {
    pub sender: String,
    pub receiver: String,
    pub currency: String,
    pub amounts: Vec<Decimal>,
    pub tx_hashes: Vec<String>,
    pub fees: Vec<Decimal>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    pub transaction_count: usize,
}

/// An address whose history fetch failed; its edges are missing from the
/// (still best-effort) result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedAddress {
    pub address: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    pub seed_address: String,
    pub edges: Vec<ConsolidatedEdge>,
    pub flows: Vec<AddressFlow>,
    pub skipped: Vec<SkippedAddress>,
    pub addresses_visited: usize,
}
