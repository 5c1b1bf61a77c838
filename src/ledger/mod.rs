// Ledger access
// The engine reads transaction history through the LedgerSource seam; the
// production implementation speaks XRPL JSON-RPC over HTTP.

pub mod client;
pub mod transaction;

pub use client::XrplClient;
pub use transaction::{LedgerAmount, LedgerTransaction, LedgerTxKind};

use crate::errors::Result;
use async_trait::async_trait;

/// Read-only view of an address's recent transaction history, already decoded
/// into validated transfers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Most-recent `limit` transfers touching `address`, newest first as the
    /// ledger returns them.
    async fn fetch_history(&self, address: &str, limit: u32) -> Result<Vec<LedgerTransaction>>;
}
