use crate::errors::{EngineError, Result};
use crate::ledger::transaction::{AccountTxResponse, LedgerTransaction};
use crate::ledger::LedgerSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: [AccountTxParams<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AccountTxParams<'a> {
    account: &'a str,
    ledger_index_max: i64,
    limit: u32,
}

/// XRPL JSON-RPC client for account transaction history.
pub struct XrplClient {
    endpoint: String,
    client: Client,
}

impl XrplClient {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(XrplClient { endpoint, client })
    }
}

#[async_trait]
impl LedgerSource for XrplClient {
    async fn fetch_history(&self, address: &str, limit: u32) -> Result<Vec<LedgerTransaction>> {
        let request = RpcRequest {
            method: "account_tx",
            params: [AccountTxParams {
                account: address,
                ledger_index_max: -1,
                limit,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::UpstreamLedger {
                address: address.to_string(),
                reason: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(EngineError::UpstreamLedger {
                address: address.to_string(),
                reason: format!("http status {}", response.status()),
            });
        }

        let body = response.json::<AccountTxResponse>().await.map_err(|e| {
            EngineError::UpstreamLedger {
                address: address.to_string(),
                reason: format!("unparseable response: {}", e),
            }
        })?;

        if body.result.status.as_deref() != Some("success") {
            return Err(EngineError::UpstreamLedger {
                address: address.to_string(),
                reason: body
                    .result
                    .error_message
                    .unwrap_or_else(|| "ledger reported failure".to_string()),
            });
        }

        // Best-effort history: one undecodable entry should not hide the
        // rest of the page.
        let mut transfers = Vec::with_capacity(body.result.transactions.len());
        for entry in &body.result.transactions {
            match entry.decode() {
                Ok(Some(tx)) => transfers.push(tx),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping undecodable ledger entry for {}: {}", address, e);
                }
            }
        }

        Ok(transfers)
    }
}
