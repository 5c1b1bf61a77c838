// Ledger payload decoding
// Raw account_tx entries are loosely shaped JSON; everything is decoded and
// validated here, before any business logic sees it.

use crate::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// One XRP = 1_000_000 drops; native amounts and fees arrive in drops.
const DROPS_PER_XRP: u32 = 1_000_000;

pub const NATIVE_CURRENCY: &str = "XRP";

// ===== RAW WIRE SHAPES =====

#[derive(Debug, Deserialize)]
pub struct AccountTxResponse {
    pub result: AccountTxResult,
}

#[derive(Debug, Deserialize)]
pub struct AccountTxResult {
    pub status: Option<String>,
    #[serde(default)]
    pub transactions: Vec<AccountTxEntry>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountTxEntry {
    pub tx_json: TxJson,
    pub meta: TxMeta,
    pub hash: String,
    pub close_time_iso: String,
}

#[derive(Debug, Deserialize)]
pub struct TxJson {
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Destination")]
    pub destination: Option<String>,
    #[serde(rename = "Fee")]
    pub fee: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TxMeta {
    pub delivered_amount: Option<RawAmount>,
}

/// Delivered amount is either a numeric drops string (native XRP) or a
/// structured issued-currency object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Drops(String),
    Issued {
        currency: String,
        value: String,
        issuer: String,
    },
}

// ===== DECODED SHAPES =====

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerAmount {
    pub currency: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerTxKind {
    Payment { source: String, destination: String },
    CheckCash { casher: String },
}

/// A validated ledger transfer, normalized to display units (drops become
/// XRP; issued currencies keep their code and exact decimal value).
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    pub kind: LedgerTxKind,
    pub amount: LedgerAmount,
    pub hash: String,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl AccountTxEntry {
    /// Decode one raw entry. Transaction types other than Payment and
    /// CheckCash yield `Ok(None)`; malformed payloads are errors.
    pub fn decode(&self) -> Result<Option<LedgerTransaction>> {
        let kind = match self.tx_json.transaction_type.as_str() {
            "Payment" => {
                let destination = self.tx_json.destination.clone().ok_or_else(|| {
                    EngineError::LedgerPayload(format!(
                        "payment {} has no destination",
                        self.hash
                    ))
                })?;
                LedgerTxKind::Payment {
                    source: self.tx_json.account.clone(),
                    destination,
                }
            }
            "CheckCash" => LedgerTxKind::CheckCash {
                casher: self.tx_json.account.clone(),
            },
            _ => return Ok(None),
        };

        let amount = match &self.meta.delivered_amount {
            Some(RawAmount::Drops(drops)) => LedgerAmount {
                currency: NATIVE_CURRENCY.to_string(),
                value: drops_to_xrp(drops)?,
            },
            Some(RawAmount::Issued { currency, value, .. }) => LedgerAmount {
                currency: currency.clone(),
                value: Decimal::from_str(value).map_err(|e| {
                    EngineError::LedgerPayload(format!(
                        "bad issued amount '{}' in {}: {}",
                        value, self.hash, e
                    ))
                })?,
            },
            None => LedgerAmount {
                currency: NATIVE_CURRENCY.to_string(),
                value: Decimal::ZERO,
            },
        };

        let fee = match &self.tx_json.fee {
            Some(drops) => drops_to_xrp(drops)?,
            None => Decimal::ZERO,
        };

        let timestamp = DateTime::parse_from_rfc3339(&self.close_time_iso)
            .map_err(|e| {
                EngineError::LedgerPayload(format!(
                    "bad close time '{}' in {}: {}",
                    self.close_time_iso, self.hash, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Some(LedgerTransaction {
            kind,
            amount,
            hash: self.hash.clone(),
            fee,
            timestamp,
        }))
    }
}

fn drops_to_xrp(drops: &str) -> Result<Decimal> {
    let raw = Decimal::from_str(drops.trim())
        .map_err(|e| EngineError::LedgerPayload(format!("bad drops amount '{}': {}", drops, e)))?;
    raw.checked_div(Decimal::from(DROPS_PER_XRP))
        .ok_or_else(|| EngineError::LedgerPayload(format!("drops amount out of range: {}", drops)))
}
