use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ledger client error: {0}")]
    LedgerClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cause not found: {0}")]
    CauseNotFound(String),

    #[error("Donation not found: {0}")]
    DonationNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Ledger fetch failed for {address}: {reason}")]
    UpstreamLedger { address: String, reason: String },

    #[error("Malformed ledger payload: {0}")]
    LedgerPayload(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for EngineError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": error_message,
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::LedgerClient(_) => StatusCode::BAD_GATEWAY,
            EngineError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::DecimalParse(_) => StatusCode::BAD_REQUEST,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::CauseNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::DonationNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::UpstreamLedger { .. } => StatusCode::BAD_GATEWAY,
            EngineError::LedgerPayload(_) => StatusCode::BAD_GATEWAY,
            EngineError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl EngineError {
    fn error_type(&self) -> &str {
        match self {
            EngineError::Database(_) => "database_error",
            EngineError::LedgerClient(_) => "ledger_client_error",
            EngineError::Serialization(_) => "serialization_error",
            EngineError::DecimalParse(_) => "decimal_parse_error",
            EngineError::Validation(_) => "validation_error",
            EngineError::CauseNotFound(_) => "not_found",
            EngineError::DonationNotFound(_) => "not_found",
            EngineError::Conflict(_) => "conflict",
            EngineError::UpstreamLedger { .. } => "upstream_ledger_error",
            EngineError::LedgerPayload(_) => "ledger_payload_error",
            EngineError::Configuration(_) => "configuration_error",
            EngineError::Internal(_) => "internal_error",
        }
    }
}
