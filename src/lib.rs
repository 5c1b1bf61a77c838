// Disbursement Engine Library
// Settlement allocation and payment-network tracing for the donation platform

pub mod allocation;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod services;
pub mod trace;

// Re-exports
pub use errors::{EngineError, Result};
pub use models::*;
pub use services::DisbursementService;
pub use trace::{consolidate, PaymentTracer};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVICE_NAME: &str = "disbursement-engine";
