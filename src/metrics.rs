use lazy_static::lazy_static;
use prometheus::{Histogram, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref ALLOCATIONS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "disbursement_allocations_total",
        "Allocation calls by outcome (committed, replayed, empty, failed)",
        &["outcome"]
    )
    .expect("metric registration");

    pub static ref DISBURSEMENT_RECORDS_CREATED: IntCounter = prometheus::register_int_counter!(
        "disbursement_records_created_total",
        "Disbursement records committed to the store"
    )
    .expect("metric registration");

    pub static ref TRACE_REQUESTS_TOTAL: IntCounter = prometheus::register_int_counter!(
        "payment_trace_requests_total",
        "Payment network trace requests"
    )
    .expect("metric registration");

    pub static ref TRACE_ADDRESSES_VISITED: Histogram = prometheus::register_histogram!(
        "payment_trace_addresses_visited",
        "Addresses visited per trace"
    )
    .expect("metric registration");

    pub static ref LEDGER_FETCH_FAILURES: IntCounter = prometheus::register_int_counter!(
        "ledger_fetch_failures_total",
        "Per-address history fetches skipped during traces"
    )
    .expect("metric registration");
}
