use crate::config::Config;
use crate::errors::EngineError;
use crate::models::{AllocateRequest, NewDonation, TraceRequest};
use crate::services::DisbursementService;
use actix_web::{web, HttpResponse};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": crate::SERVICE_NAME,
        "version": crate::VERSION
    }))
}

/// Allocate a settlement payment across a cause's pending donations
pub async fn allocate_disbursement(
    service: web::Data<Arc<DisbursementService>>,
    request: web::Json<AllocateRequest>,
) -> Result<HttpResponse, EngineError> {
    let request = request.into_inner();
    validator::Validate::validate(&request)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    let result = service
        .allocate_disbursement(&request.cause_id, request.amount, &request.disbursement_ref)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Look up the committed batch for a (cause, disbursement_ref) pair
pub async fn get_disbursement_batch(
    service: web::Data<Arc<DisbursementService>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, EngineError> {
    let (cause_id, disbursement_ref) = path.into_inner();
    let records = service.committed_batch(&cause_id, &disbursement_ref).await?;

    Ok(HttpResponse::Ok().json(json!({
        "cause_id": cause_id,
        "disbursement_ref": disbursement_ref,
        "total_records": records.len(),
        "records": records
    })))
}

/// Register a new pending donation
pub async fn create_donation(
    service: web::Data<Arc<DisbursementService>>,
    request: web::Json<NewDonation>,
) -> Result<HttpResponse, EngineError> {
    let donation = service.register_donation(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(donation))
}

/// Pending donations for a cause in FIFO order
pub async fn get_pending_donations(
    service: web::Data<Arc<DisbursementService>>,
    cause_id: web::Path<String>,
) -> Result<HttpResponse, EngineError> {
    let donations = service.pending_donations(&cause_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "cause_id": cause_id.as_str(),
        "total_pending": donations.len(),
        "donations": donations
    })))
}

/// Trace the payment network out of a seed address
pub async fn trace_payment_network(
    service: web::Data<Arc<DisbursementService>>,
    config: web::Data<Config>,
    request: web::Json<TraceRequest>,
) -> Result<HttpResponse, EngineError> {
    let request = request.into_inner();
    validator::Validate::validate(&request)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    let cap = config.trace.max_depth_cap;
    if request.max_depth > cap {
        warn!(
            "Clamping trace depth {} to configured cap {} for {}",
            request.max_depth, cap, request.seed_address
        );
    }
    let max_depth = request.max_depth.min(cap);

    let report = service
        .trace_payment_network(&request.seed_address, max_depth, request.currency.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Prometheus metrics in text exposition format
pub async fn prometheus_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => match String::from_utf8(buffer) {
            Ok(body) => HttpResponse::Ok()
                .content_type("text/plain; version=0.0.4")
                .body(body),
            Err(e) => HttpResponse::InternalServerError()
                .body(format!("Failed to encode metrics: {}", e)),
        },
        Err(e) => {
            HttpResponse::InternalServerError().body(format!("Failed to gather metrics: {}", e))
        }
    }
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(prometheus_metrics))
        .service(
            web::scope("/api/v1")
                .route("/disbursements", web::post().to(allocate_disbursement))
                .route(
                    "/disbursements/{cause_id}/{disbursement_ref}",
                    web::get().to(get_disbursement_batch),
                )
                .route("/donations", web::post().to(create_donation))
                .route(
                    "/causes/{cause_id}/pending",
                    web::get().to(get_pending_donations),
                )
                .route("/trace", web::post().to(trace_payment_network)),
        );
}
