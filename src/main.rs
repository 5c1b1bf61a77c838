use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use disbursement_engine::{
    config::Config,
    database::PgDonationStore,
    handlers,
    ledger::XrplClient,
    services::DisbursementService,
    trace::PaymentTracer,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .json()
        .init();

    info!("Starting Disbursement Engine...");

    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    info!("Configuration loaded successfully");

    let store = Arc::new(
        PgDonationStore::new(&config.database.url, config.database.max_connections)
            .await
            .context("failed to connect to database")?,
    );

    info!("Database connected successfully");

    let ledger = Arc::new(
        XrplClient::new(
            config.ledger.json_rpc_url.clone(),
            config.ledger.request_timeout_secs,
        )
        .context("failed to build ledger client")?,
    );
    let tracer = PaymentTracer::new(ledger, config.ledger.history_page_limit);

    info!("Ledger client initialized ({})", config.ledger.json_rpc_url);

    let service = Arc::new(DisbursementService::new(store, tracer));
    let service_data = web::Data::new(service);
    let config_data = web::Data::new(config.clone());

    info!(
        "Starting HTTP server on {}:{}",
        config.server.host, config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
