use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lawbook_payments::config::{AppConfig, Config};
use lawbook_payments::middleware::{RequestId, TrustedHeaderAuth};
use lawbook_payments::modules::catalog::MySqlCatalogLookup;
use lawbook_payments::modules::commissions::MySqlCommissionRepository;
use lawbook_payments::modules::gateways::{PaymentGateway, SafepayClient};
use lawbook_payments::modules::health;
use lawbook_payments::modules::payments::{
    self, CheckoutService, MySqlPaymentRepository, ReconciliationService, ReturnPageSettings,
    SellerEarningsDistributor,
};
use lawbook_payments::modules::payouts::{
    self, LogNotifier, MySqlPayoutRepository, PayoutService, RailRegistry, SafepayPayoutRail,
    SettlementScheduler,
};
use lawbook_payments::modules::purchases::MySqlPurchaseRepository;
use lawbook_payments::modules::sellers::MySqlSellerRepository;

fn init_tracing(app: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("lawbook_payments={},actix_web=info", app.log_level).into()
    });

    if app.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.app);
    config.validate().context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.app.env,
        bind_address = %config.server.bind_address(),
        "Starting lawbook payments service"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
    }

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    // Repositories
    let payment_repo = Arc::new(MySqlPaymentRepository::new(db_pool.clone()));
    let purchase_repo = Arc::new(MySqlPurchaseRepository::new(db_pool.clone()));
    let commission_repo = Arc::new(MySqlCommissionRepository::new(db_pool.clone()));
    let seller_repo = Arc::new(MySqlSellerRepository::new(db_pool.clone()));
    let payout_repo = Arc::new(MySqlPayoutRepository::new(db_pool.clone()));
    let catalog = Arc::new(MySqlCatalogLookup::new(db_pool.clone()));

    // Gateway
    let return_url = format!(
        "{}/api/payments/return",
        config.app.public_api_url.trim_end_matches('/')
    );
    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        SafepayClient::new(&config.safepay, return_url)
            .context("Failed to build Safepay client")?,
    );

    // Services
    let checkout_service = Arc::new(CheckoutService::new(
        catalog,
        payment_repo.clone(),
        purchase_repo.clone(),
        gateway.clone(),
        config.commission.clone(),
        config.app.currency,
    ));

    let reconciliation_service = Arc::new(ReconciliationService::new(
        payment_repo,
        purchase_repo,
        commission_repo,
        gateway,
        Arc::new(SellerEarningsDistributor::new(seller_repo.clone())),
    ));

    let mut rails = RailRegistry::new();
    match &config.payouts.safepay_payout_url {
        Some(url) => rails.register(Arc::new(
            SafepayPayoutRail::new(url, &config.safepay.secret_key, config.safepay.timeout)
                .context("Failed to build Safepay payout rail")?,
        )),
        None => tracing::warn!("SAFEPAY_PAYOUT_URL not set; Safepay payouts will be manual"),
    }

    let payout_service = Arc::new(PayoutService::new(
        seller_repo,
        payout_repo,
        rails,
        Arc::new(LogNotifier),
        config.payouts.clone(),
        config.app.currency,
    ));

    if config.payouts.sweep_enabled {
        let scheduler = Arc::new(SettlementScheduler::new(
            payout_service.clone(),
            reconciliation_service.clone(),
            config.payouts.sweep_interval,
        ));
        tokio::spawn(scheduler.start());
    }

    let return_page = ReturnPageSettings {
        frontend_url: config.app.frontend_url.clone(),
    };
    let frontend_url = config.app.frontend_url.clone();
    let bind_address = config.server.bind_address();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(TrustedHeaderAuth)
            .wrap(cors)
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(reconciliation_service.clone()))
            .app_data(web::Data::new(payout_service.clone()))
            .app_data(web::Data::new(return_page.clone()))
            .configure(health::configure)
            .service(
                web::scope("/api")
                    .configure(payments::configure)
                    .configure(payouts::configure),
            )
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}
