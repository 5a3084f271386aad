use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{signal, sync::mpsc};
use tracing::{error, info};

use tableside_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    // Event channel feeding the notification dispatcher
    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(api::events::EventSender::new(event_tx));

    let mailer = api::services::mail::build_sender(&cfg.smtp)
        .context("failed to initialize mail sender")?;
    let dispatcher = Arc::new(api::services::notifications::NotificationDispatcher::new(
        db.clone(),
        mailer,
    ));
    tokio::spawn(api::events::process_events(event_rx, dispatcher));

    let storage: Arc<dyn api::services::storage::ObjectStorage> = Arc::new(
        api::services::storage::HttpObjectStorage::new(cfg.storage.clone()),
    );
    let checkout_client = Arc::new(api::services::hosted_checkout::HostedCheckoutClient::new(
        cfg.checkout.clone(),
    ));

    let tax_rate = api::services::pricing::rate_from_config(cfg.default_tax_rate);
    let delivery_fee = api::services::pricing::rate_from_config(cfg.delivery_fee);

    let services = api::handlers::AppServices {
        menu: Arc::new(api::services::menu::MenuService::new(db.clone())),
        carts: Arc::new(api::services::carts::CartService::new(
            db.clone(),
            event_sender.clone(),
            tax_rate,
            cfg.default_currency.clone(),
        )),
        orders: Arc::new(api::services::orders::OrderService::new(
            db.clone(),
            event_sender.clone(),
            tax_rate,
            delivery_fee,
            cfg.default_currency.clone(),
            cfg.api_default_page_size as u64,
            cfg.api_max_page_size as u64,
        )),
        payments: Arc::new(api::services::payments::PaymentService::new(
            db.clone(),
            event_sender.clone(),
            checkout_client,
        )),
        proofs: Arc::new(api::services::proofs::ProofService::new(
            db.clone(),
            event_sender.clone(),
            storage,
        )),
        bookings: Arc::new(api::services::bookings::BookingService::new(
            db.clone(),
            event_sender.clone(),
        )),
    };

    let state = api::AppState {
        db,
        config: Arc::new(cfg.clone()),
        event_sender,
        services,
    };
    let app = api::build_app(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port configuration")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("tableside-api listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
