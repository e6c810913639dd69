use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cyclemart_api::AppState;
use cyclemart_hold::{HoldManager, RefreshLoop, Refresher, SettlementService};
use cyclemart_store::{
    ChangeNotifier, DbClient, PgCycleRepository, PgHoldRepository, PgSettlementRepository,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cyclemart_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cyclemart_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Cyclemart API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let holds = Arc::new(PgHoldRepository { pool: db.pool.clone() });
    let cycles = Arc::new(PgCycleRepository { pool: db.pool.clone() });
    let settlements = Arc::new(PgSettlementRepository { pool: db.pool.clone() });

    let notifier = ChangeNotifier::default();
    let manager = Arc::new(HoldManager::new(
        holds,
        cycles.clone(),
        notifier.clone(),
        config.business_rules.hold_minutes,
    ));
    let settlement = Arc::new(SettlementService::new(settlements, manager.clone()));

    // Background sweep + refresh, driven by both the timer and the notifier.
    let (refresher, _snapshot_rx) = Refresher::new(manager.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(
        RefreshLoop::new(
            refresher,
            notifier.clone(),
            Duration::from_secs(config.business_rules.refresh_interval_seconds),
        )
        .run(shutdown_rx),
    );

    let state = AppState {
        manager,
        settlement,
        cycles,
        notifier,
    };
    let app = cyclemart_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Stop the refresh loop once the server has drained.
    let _ = shutdown_tx.send(true);
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
