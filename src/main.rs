use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tollgate::{
    app,
    config::Config,
    handlers::AppState,
    middleware::PaymentGate,
    models::ServiceCatalog,
    services::{BalanceService, ChainVerifier, MemoryLedger, PaymentLedger, PaymentPolicy},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    tracing::info!("Starting tollgate v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Network: {} (chain id {})",
        config.network.name,
        config.network.chain_id
    );
    tracing::info!("Payment address: {:?}", config.payment_address);

    if config.explorer_api_key.is_none() {
        tracing::warn!(
            "No BASESCAN_API_KEY configured; payments cannot be confirmed and gated endpoints will refuse"
        );
    }

    // Initialize services
    let ledger: Arc<dyn PaymentLedger> = Arc::new(MemoryLedger::new());
    let policy = Arc::new(PaymentPolicy::new(
        ServiceCatalog::standard(),
        config.network.clone(),
        config.payment_address,
        config.public_url.clone(),
    ));
    let verifier = Arc::new(ChainVerifier::new(
        config.explorer_api_url.clone(),
        config.explorer_api_key.clone(),
        config.verify_timeout,
        config.payment_address,
        ledger.clone(),
    )?);
    let balance = Arc::new(BalanceService::new(
        &config.network.rpc_url,
        config.network.usdc_address,
        config.payment_address,
        config.balance_cache_ttl,
    )?);

    let gate = Arc::new(PaymentGate::new(
        policy.clone(),
        verifier.clone(),
        ledger.clone(),
    ));

    // Optional eviction. Without LEDGER_TTL_SECS, verified payments live as
    // long as the process.
    if let Some(ttl) = config.ledger_ttl {
        let ledger = ledger.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                let purged = ledger.purge_expired(ttl).await;
                if purged > 0 {
                    tracing::info!("Purged {} expired ledger records", purged);
                }
            }
        });
    }

    // Build application state and router
    let state = AppState {
        config: config.clone(),
        policy,
        verifier,
        balance,
        ledger,
    };
    let app = app::router(state, gate);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Service info: http://{}/api/info", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
