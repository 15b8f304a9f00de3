use crate::handlers::AppState;
use crate::models::HealthStatus;
use axum::{extract::State, Json};
use chrono::Utc;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    // Degraded without an explorer key: the gate still runs, but payments
    // cannot be confirmed.
    let status = if state.config.explorer_api_key.is_some() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: state.config.network.name.clone(),
        currency: "USDC".to_string(),
        address: state.config.payment_address,
        explorer: state.config.network.address_link(&state.config.payment_address),
        ledger_size: state.ledger.size().await,
        timestamp: Utc::now(),
    })
}
