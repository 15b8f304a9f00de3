use crate::handlers::AppState;
use crate::models::{BalanceFailure, BalanceResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

pub async fn get_balance(State(state): State<AppState>) -> Response {
    let reading = state.balance.usdc_balance().await;
    let address = state.config.payment_address;
    let network = state.config.network.name.clone();

    match reading.error {
        None => Json(BalanceResponse {
            address,
            network,
            usdc_balance: reading.balance,
            explorer: state.config.network.address_link(&address),
            timestamp: Utc::now(),
        })
        .into_response(),
        Some(message) => (
            StatusCode::BAD_GATEWAY,
            Json(BalanceFailure {
                error: "Failed to fetch balance".to_string(),
                message,
                address,
                network,
                timestamp: Utc::now(),
            }),
        )
            .into_response(),
    }
}
