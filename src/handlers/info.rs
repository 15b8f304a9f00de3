use crate::handlers::AppState;
use crate::models::{HowToPay, InfoResponse};
use axum::{extract::State, Json};

pub async fn service_info(State(state): State<AppState>) -> Json<InfoResponse> {
    let payment_address = state.config.payment_address;

    Json(InfoResponse {
        network: state.config.network.name.clone(),
        currency: "USDC".to_string(),
        payment_address,
        explorer_url: state.config.network.address_link(&payment_address),
        services: state.policy.catalog().iter().cloned().collect(),
        how_to_pay: HowToPay {
            step1: format!("Get USDC on {}", state.config.network.name),
            step2: format!("Send USDC to: {payment_address:?}"),
            step3: "Get the transaction hash".to_string(),
            step4: "Retry with header X-Payment-Tx: <hash>, or POST /api/verify".to_string(),
        },
    })
}
