use crate::error::GatewayError;
use crate::handlers::AppState;
use crate::middleware::payment::parse_tx_hash;
use crate::models::{RetryInstructions, Usdc, VerifyFailure, VerifyRequest, VerifySuccess};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

// Standalone verification: checks a hash without consuming it, so a caller
// can confirm a payment landed before spending it on a gated endpoint.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Response, GatewayError> {
    let Some(raw_hash) = request.tx_hash.as_deref() else {
        return Err(GatewayError::BadRequest(
            "Missing txHash; required: txHash, service (optional), amountUSD (optional)"
                .to_string(),
        ));
    };

    let Some(tx_hash) = parse_tx_hash(raw_hash) else {
        return Err(GatewayError::InvalidCredential(format!(
            "not a transaction hash: {raw_hash}"
        )));
    };

    // Expected amount: explicit, else the named service's price, else the
    // cheapest tier.
    let expected = request
        .amount_usd
        .or_else(|| {
            request
                .service
                .as_deref()
                .and_then(|id| state.policy.price_for(id))
                .map(|descriptor| descriptor.price)
        })
        .unwrap_or(Usdc::from_base_units(1_000));

    let record = state.verifier.verify(tx_hash, expected).await;
    let explorer = state.config.network.tx_link(&tx_hash);

    if record.verified {
        let body = VerifySuccess {
            success: true,
            tx_hash,
            confirmed: true,
            amount: record.amount.unwrap_or(Usdc::ZERO),
            from: record.from,
            to: record.to,
            explorer,
            message: "Payment verified successfully!".to_string(),
        };
        return Ok(Json(body).into_response());
    }

    let network = &state.config.network;
    let body = VerifyFailure {
        success: false,
        tx_hash,
        error: "Payment verification failed".to_string(),
        possible_reasons: vec![
            "Transaction not found".to_string(),
            format!("Wrong network (must be {})", network.name),
            "Insufficient amount".to_string(),
            "Transaction not yet confirmed".to_string(),
        ],
        instructions: RetryInstructions {
            network: format!("{} (Chain ID: {})", network.name, network.chain_id),
            usdc_contract: network.usdc_address,
            payment_to: state.config.payment_address,
            explorer,
        },
    };
    Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
}
