use crate::models::PaymentChallenge;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use ethers::types::H256;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unknown service: {0}")]
    ServiceNotFound(String),

    #[error("Payment required: {} USDC for {}", .0.amount, .0.service)]
    PaymentRequired(Box<PaymentChallenge>),

    #[error("Payment not verified: {tx_hash}")]
    PaymentInvalid { tx_hash: H256 },

    #[error("Payment {tx_hash} already consumed by {service}")]
    PaymentConsumed { tx_hash: H256, service: String },

    #[error("Invalid payment credential: {0}")]
    InvalidCredential(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            // The 402 bodies have their own shapes; everything else gets the
            // standard envelope below.
            GatewayError::PaymentRequired(challenge) => {
                tracing::info!(service = %challenge.service, "Payment required");
                (StatusCode::PAYMENT_REQUIRED, Json(*challenge)).into_response()
            }

            GatewayError::PaymentInvalid { tx_hash } => {
                tracing::warn!(tx_hash = ?tx_hash, "Payment not verified");
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({
                        "error": "Invalid Payment",
                        "message": "Payment not verified. Please ensure transaction is confirmed.",
                        "txHash": tx_hash,
                    })),
                )
                    .into_response()
            }

            GatewayError::PaymentConsumed { tx_hash, service } => {
                tracing::warn!(tx_hash = ?tx_hash, service = %service, "Replayed payment rejected");
                let message = format!(
                    "This transaction already paid for '{service}'. Send a new payment for this service."
                );
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({
                        "error": "Payment Already Used",
                        "message": message,
                        "txHash": tx_hash,
                        "service": service,
                    })),
                )
                    .into_response()
            }

            other => {
                let request_id = Uuid::new_v4().to_string();

                let (status, error_code) = match &other {
                    GatewayError::ServiceNotFound(_) => {
                        (StatusCode::NOT_FOUND, "SERVICE_NOT_FOUND")
                    }
                    GatewayError::InvalidCredential(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_PAYMENT_CREDENTIAL")
                    }
                    GatewayError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                    GatewayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };

                let body = ErrorResponse {
                    success: false,
                    error: other.to_string(),
                    error_code: error_code.to_string(),
                    timestamp: Utc::now(),
                    request_id,
                };

                tracing::error!(
                    error = ?other,
                    error_code = error_code,
                    "Request failed"
                );

                (status, Json(body)).into_response()
            }
        }
    }
}
