use crate::models::{PaidResponse, VerifiedPayment};
use axum::{
    extract::{Extension, Query},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

// Mock payloads behind the paywall. The payment middleware has already run;
// the verified hash and amount arrive through request extensions.

pub async fn weather(Extension(payment): Extension<VerifiedPayment>) -> Json<PaidResponse<Value>> {
    Json(PaidResponse::new(
        "weather",
        payment.tx_hash,
        payment.amount,
        json!({
            "temperature": 22,
            "condition": "sunny",
            "location": "Default Location",
            "timestamp": Utc::now(),
        }),
    ))
}

pub async fn crypto(Extension(payment): Extension<VerifiedPayment>) -> Json<PaidResponse<Value>> {
    Json(PaidResponse::new(
        "crypto",
        payment.tx_hash,
        payment.amount,
        json!({
            "BTC": { "price": 97500, "change": "+2.5%" },
            "ETH": { "price": 3650, "change": "+1.8%" },
            "SOL": { "price": 240, "change": "+3.2%" },
            "timestamp": Utc::now(),
        }),
    ))
}

pub async fn news(Extension(payment): Extension<VerifiedPayment>) -> Json<PaidResponse<Value>> {
    Json(PaidResponse::new(
        "news",
        payment.tx_hash,
        payment.amount,
        json!([
            { "title": "AI Agents Transform Web3 Payments", "source": "CryptoDaily", "time": "2h ago" },
            { "title": "Base Network Reaches New Milestone", "source": "BaseNews", "time": "4h ago" },
            { "title": "x402 Protocol Adoption Grows", "source": "TechCrunch", "time": "6h ago" },
        ]),
    ))
}

#[derive(Debug, Deserialize)]
pub struct GeoQuery {
    pub address: Option<String>,
}

pub async fn geo(
    Query(query): Query<GeoQuery>,
    Extension(payment): Extension<VerifiedPayment>,
) -> Json<PaidResponse<Value>> {
    let address = query.address.unwrap_or_else(|| "Unknown".to_string());

    Json(PaidResponse::new(
        "geo",
        payment.tx_hash,
        payment.amount,
        json!({
            "address": address,
            "coordinates": { "lat": 37.7749, "lng": -122.4194 },
            "formatted": format!("{address}, San Francisco, CA"),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct TtsQuery {
    pub text: Option<String>,
}

pub async fn tts(
    Query(query): Query<TtsQuery>,
    Extension(payment): Extension<VerifiedPayment>,
) -> Json<PaidResponse<Value>> {
    let text = query.text.unwrap_or_else(|| "Hello from the gateway".to_string());

    Json(PaidResponse::new(
        "tts",
        payment.tx_hash,
        payment.amount,
        json!({
            "text": text,
            "voice": "standard",
            "format": "mp3",
            "url": format!("/audio/{}.mp3", Uuid::new_v4()),
            "timestamp": Utc::now(),
        }),
    ))
}

pub async fn memory(Extension(payment): Extension<VerifiedPayment>) -> Json<PaidResponse<Value>> {
    Json(PaidResponse::new(
        "memory",
        payment.tx_hash,
        payment.amount,
        json!({
            "namespace": "default",
            "entries": 0,
            "capacityBytes": 1_048_576,
            "timestamp": Utc::now(),
        }),
    ))
}

pub async fn premium(Extension(payment): Extension<VerifiedPayment>) -> Json<PaidResponse<Value>> {
    Json(PaidResponse::new(
        "premium",
        payment.tx_hash,
        payment.amount,
        json!({
            "status": "premium_active",
            "expires": "30d",
            "features": ["All API access", "Priority support", "Custom integrations"],
        }),
    ))
}
