use crate::models::usdc::Usdc;
use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

pub const X402_VERSION: u8 = 1;
pub const X402_SCHEME: &str = "exact";
pub const X402_MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: u64,
}

// The 402 body: one human-readable encoding plus an x402 mirror for
// protocol-aware agents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChallenge {
    pub error: String,
    pub service: String,
    pub scheme: String,
    pub currency: String,
    pub amount: Usdc,
    pub price: String,
    pub network: NetworkInfo,
    pub payment_address: Address,
    pub instructions: PaymentInstructions,
    pub x402: X402Challenge,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentInstructions {
    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub example: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct X402Challenge {
    pub x402_version: u8,
    pub accepts: Vec<PaymentRequirements>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub max_amount_required: String,
    pub asset: Address,
    pub pay_to: Address,
    pub max_timeout_seconds: u64,
    pub description: String,
    pub mime_type: String,
}

// Body of POST /api/verify. txHash stays optional so the handler can shape
// its own 400 instead of a generic rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub tx_hash: Option<String>,
    pub service: Option<String>,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<Usdc>,
}

// Outcome of checking one transaction hash. Only verified records are kept
// in the ledger; unverified ones exist to carry a diagnostic back to the
// caller without raising.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub tx_hash: H256,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub amount: Option<Usdc>,
    pub verified: bool,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub consumed_by: Option<String>,
}

impl VerificationRecord {
    pub fn verified(tx_hash: H256, from: Address, to: Address, amount: Usdc) -> Self {
        Self {
            tx_hash,
            from: Some(from),
            to: Some(to),
            amount: Some(amount),
            verified: true,
            reason: None,
            timestamp: Utc::now(),
            consumed_by: None,
        }
    }

    pub fn unverified(tx_hash: H256, reason: impl Into<String>) -> Self {
        Self {
            tx_hash,
            from: None,
            to: None,
            amount: None,
            verified: false,
            reason: Some(reason.into()),
            timestamp: Utc::now(),
            consumed_by: None,
        }
    }
}

// Inserted into request extensions by the payment middleware so handlers
// can surface the audit fields in their response body.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub tx_hash: H256,
    pub amount: Usdc,
    pub from: Option<Address>,
    pub to: Option<Address>,
}

impl VerifiedPayment {
    pub fn from_record(record: &VerificationRecord) -> Self {
        Self {
            tx_hash: record.tx_hash,
            amount: record.amount.unwrap_or(Usdc::ZERO),
            from: record.from,
            to: record.to,
        }
    }
}
