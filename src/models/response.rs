use crate::models::service::ServiceDescriptor;
use crate::models::usdc::Usdc;
use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub network: String,
    pub currency: String,
    pub address: Address,
    pub explorer: String,
    pub ledger_size: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub network: String,
    pub currency: String,
    pub payment_address: Address,
    pub explorer_url: String,
    pub services: Vec<ServiceDescriptor>,
    pub how_to_pay: HowToPay,
}

#[derive(Debug, Clone, Serialize)]
pub struct HowToPay {
    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub step4: String,
}

// Body of every paid endpoint: the audit fields in front, the mock payload
// under `data`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidResponse<T: Serialize> {
    pub service: String,
    pub paid: bool,
    pub tx_hash: H256,
    pub amount: Usdc,
    pub data: T,
}

impl<T: Serialize> PaidResponse<T> {
    pub fn new(service: &str, tx_hash: H256, amount: Usdc, data: T) -> Self {
        Self {
            service: service.to_string(),
            paid: true,
            tx_hash,
            amount,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySuccess {
    pub success: bool,
    pub tx_hash: H256,
    pub confirmed: bool,
    pub amount: Usdc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub explorer: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyFailure {
    pub success: bool,
    pub tx_hash: H256,
    pub error: String,
    pub possible_reasons: Vec<String>,
    pub instructions: RetryInstructions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryInstructions {
    pub network: String,
    pub usdc_contract: Address,
    pub payment_to: Address,
    pub explorer: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: Address,
    pub network: String,
    pub usdc_balance: Usdc,
    pub explorer: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceFailure {
    pub error: String,
    pub message: String,
    pub address: Address,
    pub network: String,
    pub timestamp: DateTime<Utc>,
}
