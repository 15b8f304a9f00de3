pub mod balance;
pub mod content;
pub mod health;
pub mod info;
pub mod verify;

pub use balance::*;
pub use content::*;
pub use health::*;
pub use info::*;
pub use verify::*;

use crate::config::Config;
use crate::services::{BalanceService, ChainVerifier, PaymentLedger, PaymentPolicy};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub policy: Arc<PaymentPolicy>,
    pub verifier: Arc<ChainVerifier>,
    pub balance: Arc<BalanceService>,
    pub ledger: Arc<dyn PaymentLedger>,
}
