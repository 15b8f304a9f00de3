pub mod balance;
pub mod cache;
pub mod ledger;
pub mod policy;
pub mod verifier;

pub use balance::{BalanceReading, BalanceService};
pub use cache::CacheService;
pub use ledger::{ClaimOutcome, MemoryLedger, PaymentLedger};
pub use policy::PaymentPolicy;
pub use verifier::ChainVerifier;
