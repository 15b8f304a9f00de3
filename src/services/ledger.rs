use crate::models::VerificationRecord;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use ethers::types::H256;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted,
    AlreadyConsumed { service: String },
}

// Store seam for verified payments. Injected into the verifier and the gate
// so tests can substitute their own and deployments can move the records out
// of process.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn lookup(&self, tx_hash: &H256) -> Option<VerificationRecord>;

    // Idempotent upsert keyed by tx hash. Concurrent first-time writers race,
    // which is benign: the chain answer is deterministic per hash.
    async fn record(&self, record: VerificationRecord);

    // Atomically mark a verified payment as spent on `service`. Re-claiming
    // for the same service is granted so retried requests keep working.
    async fn claim(&self, tx_hash: &H256, service: &str) -> ClaimOutcome;

    async fn purge_expired(&self, max_age: Duration) -> usize;

    async fn size(&self) -> usize;
}

pub struct MemoryLedger {
    records: DashMap<H256, VerificationRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentLedger for MemoryLedger {
    async fn lookup(&self, tx_hash: &H256) -> Option<VerificationRecord> {
        self.records.get(tx_hash).map(|entry| entry.clone())
    }

    async fn record(&self, record: VerificationRecord) {
        use dashmap::mapref::entry::Entry;
        match self.records.entry(record.tx_hash) {
            Entry::Occupied(mut occupied) => {
                // An upsert must not erase a consumption claim taken earlier.
                let mut record = record;
                if record.consumed_by.is_none() {
                    record.consumed_by = occupied.get().consumed_by.clone();
                }
                occupied.insert(record);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
            }
        }
    }

    async fn claim(&self, tx_hash: &H256, service: &str) -> ClaimOutcome {
        // get_mut holds the shard write lock, making check-then-set atomic
        // per hash.
        match self.records.get_mut(tx_hash) {
            Some(mut entry) => match &entry.consumed_by {
                Some(owner) if owner != service => ClaimOutcome::AlreadyConsumed {
                    service: owner.clone(),
                },
                _ => {
                    entry.consumed_by = Some(service.to_string());
                    ClaimOutcome::Granted
                }
            },
            // Nothing recorded for this hash, so there is nothing to guard.
            None => ClaimOutcome::Granted,
        }
    }

    async fn purge_expired(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let before = self.records.len();
        self.records.retain(|_, record| {
            // A negative age means clock skew; keep the record.
            let age = (now - record.timestamp).to_std().unwrap_or(Duration::ZERO);
            age < max_age
        });
        before - self.records.len()
    }

    async fn size(&self) -> usize {
        self.records.len()
    }
}
