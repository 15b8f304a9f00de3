use anyhow::Result;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

// Small in-process TTL cache, JSON-encoded values. Used to keep repeated
// balance reads off the RPC endpoint.
pub struct CacheService {
    memory: Cache<String, String>,
}

impl CacheService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            memory: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = self.memory.get(key).await?;
        match serde_json::from_str(&cached) {
            Ok(value) => {
                tracing::debug!("Cache hit for key: {}", key);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Cache entry for {} failed to decode: {}", key, e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        self.memory.insert(key.to_string(), serialized).await;
        Ok(())
    }
}
