use crate::models::Usdc;
use crate::services::cache::CacheService;
use anyhow::{Context, Result};
use ethers::{
    contract::abigen,
    providers::{Http, Provider},
    types::{Address, U256},
};
use std::sync::Arc;
use std::time::Duration;

abigen!(
    Erc20Token,
    r#"[
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

// What the balance endpoint works with: a number that is zero on failure,
// plus the failure message when there was one. RPC trouble never propagates
// as an error.
#[derive(Debug, Clone)]
pub struct BalanceReading {
    pub balance: Usdc,
    pub error: Option<String>,
}

pub struct BalanceService {
    provider: Arc<Provider<Http>>,
    usdc_address: Address,
    account: Address,
    cache: CacheService,
}

impl BalanceService {
    pub fn new(
        rpc_url: &str,
        usdc_address: Address,
        account: Address,
        cache_ttl: Duration,
    ) -> Result<Self> {
        let provider = Arc::new(Provider::<Http>::try_from(rpc_url).context("Invalid RPC URL")?);

        Ok(Self {
            provider,
            usdc_address,
            account,
            cache: CacheService::new(cache_ttl),
        })
    }

    pub async fn usdc_balance(&self) -> BalanceReading {
        const KEY: &str = "usdc_balance";

        if let Some(balance) = self.cache.get::<Usdc>(KEY).await {
            return BalanceReading {
                balance,
                error: None,
            };
        }

        match self.fetch_balance().await {
            Ok(balance) => {
                if let Err(e) = self.cache.set(KEY, &balance).await {
                    tracing::warn!("Balance cache write failed: {}", e);
                }
                tracing::debug!("USDC balance: {}", balance);
                BalanceReading {
                    balance,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!("Balance fetch failed: {:#}", e);
                BalanceReading {
                    balance: Usdc::ZERO,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn fetch_balance(&self) -> Result<Usdc> {
        let usdc = Erc20Token::new(self.usdc_address, self.provider.clone());
        let raw = usdc
            .balance_of(self.account)
            .call()
            .await
            .context("balanceOf call failed")?;

        // Balances past u64 saturate rather than wrap.
        let units = if raw > U256::from(u64::MAX) {
            u64::MAX
        } else {
            raw.as_u64()
        };
        Ok(Usdc::from_base_units(units))
    }
}
