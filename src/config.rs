use anyhow::{bail, Context, Result};
use ethers::types::{Address, H256};
use std::str::FromStr;
use std::time::Duration;

// Real USDC contract on Base mainnet.
const USDC_BASE_MAINNET: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
const DEFAULT_PAYMENT_ADDRESS: &str = "0xf90323646eF20d988ca4cD4b664bC6a0F6E63c11";

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub slug: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
    pub usdc_address: Address,
}

impl NetworkConfig {
    pub fn base_mainnet() -> Result<Self> {
        Ok(Self {
            name: "Base Mainnet".to_string(),
            slug: "base".to_string(),
            chain_id: 8453,
            rpc_url: "https://mainnet.base.org".to_string(),
            explorer_url: "https://basescan.org".to_string(),
            usdc_address: Address::from_str(USDC_BASE_MAINNET)
                .context("Invalid built-in USDC address")?,
        })
    }

    fn from_env() -> Result<Self> {
        let defaults = Self::base_mainnet()?;

        Ok(Self {
            name: std::env::var("NETWORK_NAME").unwrap_or(defaults.name),
            slug: std::env::var("NETWORK_SLUG").unwrap_or(defaults.slug),
            chain_id: std::env::var("CHAIN_ID")
                .unwrap_or_else(|_| defaults.chain_id.to_string())
                .parse()
                .context("Invalid CHAIN_ID")?,
            rpc_url: std::env::var("RPC_URL").unwrap_or(defaults.rpc_url),
            explorer_url: std::env::var("EXPLORER_URL").unwrap_or(defaults.explorer_url),
            usdc_address: match std::env::var("USDC_ADDRESS") {
                Ok(raw) => Address::from_str(&raw).context("Invalid USDC_ADDRESS")?,
                Err(_) => defaults.usdc_address,
            },
        })
    }

    // H256/H160 Display truncates with an ellipsis; explorer links need the
    // full hex, which Debug prints.
    pub fn tx_link(&self, hash: &H256) -> String {
        format!("{}/tx/{:?}", self.explorer_url, hash)
    }

    pub fn address_link(&self, address: &Address) -> String {
        format!("{}/address/{:?}", self.explorer_url, address)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub public_url: String,

    pub network: NetworkConfig,
    pub payment_address: Address,

    // Explorer proxy API; no key means verification degrades to
    // "cannot confirm", never to silent acceptance.
    pub explorer_api_url: String,
    pub explorer_api_key: Option<String>,
    pub verify_timeout: Duration,

    pub ledger_ttl: Option<Duration>,
    pub balance_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("Invalid PORT")?;

        let config = Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),

            network: NetworkConfig::from_env()?,
            payment_address: match std::env::var("PAYMENT_ADDRESS") {
                Ok(raw) => Address::from_str(&raw).context("Invalid PAYMENT_ADDRESS")?,
                Err(_) => Address::from_str(DEFAULT_PAYMENT_ADDRESS)
                    .context("Invalid built-in payment address")?,
            },

            explorer_api_url: std::env::var("EXPLORER_API_URL")
                .unwrap_or_else(|_| "https://api.basescan.org/api".to_string()),
            explorer_api_key: std::env::var("BASESCAN_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            verify_timeout: Duration::from_secs(
                std::env::var("VERIFY_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("Invalid VERIFY_TIMEOUT_SECS")?,
            ),

            ledger_ttl: match std::env::var("LEDGER_TTL_SECS") {
                Ok(raw) => Some(Duration::from_secs(
                    raw.parse().context("Invalid LEDGER_TTL_SECS")?,
                )),
                Err(_) => None,
            },
            balance_cache_ttl: Duration::from_secs(
                std::env::var("BALANCE_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid BALANCE_CACHE_TTL_SECS")?,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.public_url.starts_with("http") {
            bail!("PUBLIC_URL must be an HTTP(S) URL");
        }
        if !self.network.rpc_url.starts_with("http") {
            bail!("RPC_URL must be an HTTP(S) URL");
        }
        if !self.network.explorer_url.starts_with("http") {
            bail!("EXPLORER_URL must be an HTTP(S) URL");
        }
        if !self.explorer_api_url.starts_with("http") {
            bail!("EXPLORER_API_URL must be an HTTP(S) URL");
        }
        if self.payment_address == Address::zero() {
            bail!("PAYMENT_ADDRESS must not be the zero address");
        }
        if self.verify_timeout.is_zero() {
            bail!("VERIFY_TIMEOUT_SECS must be positive");
        }

        tracing::info!(
            "Configuration validated for {} (chain id {})",
            self.network.name,
            self.network.chain_id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_links_carry_the_full_hash() {
        let network = NetworkConfig::base_mainnet().unwrap();
        let hash = H256::from_low_u64_be(0xabc);
        let link = network.tx_link(&hash);
        assert!(link.starts_with("https://basescan.org/tx/0x"));
        assert!(link.ends_with("abc"));
        assert_eq!(link.len(), "https://basescan.org/tx/0x".len() + 64);
    }

    #[test]
    fn address_link_points_at_the_explorer() {
        let network = NetworkConfig::base_mainnet().unwrap();
        let link = network.address_link(&network.usdc_address);
        assert_eq!(
            link,
            "https://basescan.org/address/0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
        );
    }
}
