use crate::config::NetworkConfig;
use crate::models::{
    NetworkInfo, PaymentChallenge, PaymentInstructions, PaymentRequirements, ServiceCatalog,
    ServiceDescriptor, X402Challenge, X402_MAX_TIMEOUT_SECS, X402_SCHEME, X402_VERSION,
};
use ethers::types::Address;

// Pure pricing: no I/O, no shared state. Maps service ids to descriptors and
// renders 402 challenges from static configuration.
pub struct PaymentPolicy {
    catalog: ServiceCatalog,
    network: NetworkConfig,
    payment_address: Address,
    public_url: String,
}

impl PaymentPolicy {
    pub fn new(
        catalog: ServiceCatalog,
        network: NetworkConfig,
        payment_address: Address,
        public_url: String,
    ) -> Self {
        Self {
            catalog,
            network,
            payment_address,
            public_url,
        }
    }

    pub fn price_for(&self, service_id: &str) -> Option<&ServiceDescriptor> {
        self.catalog.get(service_id)
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn payment_address(&self) -> Address {
        self.payment_address
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn challenge_for(&self, descriptor: &ServiceDescriptor) -> PaymentChallenge {
        let amount = descriptor.price;

        PaymentChallenge {
            error: "Payment Required".to_string(),
            service: descriptor.id.clone(),
            scheme: X402_SCHEME.to_string(),
            currency: "USDC".to_string(),
            amount,
            price: format!("{amount} USDC"),
            network: NetworkInfo {
                name: self.network.name.clone(),
                chain_id: self.network.chain_id,
            },
            payment_address: self.payment_address,
            instructions: PaymentInstructions {
                step1: format!("Get USDC on {}", self.network.name),
                step2: format!("Send {amount} USDC to {:?}", self.payment_address),
                step3: "Add header: X-Payment-Tx: YOUR_TRANSACTION_HASH".to_string(),
                example: format!(
                    "curl -H \"X-Payment-Tx: 0x...\" {}{}",
                    self.public_url, descriptor.endpoint
                ),
            },
            x402: X402Challenge {
                x402_version: X402_VERSION,
                accepts: vec![PaymentRequirements {
                    scheme: X402_SCHEME.to_string(),
                    network: self.network.slug.clone(),
                    max_amount_required: amount.base_units().to_string(),
                    asset: self.network.usdc_address,
                    pay_to: self.payment_address,
                    max_timeout_seconds: X402_MAX_TIMEOUT_SECS,
                    description: descriptor.description.clone(),
                    mime_type: "application/json".to_string(),
                }],
            },
        }
    }
}
