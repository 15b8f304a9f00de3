use crate::error::GatewayError;
use crate::models::VerifiedPayment;
use crate::services::{ChainVerifier, ClaimOutcome, PaymentLedger, PaymentPolicy};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use base64::Engine;
use ethers::types::H256;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

pub const TX_HEADER: &str = "x-payment-tx";
pub const X402_HEADER: &str = "x-payment";

// Proof of payment as presented by the caller: a bare transaction hash, or
// an x402 token wrapping one. Both gate identically.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentCredential {
    TxHash(String),
    X402Token(String),
}

impl PaymentCredential {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        if let Some(value) = headers.get(TX_HEADER).and_then(|v| v.to_str().ok()) {
            return Some(Self::TxHash(value.to_string()));
        }
        if let Some(value) = headers.get(X402_HEADER).and_then(|v| v.to_str().ok()) {
            return Some(Self::X402Token(value.to_string()));
        }
        None
    }

    pub fn resolve(&self) -> Result<H256, GatewayError> {
        match self {
            Self::TxHash(raw) => parse_tx_hash(raw).ok_or_else(|| {
                GatewayError::InvalidCredential(format!("not a transaction hash: {raw}"))
            }),
            // Tolerate agents that put a bare hash in the x402 header.
            Self::X402Token(raw) => decode_x402_token(raw)
                .or_else(|| parse_tx_hash(raw))
                .ok_or_else(|| {
                    GatewayError::InvalidCredential("unreadable x402 token".to_string())
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct X402Token {
    payload: X402Payload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct X402Payload {
    tx_hash: String,
}

fn decode_x402_token(raw: &str) -> Option<H256> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .ok()?;
    let token: X402Token = serde_json::from_slice(&bytes).ok()?;
    parse_tx_hash(&token.payload.tx_hash)
}

// Hashes are canonicalized to H256; short hex inputs are left-padded so the
// ledger cannot be sidestepped by re-encoding the same hash.
pub fn parse_tx_hash(raw: &str) -> Option<H256> {
    let hex = raw.trim().trim_start_matches("0x");
    if hex.is_empty() || hex.len() > 64 {
        return None;
    }
    H256::from_str(&format!("{hex:0>64}")).ok()
}

pub struct PaymentGate {
    policy: Arc<PaymentPolicy>,
    verifier: Arc<ChainVerifier>,
    ledger: Arc<dyn PaymentLedger>,
}

impl PaymentGate {
    pub fn new(
        policy: Arc<PaymentPolicy>,
        verifier: Arc<ChainVerifier>,
        ledger: Arc<dyn PaymentLedger>,
    ) -> Self {
        Self {
            policy,
            verifier,
            ledger,
        }
    }

    // Per-request decision: either the caller has paid for this service and
    // we hand back the audit fields, or they get a structured refusal.
    pub async fn check(
        &self,
        service_id: &str,
        credential: Option<PaymentCredential>,
    ) -> Result<VerifiedPayment, GatewayError> {
        let descriptor = self
            .policy
            .price_for(service_id)
            .ok_or_else(|| GatewayError::ServiceNotFound(service_id.to_string()))?;

        let Some(credential) = credential else {
            let challenge = self.policy.challenge_for(descriptor);
            return Err(GatewayError::PaymentRequired(Box::new(challenge)));
        };

        let tx_hash = credential.resolve()?;
        let record = self.verifier.verify(tx_hash, descriptor.price).await;

        if !record.verified {
            // The specific reason was logged by the verifier; the caller
            // only sees the generic refusal.
            return Err(GatewayError::PaymentInvalid { tx_hash });
        }

        match self.ledger.claim(&tx_hash, service_id).await {
            ClaimOutcome::Granted => Ok(VerifiedPayment::from_record(&record)),
            ClaimOutcome::AlreadyConsumed { service } => {
                Err(GatewayError::PaymentConsumed { tx_hash, service })
            }
        }
    }
}

pub async fn payment_gate_layer(
    gate: Arc<PaymentGate>,
    service: &'static str,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let credential = PaymentCredential::from_headers(request.headers());
    let payment = gate.check(service, credential).await?;
    request.extensions_mut().insert(payment);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::models::{ServiceCatalog, Usdc};
    use crate::services::MemoryLedger;
    use ethers::types::Address;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    const FULL_HASH: &str = "0x00000000000000000000000000000000000000000000000000000000deadbeef";

    fn recipient() -> Address {
        Address::from_low_u64_be(0xbeef)
    }

    fn gate_for(server: &ServerGuard, api_key: Option<&str>) -> PaymentGate {
        let ledger = Arc::new(MemoryLedger::new());
        let policy = Arc::new(PaymentPolicy::new(
            ServiceCatalog::standard(),
            NetworkConfig::base_mainnet().unwrap(),
            recipient(),
            "http://localhost:3000".to_string(),
        ));
        let verifier = Arc::new(
            ChainVerifier::new(
                server.url(),
                api_key.map(|key| key.to_string()),
                Duration::from_secs(2),
                recipient(),
                ledger.clone(),
            )
            .unwrap(),
        );
        PaymentGate::new(policy, verifier, ledger)
    }

    fn paid_body(value: &str) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "from": "0x00000000000000000000000000000000000000aa",
                "to": format!("{:?}", recipient()),
                "value": value
            }
        })
        .to_string()
    }

    #[test]
    fn tx_hashes_parse_leniently_but_canonically() {
        let full = parse_tx_hash(FULL_HASH).unwrap();
        assert_eq!(full, H256::from_low_u64_be(0xdeadbeef));
        // Bare, short and uppercase spellings land on the same key.
        assert_eq!(parse_tx_hash("deadbeef"), Some(full));
        assert_eq!(parse_tx_hash("0xDEADBEEF"), Some(full));
        assert_eq!(parse_tx_hash(" 0xdeadbeef "), Some(full));

        assert_eq!(parse_tx_hash(""), None);
        assert_eq!(parse_tx_hash("0x"), None);
        assert_eq!(parse_tx_hash("not-hex"), None);
        assert_eq!(parse_tx_hash(&"f".repeat(65)), None);
    }

    #[test]
    fn x402_tokens_resolve_to_their_embedded_hash() {
        let token = base64::engine::general_purpose::STANDARD.encode(
            serde_json::json!({
                "x402Version": 1,
                "payload": { "txHash": FULL_HASH }
            })
            .to_string(),
        );

        let credential = PaymentCredential::X402Token(token);
        assert_eq!(
            credential.resolve().unwrap(),
            H256::from_low_u64_be(0xdeadbeef)
        );
    }

    #[test]
    fn bare_hashes_in_the_x402_header_still_resolve() {
        let credential = PaymentCredential::X402Token(FULL_HASH.to_string());
        assert_eq!(
            credential.resolve().unwrap(),
            H256::from_low_u64_be(0xdeadbeef)
        );
    }

    #[test]
    fn garbage_credentials_are_rejected() {
        let err = PaymentCredential::TxHash("zzzz".to_string())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredential(_)));

        let err = PaymentCredential::X402Token("!!not-base64!!".to_string())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredential(_)));
    }

    #[test]
    fn the_tx_header_wins_when_both_are_present() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Payment-Tx", "0xaa".parse().unwrap());
        headers.insert("X-Payment", "0xbb".parse().unwrap());

        assert_eq!(
            PaymentCredential::from_headers(&headers),
            Some(PaymentCredential::TxHash("0xaa".to_string()))
        );
    }

    #[tokio::test]
    async fn unknown_service_never_reaches_the_verifier() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let gate = gate_for(&server, Some("test-key"));

        let err = gate
            .check(
                "quantum",
                Some(PaymentCredential::TxHash(FULL_HASH.to_string())),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::ServiceNotFound(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_credential_yields_the_priced_challenge() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let gate = gate_for(&server, Some("test-key"));

        let err = gate.check("weather", None).await.unwrap_err();

        match err {
            GatewayError::PaymentRequired(challenge) => {
                assert_eq!(challenge.service, "weather");
                assert_eq!(challenge.amount, Usdc::from_base_units(1_000));
                assert_eq!(challenge.payment_address, recipient());
            }
            other => panic!("expected a challenge, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unconfirmed_payment_is_refused_not_authorized() {
        let mut server = Server::new_async().await;
        let gate = gate_for(&server, None);

        let err = gate
            .check(
                "crypto",
                Some(PaymentCredential::TxHash("0xabc".to_string())),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::PaymentInvalid { .. }));
    }

    #[tokio::test]
    async fn a_verified_payment_is_single_use_across_services() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(paid_body("0x3e8"))
            .expect(1)
            .create_async()
            .await;
        let gate = gate_for(&server, Some("test-key"));
        let credential = PaymentCredential::TxHash(FULL_HASH.to_string());

        let payment = gate
            .check("weather", Some(credential.clone()))
            .await
            .unwrap();
        assert_eq!(payment.amount, Usdc::from_base_units(1_000));
        assert_eq!(payment.tx_hash, H256::from_low_u64_be(0xdeadbeef));

        // Replaying the hash against another service is refused.
        let err = gate
            .check("memory", Some(credential.clone()))
            .await
            .unwrap_err();
        match err {
            GatewayError::PaymentConsumed { service, .. } => assert_eq!(service, "weather"),
            other => panic!("expected consumed, got {other:?}"),
        }

        // Retrying the paid service keeps working, from the ledger.
        let retry = gate.check("weather", Some(credential)).await.unwrap();
        assert_eq!(retry.tx_hash, H256::from_low_u64_be(0xdeadbeef));
        mock.assert_async().await;
    }
}
