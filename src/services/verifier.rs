use crate::models::{Usdc, VerificationRecord};
use crate::services::ledger::PaymentLedger;
use anyhow::{bail, Context, Result};
use ethers::types::{Address, H256};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

// Etherscan-style proxy envelope for eth_getTransactionByHash. `result` is
// null when the hash is unknown to the chain.
#[derive(Debug, Deserialize)]
struct ProxyResponse {
    result: Option<ProxyTransaction>,
}

#[derive(Debug, Deserialize)]
struct ProxyTransaction {
    from: String,
    to: Option<String>,
    value: String,
}

pub struct ChainVerifier {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    expected_recipient: Address,
    ledger: Arc<dyn PaymentLedger>,
}

impl ChainVerifier {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        timeout: Duration,
        expected_recipient: Address,
        ledger: Arc<dyn PaymentLedger>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build explorer HTTP client")?;

        Ok(Self {
            http,
            api_url,
            api_key,
            expected_recipient,
            ledger,
        })
    }

    // Never errors: every failure path comes back as an unverified record
    // with the reason inside. A verified ledger entry answers immediately,
    // whatever `expected` is now.
    pub async fn verify(&self, tx_hash: H256, expected: Usdc) -> VerificationRecord {
        if let Some(record) = self.ledger.lookup(&tx_hash).await {
            if record.verified {
                tracing::debug!(tx_hash = ?tx_hash, "Ledger hit, skipping explorer lookup");
                return record;
            }
        }

        // Indeterminate, not fraud: without a key we cannot confirm, so the
        // payment stays unconfirmed.
        let Some(api_key) = self.api_key.clone() else {
            tracing::warn!(tx_hash = ?tx_hash, "No explorer API key configured, cannot confirm payment");
            return VerificationRecord::unverified(
                tx_hash,
                "cannot verify without explorer API access",
            );
        };

        let transaction = match self.fetch_transaction(tx_hash, &api_key).await {
            Ok(Some(transaction)) => transaction,
            Ok(None) => {
                tracing::info!(tx_hash = ?tx_hash, "Transaction not found on chain");
                return VerificationRecord::unverified(tx_hash, "transaction not found");
            }
            Err(e) => {
                tracing::warn!(tx_hash = ?tx_hash, error = %e, "Explorer lookup failed");
                return VerificationRecord::unverified(
                    tx_hash,
                    format!("explorer lookup failed: {e}"),
                );
            }
        };

        let record = self.judge(tx_hash, expected, transaction);
        if record.verified {
            self.ledger.record(record.clone()).await;
        }
        record
    }

    async fn fetch_transaction(
        &self,
        tx_hash: H256,
        api_key: &str,
    ) -> Result<Option<ProxyTransaction>> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("module", "proxy"),
                ("action", "eth_getTransactionByHash"),
                ("txhash", &format!("{tx_hash:?}")),
                ("apikey", api_key),
            ])
            .send()
            .await
            .context("explorer request failed")?;

        if !response.status().is_success() {
            bail!("explorer returned HTTP {}", response.status());
        }

        let body: ProxyResponse = response
            .json()
            .await
            .context("explorer response was not JSON")?;
        Ok(body.result)
    }

    fn judge(&self, tx_hash: H256, expected: Usdc, tx: ProxyTransaction) -> VerificationRecord {
        let Ok(from) = Address::from_str(tx.from.trim()) else {
            return VerificationRecord::unverified(tx_hash, "sender address unparseable");
        };

        let to = match tx.to.as_deref().map(|raw| Address::from_str(raw.trim())) {
            Some(Ok(to)) => to,
            Some(Err(_)) => {
                return VerificationRecord::unverified(tx_hash, "recipient address unparseable")
            }
            None => {
                return VerificationRecord::unverified(
                    tx_hash,
                    "contract creation, not a payment",
                )
            }
        };

        // Recipient equality is not negotiable: a matching amount sent
        // elsewhere is not a payment to us.
        if to != self.expected_recipient {
            tracing::info!(tx_hash = ?tx_hash, to = ?to, "Payment went to a different address");
            return VerificationRecord::unverified(
                tx_hash,
                format!("recipient mismatch: {to:?}"),
            );
        }

        let Some(amount) = parse_base_units(&tx.value).map(Usdc::from_base_units) else {
            return VerificationRecord::unverified(tx_hash, "value field unparseable");
        };

        if amount < expected {
            tracing::info!(
                tx_hash = ?tx_hash,
                "Insufficient payment: {} < {} USDC",
                amount,
                expected
            );
            return VerificationRecord::unverified(
                tx_hash,
                format!("insufficient amount: {amount} < {expected} USDC"),
            );
        }

        tracing::info!(
            "Payment verified: {} USDC from {} (tx: {})",
            amount,
            from,
            tx_hash
        );
        VerificationRecord::verified(tx_hash, from, to, amount)
    }
}

// Hex quantity as reported by the proxy API, e.g. "0x1388". Values beyond
// u64 saturate; beyond u128 they are rejected as malformed.
fn parse_base_units(raw: &str) -> Option<u64> {
    let hex = raw.trim().trim_start_matches("0x");
    if hex.is_empty() {
        return None;
    }
    u128::from_str_radix(hex, 16)
        .ok()
        .map(|units| u64::try_from(units).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::MemoryLedger;
    use mockito::{Matcher, Server, ServerGuard};

    fn hash(n: u64) -> H256 {
        H256::from_low_u64_be(n)
    }

    fn recipient() -> Address {
        Address::from_low_u64_be(0xbeef)
    }

    fn verifier_for(
        server: &ServerGuard,
        api_key: Option<&str>,
    ) -> (ChainVerifier, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let verifier = ChainVerifier::new(
            server.url(),
            api_key.map(|key| key.to_string()),
            Duration::from_secs(2),
            recipient(),
            ledger.clone(),
        )
        .unwrap();
        (verifier, ledger)
    }

    fn found_body(from: &str, to: &str, value: &str) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "from": from, "to": to, "value": value }
        })
        .to_string()
    }

    #[tokio::test]
    async fn missing_api_key_is_indeterminate_and_makes_no_remote_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let (verifier, ledger) = verifier_for(&server, None);

        let record = verifier.verify(hash(1), Usdc::from_base_units(1_000)).await;

        assert!(!record.verified);
        assert!(record
            .reason
            .as_deref()
            .unwrap()
            .contains("without explorer API"));
        assert_eq!(ledger.size().await, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn queries_the_proxy_endpoint_with_the_full_hash() {
        let mut server = Server::new_async().await;
        let tx = hash(2);
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("module".into(), "proxy".into()),
                Matcher::UrlEncoded("action".into(), "eth_getTransactionByHash".into()),
                Matcher::UrlEncoded("txhash".into(), format!("{tx:?}")),
                Matcher::UrlEncoded("apikey".into(), "test-key".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;
        let (verifier, ledger) = verifier_for(&server, Some("test-key"));

        let record = verifier.verify(tx, Usdc::from_base_units(1_000)).await;

        assert!(!record.verified);
        assert_eq!(record.reason.as_deref(), Some("transaction not found"));
        // Unverified outcomes are never cached.
        assert_eq!(ledger.size().await, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn accepts_a_payment_at_exactly_the_expected_amount() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(found_body(
                "0x00000000000000000000000000000000000000aa",
                &format!("{:?}", recipient()),
                "0x1388",
            ))
            .create_async()
            .await;
        let (verifier, ledger) = verifier_for(&server, Some("test-key"));

        let record = verifier.verify(hash(3), Usdc::from_base_units(5_000)).await;

        assert!(record.verified);
        assert_eq!(record.amount, Some(Usdc::from_base_units(5_000)));
        assert_eq!(record.to, Some(recipient()));
        assert_eq!(ledger.lookup(&hash(3)).await, Some(record));
    }

    #[tokio::test]
    async fn second_verify_is_served_from_the_ledger() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(found_body(
                "0x00000000000000000000000000000000000000aa",
                &format!("{:?}", recipient()),
                "0x1388",
            ))
            .expect(1)
            .create_async()
            .await;
        let (verifier, _ledger) = verifier_for(&server, Some("test-key"));

        let first = verifier.verify(hash(4), Usdc::from_base_units(5_000)).await;
        // Different expected amount on the second call: the ledger answers
        // regardless.
        let second = verifier.verify(hash(4), Usdc::from_base_units(9_999)).await;

        assert!(first.verified);
        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_a_payment_below_the_expected_amount() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(found_body(
                "0x00000000000000000000000000000000000000aa",
                &format!("{:?}", recipient()),
                "0x3e7",
            ))
            .create_async()
            .await;
        let (verifier, ledger) = verifier_for(&server, Some("test-key"));

        let record = verifier.verify(hash(5), Usdc::from_base_units(1_000)).await;

        assert!(!record.verified);
        assert!(record.reason.as_deref().unwrap().contains("insufficient"));
        assert_eq!(ledger.size().await, 0);
    }

    #[tokio::test]
    async fn rejects_a_payment_to_the_wrong_recipient() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(found_body(
                "0x00000000000000000000000000000000000000aa",
                "0x00000000000000000000000000000000000000cc",
                "0x1388",
            ))
            .create_async()
            .await;
        let (verifier, _ledger) = verifier_for(&server, Some("test-key"));

        let record = verifier.verify(hash(6), Usdc::from_base_units(1_000)).await;

        assert!(!record.verified);
        assert!(record.reason.as_deref().unwrap().contains("recipient mismatch"));
    }

    #[tokio::test]
    async fn contract_creation_is_not_a_payment() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "from": "0x00000000000000000000000000000000000000aa",
                        "to": null,
                        "value": "0x1388"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;
        let (verifier, _ledger) = verifier_for(&server, Some("test-key"));

        let record = verifier.verify(hash(7), Usdc::from_base_units(1_000)).await;

        assert!(!record.verified);
        assert!(record.reason.as_deref().unwrap().contains("contract creation"));
    }

    #[tokio::test]
    async fn explorer_failure_recovers_to_unverified() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let (verifier, ledger) = verifier_for(&server, Some("test-key"));

        let record = verifier.verify(hash(8), Usdc::from_base_units(1_000)).await;

        assert!(!record.verified);
        assert!(record
            .reason
            .as_deref()
            .unwrap()
            .contains("explorer lookup failed"));
        assert_eq!(ledger.size().await, 0);
    }

    #[test]
    fn hex_values_parse_to_base_units() {
        assert_eq!(parse_base_units("0x1388"), Some(5_000));
        assert_eq!(parse_base_units("0x0"), Some(0));
        assert_eq!(parse_base_units("1388"), Some(5_000));
        assert_eq!(parse_base_units("0x"), None);
        assert_eq!(parse_base_units("0xzz"), None);
        // Beyond u64: saturates instead of wrapping.
        assert_eq!(parse_base_units("0xffffffffffffffffff"), Some(u64::MAX));
    }
}
