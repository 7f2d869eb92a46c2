//! Block-explorer REST client.
//!
//! Talks to a Kaspa-style explorer API:
//! `GET {base}/addresses/{address}/full-transactions?limit=N&resolve_previous_outpoints=light`.
//! Each explorer transaction is flattened into one [`Transaction`] per output.

use crate::{ExplorerError, LedgerQueryClient};
use async_trait::async_trait;
use selfproof_types::{Amount, Timestamp, Transaction, TxId, WalletAddress};
use serde::Deserialize;
use std::time::Duration;

/// Default public explorer API.
pub const DEFAULT_EXPLORER_URL: &str = "https://api.kaspa.org";

/// HTTP client for a block-explorer API.
///
/// Wraps `reqwest::Client` with the explorer's base URL. Cloning is cheap and
/// shares the connection pool.
#[derive(Clone)]
pub struct ExplorerClient {
    base_url: String,
    http: reqwest::Client,
}

impl ExplorerClient {
    /// Create a client targeting the given base URL (e.g. `https://api.kaspa.org`).
    pub fn new(base_url: &str) -> Result<Self, ExplorerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ExplorerError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transactions_url(&self, address: &WalletAddress) -> String {
        format!("{}/addresses/{}/full-transactions", self.base_url, address)
    }
}

#[async_trait]
impl LedgerQueryClient for ExplorerClient {
    async fn fetch_recent_transactions(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<Transaction>, ExplorerError> {
        let response = self
            .http
            .get(self.transactions_url(address))
            .query(&[
                ("limit", limit.to_string()),
                ("resolve_previous_outpoints", "light".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ExplorerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExplorerError::Status(response.status().as_u16()));
        }

        let body: Vec<ExplorerTransaction> = response
            .json()
            .await
            .map_err(|e| ExplorerError::Decode(e.to_string()))?;

        let txs = flatten(body);
        tracing::trace!(%address, count = txs.len(), "fetched explorer transactions");
        Ok(txs)
    }
}

// ── Wire format ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExplorerTransaction {
    transaction_id: String,
    /// Milliseconds since epoch.
    block_time: Option<u64>,
    is_accepted: Option<bool>,
    #[serde(default)]
    inputs: Option<Vec<ExplorerInput>>,
    #[serde(default)]
    outputs: Option<Vec<ExplorerOutput>>,
}

#[derive(Debug, Deserialize)]
struct ExplorerInput {
    previous_outpoint_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExplorerOutput {
    amount: u64,
    script_public_key_address: Option<String>,
}

/// Drop unaccepted or untimed transactions and emit one entry per addressed output.
fn flatten(body: Vec<ExplorerTransaction>) -> Vec<Transaction> {
    let mut out = Vec::new();
    for tx in body {
        if tx.is_accepted == Some(false) {
            continue;
        }
        let Some(block_time) = tx.block_time else {
            continue;
        };
        let from = tx
            .inputs
            .as_deref()
            .and_then(|inputs| inputs.first())
            .and_then(|input| input.previous_outpoint_address.as_deref())
            .map(WalletAddress::new);
        for output in tx.outputs.unwrap_or_default() {
            let Some(to) = output.script_public_key_address else {
                continue;
            };
            out.push(Transaction {
                id: TxId::new(tx.transaction_id.clone()),
                timestamp: Timestamp::from_millis(block_time),
                from: from.clone(),
                to: WalletAddress::new(to),
                amount: Amount::from_base_units(output.amount),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Transaction> {
        let body: Vec<ExplorerTransaction> = serde_json::from_str(json).unwrap();
        flatten(body)
    }

    #[test]
    fn flattens_outputs_and_resolves_sender() {
        let txs = parse(
            r#"[{
                "transaction_id": "aa11",
                "block_time": 1700000005000,
                "is_accepted": true,
                "inputs": [{"previous_outpoint_address": "kaspa:abc", "previous_outpoint_amount": 500000000}],
                "outputs": [
                    {"amount": 100000000, "script_public_key_address": "kaspa:abc"},
                    {"amount": 399990000, "script_public_key_address": "kaspa:abc"}
                ]
            }]"#,
        );
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].id, TxId::new("aa11"));
        assert_eq!(txs[0].timestamp, Timestamp::from_millis(1_700_000_005_000));
        assert_eq!(txs[0].amount, Amount::from_native(1));
        assert!(txs[0].is_self_payment());
    }

    #[test]
    fn skips_unaccepted_and_untimed() {
        let txs = parse(
            r#"[
                {"transaction_id": "a", "block_time": 1, "is_accepted": false,
                 "outputs": [{"amount": 1, "script_public_key_address": "kaspa:abc"}]},
                {"transaction_id": "b", "block_time": null, "is_accepted": true,
                 "outputs": [{"amount": 1, "script_public_key_address": "kaspa:abc"}]},
                {"transaction_id": "c", "block_time": 2,
                 "outputs": [{"amount": 1, "script_public_key_address": "kaspa:abc"}]}
            ]"#,
        );
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, TxId::new("c"));
        assert_eq!(txs[0].from, None);
    }

    #[test]
    fn outputs_without_address_are_ignored() {
        let txs = parse(
            r#"[{"transaction_id": "d", "block_time": 3, "inputs": null,
                 "outputs": [{"amount": 7, "script_public_key_address": null}]}]"#,
        );
        assert!(txs.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ExplorerClient::new("https://explorer.example/").unwrap();
        assert_eq!(client.base_url(), "https://explorer.example");
        assert_eq!(
            client.transactions_url(&WalletAddress::new("kaspa:abc")),
            "https://explorer.example/addresses/kaspa:abc/full-transactions"
        );
    }
}
