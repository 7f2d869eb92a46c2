//! Nullable ledger: a scripted, in-memory public ledger.

use async_trait::async_trait;
use selfproof_explorer::{ExplorerError, LedgerQueryClient};
use selfproof_types::{Transaction, WalletAddress};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// An in-memory ledger that serves whatever transactions have been added.
///
/// Queued failures are returned (one per call) before the ledger answers
/// normally again, which simulates a flaky explorer.
#[derive(Default)]
pub struct NullLedgerClient {
    transactions: Mutex<Vec<Transaction>>,
    failures: Mutex<VecDeque<ExplorerError>>,
    always_fail: Mutex<Option<String>>,
    calls: AtomicU32,
}

impl NullLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a transaction visible to subsequent fetches.
    pub fn add_transaction(&self, tx: Transaction) {
        self.transactions.lock().unwrap().push(tx);
    }

    /// Fail the next call with `err`. Calls queue up in order.
    pub fn fail_next(&self, err: ExplorerError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Fail every call from now on with a transport error.
    pub fn fail_always(&self, reason: &str) {
        *self.always_fail.lock().unwrap() = Some(reason.to_string());
    }

    /// Number of fetches served (successful or not).
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerQueryClient for NullLedgerClient {
    async fn fetch_recent_transactions(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<Transaction>, ExplorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        if let Some(reason) = self.always_fail.lock().unwrap().clone() {
            return Err(ExplorerError::Transport(reason));
        }
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|tx| &tx.to == address || tx.from.as_ref() == Some(address))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfproof_types::{Amount, Timestamp, TxId};

    #[tokio::test]
    async fn serves_added_transactions_newest_first() {
        let ledger = NullLedgerClient::new();
        let addr = WalletAddress::new("kaspa:abc");
        for i in 0..3 {
            ledger.add_transaction(Transaction {
                id: TxId::new(i.to_string()),
                timestamp: Timestamp::from_secs(i),
                from: Some(addr.clone()),
                to: addr.clone(),
                amount: Amount::from_native(1),
            });
        }
        let got = ledger.fetch_recent_transactions(&addr, 2).await.unwrap();
        let ids: Vec<_> = got.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(ledger.calls(), 1);
    }

    #[tokio::test]
    async fn queued_failures_come_first() {
        let ledger = NullLedgerClient::new();
        ledger.fail_next(ExplorerError::Status(503));
        let addr = WalletAddress::new("kaspa:abc");
        assert!(ledger.fetch_recent_transactions(&addr, 5).await.is_err());
        assert!(ledger.fetch_recent_transactions(&addr, 5).await.is_ok());
        assert_eq!(ledger.calls(), 2);
    }
}
