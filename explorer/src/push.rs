//! Push-fed ledger client.
//!
//! Adapts a subscription (e.g. a node's UTXO-changed notifications) to the
//! polling [`LedgerQueryClient`] contract: pushed transactions are buffered in a
//! bounded window and served on the next fetch, so the watcher does not change.

use crate::{ExplorerError, LedgerQueryClient};
use async_trait::async_trait;
use selfproof_types::{Transaction, WalletAddress};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Producer side of a push feed. Dropping every sender closes the feed.
#[derive(Clone)]
pub struct PushFeedSender {
    tx: mpsc::UnboundedSender<Transaction>,
}

impl PushFeedSender {
    /// Deliver one transaction. Returns `false` if the client is gone.
    pub fn push(&self, transaction: Transaction) -> bool {
        self.tx.send(transaction).is_ok()
    }
}

/// Consumer side: buffers the most recent `window` pushed transactions.
pub struct PushFeedClient {
    inner: Mutex<FeedState>,
    window: usize,
}

struct FeedState {
    rx: mpsc::UnboundedReceiver<Transaction>,
    buffer: VecDeque<Transaction>,
    closed: bool,
}

/// Create a connected sender/client pair retaining at most `window` transactions.
pub fn push_feed(window: usize) -> (PushFeedSender, PushFeedClient) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = PushFeedClient {
        inner: Mutex::new(FeedState {
            rx,
            buffer: VecDeque::with_capacity(window),
            closed: false,
        }),
        window: window.max(1),
    };
    (PushFeedSender { tx }, client)
}

impl PushFeedClient {
    fn drain(&self) -> Result<Vec<Transaction>, ExplorerError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match state.rx.try_recv() {
                Ok(tx) => {
                    if state.buffer.len() == self.window {
                        state.buffer.pop_front();
                    }
                    state.buffer.push_back(tx);
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    state.closed = true;
                    break;
                }
            }
        }
        if state.closed && state.buffer.is_empty() {
            return Err(ExplorerError::SubscriptionClosed);
        }
        Ok(state.buffer.iter().cloned().collect())
    }
}

#[async_trait]
impl LedgerQueryClient for PushFeedClient {
    async fn fetch_recent_transactions(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<Transaction>, ExplorerError> {
        let buffered = self.drain()?;
        Ok(buffered
            .into_iter()
            .rev()
            .filter(|tx| &tx.to == address || tx.from.as_ref() == Some(address))
            .take(limit)
            .collect())
    }
}
