//! Nullable wallet provider: scripted signing and self-payments.

use crate::NullLedgerClient;
use async_trait::async_trait;
use selfproof_signing::{ProviderError, WalletProvider};
use selfproof_types::{Amount, Clock, Transaction, TxId, WalletAddress};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// How the next `sign_message` call answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignBehavior {
    /// Return a deterministic 128-character signature derived from the text.
    Sign,
    /// The user cancels the prompt.
    Reject,
    /// The extension is not reachable.
    Unavailable,
}

/// A wallet provider controlling a single account.
///
/// When attached to a [`NullLedgerClient`], `send_self_payment` lands the
/// payment on that ledger, stamped with the attached clock.
pub struct NullWalletProvider {
    account: WalletAddress,
    behavior: Mutex<SignBehavior>,
    signed: Mutex<Vec<String>>,
    ledger: Option<(Arc<NullLedgerClient>, Arc<dyn Clock>)>,
    payments: AtomicU32,
}

impl NullWalletProvider {
    pub fn new(account: WalletAddress) -> Self {
        Self {
            account,
            behavior: Mutex::new(SignBehavior::Sign),
            signed: Mutex::new(Vec::new()),
            ledger: None,
            payments: AtomicU32::new(0),
        }
    }

    /// Land self-payments on `ledger`, timestamped by `clock`.
    pub fn with_ledger(mut self, ledger: Arc<NullLedgerClient>, clock: Arc<dyn Clock>) -> Self {
        self.ledger = Some((ledger, clock));
        self
    }

    pub fn set_behavior(&self, behavior: SignBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Every message text signed so far (for assertions).
    pub fn signed_messages(&self) -> Vec<String> {
        self.signed.lock().unwrap().clone()
    }

    /// The signature this provider returns for `text`.
    pub fn signature_for(text: &str) -> String {
        let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
        let mut out = String::with_capacity(128);
        for i in 0..8u64 {
            for b in text.bytes().chain(i.to_le_bytes()) {
                acc ^= u64::from(b);
                acc = acc.wrapping_mul(0x0100_0000_01b3);
            }
            out.push_str(&format!("{acc:016x}"));
        }
        out
    }
}

#[async_trait]
impl WalletProvider for NullWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError> {
        Ok(vec![self.account.clone()])
    }

    async fn sign_message(&self, text: &str) -> Result<String, ProviderError> {
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            SignBehavior::Sign => {
                self.signed.lock().unwrap().push(text.to_string());
                Ok(Self::signature_for(text))
            }
            SignBehavior::Reject => Err(ProviderError::Rejected),
            SignBehavior::Unavailable => {
                Err(ProviderError::Unavailable("extension not installed".into()))
            }
        }
    }

    async fn send_self_payment(&self, amount: Amount) -> Result<TxId, ProviderError> {
        let n = self.payments.fetch_add(1, Ordering::SeqCst);
        let id = TxId::new(format!("null-tx-{n}"));
        if let Some((ledger, clock)) = &self.ledger {
            ledger.add_transaction(Transaction {
                id: id.clone(),
                timestamp: clock.now(),
                from: Some(self.account.clone()),
                to: self.account.clone(),
                amount,
            });
        }
        Ok(id)
    }
}
