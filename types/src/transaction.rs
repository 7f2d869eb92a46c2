//! Confirmed ledger transactions as seen by the watcher.

use crate::{Amount, Timestamp, TxId, WalletAddress};
use serde::{Deserialize, Serialize};

/// One value transfer read from the public ledger.
///
/// A ledger transaction with several outputs is flattened into one
/// `Transaction` per output; they share the same `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    /// Block time of the transaction.
    pub timestamp: Timestamp,
    /// Sender, when the ledger resolved it.
    pub from: Option<WalletAddress>,
    /// Destination of this output.
    pub to: WalletAddress,
    pub amount: Amount,
}

impl Transaction {
    /// Sender and recipient are the same address.
    pub fn is_self_payment(&self) -> bool {
        self.from.as_ref() == Some(&self.to)
    }
}
