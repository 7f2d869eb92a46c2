//! The self-payment matching rule.

use crate::WatchRequest;
use selfproof_types::{Amount, Transaction};

/// A transaction matches iff all of:
/// - it happened at or after `not_before` (an older payment cannot be replayed),
/// - it pays the watched address itself,
/// - its amount is within `tolerance` of the expected amount.
pub fn is_match(tx: &Transaction, request: &WatchRequest, tolerance: Amount) -> bool {
    tx.timestamp >= request.not_before
        && tx.to == request.address
        && tx.amount.within(request.expected_amount, tolerance)
}

/// The earliest matching transaction in one poll result, if any.
///
/// Ties on timestamp go to the one listed first.
pub fn select_match<'a>(
    txs: &'a [Transaction],
    request: &WatchRequest,
    tolerance: Amount,
) -> Option<&'a Transaction> {
    txs.iter()
        .filter(|tx| is_match(tx, request, tolerance))
        .min_by_key(|tx| tx.timestamp)
}
