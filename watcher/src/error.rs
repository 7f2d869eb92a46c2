use selfproof_explorer::ExplorerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// The ledger kept failing until the attempt budget ran out.
    #[error("ledger unreachable after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: ExplorerError,
    },

    /// The ledger refused the query in a way retrying will not fix.
    #[error("ledger rejected the query on attempt {attempt}: {source}")]
    Rejected {
        attempt: u32,
        #[source]
        source: ExplorerError,
    },
}
