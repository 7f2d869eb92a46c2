use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("explorer returned HTTP {0}")]
    Status(u16),

    #[error("invalid explorer response: {0}")]
    Decode(String),

    #[error("transaction subscription closed")]
    SubscriptionClosed,
}

impl ExplorerError {
    /// Whether retrying the same query later may succeed.
    ///
    /// Transport failures, 5xx and 429 are transient. A 4xx, an undecodable
    /// body or a closed subscription will not improve by polling again.
    pub fn is_transient(&self) -> bool {
        match self {
            ExplorerError::Transport(_) => true,
            ExplorerError::Status(code) => !(400..500).contains(code) || *code == 429,
            ExplorerError::Decode(_) | ExplorerError::SubscriptionClosed => false,
        }
    }
}
