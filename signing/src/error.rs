use selfproof_types::WalletAddress;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    /// The user cancelled or denied the wallet prompt.
    #[error("signing was rejected in the wallet")]
    SigningRejected,

    /// No PIN (or other secret) is configured for the non-interactive path.
    #[error("no secret configured for non-interactive signing; set a PIN first")]
    MissingSecret,

    #[error("no wallet provider is connected")]
    NoProvider,

    #[error("wallet provider does not control {0}")]
    AccountMismatch(WalletAddress),

    #[error("wallet provider returned a malformed signature: {0}")]
    MalformedSignature(&'static str),

    #[error("wallet provider error: {0}")]
    Provider(String),
}

impl SigningError {
    /// Errors the user resolves by acting (retrying the prompt, setting a PIN,
    /// connecting the right wallet) rather than by reporting a bug.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(
            self,
            SigningError::MalformedSignature(_) | SigningError::Provider(_)
        )
    }
}
