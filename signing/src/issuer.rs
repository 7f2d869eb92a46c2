//! Polymorphic signature issuing.

use crate::{SecretMaterial, SigningError, VerificationMessage, WalletProvider};
use crate::provider::ProviderError;
use selfproof_crypto::{content_hash, fallback_digest, is_hex_digest};
use selfproof_types::record::CONTENT_HASH_LEN;
use selfproof_types::{SigningCapability, WalletBinding};
use std::sync::Arc;

/// A signature and the tamper tag derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    pub message: String,
    pub signature: String,
    /// Always `signature[0..64]`. Not chain-verifiable.
    pub content_hash: String,
    pub capability: SigningCapability,
}

/// Produces signatures for verification records.
///
/// The path is chosen from the binding's wallet type: extension wallets sign
/// through the connected [`WalletProvider`]; in-app and imported wallets use the
/// PIN-derived fallback digest.
#[derive(Clone, Default)]
pub struct SignatureIssuer {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl SignatureIssuer {
    /// An issuer with no wallet provider; only the fallback path works.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Sign `message` for `binding`.
    ///
    /// `secret` is only consulted on the non-interactive path.
    pub async fn sign(
        &self,
        message: &VerificationMessage,
        binding: &WalletBinding,
        secret: Option<&SecretMaterial>,
    ) -> Result<SignedMessage, SigningError> {
        let text = message.to_string();
        let capability = binding.wallet_type.capability();
        let signature = match capability {
            SigningCapability::Interactive => self.sign_interactive(&text, binding).await?,
            SigningCapability::NonInteractive => Self::sign_fallback(&text, binding, secret)?,
        };
        let content_hash = content_hash(&signature)
            .ok_or(SigningError::MalformedSignature("shorter than 64 characters"))?;
        tracing::debug!(
            owner = %binding.owner_id,
            address = %binding.address,
            ?capability,
            "issued verification signature"
        );
        Ok(SignedMessage {
            message: text,
            signature,
            content_hash,
            capability,
        })
    }

    /// Recompute the fallback digest and compare it to `signature`.
    pub fn verify_fallback(
        message: &str,
        binding: &WalletBinding,
        secret: &SecretMaterial,
        signature: &str,
    ) -> bool {
        fallback_digest(message, secret.expose(), &binding.address) == signature
    }

    async fn sign_interactive(
        &self,
        text: &str,
        binding: &WalletBinding,
    ) -> Result<String, SigningError> {
        let provider = self.provider.as_ref().ok_or(SigningError::NoProvider)?;

        let accounts = provider.request_accounts().await.map_err(map_provider)?;
        if !accounts.contains(&binding.address) {
            return Err(SigningError::AccountMismatch(binding.address.clone()));
        }

        let signature = provider.sign_message(text).await.map_err(map_provider)?;
        check_provider_signature(&signature)?;
        Ok(signature)
    }

    fn sign_fallback(
        text: &str,
        binding: &WalletBinding,
        secret: Option<&SecretMaterial>,
    ) -> Result<String, SigningError> {
        let secret = secret.ok_or(SigningError::MissingSecret)?;
        Ok(fallback_digest(text, secret.expose(), &binding.address))
    }
}

/// The content hash is the signature's first 64 characters, so they must be hex.
fn check_provider_signature(signature: &str) -> Result<(), SigningError> {
    if !signature.is_ascii() {
        return Err(SigningError::MalformedSignature("contains non-ASCII characters"));
    }
    match signature.get(..CONTENT_HASH_LEN) {
        None => Err(SigningError::MalformedSignature("shorter than 64 characters")),
        Some(prefix) if !is_hex_digest(prefix) => {
            Err(SigningError::MalformedSignature("first 64 characters are not hex"))
        }
        Some(_) => Ok(()),
    }
}

fn map_provider(err: ProviderError) -> SigningError {
    match err {
        ProviderError::Rejected => SigningError::SigningRejected,
        other => SigningError::Provider(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use selfproof_types::{Amount, OwnerId, Timestamp, TxId, WalletAddress, WalletType};

    struct FixedProvider {
        accounts: Vec<WalletAddress>,
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl WalletProvider for FixedProvider {
        async fn request_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError> {
            Ok(self.accounts.clone())
        }

        async fn sign_message(&self, _text: &str) -> Result<String, ProviderError> {
            self.reply.clone().map_err(|_| ProviderError::Rejected)
        }

        async fn send_self_payment(&self, _amount: Amount) -> Result<TxId, ProviderError> {
            Err(ProviderError::Other("not used".into()))
        }
    }

    fn binding(wallet_type: WalletType) -> WalletBinding {
        WalletBinding::new(
            OwnerId::new("u1"),
            wallet_type,
            WalletAddress::new("kaspa:abc"),
            Timestamp::from_secs(1),
        )
    }

    fn message() -> VerificationMessage {
        VerificationMessage {
            action: "publish".into(),
            owner_id: OwnerId::new("u1"),
            address: WalletAddress::new("kaspa:abc"),
            timestamp: Timestamp::from_secs(100),
        }
    }

    fn provider(reply: Result<String, ()>) -> Arc<dyn WalletProvider> {
        Arc::new(FixedProvider {
            accounts: vec![WalletAddress::new("kaspa:abc")],
            reply,
        })
    }

    #[tokio::test]
    async fn fallback_signature_is_deterministic() {
        let issuer = SignatureIssuer::new();
        let pin = SecretMaterial::pin("4321").unwrap();
        let b = binding(WalletType::InAppCustodial);

        let first = issuer.sign(&message(), &b, Some(&pin)).await.unwrap();
        let second = issuer.sign(&message(), &b, Some(&pin)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.capability, SigningCapability::NonInteractive);
        assert_eq!(first.content_hash, &first.signature[..64]);
        assert!(SignatureIssuer::verify_fallback(
            &first.message,
            &b,
            &pin,
            &first.signature
        ));
    }

    #[tokio::test]
    async fn fallback_without_pin_is_missing_secret() {
        let issuer = SignatureIssuer::new();
        let err = issuer
            .sign(&message(), &binding(WalletType::ImportedIdentity), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::MissingSecret));
    }

    #[tokio::test]
    async fn wrong_pin_does_not_verify() {
        let issuer = SignatureIssuer::new();
        let b = binding(WalletType::InAppCustodial);
        let pin = SecretMaterial::pin("1111").unwrap();
        let signed = issuer.sign(&message(), &b, Some(&pin)).await.unwrap();
        let other = SecretMaterial::pin("2222").unwrap();
        assert!(!SignatureIssuer::verify_fallback(
            &signed.message,
            &b,
            &other,
            &signed.signature
        ));
    }

    #[tokio::test]
    async fn interactive_signature_comes_from_provider() {
        let sig = "ab".repeat(65);
        let issuer = SignatureIssuer::with_provider(provider(Ok(sig.clone())));
        let signed = issuer
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap();
        assert_eq!(signed.signature, sig);
        assert_eq!(signed.content_hash, &sig[..64]);
        assert_eq!(signed.capability, SigningCapability::Interactive);
    }

    #[tokio::test]
    async fn interactive_rejection_maps_to_signing_rejected() {
        let issuer = SignatureIssuer::with_provider(provider(Err(())));
        let err = issuer
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::SigningRejected));
        assert!(err.is_user_correctable());
    }

    #[tokio::test]
    async fn interactive_without_provider_fails() {
        let err = SignatureIssuer::new()
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::NoProvider));
    }

    #[tokio::test]
    async fn provider_must_control_address() {
        let issuer = SignatureIssuer::with_provider(Arc::new(FixedProvider {
            accounts: vec![WalletAddress::new("kaspa:zzz")],
            reply: Ok("ab".repeat(65)),
        }));
        let err = issuer
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::AccountMismatch(_)));
    }

    #[tokio::test]
    async fn short_provider_signature_is_malformed() {
        let issuer = SignatureIssuer::with_provider(provider(Ok("abcd".into())));
        let err = issuer
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::MalformedSignature(_)));
        assert!(!err.is_user_correctable());
    }

    #[tokio::test]
    async fn base64_provider_signature_is_malformed() {
        let sig = "q83v+/==".repeat(16);
        let issuer = SignatureIssuer::with_provider(provider(Ok(sig)));
        let err = issuer
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SigningError::MalformedSignature("first 64 characters are not hex")
        ));
    }

    #[tokio::test]
    async fn multibyte_provider_signature_is_malformed() {
        // 63 hex characters then a two-byte char straddling the 64-byte mark.
        let sig = format!("{}é{}", "a".repeat(63), "b".repeat(64));
        let issuer = SignatureIssuer::with_provider(provider(Ok(sig)));
        let err = issuer
            .sign(&message(), &binding(WalletType::Extension), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SigningError::MalformedSignature("contains non-ASCII characters")
        ));
    }
}
