//! An in-process Ed25519 wallet.
//!
//! The command-line client has no browser extension to talk to, so it holds
//! the signing key itself. Key bytes are never logged and never serialized
//! implicitly; export is explicit through [`LocalWallet::secret_hex`].

use async_trait::async_trait;
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use tracing::{debug, warn};

use super::{Wallet, WalletError};
use crate::address::{Address, Network};
use crate::transaction::TransportEnvelope;

/// A wallet holding one signing key for one network.
pub struct LocalWallet {
    signing_key: SigningKey,
    network: Network,
}

impl LocalWallet {
    /// Generates a fresh key using the OS RNG.
    pub fn generate(network: Network) -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
            network,
        }
    }

    /// Builds a wallet from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH], network: Network) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
            network,
        }
    }

    /// Loads a hex-encoded secret key.
    ///
    /// The error deliberately does not echo the input.
    pub fn from_secret_hex(hex_str: &str, network: Network) -> Result<Self, WalletError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|_| WalletError::new("secret key is not valid hex"))?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| WalletError::new("secret key must be 32 bytes"))?;
        Ok(Self::from_seed(&seed, network))
    }

    /// The account this wallet controls.
    pub fn address(&self) -> Address {
        Address::Account(self.signing_key.verifying_key().to_bytes())
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Hex export of the secret key. Handle with care.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    async fn request_access(&self) -> Result<Address, WalletError> {
        Ok(self.address())
    }

    async fn sign_transaction(
        &self,
        transport: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError> {
        if network_passphrase != self.network.passphrase() {
            warn!(
                requested = network_passphrase,
                "refusing to sign for a different network"
            );
            return Err(WalletError::new(format!(
                "network mismatch: wallet is configured for \"{}\", request was for \"{}\"",
                self.network.passphrase(),
                network_passphrase
            )));
        }

        let mut envelope =
            TransportEnvelope::decode(transport).map_err(|e| WalletError::new(e.to_string()))?;

        if envelope.envelope.source != self.address() {
            return Err(WalletError::new(format!(
                "envelope source {} is not this wallet's account",
                envelope.envelope.source
            )));
        }

        envelope
            .sign_with(&self.signing_key, &self.network)
            .map_err(|e| WalletError::new(e.to_string()))?;
        debug!(
            method = envelope.envelope.operation.method(),
            sequence = envelope.envelope.sequence,
            "envelope signed"
        );
        envelope.encode().map_err(|e| WalletError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TESTNET_PASSPHRASE;
    use crate::transaction::{EnvelopeBuilder, OperationRequest, ResourceEstimate, SignedEnvelope};

    fn testnet() -> Network {
        Network::new(TESTNET_PASSPHRASE)
    }

    fn unsigned_for(source: Address) -> String {
        EnvelopeBuilder::new(source, 1)
            .operation(OperationRequest::new(
                Address::Contract([9u8; 32]),
                "get_token_count",
                vec![],
            ))
            .build()
            .unwrap()
            .assemble(ResourceEstimate::default())
            .to_transport()
            .unwrap()
    }

    #[tokio::test]
    async fn access_returns_own_account() {
        let wallet = LocalWallet::from_seed(&[3u8; 32], testnet());
        let address = wallet.request_access().await.unwrap();
        assert_eq!(address, wallet.address());
        assert!(address.is_account());
    }

    #[tokio::test]
    async fn signs_for_its_own_network() {
        let wallet = LocalWallet::generate(testnet());
        let text = unsigned_for(wallet.address());
        let signed = wallet
            .sign_transaction(&text, TESTNET_PASSPHRASE)
            .await
            .unwrap();
        let signed = SignedEnvelope::from_transport(&signed, &testnet()).unwrap();
        assert_eq!(signed.signatures().len(), 1);
    }

    #[tokio::test]
    async fn refuses_a_different_network() {
        let wallet = LocalWallet::generate(testnet());
        let text = unsigned_for(wallet.address());
        let err = wallet
            .sign_transaction(&text, "Public Global Stellar Network ; September 2015")
            .await
            .unwrap_err();
        assert!(err.0.contains("network mismatch"));
    }

    #[tokio::test]
    async fn refuses_foreign_source_accounts() {
        let wallet = LocalWallet::generate(testnet());
        let text = unsigned_for(Address::Account([8u8; 32]));
        let err = wallet
            .sign_transaction(&text, TESTNET_PASSPHRASE)
            .await
            .unwrap_err();
        assert!(err.0.contains("not this wallet's account"));
    }

    #[test]
    fn secret_hex_roundtrip() {
        let wallet = LocalWallet::generate(testnet());
        let restored = LocalWallet::from_secret_hex(&wallet.secret_hex(), testnet()).unwrap();
        assert_eq!(restored.address(), wallet.address());
        assert!(LocalWallet::from_secret_hex("zz", testnet()).is_err());
        assert!(LocalWallet::from_secret_hex("abcd", testnet()).is_err());
    }
}
