//! # Wallet
//!
//! The wallet is an external, user-controlled trust boundary: it grants
//! access to an account and signs envelopes on the user's behalf. The
//! workflow only ever sees the [`Wallet`] trait.
//!
//! A session with no wallet at all models "no wallet installed"; see
//! [`crate::session::Session::connect`].

pub mod local;

pub use local::LocalWallet;

use async_trait::async_trait;
use thiserror::Error;

use crate::address::Address;

/// A wallet failure, carrying the wallet's own message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct WalletError(pub String);

impl WalletError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An external signing authority.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Asks the user to share an account. Fails if the user declines.
    async fn request_access(&self) -> Result<Address, WalletError>;

    /// Signs a transport-encoded envelope and returns the signed transport
    /// text.
    ///
    /// `network_passphrase` is the network the caller intends to use; a
    /// wallet must refuse to sign if it does not match its own.
    async fn sign_transaction(
        &self,
        transport: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError>;
}
