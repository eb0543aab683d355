//! # Addresses & Network Identity
//!
//! Ledger participants come in two flavours: accounts, identified by their
//! Ed25519 public key, and contracts, identified by a 32-byte contract id.
//! Both are rendered as Bech32 strings so a mistyped character is caught
//! by the checksum instead of by the remote node:
//!
//! ```text
//! account  -> acct1<bech32(public_key)>
//! contract -> ctr1<bech32(contract_id)>
//! ```
//!
//! A [`Network`] is identified by its passphrase. The SHA-256 of the
//! passphrase is mixed into every transaction hash, which is what keeps a
//! signature made for one network from being replayed on another.

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Human-readable prefix for account addresses.
const ACCOUNT_HRP: &str = "acct";

/// Human-readable prefix for contract addresses.
const CONTRACT_HRP: &str = "ctr";

/// Placeholders the contracts store in address-typed slots.
const SENTINELS: [&str; 3] = ["pending", "none", "tie"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing an address string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The string is not valid Bech32 (bad charset or checksum).
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The prefix is neither an account nor a contract prefix.
    #[error("unknown address prefix: {0}")]
    UnknownPrefix(String),

    /// The payload is not 32 bytes.
    #[error("invalid address payload length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An account or contract on the ledger.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Address {
    /// An account, keyed by its Ed25519 public key.
    Account([u8; 32]),
    /// A deployed contract.
    Contract([u8; 32]),
}

impl Address {
    /// A random, syntactically valid account. Read-only simulations need a
    /// source account but never touch its state, so any key will do.
    pub fn placeholder_account() -> Self {
        Self::Account(rand::random::<[u8; 32]>())
    }

    /// Raw 32-byte payload.
    pub fn as_bytes(&self) -> &[u8; 32] {
        match self {
            Self::Account(bytes) | Self::Contract(bytes) => bytes,
        }
    }

    /// Returns `true` for account addresses.
    pub fn is_account(&self) -> bool {
        matches!(self, Self::Account(_))
    }

    fn hrp(&self) -> &'static str {
        match self {
            Self::Account(_) => ACCOUNT_HRP,
            Self::Contract(_) => CONTRACT_HRP,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = Hrp::parse(self.hrp()).expect("static HRP is valid");
        let encoded = bech32::encode::<Bech32>(hrp, self.as_bytes())
            .expect("encoding a 32-byte payload should never fail");
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) =
            bech32::decode(s.trim()).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let bytes: [u8; 32] = data
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(data.len()))?;

        match hrp.to_string().as_str() {
            ACCOUNT_HRP => Ok(Self::Account(bytes)),
            CONTRACT_HRP => Ok(Self::Contract(bytes)),
            other => Err(AddressError::UnknownPrefix(other.to_string())),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Abbreviates an address for display as `first8...last4`.
///
/// Contract sentinels (`pending`, `none`, `tie`) and anything too short to
/// abbreviate are returned unchanged.
pub fn short_address(address: &str) -> String {
    if SENTINELS.contains(&address) || address.len() <= 12 {
        return address.to_string();
    }
    format!("{}...{}", &address[..8], &address[address.len() - 4..])
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A ledger network, identified by its passphrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Network {
    passphrase: String,
}

impl Network {
    /// Wraps a network passphrase.
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }

    /// The passphrase handed to the wallet when signing.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Network identifier: SHA-256 of the passphrase.
    pub fn id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase.as_bytes()).into()
    }

    /// Contract address of the native asset on this network.
    pub fn native_asset_contract(&self) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(self.id());
        hasher.update(b"native");
        Address::Contract(hasher.finalize().into())
    }
}
