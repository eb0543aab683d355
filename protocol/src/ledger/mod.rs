//! # Ledger RPC
//!
//! The remote ledger node is an opaque collaborator reached over JSON-RPC.
//! The workflow only needs four operations from it, captured by the
//! [`LedgerRpc`] trait so tests can substitute a scripted ledger:
//!
//! ```text
//! rpc.rs:   JSON-RPC 2.0 envelope types and the method enumeration
//! types.rs: typed request/response payloads
//! http.rs:  reqwest-backed client
//! ```

pub mod http;
pub mod rpc;
pub mod types;

pub use http::HttpLedger;
pub use rpc::{RpcError, RpcMethod, RpcRequest, RpcResponse};
pub use types::{AccountRecord, SendResult, SendStatus, SimulationResult, TransactionStatus};

use async_trait::async_trait;
use thiserror::Error;

use crate::address::Address;
use crate::config::STILL_PROCESSING_SIGNATURE;

/// Errors talking to the ledger node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The request never got a response (connection, TLS, timeout).
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("ledger error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// The response could not be decoded.
    #[error("malformed ledger response: {0}")]
    Decode(String),

    /// The account does not exist on the ledger.
    #[error("account not found: {0}")]
    AccountNotFound(String),
}

impl LedgerError {
    /// Returns `true` for the transient error a node produces while a
    /// transaction result is still being written. Callers polling for
    /// finality treat it like "not found yet".
    pub fn is_still_processing(&self) -> bool {
        match self {
            Self::Decode(message) | Self::Rpc { message, .. } => {
                message.contains(STILL_PROCESSING_SIGNATURE)
            }
            _ => false,
        }
    }
}

/// The ledger operations the transaction workflow consumes.
///
/// Envelopes cross this boundary in their base64 transport form.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Loads an account and its current sequence number.
    async fn get_account(&self, address: &Address) -> Result<AccountRecord, LedgerError>;

    /// Simulates an envelope, returning the contract's return value and a
    /// resource estimate.
    async fn simulate(&self, transport: &str) -> Result<SimulationResult, LedgerError>;

    /// Submits a signed envelope.
    async fn send_transaction(&self, transport: &str) -> Result<SendResult, LedgerError>;

    /// Fetches the status of a submitted transaction.
    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_processing_signature_is_recognised() {
        let decode = LedgerError::Decode("XDR Read Error: Bad union switch: 4".into());
        let rpc = LedgerError::Rpc {
            code: -32603,
            message: "Bad union switch".into(),
        };
        assert!(decode.is_still_processing());
        assert!(rpc.is_still_processing());
    }

    #[test]
    fn other_errors_are_not_transient() {
        assert!(!LedgerError::Transport("connection refused".into()).is_still_processing());
        assert!(!LedgerError::Decode("unexpected end of input".into()).is_still_processing());
        assert!(!LedgerError::AccountNotFound("acct1".into()).is_still_processing());
    }
}
