//! # Client Errors
//!
//! [`ClientError`] is the single error type every session, workflow and
//! marketplace operation returns. Each variant is user-actionable on its own
//! and none of them is fatal to the process: after any failure the session is
//! idle and can be used again.
//!
//! Messages supplied by a remote party (the wallet, the simulation endpoint,
//! the ledger) are embedded verbatim so the user sees exactly what the remote
//! side said.

use thiserror::Error;

use crate::amount::AmountError;
use crate::ledger::LedgerError;
use crate::transaction::EnvelopeError;
use crate::value::ValueError;

/// Errors surfaced by session and workflow operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No wallet is available to this session.
    #[error("no wallet found: install a wallet and try again")]
    WalletAbsent,

    /// The wallet failed or the user denied access.
    #[error("wallet refused access: {0}")]
    WalletRejected(String),

    /// The operation needs a connected identity and there is none.
    #[error("not connected: connect a wallet first")]
    NotConnected,

    /// The acting account could not be loaded from the ledger.
    #[error("could not resolve account {address}: {reason}")]
    AccountUnresolvable { address: String, reason: String },

    /// Arguments do not match the contract's declared interface.
    #[error("`{method}` does not match the contract interface: {reason}")]
    SchemaMismatch { method: String, reason: String },

    /// The remote simulation rejected the call.
    #[error("simulation failed: {0}")]
    RemoteSimulation(String),

    /// The wallet refused to sign or returned something unusable.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The ledger reported the transaction as failed.
    #[error("transaction failed: {0}")]
    SubmissionFailed(String),

    /// Finality could not be determined before the attempt ceiling.
    #[error("transaction {hash} still not final after {attempts} status checks")]
    PollTimeout { hash: String, attempts: u32 },

    /// The wait for finality was cancelled.
    #[error("stopped waiting for transaction {0}")]
    Cancelled(String),

    /// A returned value did not have the expected shape.
    #[error("unexpected result: {0}")]
    Decode(#[from] ValueError),

    /// Another signing submission is still running on this session.
    #[error("another transaction is already being submitted")]
    SubmissionInFlight,

    /// User input was rejected before any remote call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The receipt is not listed, or its listing is no longer active.
    #[error("receipt {0} is not listed for sale")]
    ListingInactive(u64),

    /// The listing-cache service failed.
    #[error("listing cache: {0}")]
    Cache(String),

    /// Transport-level ledger failure outside the cases above.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// An envelope could not be encoded or decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

impl From<AmountError> for ClientError {
    fn from(err: AmountError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl ClientError {
    /// Returns `true` when retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PollTimeout { .. } | Self::SubmissionInFlight | Self::Cancelled(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_messages_are_verbatim() {
        let err = ClientError::RemoteSimulation("HostError: Error(Contract, #3)".into());
        assert!(err.to_string().contains("HostError: Error(Contract, #3)"));

        let err = ClientError::WalletRejected("User declined access".into());
        assert!(err.to_string().ends_with("User declined access"));
    }

    #[test]
    fn amount_errors_become_invalid_input() {
        let err: ClientError = AmountError::Empty.into();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn transient_classification() {
        assert!(ClientError::SubmissionInFlight.is_transient());
        assert!(ClientError::PollTimeout {
            hash: "ab".into(),
            attempts: 30
        }
        .is_transient());
        assert!(!ClientError::NotConnected.is_transient());
        assert!(!ClientError::SubmissionFailed("x".into()).is_transient());
    }
}
