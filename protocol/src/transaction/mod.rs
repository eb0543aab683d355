//! # Transaction Envelopes
//!
//! An envelope moves through three states on its way to the ledger:
//!
//! ```text
//! EnvelopeBuilder --build--> Envelope --assemble(resources)--> PreparedEnvelope
//!                                                                   |
//!                                    wallet signs the transport text |
//!                                                                   v
//!                                 SignedEnvelope::from_transport(text, network)
//! ```
//!
//! - [`builder`]: [`OperationRequest`], [`Envelope`] and the fluent
//!   [`EnvelopeBuilder`].
//! - [`prepared`]: resource estimates, the prepared and signed forms, and
//!   the base64 transport encoding exchanged with the wallet and the ledger.

pub mod builder;
pub mod prepared;

pub use builder::{Envelope, EnvelopeBuilder, OperationRequest};
pub use prepared::{
    DecoratedSignature, PreparedEnvelope, ResourceEstimate, SignedEnvelope, TransportEnvelope,
};

use thiserror::Error;

/// Errors produced while building, encoding or decoding envelopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The builder was finished without an operation.
    #[error("envelope has no operation")]
    MissingOperation,

    /// Binary encoding failed.
    #[error("envelope encoding failed: {0}")]
    Encode(String),

    /// The transport text is not valid base64 or not a valid envelope.
    #[error("malformed envelope: {0}")]
    Decode(String),

    /// A signed envelope was expected but none of the signatures are present.
    #[error("envelope carries no signature")]
    Unsigned,

    /// A signature does not verify for this network.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// None of the signatures was made by the envelope's source account.
    #[error("envelope is not signed by its source account {0}")]
    SourceUnsigned(String),
}
