//! Envelope construction via the builder pattern.
//!
//! The [`EnvelopeBuilder`] takes the acting account and its current sequence
//! number, a fee, an expiry and exactly one contract call, and produces an
//! unsigned [`Envelope`]. It never signs and never talks to the network, so
//! construction is testable without key material or a ledger.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::prepared::ResourceEstimate;
use super::{EnvelopeError, PreparedEnvelope};
use crate::address::{Address, Network};
use crate::config::{BASE_FEE, DEFAULT_DEADLINE};
use crate::value::ScValue;

// ---------------------------------------------------------------------------
// OperationRequest
// ---------------------------------------------------------------------------

/// One call of a named contract method with positional, typed arguments.
///
/// Built fresh for every user action and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    contract: Address,
    method: String,
    args: Vec<ScValue>,
}

impl OperationRequest {
    pub fn new(contract: Address, method: impl Into<String>, args: Vec<ScValue>) -> Self {
        Self {
            contract,
            method: method.into(),
            args,
        }
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[ScValue] {
        &self.args
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// An operation plus the metadata the ledger needs to order and expire it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Account paying the fee and authorising the call.
    pub source: Address,
    /// Sequence number this envelope consumes (account sequence + 1).
    pub sequence: u64,
    /// Total fee in minor units. Grows by the resource fee on assembly.
    pub fee: u64,
    /// Unix seconds after which the ledger rejects the envelope.
    pub expires_at: u64,
    /// The single contract call.
    pub operation: OperationRequest,
    /// Resource estimate attached by simulation. `None` until assembled.
    pub resources: Option<ResourceEstimate>,
}

impl Envelope {
    /// Canonical binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        bincode::serialize(self).map_err(|e| EnvelopeError::Encode(e.to_string()))
    }

    /// The 32 bytes a signer signs: `SHA-256(network_id || envelope_bytes)`.
    ///
    /// Mixing in the network id makes a signature meaningless on any other
    /// network.
    pub fn signature_payload(&self, network: &Network) -> Result<[u8; 32], EnvelopeError> {
        let mut hasher = Sha256::new();
        hasher.update(network.id());
        hasher.update(self.to_bytes()?);
        Ok(hasher.finalize().into())
    }

    /// Hex transaction hash, the reference used to poll for finality.
    pub fn hash(&self, network: &Network) -> Result<String, EnvelopeError> {
        self.signature_payload(network).map(hex::encode)
    }

    /// Attaches a simulation's resource estimate and raises the fee by the
    /// minimum resource fee.
    pub fn assemble(mut self, resources: ResourceEstimate) -> PreparedEnvelope {
        self.fee = self.fee.saturating_add(resources.min_resource_fee);
        self.resources = Some(resources);
        PreparedEnvelope::new(self)
    }
}

// ---------------------------------------------------------------------------
// EnvelopeBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Envelope`]s.
///
/// ```rust,no_run
/// use hourglass_protocol::address::Address;
/// use hourglass_protocol::transaction::{EnvelopeBuilder, OperationRequest};
/// use hourglass_protocol::value::ScValue;
///
/// let contract = Address::Contract([9u8; 32]);
/// let envelope = EnvelopeBuilder::new(Address::placeholder_account(), 41)
///     .fee(100)
///     .operation(OperationRequest::new(contract, "get_token", vec![ScValue::U64(1)]))
///     .build()
///     .unwrap();
/// assert_eq!(envelope.sequence, 42);
/// ```
pub struct EnvelopeBuilder {
    source: Address,
    account_sequence: u64,
    fee: u32,
    timeout: Duration,
    now: Option<u64>,
    operation: Option<OperationRequest>,
}

impl EnvelopeBuilder {
    /// Starts an envelope for `source`, whose current ledger sequence is
    /// `account_sequence`.
    ///
    /// Defaults: base fee, the default deadline, expiry measured from the
    /// current UTC time.
    pub fn new(source: Address, account_sequence: u64) -> Self {
        Self {
            source,
            account_sequence,
            fee: BASE_FEE,
            timeout: DEFAULT_DEADLINE,
            now: None,
            operation: None,
        }
    }

    /// Sets the inclusion fee in minor units.
    pub fn fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the validity window.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pins "now" (Unix seconds). Tests use this for deterministic hashes.
    pub fn now(mut self, unix_seconds: u64) -> Self {
        self.now = Some(unix_seconds);
        self
    }

    /// Sets the contract call.
    pub fn operation(mut self, operation: OperationRequest) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Consumes the builder. The envelope uses the next sequence number.
    pub fn build(self) -> Result<Envelope, EnvelopeError> {
        let operation = self.operation.ok_or(EnvelopeError::MissingOperation)?;
        let now = self
            .now
            .unwrap_or_else(|| Utc::now().timestamp().max(0) as u64);

        Ok(Envelope {
            source: self.source,
            sequence: self.account_sequence.saturating_add(1),
            fee: u64::from(self.fee),
            expires_at: now.saturating_add(self.timeout.as_secs()),
            operation,
            resources: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
