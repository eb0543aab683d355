//! Prepared and signed envelopes, and their transport encoding.
//!
//! The transport form is `base64(bincode({envelope, signatures}))`. The
//! wallet receives an unsigned payload, appends its signature, and hands the
//! text back; [`SignedEnvelope::from_transport`] then checks every signature
//! against the network the caller expects before anything is submitted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::{Envelope, EnvelopeError};
use crate::address::Network;

/// Resource usage reported by a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    /// Fee the ledger charges for the resources, in minor units.
    pub min_resource_fee: u64,
    pub cpu_instructions: u64,
    pub read_bytes: u32,
    pub write_bytes: u32,
}

/// An Ed25519 signature together with the key that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    pub public_key: [u8; 32],
    pub signature: Vec<u8>,
}

impl DecoratedSignature {
    /// Verifies this signature over `payload`.
    pub fn verify(&self, payload: &[u8]) -> Result<(), EnvelopeError> {
        let key = VerifyingKey::from_bytes(&self.public_key)
            .map_err(|e| EnvelopeError::InvalidSignature(e.to_string()))?;
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| EnvelopeError::InvalidSignature(e.to_string()))?;
        key.verify(payload, &signature)
            .map_err(|_| EnvelopeError::InvalidSignature(hex::encode(self.public_key)))
    }
}

// ---------------------------------------------------------------------------
// Transport encoding
// ---------------------------------------------------------------------------

/// Wire form shared by prepared and signed envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportEnvelope {
    pub envelope: Envelope,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransportEnvelope {
    /// Encodes to base64 text.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        let bytes = bincode::serialize(self).map_err(|e| EnvelopeError::Encode(e.to_string()))?;
        Ok(BASE64.encode(bytes))
    }

    /// Decodes base64 text.
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        let bytes = BASE64
            .decode(text.trim())
            .map_err(|e| EnvelopeError::Decode(e.to_string()))?;
        bincode::deserialize(&bytes).map_err(|e| EnvelopeError::Decode(e.to_string()))
    }

    /// Appends a signature made with `key` for `network`.
    pub fn sign_with(&mut self, key: &SigningKey, network: &Network) -> Result<(), EnvelopeError> {
        let payload = self.envelope.signature_payload(network)?;
        let signature = key.sign(&payload);
        self.signatures.push(DecoratedSignature {
            public_key: key.verifying_key().to_bytes(),
            signature: signature.to_bytes().to_vec(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PreparedEnvelope
// ---------------------------------------------------------------------------

/// An envelope annotated with its simulated resource estimate, ready to be
/// signed. No public API mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEnvelope {
    envelope: Envelope,
}

impl PreparedEnvelope {
    pub(crate) fn new(envelope: Envelope) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn hash(&self, network: &Network) -> Result<String, EnvelopeError> {
        self.envelope.hash(network)
    }

    /// Unsigned transport text handed to the wallet.
    pub fn to_transport(&self) -> Result<String, EnvelopeError> {
        TransportEnvelope {
            envelope: self.envelope.clone(),
            signatures: Vec::new(),
        }
        .encode()
    }
}

// ---------------------------------------------------------------------------
// SignedEnvelope
// ---------------------------------------------------------------------------

/// A prepared envelope plus at least one signature valid for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    envelope: Envelope,
    signatures: Vec<DecoratedSignature>,
    network: Network,
}

impl SignedEnvelope {
    /// Decodes wallet output and binds it to `network`.
    ///
    /// Fails if there is no signature, if any signature was made for a
    /// different network or a different envelope, or if the source account
    /// did not sign.
    pub fn from_transport(text: &str, network: &Network) -> Result<Self, EnvelopeError> {
        let TransportEnvelope {
            envelope,
            signatures,
        } = TransportEnvelope::decode(text)?;

        if signatures.is_empty() {
            return Err(EnvelopeError::Unsigned);
        }

        let payload = envelope.signature_payload(network)?;
        for signature in &signatures {
            signature.verify(&payload)?;
        }

        let source = &envelope.source;
        if !source.is_account()
            || !signatures
                .iter()
                .any(|s| &s.public_key == source.as_bytes())
        {
            return Err(EnvelopeError::SourceUnsigned(source.to_string()));
        }

        Ok(Self {
            envelope,
            signatures,
            network: network.clone(),
        })
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    /// Transaction hash on the bound network.
    pub fn hash(&self) -> Result<String, EnvelopeError> {
        self.envelope.hash(&self.network)
    }

    /// Signed transport text submitted to the ledger.
    pub fn to_transport(&self) -> Result<String, EnvelopeError> {
        TransportEnvelope {
            envelope: self.envelope.clone(),
            signatures: self.signatures.clone(),
        }
        .encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::config::TESTNET_PASSPHRASE;
    use crate::transaction::{EnvelopeBuilder, OperationRequest};
    use crate::value::ScValue;

    fn source_key() -> SigningKey {
        SigningKey::from_bytes(&[11u8; 32])
    }

    fn prepared() -> PreparedEnvelope {
        prepared_for(Address::Account(source_key().verifying_key().to_bytes()))
    }

    fn prepared_for(source: Address) -> PreparedEnvelope {
        EnvelopeBuilder::new(source.clone(), 10)
            .now(1_700_000_000)
            .operation(OperationRequest::new(
                Address::Contract([9u8; 32]),
                "redeem_receipt",
                vec![ScValue::U64(2), ScValue::Address(source)],
            ))
            .build()
            .unwrap()
            .assemble(ResourceEstimate {
                min_resource_fee: 900,
                cpu_instructions: 1_000_000,
                read_bytes: 512,
                write_bytes: 128,
            })
    }

    fn sign(text: &str, key: &SigningKey, network: &Network) -> String {
        let mut transport = TransportEnvelope::decode(text).unwrap();
        transport.sign_with(key, network).unwrap();
        transport.encode().unwrap()
    }

    #[test]
    fn transport_roundtrip_keeps_the_envelope() {
        let prepared = prepared();
        let decoded = TransportEnvelope::decode(&prepared.to_transport().unwrap()).unwrap();
        assert_eq!(&decoded.envelope, prepared.envelope());
        assert!(decoded.signatures.is_empty());
    }

    #[test]
    fn unsigned_transport_is_not_a_signed_envelope() {
        let network = Network::new(TESTNET_PASSPHRASE);
        let text = prepared().to_transport().unwrap();
        assert_eq!(
            SignedEnvelope::from_transport(&text, &network),
            Err(EnvelopeError::Unsigned)
        );
    }

    #[test]
    fn signed_transport_verifies_on_the_same_network() {
        let network = Network::new(TESTNET_PASSPHRASE);
        let key = source_key();
        let prepared = prepared();

        let signed_text = sign(&prepared.to_transport().unwrap(), &key, &network);
        let signed = SignedEnvelope::from_transport(&signed_text, &network).unwrap();

        assert_eq!(signed.envelope(), prepared.envelope());
        assert_eq!(signed.signatures().len(), 1);
        assert_eq!(signed.hash().unwrap(), prepared.hash(&network).unwrap());
        assert_eq!(signed.to_transport().unwrap(), signed_text);
    }

    #[test]
    fn signature_for_another_network_is_rejected() {
        let key = source_key();
        let text = sign(
            &prepared().to_transport().unwrap(),
            &key,
            &Network::new("Private Network"),
        );
        let err = SignedEnvelope::from_transport(&text, &Network::new(TESTNET_PASSPHRASE))
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidSignature(_)));
    }

    #[test]
    fn signature_from_another_account_is_rejected() {
        let network = Network::new(TESTNET_PASSPHRASE);
        let stranger = SigningKey::from_bytes(&[12u8; 32]);
        let text = sign(&prepared().to_transport().unwrap(), &stranger, &network);

        let err = SignedEnvelope::from_transport(&text, &network).unwrap_err();
        assert!(matches!(err, EnvelopeError::SourceUnsigned(_)));
    }

    #[test]
    fn extra_signatures_are_fine_once_the_source_signed() {
        let network = Network::new(TESTNET_PASSPHRASE);
        let stranger = SigningKey::from_bytes(&[12u8; 32]);
        let once = sign(&prepared().to_transport().unwrap(), &stranger, &network);
        let twice = sign(&once, &source_key(), &network);

        let signed = SignedEnvelope::from_transport(&twice, &network).unwrap();
        assert_eq!(signed.signatures().len(), 2);
    }

    #[test]
    fn contract_source_can_never_be_signed_for() {
        let network = Network::new(TESTNET_PASSPHRASE);
        let text = sign(
            &prepared_for(Address::Contract([11u8; 32])).to_transport().unwrap(),
            &source_key(),
            &network,
        );
        assert!(matches!(
            SignedEnvelope::from_transport(&text, &network),
            Err(EnvelopeError::SourceUnsigned(_))
        ));
    }

    #[test]
    fn garbage_transport_is_a_decode_error() {
        let network = Network::new(TESTNET_PASSPHRASE);
        assert!(matches!(
            SignedEnvelope::from_transport("not base64!!", &network),
            Err(EnvelopeError::Decode(_))
        ));
        assert!(matches!(
            SignedEnvelope::from_transport("AAAA", &network),
            Err(EnvelopeError::Decode(_))
        ));
    }
}
