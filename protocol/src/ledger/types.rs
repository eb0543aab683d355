//! Typed payloads of the ledger RPC methods.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::transaction::ResourceEstimate;
use crate::value::ScValue;

/// Response payload for `getAccount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub address: Address,
    /// Sequence number of the account's last transaction.
    pub sequence: u64,
}

/// Response payload for `simulateTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// The contract's return value, if it returned one.
    #[serde(default)]
    pub result: Option<ScValue>,
    #[serde(default)]
    pub resources: ResourceEstimate,
    /// Host error reported by the simulation. Passed to the user verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub latest_ledger: u32,
}

impl SimulationResult {
    /// A successful simulation returning `value`.
    pub fn returning(value: Option<ScValue>) -> Self {
        Self {
            result: value,
            ..Self::default()
        }
    }

    /// A simulation rejected with `error`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Immediate status returned by `sendTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    /// Accepted for propagation.
    Pending,
    /// Already known to the node; finality is still worth waiting for.
    Duplicate,
    /// The node is overloaded.
    TryAgainLater,
    /// Rejected outright.
    Error,
}

impl SendStatus {
    /// Whether the transaction is on its way to the ledger.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Pending | Self::Duplicate)
    }
}

/// Response payload for `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub hash: String,
    pub status: SendStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response payload for `getTransaction`.
///
/// `NotFound` is transient: the transaction may simply not be in a ledger
/// yet. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotFound,
    Success {
        #[serde(default)]
        return_value: Option<ScValue>,
        ledger: u32,
    },
    Failed {
        reason: String,
    },
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_status_wire_names() {
        let json = serde_json::json!({ "hash": "ab", "status": "TRY_AGAIN_LATER" });
        let result: SendResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.status, SendStatus::TryAgainLater);
        assert!(!result.status.is_accepted());
        assert!(SendStatus::Duplicate.is_accepted());
    }

    #[test]
    fn transaction_status_is_tagged_by_status() {
        let not_found: TransactionStatus =
            serde_json::from_value(serde_json::json!({ "status": "NOT_FOUND" })).unwrap();
        assert_eq!(not_found, TransactionStatus::NotFound);
        assert!(!not_found.is_terminal());

        let failed: TransactionStatus = serde_json::from_value(
            serde_json::json!({ "status": "FAILED", "reason": "txBadSeq" }),
        )
        .unwrap();
        assert_eq!(
            failed,
            TransactionStatus::Failed {
                reason: "txBadSeq".into()
            }
        );

        let success = TransactionStatus::Success {
            return_value: Some(ScValue::U64(12)),
            ledger: 991,
        };
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(serde_json::from_value::<TransactionStatus>(json).unwrap(), success);
    }

    #[test]
    fn simulation_defaults_are_lenient() {
        let sim: SimulationResult = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(sim, SimulationResult::default());
        assert_eq!(SimulationResult::failed("trap").error.as_deref(), Some("trap"));
    }
}
