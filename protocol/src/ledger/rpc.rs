//! # JSON-RPC API Definitions
//!
//! Request/response types for the ledger node's JSON-RPC 2.0 API. The
//! client in [`super::http`] and the mock servers in the integration tests
//! both speak these types.
//!
//! ## Method Index
//!
//! | Method                | Params                       | Result                |
//! |-----------------------|------------------------------|-----------------------|
//! | `getAccount`          | `{ address }`                | [`AccountRecord`]     |
//! | `simulateTransaction` | `{ transaction }` (base64)   | [`SimulationResult`]  |
//! | `sendTransaction`     | `{ transaction }` (base64)   | [`SendResult`]        |
//! | `getTransaction`      | `{ hash }`                   | [`TransactionStatus`] |
//!
//! [`AccountRecord`]: super::AccountRecord
//! [`SimulationResult`]: super::SimulationResult
//! [`SendResult`]: super::SendResult
//! [`TransactionStatus`]: super::TransactionStatus

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Supported JSON-RPC methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Load an account and its sequence number.
    #[serde(rename = "getAccount")]
    GetAccount,
    /// Simulate an envelope and estimate its resources.
    #[serde(rename = "simulateTransaction")]
    SimulateTransaction,
    /// Submit a signed envelope.
    #[serde(rename = "sendTransaction")]
    SendTransaction,
    /// Fetch a transaction's status by hash.
    #[serde(rename = "getTransaction")]
    GetTransaction,
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version. Always "2.0".
    pub jsonrpc: String,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
    pub method: RpcMethod,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: RpcMethod, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: serde_json::Value::from(id),
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// Exactly one of `result` or `error` is set by a conforming node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Creates a successful response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object.
///
/// Standard codes: `-32700` parse error, `-32600` invalid request, `-32601`
/// method not found, `-32602` invalid params, `-32603` internal error.
/// `-32000` to `-32099` are node-specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Invalid method parameters.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::with_code(-32602, msg)
    }

    /// Internal node error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::with_code(-32603, msg)
    }

    /// The account does not exist.
    pub fn account_not_found(address: &str) -> Self {
        Self::with_code(-32002, format!("account not found: {}", address))
    }

    /// Whether this error means the requested account does not exist.
    pub fn is_account_not_found(&self) -> bool {
        self.code == -32002
    }
}
