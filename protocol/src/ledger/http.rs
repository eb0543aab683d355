//! HTTP JSON-RPC client for the ledger node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use super::rpc::{RpcMethod, RpcRequest, RpcResponse};
use super::types::{AccountRecord, SendResult, SimulationResult, TransactionStatus};
use super::{LedgerError, LedgerRpc};
use crate::address::Address;

/// Per-request timeout. Polling supplies its own cadence on top of this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// [`LedgerRpc`] over HTTP POST.
pub struct HttpLedger {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpLedger {
    /// Creates a client for the node at `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    /// Reuses an existing reqwest client.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: serde_json::Value,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        trace!(id, ?method, "ledger request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        let body: RpcResponse = response.json().await.map_err(|e| {
            LedgerError::Decode(format!("HTTP {}: {}", status.as_u16(), e))
        })?;

        if let Some(error) = body.error {
            debug!(id, code = error.code, message = %error.message, "ledger returned error");
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = body
            .result
            .ok_or_else(|| LedgerError::Decode("response has neither result nor error".into()))?;
        serde_json::from_value(result).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LedgerRpc for HttpLedger {
    async fn get_account(&self, address: &Address) -> Result<AccountRecord, LedgerError> {
        let params = json!({ "address": address.to_string() });
        match self.call(RpcMethod::GetAccount, params).await {
            Err(LedgerError::Rpc { code: -32002, .. }) => {
                Err(LedgerError::AccountNotFound(address.to_string()))
            }
            other => other,
        }
    }

    async fn simulate(&self, transport: &str) -> Result<SimulationResult, LedgerError> {
        self.call(
            RpcMethod::SimulateTransaction,
            json!({ "transaction": transport }),
        )
        .await
    }

    async fn send_transaction(&self, transport: &str) -> Result<SendResult, LedgerError> {
        self.call(RpcMethod::SendTransaction, json!({ "transaction": transport }))
            .await
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        self.call(RpcMethod::GetTransaction, json!({ "hash": hash }))
            .await
    }
}
