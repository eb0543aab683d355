//! # Transaction Workflow
//!
//! Every contract interaction goes through [`Workflow`]. Read-only calls
//! stop after simulation; signing calls continue through the wallet, the
//! ledger and the finality poller:
//!
//! ```text
//!  simulate(session, call)                submit(session, call)
//!  ───────────────────────                ─────────────────────
//!  schema check                           identity (NotConnected)
//!  placeholder or own account             schema check (SchemaMismatch)
//!  build envelope                         in-flight guard
//!  simulateTransaction ──> return value   getAccount (AccountUnresolvable)
//!                                         build envelope, simulateTransaction
//!                                         assemble (fee + resource fee)
//!                                         wallet.sign(transport, passphrase)
//!                                         decode + verify + same envelope
//!                                         sendTransaction (PENDING/DUPLICATE)
//!                                         FinalityPoller::wait
//! ```
//!
//! Nothing is retried except the poller's own status checks, and an
//! envelope is submitted at most once.

pub mod finality;

pub use finality::{Confirmation, FinalityPoller};

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::address::{Address, Network};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::ledger::{LedgerRpc, SendStatus};
use crate::schema::ContractSchema;
use crate::session::Session;
use crate::transaction::{
    Envelope, EnvelopeBuilder, OperationRequest, PreparedEnvelope, SignedEnvelope,
    TransportEnvelope,
};
use crate::value::ScValue;

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// A contract method call before it is wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    method: String,
    args: Vec<ScValue>,
    fee: Option<u32>,
}

impl Invocation {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
            fee: None,
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ScValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Overrides the configured base fee for this call.
    pub fn fee(mut self, fee: u32) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[ScValue] {
        &self.args
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Builds, simulates, signs, submits and confirms calls to one contract.
#[derive(Debug, Clone)]
pub struct Workflow {
    contract: Address,
    schema: ContractSchema,
    network: Network,
    base_fee: u32,
    deadline: Duration,
    poller: FinalityPoller,
    cancel: Option<watch::Receiver<bool>>,
}

impl Workflow {
    /// A workflow for `contract`, checked against `schema`, with network,
    /// fee and deadline taken from `config`.
    pub fn new(contract: Address, schema: ContractSchema, config: &ClientConfig) -> Self {
        Self {
            contract,
            schema,
            network: config.network.clone(),
            base_fee: config.base_fee,
            deadline: config.deadline,
            poller: FinalityPoller::from_config(config),
            cancel: None,
        }
    }

    /// Lets the owner of `cancel`'s sender abort finality waits.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Replaces the poller. Tests use this to shorten the cadence.
    pub fn with_poller(mut self, poller: FinalityPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn poller(&self) -> FinalityPoller {
        self.poller
    }

    fn envelope(
        &self,
        source: Address,
        sequence: u64,
        invocation: Invocation,
    ) -> Result<Envelope, ClientError> {
        let fee = invocation.fee.unwrap_or(self.base_fee);
        let operation = OperationRequest::new(
            self.contract.clone(),
            invocation.method,
            invocation.args,
        );
        Ok(EnvelopeBuilder::new(source, sequence)
            .fee(fee)
            .timeout(self.deadline)
            .operation(operation)
            .build()?)
    }

    async fn prepare(
        &self,
        ledger: &dyn LedgerRpc,
        envelope: Envelope,
    ) -> Result<(PreparedEnvelope, Option<ScValue>), ClientError> {
        let method = envelope.operation.method().to_string();
        let transport = TransportEnvelope {
            envelope,
            signatures: Vec::new(),
        };
        let text = transport.encode()?;

        let simulation = ledger
            .simulate(&text)
            .await
            .map_err(|e| ClientError::RemoteSimulation(e.to_string()))?;

        if let Some(error) = simulation.error {
            warn!(%method, %error, "simulation rejected the call");
            return Err(ClientError::RemoteSimulation(error));
        }

        debug!(
            %method,
            resource_fee = simulation.resources.min_resource_fee,
            "simulation finished"
        );
        Ok((
            transport.envelope.assemble(simulation.resources),
            simulation.result,
        ))
    }

    /// Runs a read-only call and returns the contract's return value.
    ///
    /// Uses the connected account as the source when there is one, and a
    /// random placeholder otherwise; simulations never touch the source.
    #[instrument(skip_all, fields(method = invocation.method()))]
    pub async fn simulate(
        &self,
        session: &Session,
        invocation: Invocation,
    ) -> Result<Option<ScValue>, ClientError> {
        self.schema.check(invocation.method(), invocation.args())?;

        let source = session
            .identity()
            .unwrap_or_else(|_| Address::placeholder_account());
        let envelope = self.envelope(source, 0, invocation)?;
        let (_, value) = self.prepare(session.ledger(), envelope).await?;
        Ok(value.filter(|v| *v != ScValue::Void))
    }

    /// Runs a signing call to finality.
    #[instrument(skip_all, fields(method = invocation.method()))]
    pub async fn submit(
        &self,
        session: &Session,
        invocation: Invocation,
    ) -> Result<Confirmation, ClientError> {
        let identity = session.identity()?;
        self.schema.check(invocation.method(), invocation.args())?;
        let _guard = session.begin_submission()?;
        let ledger = session.ledger();

        let account = ledger.get_account(&identity).await.map_err(|e| {
            ClientError::AccountUnresolvable {
                address: identity.to_string(),
                reason: e.to_string(),
            }
        })?;
        debug!(sequence = account.sequence, "account resolved");

        let envelope = self.envelope(identity, account.sequence, invocation)?;
        let (prepared, _) = self.prepare(ledger, envelope).await?;

        let wallet = session.wallet()?;
        let unsigned = prepared.to_transport()?;
        let signed_text = wallet
            .sign_transaction(&unsigned, self.network.passphrase())
            .await
            .map_err(|e| ClientError::Signing(e.0))?;

        let signed = SignedEnvelope::from_transport(&signed_text, &self.network)
            .map_err(|e| ClientError::Signing(e.to_string()))?;
        if signed.envelope() != prepared.envelope() {
            return Err(ClientError::Signing(
                "wallet returned a different envelope than it was asked to sign".into(),
            ));
        }

        let local_hash = signed.hash()?;
        let sent = ledger.send_transaction(&signed.to_transport()?).await?;
        // Finality is looked up by the reference the ledger issued.
        let hash = if sent.hash.is_empty() {
            local_hash.clone()
        } else {
            sent.hash.clone()
        };
        if hash != local_hash {
            debug!(%hash, %local_hash, "ledger issued its own transaction reference");
        }
        info!(%hash, status = ?sent.status, "transaction submitted");

        if !sent.status.is_accepted() {
            let reason = sent
                .error
                .unwrap_or_else(|| format!("ledger answered {:?}", sent.status));
            return Err(ClientError::SubmissionFailed(reason));
        }
        if sent.status == SendStatus::Duplicate {
            debug!(%hash, "ledger already knew this transaction");
        }

        self.poller.wait(ledger, &hash, self.cancel.clone()).await
    }

    /// Waits for an already-submitted transaction.
    pub async fn status(&self, session: &Session, hash: &str) -> Result<Confirmation, ClientError> {
        self.poller
            .wait(session.ledger(), hash, self.cancel.clone())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TESTNET_PASSPHRASE;
    use crate::ledger::{LedgerError, SendResult, TransactionStatus};
    use crate::testing::{LedgerCall, ScriptedLedger, ScriptedWallet};
    use std::sync::Arc;

    fn config() -> ClientConfig {
        ClientConfig::testnet(Address::Contract([9u8; 32]))
    }

    fn workflow() -> Workflow {
        Workflow::new(
            config().contract.clone(),
            ContractSchema::marketplace(),
            &config(),
        )
    }

    async fn connected(ledger: Arc<ScriptedLedger>) -> (Session, Arc<ScriptedWallet>) {
        let wallet = Arc::new(ScriptedWallet::new(Network::new(TESTNET_PASSPHRASE)));
        ledger.add_account(wallet.address(), 41);
        let session = Session::new(ledger, Some(wallet.clone()));
        session.connect().await.unwrap();
        (session, wallet)
    }

    fn redeem(owner: &Address) -> Invocation {
        Invocation::new("redeem_receipt").arg(3u64).arg(owner)
    }

    #[tokio::test]
    async fn submit_before_connect_makes_no_remote_calls() {
        let ledger = Arc::new(ScriptedLedger::new());
        let session = Session::new(ledger.clone(), None);

        let err = workflow()
            .submit(&session, redeem(&Address::Account([1u8; 32])))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NotConnected));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn schema_mismatch_is_local() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (session, _) = connected(ledger.clone()).await;

        let err = workflow()
            .submit(&session, Invocation::new("redeem_receipt").arg(3u32))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::SchemaMismatch { .. }));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_runs_every_step_in_order() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("redeem_receipt", |_| Ok(None));
        ledger.push_status(Ok(TransactionStatus::NotFound));
        ledger.push_status(Ok(TransactionStatus::Success {
            return_value: None,
            ledger: 55,
        }));
        let (session, wallet) = connected(ledger.clone()).await;

        let confirmation = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap();

        assert_eq!(confirmation.ledger, 55);
        assert_eq!(confirmation.attempts, 2);

        let calls = ledger.calls();
        assert!(matches!(calls[0], LedgerCall::GetAccount(_)));
        assert!(matches!(calls[1], LedgerCall::Simulate(_)));
        match &calls[2] {
            LedgerCall::Send(envelope) => {
                assert_eq!(envelope.sequence, 42);
                assert_eq!(envelope.operation.method(), "redeem_receipt");
                assert!(envelope.resources.is_some());
            }
            other => panic!("unexpected call: {other:?}"),
        }
        assert_eq!(ledger.status_calls(), 2);
        assert_eq!(wallet.sign_calls(), 1);
        assert!(!session.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn finality_is_polled_with_the_ledger_issued_hash() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("redeem_receipt", |_| Ok(None));
        ledger.push_send(Ok(SendResult {
            hash: "ledger-issued-hash".into(),
            status: SendStatus::Pending,
            error: None,
        }));
        ledger.push_status(Ok(TransactionStatus::Success {
            return_value: None,
            ledger: 9,
        }));
        let (session, wallet) = connected(ledger.clone()).await;

        let confirmation = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap();

        assert_eq!(confirmation.hash, "ledger-issued-hash");
        let polled: Vec<String> = ledger
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::GetTransaction(hash) => Some(hash),
                _ => None,
            })
            .collect();
        assert_eq!(polled, vec!["ledger-issued-hash".to_string()]);
    }

    #[tokio::test]
    async fn simulation_errors_are_verbatim_and_stop_before_signing() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("redeem_receipt", |_| {
            Err("HostError: Error(Contract, #4)".to_string())
        });
        let (session, wallet) = connected(ledger.clone()).await;

        let err = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap_err();

        match err {
            ClientError::RemoteSimulation(msg) => assert_eq!(msg, "HostError: Error(Contract, #4)"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(wallet.sign_calls(), 0);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn wallet_rejection_aborts_without_submitting() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("redeem_receipt", |_| Ok(None));
        let wallet = Arc::new(
            ScriptedWallet::new(Network::new(TESTNET_PASSPHRASE))
                .rejecting_signatures("User declined"),
        );
        ledger.add_account(wallet.address(), 1);
        let session = Session::new(ledger.clone(), Some(wallet.clone()));
        session.connect().await.unwrap();

        let err = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Signing(ref m) if m == "User declined"));
        assert!(!ledger
            .calls()
            .iter()
            .any(|c| matches!(c, LedgerCall::Send(_))));
    }

    #[tokio::test]
    async fn wallet_on_another_network_cannot_sign() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("redeem_receipt", |_| Ok(None));
        let wallet = Arc::new(ScriptedWallet::new(Network::new("Private Network")));
        ledger.add_account(wallet.address(), 1);
        let session = Session::new(ledger.clone(), Some(wallet.clone()));
        session.connect().await.unwrap();

        let err = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Signing(_)));
    }

    #[tokio::test]
    async fn unknown_account_is_unresolvable() {
        let ledger = Arc::new(ScriptedLedger::new());
        let wallet = Arc::new(ScriptedWallet::new(Network::new(TESTNET_PASSPHRASE)));
        let session = Session::new(ledger.clone(), Some(wallet.clone()));
        session.connect().await.unwrap();

        let err = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AccountUnresolvable { .. }));
    }

    #[tokio::test]
    async fn immediate_error_status_fails_the_submission() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("redeem_receipt", |_| Ok(None));
        ledger.push_send(Ok(SendResult {
            hash: "ff".into(),
            status: SendStatus::Error,
            error: Some("txBadSeq".into()),
        }));
        let (session, wallet) = connected(ledger.clone()).await;

        let err = workflow()
            .submit(&session, redeem(&wallet.address()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::SubmissionFailed(ref m) if m == "txBadSeq"));
        assert_eq!(ledger.status_calls(), 0);
    }

    #[tokio::test]
    async fn simulate_works_without_a_connection() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("get_token_count", |_| Ok(Some(ScValue::U64(12))));
        let session = Session::new(ledger.clone(), None);

        let value = workflow()
            .simulate(&session, Invocation::new("get_token_count"))
            .await
            .unwrap();
        assert_eq!(value, Some(ScValue::U64(12)));
        assert!(matches!(ledger.calls()[0], LedgerCall::Simulate(_)));
    }

    #[tokio::test]
    async fn simulate_treats_void_as_absent() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("get_listing", |_| Ok(Some(ScValue::Void)));
        let session = Session::new(ledger, None);

        let value = workflow()
            .simulate(&session, Invocation::new("get_listing").arg(1u64))
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn transport_failures_during_simulation_are_remote_errors() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.fail_simulations(LedgerError::Transport("connection refused".into()));
        let session = Session::new(ledger, None);

        let err = workflow()
            .simulate(&session, Invocation::new("get_token_count"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RemoteSimulation(ref m) if m.contains("connection refused")));
    }

    #[test]
    fn invocation_collects_typed_args() {
        let call = Invocation::new("purchase_token")
            .arg(5u64)
            .arg(Address::Account([2u8; 32]))
            .arg(3u32)
            .fee(500);
        assert_eq!(call.args().len(), 3);
        assert_eq!(call.args()[2], ScValue::U32(3));
        assert_eq!(call.fee, Some(500));
    }
}
