//! Scripted collaborators for tests.
//!
//! [`ScriptedLedger`], [`ScriptedWallet`] and [`ScriptedCache`] stand in for
//! the ledger node, the wallet and the listing cache. They record every call
//! so tests can assert on what reached the "network", and they are public so
//! the dice-game crate's tests can use them too.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::address::{Address, Network};
use crate::cache::{CacheError, CachedToken, ListingCache, Profile, TokenQuery};
use crate::ledger::{
    AccountRecord, LedgerError, LedgerRpc, SendResult, SendStatus, SimulationResult,
    TransactionStatus,
};
use crate::transaction::{Envelope, ResourceEstimate, TransportEnvelope};
use crate::value::ScValue;
use crate::wallet::{LocalWallet, Wallet, WalletError};

// ---------------------------------------------------------------------------
// ScriptedLedger
// ---------------------------------------------------------------------------

/// One call received by a [`ScriptedLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    GetAccount(Address),
    Simulate(Envelope),
    Send(Envelope),
    GetTransaction(String),
}

type SimulateFn = Arc<dyn Fn(&[ScValue]) -> Result<Option<ScValue>, String> + Send + Sync>;

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Address, u64>,
    simulations: HashMap<String, SimulateFn>,
    simulation_failure: Option<LedgerError>,
    sends: VecDeque<Result<SendResult, LedgerError>>,
    statuses: VecDeque<Result<TransactionStatus, LedgerError>>,
    calls: Vec<LedgerCall>,
}

/// An in-memory ledger driven by per-method simulation handlers and queued
/// send/status responses.
///
/// * Unknown accounts fail with `AccountNotFound`.
/// * A simulation of a method without a handler fails.
/// * An empty send queue answers `PENDING`; an empty status queue answers
///   `NOT_FOUND`.
#[derive(Default)]
pub struct ScriptedLedger {
    state: Mutex<LedgerState>,
}

impl ScriptedLedger {
    /// Resource estimate attached to every successful simulation.
    pub const RESOURCES: ResourceEstimate = ResourceEstimate {
        min_resource_fee: 1_000,
        cpu_instructions: 250_000,
        read_bytes: 256,
        write_bytes: 64,
    };

    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account at `sequence`.
    pub fn add_account(&self, address: Address, sequence: u64) {
        self.state.lock().accounts.insert(address, sequence);
    }

    /// Answers simulations of `method` with `handler(args)`. An `Err` becomes
    /// a simulation error carrying that message.
    pub fn on_simulate<F>(&self, method: &str, handler: F)
    where
        F: Fn(&[ScValue]) -> Result<Option<ScValue>, String> + Send + Sync + 'static,
    {
        self.state
            .lock()
            .simulations
            .insert(method.to_string(), Arc::new(handler));
    }

    /// Makes every simulation fail at the transport level.
    pub fn fail_simulations(&self, error: LedgerError) {
        self.state.lock().simulation_failure = Some(error);
    }

    pub fn push_send(&self, result: Result<SendResult, LedgerError>) {
        self.state.lock().sends.push_back(result);
    }

    pub fn push_status(&self, status: Result<TransactionStatus, LedgerError>) {
        self.state.lock().statuses.push_back(status);
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Number of `getTransaction` calls so far.
    pub fn status_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, LedgerCall::GetTransaction(_)))
            .count()
    }

    /// Envelopes that were simulated, in order.
    pub fn simulated(&self) -> Vec<Envelope> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                LedgerCall::Simulate(envelope) => Some(envelope.clone()),
                _ => None,
            })
            .collect()
    }

    /// Envelopes that were submitted, in order.
    pub fn submitted(&self) -> Vec<Envelope> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                LedgerCall::Send(envelope) => Some(envelope.clone()),
                _ => None,
            })
            .collect()
    }

    fn decode(transport: &str) -> Result<Envelope, LedgerError> {
        TransportEnvelope::decode(transport)
            .map(|t| t.envelope)
            .map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LedgerRpc for ScriptedLedger {
    async fn get_account(&self, address: &Address) -> Result<AccountRecord, LedgerError> {
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::GetAccount(address.clone()));
        state
            .accounts
            .get(address)
            .map(|&sequence| AccountRecord {
                address: address.clone(),
                sequence,
            })
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))
    }

    async fn simulate(&self, transport: &str) -> Result<SimulationResult, LedgerError> {
        let envelope = Self::decode(transport)?;
        let handler = {
            let mut state = self.state.lock();
            state.calls.push(LedgerCall::Simulate(envelope.clone()));
            if let Some(err) = state.simulation_failure.clone() {
                return Err(err);
            }
            state.simulations.get(envelope.operation.method()).cloned()
        };

        let method = envelope.operation.method();
        let Some(handler) = handler else {
            return Ok(SimulationResult::failed(format!(
                "no scripted simulation for `{method}`"
            )));
        };

        Ok(match handler(envelope.operation.args()) {
            Ok(value) => SimulationResult {
                resources: Self::RESOURCES,
                ..SimulationResult::returning(value)
            },
            Err(message) => SimulationResult::failed(message),
        })
    }

    async fn send_transaction(&self, transport: &str) -> Result<SendResult, LedgerError> {
        let envelope = Self::decode(transport)?;
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Send(envelope));
        state.sends.pop_front().unwrap_or_else(|| {
            Ok(SendResult {
                hash: hex::encode(Sha256::digest(transport.as_bytes())),
                status: SendStatus::Pending,
                error: None,
            })
        })
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::GetTransaction(hash.to_string()));
        state
            .statuses
            .pop_front()
            .unwrap_or(Ok(TransactionStatus::NotFound))
    }
}

// ---------------------------------------------------------------------------
// ScriptedWallet
// ---------------------------------------------------------------------------

/// A [`LocalWallet`] that can be told to refuse access or signatures.
pub struct ScriptedWallet {
    inner: LocalWallet,
    access_refusal: Option<String>,
    signing_refusal: Option<String>,
    sign_calls: AtomicUsize,
}

impl ScriptedWallet {
    pub fn new(network: Network) -> Self {
        Self {
            inner: LocalWallet::generate(network),
            access_refusal: None,
            signing_refusal: None,
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting_access(mut self, reason: impl Into<String>) -> Self {
        self.access_refusal = Some(reason.into());
        self
    }

    pub fn rejecting_signatures(mut self, reason: impl Into<String>) -> Self {
        self.signing_refusal = Some(reason.into());
        self
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Number of signing requests received, refused ones included.
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Wallet for ScriptedWallet {
    async fn request_access(&self) -> Result<Address, WalletError> {
        match &self.access_refusal {
            Some(reason) => Err(WalletError::new(reason.clone())),
            None => self.inner.request_access().await,
        }
    }

    async fn sign_transaction(
        &self,
        transport: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        match &self.signing_refusal {
            Some(reason) => Err(WalletError::new(reason.clone())),
            None => {
                self.inner
                    .sign_transaction(transport, network_passphrase)
                    .await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedCache
// ---------------------------------------------------------------------------

struct CacheState {
    tokens: Result<Vec<CachedToken>, CacheError>,
    profiles: HashMap<Address, Profile>,
    queries: Vec<TokenQuery>,
}

/// An in-memory listing cache.
pub struct ScriptedCache {
    state: Mutex<CacheState>,
}

impl Default for ScriptedCache {
    fn default() -> Self {
        Self {
            state: Mutex::new(CacheState {
                tokens: Ok(Vec::new()),
                profiles: HashMap::new(),
                queries: Vec::new(),
            }),
        }
    }
}

impl ScriptedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every token listing with `tokens`, ignoring filters.
    pub fn set_tokens(&self, tokens: Vec<CachedToken>) {
        self.state.lock().tokens = Ok(tokens);
    }

    /// Makes token listings fail with `error`.
    pub fn fail_with(&self, error: CacheError) {
        self.state.lock().tokens = Err(error);
    }

    pub fn insert_profile(&self, address: Address, profile: Profile) {
        self.state.lock().profiles.insert(address, profile);
    }

    pub fn profile(&self, address: &Address) -> Option<Profile> {
        self.state.lock().profiles.get(address).cloned()
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<TokenQuery> {
        self.state.lock().queries.clone()
    }
}

#[async_trait]
impl ListingCache for ScriptedCache {
    async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<CachedToken>, CacheError> {
        let mut state = self.state.lock();
        state.queries.push(query.clone());
        state.tokens.clone()
    }

    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, CacheError> {
        Ok(self.state.lock().profiles.get(address).cloned())
    }

    async fn put_profile(
        &self,
        address: &Address,
        profile: &Profile,
    ) -> Result<Profile, CacheError> {
        self.state
            .lock()
            .profiles
            .insert(address.clone(), profile.clone());
        Ok(profile.clone())
    }
}
