//! # Session
//!
//! A [`Session`] is the explicit replacement for "whoever is currently
//! connected": it owns the ledger handle, the (optional) wallet, and the
//! connected identity. Every workflow call receives the session it acts
//! for, so tests can run several sessions side by side against scripted
//! collaborators.
//!
//! ## Connect
//!
//! ```text
//! connect()
//!   ├─ no wallet            -> WalletAbsent
//!   ├─ wallet declines      -> WalletRejected(reason), still disconnected
//!   └─ access granted       -> identity stored
//!        └─ post-connect hooks run in order (failures are logged only)
//! ```
//!
//! ## Submission guard
//!
//! At most one signing submission runs per session. A second one fails with
//! [`ClientError::SubmissionInFlight`] instead of racing the first for the
//! same sequence number. The flag is held by an RAII guard and cleared on
//! every exit path, including errors and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::cache::{ListingCache, Profile};
use crate::error::ClientError;
use crate::ledger::LedgerRpc;
use crate::wallet::Wallet;

// ---------------------------------------------------------------------------
// Post-connect hooks
// ---------------------------------------------------------------------------

/// Work to run after every successful connect.
#[async_trait]
pub trait PostConnectHook: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn after_connect(&self, identity: &Address) -> Result<(), ClientError>;
}

/// Loads the connected account's profile from the listing cache.
pub struct ProfileHook {
    cache: Arc<dyn ListingCache>,
    profile: RwLock<Option<Profile>>,
}

impl ProfileHook {
    pub fn new(cache: Arc<dyn ListingCache>) -> Self {
        Self {
            cache,
            profile: RwLock::new(None),
        }
    }

    /// The profile loaded by the last connect, if any.
    pub fn profile(&self) -> Option<Profile> {
        self.profile.read().clone()
    }
}

#[async_trait]
impl PostConnectHook for ProfileHook {
    fn name(&self) -> &str {
        "load-profile"
    }

    async fn after_connect(&self, identity: &Address) -> Result<(), ClientError> {
        let profile = self.cache.get_profile(identity).await?;
        debug!(found = profile.is_some(), "profile lookup finished");
        *self.profile.write() = profile;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connected (or not yet connected) user.
pub struct Session {
    ledger: Arc<dyn LedgerRpc>,
    wallet: Option<Arc<dyn Wallet>>,
    identity: RwLock<Option<Address>>,
    hooks: Vec<Arc<dyn PostConnectHook>>,
    submitting: AtomicBool,
}

impl Session {
    /// A disconnected session. `wallet = None` models a missing wallet.
    pub fn new(ledger: Arc<dyn LedgerRpc>, wallet: Option<Arc<dyn Wallet>>) -> Self {
        Self {
            ledger,
            wallet,
            identity: RwLock::new(None),
            hooks: Vec::new(),
            submitting: AtomicBool::new(false),
        }
    }

    /// Appends a hook to run after each successful connect.
    pub fn with_hook(mut self, hook: Arc<dyn PostConnectHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn ledger(&self) -> &dyn LedgerRpc {
        self.ledger.as_ref()
    }

    /// The wallet, or `WalletAbsent`.
    pub fn wallet(&self) -> Result<&dyn Wallet, ClientError> {
        self.wallet.as_deref().ok_or(ClientError::WalletAbsent)
    }

    /// The connected identity, or `NotConnected`.
    pub fn identity(&self) -> Result<Address, ClientError> {
        self.identity.read().clone().ok_or(ClientError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.identity.read().is_some()
    }

    /// Requests wallet access and stores the granted identity.
    pub async fn connect(&self) -> Result<Address, ClientError> {
        let wallet = match self.wallet.as_deref() {
            Some(wallet) => wallet,
            None => {
                warn!("connect attempted without a wallet");
                return Err(ClientError::WalletAbsent);
            }
        };

        let identity = wallet.request_access().await.map_err(|e| {
            warn!(reason = %e, "wallet declined access");
            ClientError::WalletRejected(e.0)
        })?;

        *self.identity.write() = Some(identity.clone());
        info!(identity = %identity, "wallet connected");

        for hook in &self.hooks {
            if let Err(err) = hook.after_connect(&identity).await {
                warn!(hook = hook.name(), error = %err, "post-connect hook failed");
            }
        }

        Ok(identity)
    }

    /// Marks a signing submission as running.
    pub fn begin_submission(&self) -> Result<SubmissionGuard<'_>, ClientError> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::SubmissionInFlight)?;
        Ok(SubmissionGuard {
            flag: &self.submitting,
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}

/// Clears the session's in-flight flag when dropped.
#[must_use = "the submission is only guarded while this value is alive"]
pub struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
