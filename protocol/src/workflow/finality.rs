//! # Finality Polling
//!
//! After the ledger accepts a transaction it takes a few seconds to land in
//! a closed ledger. [`FinalityPoller`] waits for it with a bounded loop:
//!
//! ```text
//! repeat up to max_attempts:
//!     sleep(interval)                     (wakes early on cancel)
//!     getTransaction(hash)
//!       NOT_FOUND                 -> keep waiting
//!       "Bad union switch" error  -> keep waiting (result still being written)
//!       SUCCESS                   -> Confirmation
//!       FAILED                    -> SubmissionFailed(reason)
//!       any other error           -> propagated
//! after the ceiling               -> PollTimeout { attempts }
//! ```
//!
//! The loop suspends only its own task between attempts.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_DEADLINE, DEFAULT_POLL_INTERVAL};
use crate::error::ClientError;
use crate::ledger::{LedgerRpc, TransactionStatus};
use crate::value::ScValue;

/// Outcome of a transaction that reached the ledger successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Hex transaction hash.
    pub hash: String,
    /// Ledger the transaction was included in.
    pub ledger: u32,
    /// The contract call's return value, if any.
    pub return_value: Option<ScValue>,
    /// Number of status fetches it took.
    pub attempts: u32,
}

/// Bounded, cancellable status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalityPoller {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for FinalityPoller {
    fn default() -> Self {
        let attempts = DEFAULT_DEADLINE.as_millis() / DEFAULT_POLL_INTERVAL.as_millis();
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: attempts as u32,
        }
    }
}

impl FinalityPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Cadence and ceiling derived from the configured deadline.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.poll_interval, config.max_poll_attempts())
    }

    /// Polls until `hash` is final, the ceiling is hit, or `cancel` turns
    /// `true`.
    pub async fn wait(
        &self,
        ledger: &dyn LedgerRpc,
        hash: &str,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Confirmation, ClientError> {
        for attempt in 1..=self.max_attempts {
            self.pause(cancel.as_mut(), hash).await?;

            match ledger.get_transaction(hash).await {
                Ok(TransactionStatus::Success {
                    return_value,
                    ledger,
                }) => {
                    info!(hash, attempt, ledger, "transaction confirmed");
                    return Ok(Confirmation {
                        hash: hash.to_string(),
                        ledger,
                        return_value,
                        attempts: attempt,
                    });
                }
                Ok(TransactionStatus::Failed { reason }) => {
                    warn!(hash, attempt, %reason, "transaction failed on ledger");
                    return Err(ClientError::SubmissionFailed(reason));
                }
                Ok(TransactionStatus::NotFound) => {
                    debug!(hash, attempt, "transaction not visible yet");
                }
                Err(err) if err.is_still_processing() => {
                    debug!(hash, attempt, error = %err, "transaction result still being written");
                }
                Err(err) => {
                    warn!(hash, attempt, error = %err, "status check failed");
                    return Err(err.into());
                }
            }
        }

        warn!(hash, attempts = self.max_attempts, "gave up waiting for finality");
        Err(ClientError::PollTimeout {
            hash: hash.to_string(),
            attempts: self.max_attempts,
        })
    }

    async fn pause(
        &self,
        cancel: Option<&mut watch::Receiver<bool>>,
        hash: &str,
    ) -> Result<(), ClientError> {
        let cancelled = || ClientError::Cancelled(hash.to_string());

        let Some(rx) = cancel else {
            tokio::time::sleep(self.interval).await;
            return Ok(());
        };

        if *rx.borrow() {
            return Err(cancelled());
        }

        let sleep = tokio::time::sleep(self.interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return Ok(()),
                changed = rx.changed() => match changed {
                    Ok(()) if *rx.borrow_and_update() => return Err(cancelled()),
                    Ok(()) => continue,
                    Err(_) => {
                        // Sender gone: nobody can cancel any more.
                        (&mut sleep).await;
                        return Ok(());
                    }
                },
            }
        }
    }
}
