//! # Client Configuration & Constants
//!
//! Every magic number the marketplace client relies on lives here. The
//! values mirror what the deployed contract and the public RPC node expect;
//! changing them without changing the contract is a good way to get opaque
//! remote failures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::{Address, Network};

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Minor units per major unit of the native asset. One unit is ten million
/// indivisible minor units; every price on the wire is an integer in minor
/// units.
pub const MINOR_UNITS_PER_UNIT: i128 = 10_000_000;

/// Number of fractional digits implied by [`MINOR_UNITS_PER_UNIT`].
pub const AMOUNT_DECIMALS: u32 = 7;

/// Share of a secondary-market sale routed to the original seller, in percent.
pub const ROYALTY_PERCENT: i128 = 5;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Inclusion fee for ordinary contract calls, in minor units.
pub const BASE_FEE: u32 = 100;

/// Inclusion fee for `buy_from_secondary`, which moves funds three ways and
/// needs more headroom than the base fee.
pub const SECONDARY_PURCHASE_FEE: u32 = 200_000;

/// Inclusion fee for dice game calls.
pub const GAME_FEE: u32 = 100_000;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Single deadline for a submission. It bounds both the envelope's expiry
/// window and the finality poll ceiling.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Cadence of transaction status polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on sequential game ids scanned when listing live games.
pub const MAX_GAME_SCAN: u64 = 256;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Public test network RPC node.
pub const DEFAULT_RPC_URL: &str = "https://rpc-testnet.hourglass.market";

/// Default listing-cache service.
pub const DEFAULT_CACHE_URL: &str = "http://localhost:3001/api";

/// Passphrase of the public test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Passphrase of the public main network.
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Error text the RPC node produces when a transaction result is still
/// being written. Polling treats it as "not yet visible".
pub const STILL_PROCESSING_SIGNATURE: &str = "Bad union switch";

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Which dice game backend a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameBackendKind {
    /// The deployed dice contract, through the transaction workflow.
    Live,
    /// A local keyed store standing in for the contract.
    Simulated,
}

impl std::str::FromStr for GameBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "simulated" | "sim" => Ok(Self::Simulated),
            other => Err(format!("unknown game backend: {other}")),
        }
    }
}

/// Everything a client needs to reach the network and the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the ledger node.
    pub rpc_url: String,
    /// Optional listing-cache service. `None` disables the cache entirely.
    pub cache_url: Option<String>,
    /// Network the wallet must sign for.
    pub network: Network,
    /// The marketplace contract every operation targets.
    pub contract: Address,
    /// Contract of the native asset. Derived from the network when absent.
    pub native_asset: Option<Address>,
    /// Inclusion fee for ordinary calls.
    pub base_fee: u32,
    /// Envelope expiry and finality ceiling.
    pub deadline: Duration,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Dice backend selection.
    pub game_backend: GameBackendKind,
}

impl ClientConfig {
    /// Test network defaults for the given marketplace contract.
    pub fn testnet(contract: Address) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            cache_url: None,
            network: Network::new(TESTNET_PASSPHRASE),
            contract,
            native_asset: None,
            base_fee: BASE_FEE,
            deadline: DEFAULT_DEADLINE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            game_backend: GameBackendKind::Simulated,
        }
    }

    /// Contract address of the native asset on the configured network.
    pub fn native_asset(&self) -> Address {
        self.native_asset
            .clone()
            .unwrap_or_else(|| self.network.native_asset_contract())
    }

    /// Number of status polls that fit in the deadline. Never zero.
    pub fn max_poll_attempts(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let attempts = self.deadline.as_millis() / interval;
        attempts.clamp(1, u32::MAX as u128) as u32
    }
}
