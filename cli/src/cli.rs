//! # CLI Interface
//!
//! Command-line structure for `hourglass`, defined with `clap` derive.
//! Global options select the network, contracts and backends; each
//! subcommand runs exactly one marketplace or game operation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use hourglass_protocol::address::Address;
use hourglass_protocol::cache::TokenSort;
use hourglass_protocol::config::{GameBackendKind, DEFAULT_RPC_URL, TESTNET_PASSPHRASE};

use crate::logging::LogFormat;

/// Hourglass time-token marketplace client.
///
/// Mint tokens for hours of your time, buy hours from others, and trade the
/// resulting receipts on the secondary market. Also plays the dice game demo.
#[derive(Parser, Debug)]
#[command(
    name = "hourglass",
    about = "Hourglass time-token marketplace client",
    version,
    propagate_version = true
)]
pub struct HourglassCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// JSON-RPC endpoint of the ledger node.
    #[arg(long, global = true, env = "HOURGLASS_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Base URL of the listing-cache service. Search and profiles use it.
    #[arg(long, global = true, env = "HOURGLASS_CACHE_URL")]
    pub cache_url: Option<String>,

    /// Marketplace contract id.
    #[arg(long, global = true, env = "HOURGLASS_CONTRACT_ID")]
    pub contract: Option<Address>,

    /// Passphrase of the network to sign for.
    #[arg(long, global = true, env = "HOURGLASS_NETWORK_PASSPHRASE", default_value = TESTNET_PASSPHRASE)]
    pub network: String,

    /// Hex-encoded Ed25519 secret key of the signing account.
    ///
    /// Prefer the environment variable over the flag; flags end up in shell
    /// history.
    #[arg(long, global = true, env = "HOURGLASS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Dice game backend: live or simulated.
    #[arg(long, global = true, env = "HOURGLASS_GAME_BACKEND", default_value = "simulated")]
    pub game_backend: GameBackendKind,

    /// Dice game contract id, required by the live backend.
    #[arg(long, global = true, env = "HOURGLASS_GAME_CONTRACT_ID")]
    pub game_contract: Option<Address>,

    /// JSON file holding simulated games.
    #[arg(long, global = true, env = "HOURGLASS_GAME_STORE", default_value = "hourglass-games.json")]
    pub game_store: PathBuf,

    /// Log output format.
    #[arg(long, global = true, env = "HOURGLASS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Market(MarketCommand),
    /// Play the dice game.
    #[command(subcommand)]
    Game(GameCommand),
    /// Print version information and exit.
    Version,
}

/// Marketplace operations.
#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Connect the wallet and print the account (and profile, if cached).
    Connect,
    /// Mint a time token.
    Mint(MintArgs),
    /// Buy hours from a token.
    Purchase {
        token_id: u64,
        hours: u32,
    },
    /// Delete one of your tokens.
    Delete {
        token_id: u64,
    },
    /// Change the hours still available on one of your tokens.
    UpdateHours {
        token_id: u64,
        hours: u32,
    },
    /// List the tokens you minted.
    MyTokens,
    /// List every token on the ledger.
    Tokens,
    /// Search tokens through the listing cache, falling back to the ledger.
    Search(SearchArgs),
    /// List your receipts.
    Receipts,
    /// Offer a receipt on the secondary market.
    ListReceipt {
        receipt_id: u64,
        /// Price in major units, e.g. `12.5`.
        price: String,
    },
    /// Buy a receipt from the secondary market.
    BuySecondary {
        receipt_id: u64,
    },
    /// List active secondary-market offers.
    Secondary,
    /// Redeem one of your receipts.
    Redeem {
        receipt_id: u64,
    },
    /// Wait for a submitted transaction to reach a final status.
    Status {
        /// Hex transaction hash.
        hash: String,
    },
    /// Show or edit profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

/// Arguments for `mint`.
#[derive(Args, Debug)]
pub struct MintArgs {
    /// Hourly rate in major units, e.g. `2.5`.
    pub rate: String,
    /// Hours offered.
    pub hours: String,
    /// What the buyer gets.
    pub description: String,
}

/// Arguments for `search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text search over titles and descriptions.
    pub text: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// newest, oldest, price_asc or price_desc.
    #[arg(long)]
    pub sort: Option<TokenSort>,

    /// Minimum hourly rate in major units.
    #[arg(long)]
    pub min_price: Option<String>,

    /// Maximum hourly rate in major units.
    #[arg(long)]
    pub max_price: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show a profile. Defaults to the connected account.
    Show {
        address: Option<Address>,
    },
    /// Save the connected account's profile.
    Set(ProfileArgs),
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long, default_value = "")]
    pub display_name: String,
    #[arg(long, default_value = "")]
    pub bio: String,
    #[arg(long, default_value = "")]
    pub avatar_url: String,
    #[arg(long, default_value = "")]
    pub twitter: String,
    #[arg(long, default_value = "")]
    pub github: String,
}

#[derive(Subcommand, Debug)]
pub enum GameCommand {
    /// Open a game with a stake in major units.
    Create {
        stake: String,
    },
    /// Join someone else's pending game.
    Join {
        game_id: u64,
    },
    /// Roll the dice and settle a game.
    Play {
        game_id: u64,
    },
    /// Show one game.
    Show {
        game_id: u64,
    },
    /// List your games.
    List,
}
