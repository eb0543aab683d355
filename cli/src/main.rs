// Copyright (c) 2026 Hourglass Contributors. MIT License.
// See LICENSE for details.

//! # Hourglass CLI
//!
//! Entry point for the `hourglass` binary. Each invocation parses options,
//! initializes logging, builds one session (connecting the wallet when a
//! secret key is configured), runs a single operation and prints its
//! rendered result to stdout.
//!
//! Errors are printed to stderr and the process exits non-zero. Ctrl+C
//! during a finality wait cancels the wait instead of killing the process
//! mid-request.

mod cli;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;

use hourglass_contracts::render::{render_game, render_games};
use hourglass_contracts::{GameBackend, GameError};
use hourglass_protocol::address::{Address, Network};
use hourglass_protocol::amount::parse_major;
use hourglass_protocol::cache::{HttpListingCache, ListingCache, Profile, SocialLinks, TokenQuery};
use hourglass_protocol::config::ClientConfig;
use hourglass_protocol::ledger::HttpLedger;
use hourglass_protocol::market::Marketplace;
use hourglass_protocol::render;
use hourglass_protocol::session::{ProfileHook, Session};
use hourglass_protocol::wallet::{LocalWallet, Wallet};

use cli::{Commands, GameCommand, GlobalArgs, HourglassCli, MarketCommand, ProfileCommand, SearchArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = HourglassCli::parse();
    logging::init_logging(&cli.global.log_level, cli.global.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: HourglassCli) -> Result<()> {
    let HourglassCli { global, command } = cli;
    match command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Game(command) => run_game(&global, command).await,
        Commands::Market(command) => run_market(&global, command).await,
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Everything one command needs.
struct Client {
    session: Session,
    profile: Option<Arc<ProfileHook>>,
}

fn client_config(global: &GlobalArgs, contract: Address) -> ClientConfig {
    ClientConfig {
        rpc_url: global.rpc_url.clone(),
        cache_url: global.cache_url.clone(),
        network: Network::new(global.network.clone()),
        game_backend: global.game_backend,
        ..ClientConfig::testnet(contract)
    }
}

fn cache(config: &ClientConfig) -> Result<Option<Arc<dyn ListingCache>>> {
    let Some(url) = &config.cache_url else {
        return Ok(None);
    };
    let cache = HttpListingCache::new(url.clone())
        .with_context(|| format!("invalid listing cache URL {url}"))?;
    Ok(Some(Arc::new(cache)))
}

/// Builds the session and connects it when a secret key is configured.
async fn open_session(
    global: &GlobalArgs,
    config: &ClientConfig,
    cache: Option<Arc<dyn ListingCache>>,
) -> Result<Client> {
    let ledger = HttpLedger::new(config.rpc_url.clone())
        .with_context(|| format!("invalid RPC URL {}", config.rpc_url))?;

    let wallet: Option<Arc<dyn Wallet>> = match &global.secret_key {
        Some(secret) => Some(Arc::new(
            LocalWallet::from_secret_hex(secret, config.network.clone())
                .map_err(|e| anyhow!("{e}"))?,
        )),
        None => None,
    };
    let connect = wallet.is_some();

    let mut session = Session::new(Arc::new(ledger), wallet);
    let profile = cache.map(|cache| Arc::new(ProfileHook::new(cache)));
    if let Some(hook) = &profile {
        session = session.with_hook(hook.clone());
    }

    if connect {
        session.connect().await?;
    } else {
        tracing::debug!("no secret key configured, running read-only");
    }
    Ok(Client { session, profile })
}

/// A cancel flag raised by Ctrl+C.
fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            let _ = tx.send(true);
        }
    });
    rx
}

fn parse_price(label: &str, text: Option<&str>) -> Result<Option<i128>> {
    text.map(|t| parse_major(t).with_context(|| format!("invalid {label}")))
        .transpose()
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

async fn run_market(global: &GlobalArgs, command: MarketCommand) -> Result<()> {
    let contract = global
        .contract
        .clone()
        .context("no marketplace contract configured (use --contract or HOURGLASS_CONTRACT_ID)")?;
    let config = client_config(global, contract);
    let cache = cache(&config)?;
    let Client { session, profile } = open_session(global, &config, cache.clone()).await?;

    let mut market = Marketplace::new(&config).with_cancel(cancel_on_ctrl_c());
    if let Some(cache) = cache {
        market = market.with_cache(cache);
    }

    let output = match command {
        MarketCommand::Connect => {
            let me = session.identity()?;
            let mut out = format!("Connected as {me}\n");
            if let Some(hook) = profile {
                out.push_str(&render::render_profile(hook.profile().as_ref()));
            }
            out
        }
        MarketCommand::Mint(args) => render::render_confirmation(
            &market
                .mint(&session, &args.rate, &args.hours, &args.description)
                .await?,
        ),
        MarketCommand::Purchase { token_id, hours } => {
            render::render_confirmation(&market.purchase(&session, token_id, hours).await?)
        }
        MarketCommand::Delete { token_id } => {
            render::render_confirmation(&market.delete_token(&session, token_id).await?)
        }
        MarketCommand::UpdateHours { token_id, hours } => render::render_confirmation(
            &market
                .update_availability(&session, token_id, hours)
                .await?,
        ),
        MarketCommand::MyTokens => {
            render::render_tokens(&market.my_tokens(&session).await?, render::NO_MY_TOKENS)
        }
        MarketCommand::Tokens => {
            render::render_tokens(&market.all_tokens(&session).await?, render::NO_TOKENS)
        }
        MarketCommand::Search(args) => {
            let query = token_query(args)?;
            render::render_browse(&market.browse(&session, &query).await?)
        }
        MarketCommand::Receipts => render::render_receipts(&market.my_receipts(&session).await?),
        MarketCommand::ListReceipt { receipt_id, price } => render::render_confirmation(
            &market.list_receipt(&session, receipt_id, &price).await?,
        ),
        MarketCommand::BuySecondary { receipt_id } => render::render_confirmation(
            &market.buy_from_secondary(&session, receipt_id).await?,
        ),
        MarketCommand::Secondary => render::render_offers(&market.secondary_market(&session).await?),
        MarketCommand::Redeem { receipt_id } => {
            render::render_confirmation(&market.redeem(&session, receipt_id).await?)
        }
        MarketCommand::Status { hash } => {
            render::render_confirmation(&market.workflow().status(&session, &hash).await?)
        }
        MarketCommand::Profile(ProfileCommand::Show { address }) => {
            let address = match address {
                Some(address) => address,
                None => session.identity()?,
            };
            render::render_profile(market.profile(&address).await?.as_ref())
        }
        MarketCommand::Profile(ProfileCommand::Set(args)) => {
            let profile = Profile {
                username: args.username,
                display_name: args.display_name,
                bio: args.bio,
                avatar_url: args.avatar_url,
                social_links: SocialLinks {
                    twitter: args.twitter,
                    github: args.github,
                },
            };
            render::render_profile(Some(&market.save_profile(&session, &profile).await?))
        }
    };

    print!("{output}");
    Ok(())
}

fn token_query(args: SearchArgs) -> Result<TokenQuery> {
    Ok(TokenQuery {
        search: args.text,
        category: args.category,
        sort: args.sort,
        min_price: parse_price("minimum price", args.min_price.as_deref())?,
        max_price: parse_price("maximum price", args.max_price.as_deref())?,
        page: args.page,
        limit: args.limit,
    })
}

// ---------------------------------------------------------------------------
// Dice game
// ---------------------------------------------------------------------------

async fn run_game(global: &GlobalArgs, command: GameCommand) -> Result<()> {
    // The dice backends never call the marketplace contract.
    let config = client_config(
        global,
        global.contract.clone().unwrap_or(Address::Contract([0u8; 32])),
    );
    let Client { session, .. } = open_session(global, &config, None).await?;
    let games = match GameBackend::from_config(&config, global.game_contract.clone(), &global.game_store)? {
        GameBackend::Live(live) => GameBackend::Live(live.with_cancel(cancel_on_ctrl_c())),
        simulated => simulated,
    };
    tracing::debug!(backend = ?games.kind(), "dice backend ready");

    let me = session.identity().ok();
    let output = match command {
        GameCommand::Create { stake } => {
            let game_id = games.create_game(&session, &stake).await?;
            format!("Created game #{game_id}. Share the id with an opponent.\n")
        }
        GameCommand::Join { game_id } => {
            render_game(&games.join_game(&session, game_id).await?, me.as_ref())
        }
        GameCommand::Play { game_id } => {
            render_game(&games.play_game(&session, game_id).await?, me.as_ref())
        }
        GameCommand::Show { game_id } => {
            let game = games
                .view_game(&session, game_id)
                .await?
                .ok_or(GameError::NotFound(game_id))?;
            render_game(&game, me.as_ref())
        }
        GameCommand::List => render_games(&games.my_games(&session).await?, me.as_ref()),
    };

    print!("{output}");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("hourglass {}", env!("CARGO_PKG_VERSION"));
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
