//! # Time-Token Marketplace
//!
//! Typed operations over the marketplace contract. Every call goes through
//! the [`Workflow`]: writes are signed submissions, reads are simulations.
//!
//! ```text
//! writes  mint_time_token  purchase_token  delete_token  update_availability
//!         list_on_secondary  buy_from_secondary  redeem_receipt
//! reads   get_token  get_token_count  get_seller_tokens
//!         get_receipt  get_receipt_count  get_owner_receipts  get_listing
//! ```
//!
//! List reads fetch ids first and then each element. A failing element is
//! logged and counted in [`Listing::skipped`]; the rest still load.

pub mod listing;
pub mod types;

pub use listing::Listing;
pub use types::{Receipt, SecondaryListing, SecondaryOffer, TimeToken};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::address::Address;
use crate::amount::parse_major;
use crate::cache::{CachedToken, ListingCache, Profile, TokenQuery};
use crate::config::{ClientConfig, SECONDARY_PURCHASE_FEE};
use crate::error::ClientError;
use crate::schema::ContractSchema;
use crate::session::Session;
use crate::value::{FromScValue, ValueError};
use crate::workflow::{Confirmation, FinalityPoller, Invocation, Workflow};

/// Result of browsing the token catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBrowse {
    /// Served by the listing cache.
    Cached(Vec<CachedToken>),
    /// Read from the ledger because the cache was unavailable or empty.
    Ledger(Listing<TimeToken>),
}

impl TokenBrowse {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Cached(tokens) => tokens.is_empty(),
            Self::Ledger(listing) => listing.is_empty(),
        }
    }
}

/// Client for one deployed marketplace contract.
pub struct Marketplace {
    workflow: Workflow,
    native_asset: Address,
    cache: Option<Arc<dyn ListingCache>>,
}

impl Marketplace {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            workflow: Workflow::new(
                config.contract.clone(),
                ContractSchema::marketplace(),
                config,
            ),
            native_asset: config.native_asset(),
            cache: None,
        }
    }

    /// Consults `cache` for catalogue and profile reads.
    pub fn with_cache(mut self, cache: Arc<dyn ListingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_poller(mut self, poller: FinalityPoller) -> Self {
        self.workflow = self.workflow.with_poller(poller);
        self
    }

    pub fn with_cancel(mut self, cancel: tokio::sync::watch::Receiver<bool>) -> Self {
        self.workflow = self.workflow.with_cancel(cancel);
        self
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Mints a token selling `hours` at `hourly_rate` (decimal text in major
    /// units) on behalf of the connected account.
    pub async fn mint(
        &self,
        session: &Session,
        hourly_rate: &str,
        hours: &str,
        description: &str,
    ) -> Result<Confirmation, ClientError> {
        let seller = session.identity()?;
        let rate = positive_amount("hourly rate", hourly_rate)?;
        let hours = positive_hours(hours)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(ClientError::InvalidInput("description is required".into()));
        }

        info!(rate, hours, "minting time token");
        let call = Invocation::new("mint_time_token")
            .arg(&seller)
            .arg(rate)
            .arg(hours)
            .arg(description);
        self.workflow.submit(session, call).await
    }

    /// Buys `hours` from token `token_id`.
    pub async fn purchase(
        &self,
        session: &Session,
        token_id: u64,
        hours: u32,
    ) -> Result<Confirmation, ClientError> {
        let buyer = session.identity()?;
        if hours == 0 {
            return Err(ClientError::InvalidInput("hours must be at least 1".into()));
        }
        let call = Invocation::new("purchase_token")
            .arg(token_id)
            .arg(&buyer)
            .arg(hours);
        self.workflow.submit(session, call).await
    }

    pub async fn delete_token(
        &self,
        session: &Session,
        token_id: u64,
    ) -> Result<Confirmation, ClientError> {
        let seller = session.identity()?;
        let call = Invocation::new("delete_token").arg(token_id).arg(&seller);
        self.workflow.submit(session, call).await
    }

    /// Sets the hours still available on one of the caller's tokens.
    pub async fn update_availability(
        &self,
        session: &Session,
        token_id: u64,
        hours: u32,
    ) -> Result<Confirmation, ClientError> {
        let seller = session.identity()?;
        let call = Invocation::new("update_availability")
            .arg(token_id)
            .arg(&seller)
            .arg(hours);
        self.workflow.submit(session, call).await
    }

    /// Offers a receipt for resale at `price` (decimal text, major units).
    pub async fn list_receipt(
        &self,
        session: &Session,
        receipt_id: u64,
        price: &str,
    ) -> Result<Confirmation, ClientError> {
        let seller = session.identity()?;
        let price = positive_amount("price", price)?;
        let call = Invocation::new("list_on_secondary")
            .arg(receipt_id)
            .arg(&seller)
            .arg(price);
        self.workflow.submit(session, call).await
    }

    /// Buys a listed receipt, paying in the native asset.
    ///
    /// The listing is read first; a missing or inactive listing fails with
    /// `ListingInactive` before anything is signed.
    pub async fn buy_from_secondary(
        &self,
        session: &Session,
        receipt_id: u64,
    ) -> Result<Confirmation, ClientError> {
        let buyer = session.identity()?;
        match self.listing(session, receipt_id).await? {
            Some(listing) if listing.is_active => {
                debug!(receipt_id, price = listing.price, "listing is active");
            }
            _ => return Err(ClientError::ListingInactive(receipt_id)),
        }

        let call = Invocation::new("buy_from_secondary")
            .arg(receipt_id)
            .arg(&buyer)
            .arg(&self.native_asset)
            .fee(SECONDARY_PURCHASE_FEE);
        self.workflow.submit(session, call).await
    }

    pub async fn redeem(
        &self,
        session: &Session,
        receipt_id: u64,
    ) -> Result<Confirmation, ClientError> {
        let owner = session.identity()?;
        let call = Invocation::new("redeem_receipt").arg(receipt_id).arg(&owner);
        self.workflow.submit(session, call).await
    }

    // -----------------------------------------------------------------------
    // Single reads
    // -----------------------------------------------------------------------

    async fn read<T: FromScValue>(
        &self,
        session: &Session,
        call: Invocation,
    ) -> Result<Option<T>, ClientError> {
        match self.workflow.simulate(session, call).await? {
            Some(value) => Ok(Some(value.decode()?)),
            None => Ok(None),
        }
    }

    async fn read_required<T: FromScValue>(
        &self,
        session: &Session,
        call: Invocation,
    ) -> Result<T, ClientError> {
        let method = call.method().to_string();
        self.read(session, call).await?.ok_or_else(|| {
            ClientError::Decode(ValueError::MissingField(format!(
                "return value of {method}"
            )))
        })
    }

    pub async fn token(
        &self,
        session: &Session,
        token_id: u64,
    ) -> Result<Option<TimeToken>, ClientError> {
        self.read(session, Invocation::new("get_token").arg(token_id))
            .await
    }

    pub async fn token_count(&self, session: &Session) -> Result<u64, ClientError> {
        self.read_required(session, Invocation::new("get_token_count"))
            .await
    }

    pub async fn seller_token_ids(
        &self,
        session: &Session,
        seller: &Address,
    ) -> Result<Vec<u64>, ClientError> {
        let ids: Option<Vec<u64>> = self
            .read(session, Invocation::new("get_seller_tokens").arg(seller))
            .await?;
        Ok(ids.unwrap_or_default())
    }

    pub async fn receipt(
        &self,
        session: &Session,
        receipt_id: u64,
    ) -> Result<Option<Receipt>, ClientError> {
        self.read(session, Invocation::new("get_receipt").arg(receipt_id))
            .await
    }

    pub async fn receipt_count(&self, session: &Session) -> Result<u64, ClientError> {
        self.read_required(session, Invocation::new("get_receipt_count"))
            .await
    }

    pub async fn owner_receipt_ids(
        &self,
        session: &Session,
        owner: &Address,
    ) -> Result<Vec<u64>, ClientError> {
        let ids: Option<Vec<u64>> = self
            .read(session, Invocation::new("get_owner_receipts").arg(owner))
            .await?;
        Ok(ids.unwrap_or_default())
    }

    /// The secondary listing for a receipt, if one was ever created.
    pub async fn listing(
        &self,
        session: &Session,
        receipt_id: u64,
    ) -> Result<Option<SecondaryListing>, ClientError> {
        let call = Invocation::new("get_listing").arg(receipt_id);
        match self.workflow.simulate(session, call).await? {
            Some(value) => Ok(Some(SecondaryListing::decode(receipt_id, &value)?)),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    async fn tokens_by_id(
        &self,
        session: &Session,
        ids: impl IntoIterator<Item = u64>,
    ) -> Listing<TimeToken> {
        let mut listing = Listing::default();
        for id in ids {
            match self.token(session, id).await {
                Ok(Some(token)) => listing.push(token),
                Ok(None) => {
                    warn!(token_id = id, "token not found, skipping");
                    listing.skip();
                }
                Err(err) => {
                    warn!(token_id = id, error = %err, "failed to load token, skipping");
                    listing.skip();
                }
            }
        }
        listing
    }

    /// Tokens minted by the connected account.
    pub async fn my_tokens(&self, session: &Session) -> Result<Listing<TimeToken>, ClientError> {
        let me = session.identity()?;
        let ids = self.seller_token_ids(session, &me).await?;
        debug!(count = ids.len(), "seller token ids loaded");
        Ok(self.tokens_by_id(session, ids).await)
    }

    /// Every token, read from the ledger by id.
    pub async fn all_tokens(&self, session: &Session) -> Result<Listing<TimeToken>, ClientError> {
        let count = self.token_count(session).await?;
        Ok(self.tokens_by_id(session, 1..=count).await)
    }

    /// Browses the catalogue, asking the listing cache first.
    ///
    /// Falls back to the ledger when there is no cache, when the cache
    /// fails, or when an unfiltered query comes back empty. Ledger results
    /// are filtered locally by search text and price bounds.
    pub async fn browse(
        &self,
        session: &Session,
        query: &TokenQuery,
    ) -> Result<TokenBrowse, ClientError> {
        if let Some(cache) = &self.cache {
            match cache.list_tokens(query).await {
                Ok(tokens) if !tokens.is_empty() || !query.is_unfiltered() => {
                    debug!(count = tokens.len(), "catalogue served from cache");
                    return Ok(TokenBrowse::Cached(tokens));
                }
                Ok(_) => info!("listing cache is empty, reading tokens from the ledger"),
                Err(err) => warn!(error = %err, "listing cache failed, reading tokens from the ledger"),
            }
        }

        let mut listing = self.all_tokens(session).await?;
        listing.items.retain(|token| matches_query(token, query));
        Ok(TokenBrowse::Ledger(listing))
    }

    /// Receipts held by the connected account.
    pub async fn my_receipts(&self, session: &Session) -> Result<Listing<Receipt>, ClientError> {
        let me = session.identity()?;
        let ids = self.owner_receipt_ids(session, &me).await?;

        let mut listing = Listing::default();
        for id in ids {
            match self.receipt(session, id).await {
                Ok(Some(receipt)) => listing.push(receipt),
                Ok(None) => {
                    warn!(receipt_id = id, "receipt not found, skipping");
                    listing.skip();
                }
                Err(err) => {
                    warn!(receipt_id = id, error = %err, "failed to load receipt, skipping");
                    listing.skip();
                }
            }
        }
        Ok(listing)
    }

    /// Active resale offers across all receipts.
    pub async fn secondary_market(
        &self,
        session: &Session,
    ) -> Result<Listing<SecondaryOffer>, ClientError> {
        let count = self.receipt_count(session).await?;

        let mut offers = Listing::default();
        for id in 1..=count {
            let listing = match self.listing(session, id).await {
                Ok(Some(listing)) if listing.is_active => listing,
                Ok(_) => continue,
                Err(err) => {
                    warn!(receipt_id = id, error = %err, "failed to load listing, skipping");
                    offers.skip();
                    continue;
                }
            };

            match self.receipt(session, id).await {
                Ok(Some(receipt)) => offers.push(SecondaryOffer { receipt, listing }),
                Ok(None) => {
                    warn!(receipt_id = id, "listed receipt not found, skipping");
                    offers.skip();
                }
                Err(err) => {
                    warn!(receipt_id = id, error = %err, "failed to load listed receipt, skipping");
                    offers.skip();
                }
            }
        }
        Ok(offers)
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    fn cache(&self) -> Result<&Arc<dyn ListingCache>, ClientError> {
        self.cache
            .as_ref()
            .ok_or_else(|| ClientError::Cache("no listing cache configured".into()))
    }

    pub async fn profile(&self, address: &Address) -> Result<Option<Profile>, ClientError> {
        Ok(self.cache()?.get_profile(address).await?)
    }

    /// Saves the connected account's profile.
    pub async fn save_profile(
        &self,
        session: &Session,
        profile: &Profile,
    ) -> Result<Profile, ClientError> {
        let me = session.identity()?;
        if profile.username.trim().is_empty() {
            return Err(ClientError::InvalidInput("username is required".into()));
        }
        Ok(self.cache()?.put_profile(&me, profile).await?)
    }
}

fn positive_amount(label: &str, text: &str) -> Result<i128, ClientError> {
    let value = parse_major(text)?;
    if value <= 0 {
        return Err(ClientError::InvalidInput(format!("{label} must be greater than zero")));
    }
    Ok(value)
}

fn positive_hours(text: &str) -> Result<u32, ClientError> {
    let hours: u32 = text
        .trim()
        .parse()
        .map_err(|_| ClientError::InvalidInput(format!("hours must be a whole number, got `{text}`")))?;
    if hours == 0 {
        return Err(ClientError::InvalidInput("hours must be at least 1".into()));
    }
    Ok(hours)
}

fn matches_query(token: &TimeToken, query: &TokenQuery) -> bool {
    let text_ok = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or(true, |needle| {
            token
                .description
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
    let min_ok = query.min_price.map_or(true, |min| token.hourly_rate >= min);
    let max_ok = query.max_price.map_or(true, |max| token.hourly_rate <= max);
    text_ok && min_ok && max_ok
}
