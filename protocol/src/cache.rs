//! # Listing Cache
//!
//! An optional REST service that mirrors marketplace tokens into a database
//! so browsing does not cost one simulation per token. It is best-effort:
//! every caller that consults it falls back to the ledger when it fails.
//!
//! ```text
//! GET {api}/tokens?search=&category=&sort=&min_price=&max_price=&page=&limit=
//!     -> { "data": [CachedToken, ...] }
//! GET {api}/profiles/{address}  -> Profile | 404
//! PUT {api}/profiles/{address}  <- Profile -> Profile
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::address::Address;
use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the listing-cache service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unreachable: {0}")]
    Http(String),

    #[error("cache returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("cache response malformed: {0}")]
    Decode(String),
}

impl From<CacheError> for ClientError {
    fn from(err: CacheError) -> Self {
        ClientError::Cache(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Sort order for cached token listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl TokenSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
        }
    }
}

impl fmt::Display for TokenSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            other => Err(format!(
                "unknown sort `{other}` (expected newest, oldest, price_asc or price_desc)"
            )),
        }
    }
}

/// Filters for a cached token listing. Prices are in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<TokenSort>,
    pub min_price: Option<i128>,
    pub max_price: Option<i128>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TokenQuery {
    /// `true` when no filter narrows the result set. An empty answer to an
    /// unfiltered query means the cache is empty, not that nothing matched.
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none()
            && self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Query-string pairs, skipping unset and blank filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();
        let mut text = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        };
        text("search", &self.search);
        text("category", &self.category);

        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A token as mirrored by the cache service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub token_id: u64,
    pub seller_address: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Minor units per hour.
    pub hourly_rate: i128,
    pub hours_available: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub view_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub github: String,
}

/// A user profile stored by the cache service, keyed by account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub social_links: SocialLinks,
}

#[derive(Deserialize)]
struct TokenPage {
    data: Vec<CachedToken>,
}

// ---------------------------------------------------------------------------
// ListingCache
// ---------------------------------------------------------------------------

/// The cache service's query interface.
#[async_trait]
pub trait ListingCache: Send + Sync {
    async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<CachedToken>, CacheError>;

    /// `Ok(None)` when the account has no profile.
    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, CacheError>;

    /// Stores a profile and returns what the service saved.
    async fn put_profile(&self, address: &Address, profile: &Profile)
        -> Result<Profile, CacheError>;
}

/// [`ListingCache`] over HTTP.
pub struct HttpListingCache {
    client: Client,
    base_url: String,
}

impl HttpListingCache {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CacheError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CacheError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn profile_url(&self, address: &Address) -> String {
        format!("{}/profiles/{}", self.base_url, address)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CacheError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| e.to_string());
            return Err(CacheError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| CacheError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ListingCache for HttpListingCache {
    async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<CachedToken>, CacheError> {
        let response = self
            .client
            .get(format!("{}/tokens", self.base_url))
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(|e| CacheError::Http(e.to_string()))?;
        let page: TokenPage = Self::read_json(response).await?;
        debug!(count = page.data.len(), "tokens loaded from cache");
        Ok(page.data)
    }

    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, CacheError> {
        let response = self
            .client
            .get(self.profile_url(address))
            .send()
            .await
            .map_err(|e| CacheError::Http(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_json(response).await.map(Some)
    }

    async fn put_profile(
        &self,
        address: &Address,
        profile: &Profile,
    ) -> Result<Profile, CacheError> {
        let response = self
            .client
            .put(self.profile_url(address))
            .json(profile)
            .send()
            .await
            .map_err(|e| CacheError::Http(e.to_string()))?;
        Self::read_json(response).await
    }
}
