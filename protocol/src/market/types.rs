//! Marketplace records as returned by the contract.
//!
//! Records arrive as symbol-keyed maps; each type decodes itself through
//! [`Record`] so a missing or mistyped field names the field in the error.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::{markup_percent, royalty_share};
use crate::value::{FromScValue, Record, ScValue, ValueError};

/// A seller's offer of hours at an hourly rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeToken {
    pub id: u64,
    pub seller: Address,
    /// Minor units per hour.
    pub hourly_rate: i128,
    pub hours_available: u32,
    pub description: String,
}

impl TimeToken {
    /// Price of `hours` hours at this token's rate.
    pub fn price_for(&self, hours: u32) -> i128 {
        self.hourly_rate.saturating_mul(i128::from(hours))
    }
}

impl FromScValue for TimeToken {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        let record = Record::new(value)?;
        Ok(Self {
            id: record.field("id")?,
            seller: record.field("seller")?,
            hourly_rate: record.field("hourly_rate")?,
            hours_available: record.field("hours_available")?,
            description: record.field("description")?,
        })
    }
}

/// Proof of a completed purchase. Tradeable on the secondary market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: u64,
    pub token_id: Option<u64>,
    /// Current holder, when the contract reports it.
    pub owner: Option<Address>,
    /// Original seller, the royalty recipient.
    pub seller: Option<Address>,
    pub hours: u32,
    pub original_rate: i128,
    pub purchase_price: i128,
    pub description: String,
    pub is_redeemed: bool,
}

impl FromScValue for Receipt {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        let record = Record::new(value)?;
        let owner = match record.optional("owner")? {
            Some(owner) => Some(owner),
            None => record.optional("buyer")?,
        };
        Ok(Self {
            id: record.field("id")?,
            token_id: record.optional("token_id")?,
            owner,
            seller: record.optional("seller")?,
            hours: record.field("hours")?,
            original_rate: record.field("original_rate")?,
            purchase_price: record.field("purchase_price")?,
            description: record.field("description")?,
            is_redeemed: record.optional("is_redeemed")?.unwrap_or(false),
        })
    }
}

/// A receipt offered for resale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryListing {
    pub receipt_id: u64,
    pub seller: Address,
    /// Asking price in minor units.
    pub price: i128,
    pub is_active: bool,
}

impl SecondaryListing {
    /// Decodes a listing record. The contract's listing record does not
    /// repeat the receipt id, so the caller supplies it.
    pub fn decode(receipt_id: u64, value: &ScValue) -> Result<Self, ValueError> {
        let record = Record::new(value)?;
        Ok(Self {
            receipt_id: record.optional("receipt_id")?.unwrap_or(receipt_id),
            seller: record.field("seller")?,
            price: record.field("price")?,
            is_active: record.field("is_active")?,
        })
    }
}

/// An active listing joined with the receipt it sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryOffer {
    pub receipt: Receipt,
    pub listing: SecondaryListing,
}

impl SecondaryOffer {
    /// Share of the asking price routed to the original seller.
    pub fn royalty(&self) -> i128 {
        royalty_share(self.listing.price)
    }

    /// Asking price relative to what the receipt originally cost.
    pub fn markup_percent(&self) -> Option<f64> {
        markup_percent(self.listing.price, self.receipt.purchase_price)
    }
}
