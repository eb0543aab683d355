//! Plain-text rendering of marketplace results.
//!
//! Every list renderer prints an explicit empty-state line instead of an
//! empty block, and reports elements that could not be loaded. Amounts are
//! shown in major units with seven fractional digits.

use std::fmt::Write;

use crate::address::short_address;
use crate::amount::format_major;
use crate::cache::{CachedToken, Profile};
use crate::market::{Listing, Receipt, SecondaryOffer, TimeToken, TokenBrowse};
use crate::value::to_native_json;
use crate::workflow::Confirmation;

pub const NO_TOKENS: &str = "No tokens found. Try adjusting your filters.";
pub const NO_MY_TOKENS: &str = "You have not minted any time tokens yet.";
pub const NO_RECEIPTS: &str = "No receipts yet. Purchase some hours to get one.";
pub const NO_OFFERS: &str = "No active secondary listings. List your receipts to start trading!";

fn skipped_line(out: &mut String, skipped: usize) {
    if skipped > 0 {
        let noun = if skipped == 1 { "item" } else { "items" };
        let _ = writeln!(out, "({skipped} {noun} could not be loaded)");
    }
}

fn listing<T>(
    listing: &Listing<T>,
    empty: &str,
    mut item: impl FnMut(&mut String, &T),
) -> String {
    let mut out = String::new();
    if listing.is_empty() {
        let _ = writeln!(out, "{empty}");
    }
    for entry in listing {
        item(&mut out, entry);
    }
    skipped_line(&mut out, listing.skipped);
    out
}

fn write_token(out: &mut String, token: &TimeToken) {
    let _ = writeln!(out, "Token #{}: {}", token.id, token.description);
    let _ = writeln!(out, "  Hourly rate:     {}", format_major(token.hourly_rate));
    let _ = writeln!(out, "  Hours available: {}", token.hours_available);
    let _ = writeln!(out, "  Seller:          {}", short_address(&token.seller.to_string()));
}

/// Tokens read from the ledger.
pub fn render_tokens(tokens: &Listing<TimeToken>, empty: &str) -> String {
    listing(tokens, empty, write_token)
}

/// Tokens served by the listing cache.
pub fn render_cached_tokens(tokens: &[CachedToken]) -> String {
    let mut out = String::new();
    if tokens.is_empty() {
        let _ = writeln!(out, "{NO_TOKENS}");
        return out;
    }
    for t in tokens {
        let title = t
            .title
            .clone()
            .unwrap_or_else(|| format!("Time Token #{}", t.token_id));
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "  Token id:        {}", t.token_id);
        let _ = writeln!(out, "  Seller:          {}", short_address(&t.seller_address));
        let _ = writeln!(out, "  Hourly rate:     {}", format_major(t.hourly_rate));
        let _ = writeln!(out, "  Hours available: {}", t.hours_available);
        if let Some(category) = &t.category {
            let _ = writeln!(out, "  Category:        {category}");
        }
        if !t.description.is_empty() {
            let _ = writeln!(out, "  {}", t.description);
        }
        if !t.tags.is_empty() {
            let _ = writeln!(out, "  Tags:            {}", t.tags.join(", "));
        }
        if t.view_count > 0 {
            let _ = writeln!(out, "  Views:           {}", t.view_count);
        }
    }
    out
}

pub fn render_browse(result: &TokenBrowse) -> String {
    match result {
        TokenBrowse::Cached(tokens) => render_cached_tokens(tokens),
        TokenBrowse::Ledger(tokens) => render_tokens(tokens, NO_TOKENS),
    }
}

pub fn render_receipts(receipts: &Listing<Receipt>) -> String {
    listing(receipts, NO_RECEIPTS, |out, r| {
        let status = if r.is_redeemed { " (redeemed)" } else { "" };
        let _ = writeln!(out, "Receipt #{}{status}: {}", r.id, r.description);
        let _ = writeln!(out, "  Hours:          {}", r.hours);
        let _ = writeln!(out, "  Original rate:  {} per hour", format_major(r.original_rate));
        let _ = writeln!(out, "  Purchase price: {}", format_major(r.purchase_price));
    })
}

pub fn render_offers(offers: &Listing<SecondaryOffer>) -> String {
    listing(offers, NO_OFFERS, |out, offer| {
        let receipt = &offer.receipt;
        let markup = offer
            .markup_percent()
            .map(|m| format!("{m:+.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "Receipt #{} - {} hours: {}",
            offer.listing.receipt_id, receipt.hours, receipt.description
        );
        let _ = writeln!(out, "  Resale price:   {}", format_major(offer.listing.price));
        let _ = writeln!(out, "  Original price: {}", format_major(receipt.purchase_price));
        let _ = writeln!(out, "  Markup:         {markup}");
        let _ = writeln!(out, "  Royalty (5%):   {}", format_major(offer.royalty()));
        let _ = writeln!(
            out,
            "  Seller:         {}",
            short_address(&offer.listing.seller.to_string())
        );
    })
}

pub fn render_confirmation(confirmation: &Confirmation) -> String {
    let mut out = format!(
        "Transaction {} confirmed in ledger {} after {} status check(s).\n",
        confirmation.hash, confirmation.ledger, confirmation.attempts
    );
    if let Some(value) = &confirmation.return_value {
        let _ = writeln!(out, "Returned: {}", to_native_json(value));
    }
    out
}

pub fn render_profile(profile: Option<&Profile>) -> String {
    let Some(p) = profile else {
        return "No profile yet. Create one with `profile set`.\n".to_string();
    };
    let mut out = String::new();
    let name = if p.display_name.is_empty() {
        &p.username
    } else {
        &p.display_name
    };
    let _ = writeln!(out, "{name} (@{})", p.username);
    for (label, value) in [
        ("Bio", &p.bio),
        ("Avatar", &p.avatar_url),
        ("Twitter", &p.social_links.twitter),
        ("GitHub", &p.social_links.github),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    out
}
