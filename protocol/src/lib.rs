// Copyright (c) 2026 Hourglass Contributors. MIT License.
// See LICENSE for details.

//! # Hourglass Protocol: Client Library
//!
//! Client side of the Hourglass time-token marketplace: sellers mint tokens
//! for hours of their time, buyers purchase hours and receive receipts, and
//! receipts can be resold on a secondary market with a royalty to the
//! original seller.
//!
//! ## Architecture
//!
//! ```text
//!  Session ──────────────► Wallet (access, signing)
//!     │                     └─ LocalWallet (ed25519, in-process)
//!     ▼
//!  Workflow ─ schema check ─ EnvelopeBuilder ─► LedgerRpc
//!     │          simulate ─ assemble ─ sign ─ send ─ FinalityPoller
//!     ▼
//!  Marketplace (typed operations) ──► ListingCache (optional, best-effort)
//!     ▼
//!  render (plain text)
//! ```
//!
//! - **address**: account and contract identifiers, network identity.
//! - **amount**: decimal text to minor units and back.
//! - **value**: the tagged contract value codec.
//! - **schema**: declared contract interfaces, checked before any call.
//! - **transaction**: envelopes, their transport encoding and signatures.
//! - **ledger**: the JSON-RPC ledger seam and its HTTP client.
//! - **wallet**: the signing seam.
//! - **session**: connected identity, post-connect hooks, in-flight guard.
//! - **workflow**: simulate and submit, with bounded finality polling.
//! - **market**: marketplace operations and records.
//! - **cache**: the listing-cache REST client.
//! - **render**: text output with explicit empty states.
//! - **testing**: scripted collaborators shared by the workspace's tests
//!   (`testing` feature).

pub mod address;
pub mod amount;
pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod market;
pub mod render;
pub mod schema;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transaction;
pub mod value;
pub mod wallet;
pub mod workflow;

pub use address::{Address, Network};
pub use config::ClientConfig;
pub use error::ClientError;
pub use market::Marketplace;
pub use session::Session;
pub use workflow::{Confirmation, Invocation, Workflow};
