// Copyright (c) 2026 Hourglass Contributors. MIT License.
// See LICENSE for details.

//! # Hourglass Dice Game
//!
//! A two-player dice duel that ships next to the marketplace as a demo. The
//! same operations run against one of two backends, picked by configuration:
//!
//! ```text
//!               GameBackend
//!              ┌─────┴──────────┐
//!        LiveDiceGame     SimulatedDiceGame
//!   (dice contract via       (GameStore + DiceRoller,
//!    protocol Workflow)       JSON file on disk)
//! ```
//!
//! - **game**: records, participants and the rules for settling a game.
//! - **store**: whole-collection persistence for simulated games.
//! - **simulated**: local rules engine.
//! - **live**: contract client.
//! - **backend**: configuration-driven selection.
//! - **render**: text output.

pub mod backend;
pub mod game;
pub mod live;
pub mod render;
pub mod simulated;
pub mod store;

pub use backend::GameBackend;
pub use game::{GameError, GameRecord, GameStatus, Participant};
pub use live::LiveDiceGame;
pub use simulated::{DiceRoller, RandomRoller, SimulatedDiceGame};
pub use store::{GameStore, JsonFileStore, MemoryStore};
