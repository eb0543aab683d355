//! # Dice Game Records
//!
//! A two-player dice duel. Player one creates a game with a stake, player
//! two joins, and playing rolls two six-sided dice per player. The higher
//! sum wins; equal sums tie.
//!
//! ```text
//!   create ──► Pending ──join──► Active ──play──► Completed
//!              (player2 = "pending")             (winner = player | "tie")
//! ```
//!
//! The contract reports "no such player" and "no winner yet" with string
//! sentinels in address slots. [`Participant`] turns those into variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hourglass_protocol::address::Address;
use hourglass_protocol::value::{FromScValue, Record, ScValue, ValueError, ValueType};
use hourglass_protocol::ClientError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from dice game operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// No game with this id exists.
    #[error("game {0} not found")]
    NotFound(u64),

    /// The game has already been played.
    #[error("game {0} is already completed")]
    AlreadyCompleted(u64),

    /// The game already has a second player.
    #[error("game {0} already has two players")]
    AlreadyJoined(u64),

    /// Player one tried to join their own game.
    #[error("you cannot join your own game {0}")]
    OwnGame(u64),

    /// The game cannot be played until a second player joins.
    #[error("game {0} is still waiting for a second player")]
    AwaitingOpponent(u64),

    /// The stake could not be used.
    #[error("invalid stake: {0}")]
    InvalidStake(String),

    /// The live backend was selected without a dice contract address.
    #[error("no dice game contract configured")]
    NoGameContract,

    /// The local game store could not be read or written.
    #[error("game store error: {0}")]
    Store(String),

    /// Session, workflow or decoding failure.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<ValueError> for GameError {
    fn from(err: ValueError) -> Self {
        GameError::Client(ClientError::Decode(err))
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

const PENDING: &str = "pending";
const NOBODY: &str = "none";
const TIE: &str = "tie";

/// The content of a player or winner slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Participant {
    Player(Address),
    /// Nobody has joined yet.
    Pending,
    /// Empty slot (no winner yet, or the game does not exist).
    Nobody,
    /// Equal rolls.
    Tie,
}

impl Participant {
    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Player(address) => Some(address),
            _ => None,
        }
    }

    pub fn is(&self, address: &Address) -> bool {
        self.address() == Some(address)
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(address) => write!(f, "{address}"),
            Self::Pending => f.write_str(PENDING),
            Self::Nobody => f.write_str(NOBODY),
            Self::Tie => f.write_str(TIE),
        }
    }
}

impl FromStr for Participant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PENDING => Ok(Self::Pending),
            NOBODY => Ok(Self::Nobody),
            TIE => Ok(Self::Tie),
            other => other
                .parse::<Address>()
                .map(Self::Player)
                .map_err(|e| e.to_string()),
        }
    }
}

impl From<Participant> for String {
    fn from(p: Participant) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for Participant {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromScValue for Participant {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::Address(address) => Ok(Self::Player(address.clone())),
            ScValue::String(s) | ScValue::Symbol(s) => {
                s.parse().map_err(|_| ValueError::TypeMismatch {
                    expected: ValueType::Address,
                    found: value.value_type(),
                })
            }
            other => Err(ValueError::TypeMismatch {
                expected: ValueType::Address,
                found: other.value_type(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// GameRecord
// ---------------------------------------------------------------------------

/// Where a game is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Pending,
    Active,
    Completed,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
        })
    }
}

/// One dice game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: u64,
    pub player1: Address,
    pub player2: Participant,
    /// Stake in minor units.
    #[serde(rename = "stake_amount")]
    pub stake: i128,
    /// Sum of player one's two dice. Zero until played.
    pub player1_roll: u64,
    pub player2_roll: u64,
    pub winner: Participant,
    pub is_completed: bool,
}

impl GameRecord {
    /// A fresh game waiting for an opponent.
    pub fn new(game_id: u64, player1: Address, stake: i128) -> Self {
        Self {
            game_id,
            player1,
            player2: Participant::Pending,
            stake,
            player1_roll: 0,
            player2_roll: 0,
            winner: Participant::Nobody,
            is_completed: false,
        }
    }

    pub fn status(&self) -> GameStatus {
        if self.is_completed {
            GameStatus::Completed
        } else if self.player2 == Participant::Pending {
            GameStatus::Pending
        } else {
            GameStatus::Active
        }
    }

    /// Whether `address` plays in this game.
    pub fn involves(&self, address: &Address) -> bool {
        &self.player1 == address || self.player2.is(address)
    }

    /// Records the rolls and decides the winner.
    pub fn settle(&mut self, player1_roll: u64, player2_roll: u64) {
        self.player1_roll = player1_roll;
        self.player2_roll = player2_roll;
        self.winner = match player1_roll.cmp(&player2_roll) {
            std::cmp::Ordering::Greater => Participant::Player(self.player1.clone()),
            std::cmp::Ordering::Less => self.player2.clone(),
            std::cmp::Ordering::Equal => Participant::Tie,
        };
        self.is_completed = true;
    }
}

impl FromScValue for GameRecord {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        let record = Record::new(value)?;
        let player1: Participant = record.field("player1")?;
        // A missing game comes back with game_id 0 and sentinel players;
        // keep decoding so the caller can see the id.
        let player1 = match player1 {
            Participant::Player(address) => address,
            _ => Address::Account([0u8; 32]),
        };
        Ok(Self {
            game_id: record.field("game_id")?,
            player1,
            player2: record.field("player2")?,
            stake: record.field("stake_amount")?,
            player1_roll: record.field("player1_roll")?,
            player2_roll: record.field("player2_roll")?,
            winner: record.field("winner")?,
            is_completed: record.field("is_completed")?,
        })
    }
}
