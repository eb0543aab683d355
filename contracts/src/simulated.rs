//! The simulated dice backend: the game rules run locally against a
//! [`GameStore`], with dice from a [`DiceRoller`].
//!
//! Nothing here touches the ledger. Identity still comes from the session,
//! so an unconnected session is refused just like on the live backend.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use tracing::info;

use hourglass_protocol::amount::parse_major;
use hourglass_protocol::session::Session;

use crate::game::{GameError, GameRecord, Participant};
use crate::store::GameStore;

/// Source of six-sided die rolls.
pub trait DiceRoller: Send + Sync {
    /// One roll, `1..=6`.
    fn roll(&self) -> u64;
}

/// Rolls with the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRoller;

impl DiceRoller for RandomRoller {
    fn roll(&self) -> u64 {
        rand::thread_rng().gen_range(1..=6)
    }
}

/// Parses a stake in major units. Must be positive.
pub(crate) fn parse_stake(text: &str) -> Result<i128, GameError> {
    let stake = parse_major(text).map_err(|e| GameError::InvalidStake(e.to_string()))?;
    if stake <= 0 {
        return Err(GameError::InvalidStake("stake must be greater than zero".into()));
    }
    Ok(stake)
}

/// Dice games played against a local store.
pub struct SimulatedDiceGame {
    store: Arc<dyn GameStore>,
    roller: Arc<dyn DiceRoller>,
    // Serialises load-modify-save cycles.
    guard: Mutex<()>,
}

impl SimulatedDiceGame {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self::with_roller(store, Arc::new(RandomRoller))
    }

    pub fn with_roller(store: Arc<dyn GameStore>, roller: Arc<dyn DiceRoller>) -> Self {
        Self {
            store,
            roller,
            guard: Mutex::new(()),
        }
    }

    fn update<T>(
        &self,
        game_id: u64,
        change: impl FnOnce(&mut GameRecord) -> Result<T, GameError>,
    ) -> Result<(T, GameRecord), GameError> {
        let _lock = self.guard.lock();
        let mut games = self.store.load()?;
        let game = games
            .iter_mut()
            .find(|g| g.game_id == game_id)
            .ok_or(GameError::NotFound(game_id))?;
        let out = change(game)?;
        let updated = game.clone();
        self.store.save(&games)?;
        Ok((out, updated))
    }

    /// Opens a game staked at `stake` (decimal text, major units). Returns
    /// the new game's id, one past the highest id in the store.
    pub fn create_game(&self, session: &Session, stake: &str) -> Result<u64, GameError> {
        let player1 = session.identity()?;
        let stake = parse_stake(stake)?;

        let _lock = self.guard.lock();
        let mut games = self.store.load()?;
        let game_id = games.iter().map(|g| g.game_id).max().unwrap_or(0) + 1;
        games.push(GameRecord::new(game_id, player1, stake));
        self.store.save(&games)?;

        info!(game_id, stake, "simulated game created");
        Ok(game_id)
    }

    /// Takes the second seat in a pending game.
    pub fn join_game(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        let player2 = session.identity()?;
        let ((), game) = self.update(game_id, |game| {
            if game.is_completed {
                return Err(GameError::AlreadyCompleted(game_id));
            }
            if game.player2 != Participant::Pending {
                return Err(GameError::AlreadyJoined(game_id));
            }
            if game.player1 == player2 {
                return Err(GameError::OwnGame(game_id));
            }
            game.player2 = Participant::Player(player2.clone());
            Ok(())
        })?;
        info!(game_id, "joined simulated game");
        Ok(game)
    }

    /// Rolls two dice for each player and settles the game.
    pub fn play_game(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        session.identity()?;
        let ((), game) = self.update(game_id, |game| {
            if game.is_completed {
                return Err(GameError::AlreadyCompleted(game_id));
            }
            if game.player2 == Participant::Pending {
                return Err(GameError::AwaitingOpponent(game_id));
            }
            let p1 = self.roller.roll() + self.roller.roll();
            let p2 = self.roller.roll() + self.roller.roll();
            game.settle(p1, p2);
            Ok(())
        })?;
        info!(game_id, p1 = game.player1_roll, p2 = game.player2_roll, winner = %game.winner, "simulated game played");
        Ok(game)
    }

    pub fn view_game(&self, session: &Session, game_id: u64) -> Result<Option<GameRecord>, GameError> {
        session.identity()?;
        Ok(self
            .store
            .load()?
            .into_iter()
            .find(|g| g.game_id == game_id))
    }

    /// Games the connected account plays in, by id.
    pub fn my_games(&self, session: &Session) -> Result<Vec<GameRecord>, GameError> {
        let me = session.identity()?;
        let mut games: Vec<GameRecord> = self
            .store
            .load()?
            .into_iter()
            .filter(|g| g.involves(&me))
            .collect();
        games.sort_by_key(|g| g.game_id);
        Ok(games)
    }
}
