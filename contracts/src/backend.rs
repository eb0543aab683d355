//! Backend selection for the dice game.
//!
//! A [`GameBackend`] is either live or simulated for its whole life. The
//! kind comes from configuration and the two are never mixed.

use std::path::Path;
use std::sync::Arc;

use hourglass_protocol::address::Address;
use hourglass_protocol::config::{ClientConfig, GameBackendKind};
use hourglass_protocol::session::Session;

use crate::game::{GameError, GameRecord};
use crate::live::LiveDiceGame;
use crate::simulated::SimulatedDiceGame;
use crate::store::JsonFileStore;

/// One dice game client, live or simulated.
pub enum GameBackend {
    Live(LiveDiceGame),
    Simulated(SimulatedDiceGame),
}

impl GameBackend {
    /// Builds the backend `config.game_backend` names. The live backend
    /// needs the dice contract's address; the simulated one keeps its games
    /// in a JSON file at `store_path`.
    pub fn from_config(
        config: &ClientConfig,
        game_contract: Option<Address>,
        store_path: &Path,
    ) -> Result<Self, GameError> {
        match config.game_backend {
            GameBackendKind::Live => {
                let contract = game_contract.ok_or(GameError::NoGameContract)?;
                Ok(Self::Live(LiveDiceGame::new(contract, config)))
            }
            GameBackendKind::Simulated => Ok(Self::Simulated(SimulatedDiceGame::new(Arc::new(
                JsonFileStore::new(store_path),
            )))),
        }
    }

    pub fn kind(&self) -> GameBackendKind {
        match self {
            Self::Live(_) => GameBackendKind::Live,
            Self::Simulated(_) => GameBackendKind::Simulated,
        }
    }

    pub async fn create_game(&self, session: &Session, stake: &str) -> Result<u64, GameError> {
        match self {
            Self::Live(game) => game.create_game(session, stake).await,
            Self::Simulated(game) => game.create_game(session, stake),
        }
    }

    pub async fn join_game(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        match self {
            Self::Live(game) => game.join_game(session, game_id).await,
            Self::Simulated(game) => game.join_game(session, game_id),
        }
    }

    pub async fn play_game(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        match self {
            Self::Live(game) => game.play_game(session, game_id).await,
            Self::Simulated(game) => game.play_game(session, game_id),
        }
    }

    pub async fn view_game(
        &self,
        session: &Session,
        game_id: u64,
    ) -> Result<Option<GameRecord>, GameError> {
        match self {
            Self::Live(game) => game.view_game(session, game_id).await,
            Self::Simulated(game) => game.view_game(session, game_id),
        }
    }

    pub async fn my_games(&self, session: &Session) -> Result<Vec<GameRecord>, GameError> {
        match self {
            Self::Live(game) => game.my_games(session).await,
            Self::Simulated(game) => game.my_games(session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: GameBackendKind) -> ClientConfig {
        ClientConfig {
            game_backend: kind,
            ..ClientConfig::testnet(Address::Contract([1u8; 32]))
        }
    }

    #[test]
    fn configuration_picks_the_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");

        let sim = GameBackend::from_config(&config(GameBackendKind::Simulated), None, &path).unwrap();
        assert_eq!(sim.kind(), GameBackendKind::Simulated);

        let live = GameBackend::from_config(
            &config(GameBackendKind::Live),
            Some(Address::Contract([2u8; 32])),
            &path,
        )
        .unwrap();
        assert_eq!(live.kind(), GameBackendKind::Live);
    }

    #[test]
    fn live_backend_requires_a_contract() {
        let result = GameBackend::from_config(
            &config(GameBackendKind::Live),
            None,
            Path::new("games.json"),
        );
        assert!(matches!(result, Err(GameError::NoGameContract)));
    }
}
