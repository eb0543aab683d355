//! The live dice backend: every game operation is a call to the deployed
//! dice contract through the transaction [`Workflow`].
//!
//! Writes are signed submissions carrying [`GAME_FEE`]. Reads are
//! simulations. The contract answers `view_game` for an unknown id with a
//! record whose `game_id` is 0, which is how "no such game" is detected.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use hourglass_protocol::address::Address;
use hourglass_protocol::config::{ClientConfig, GAME_FEE, MAX_GAME_SCAN};
use hourglass_protocol::schema::ContractSchema;
use hourglass_protocol::session::Session;
use hourglass_protocol::value::{ScValue, ValueError};
use hourglass_protocol::workflow::{FinalityPoller, Invocation, Workflow};

use crate::game::{GameError, GameRecord};
use crate::simulated::parse_stake;

/// Dice games on the ledger.
#[derive(Debug, Clone)]
pub struct LiveDiceGame {
    workflow: Workflow,
}

impl LiveDiceGame {
    /// A client for the dice contract at `contract`.
    pub fn new(contract: Address, config: &ClientConfig) -> Self {
        Self {
            workflow: Workflow::new(contract, ContractSchema::dice_game(), config),
        }
    }

    pub fn with_poller(mut self, poller: FinalityPoller) -> Self {
        self.workflow = self.workflow.with_poller(poller);
        self
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.workflow = self.workflow.with_cancel(cancel);
        self
    }

    pub fn contract(&self) -> &Address {
        self.workflow.contract()
    }

    /// Opens a game and returns the id the contract assigned.
    pub async fn create_game(&self, session: &Session, stake: &str) -> Result<u64, GameError> {
        let player1 = session.identity()?;
        let stake = parse_stake(stake)?;

        let call = Invocation::new("create_game")
            .arg(player1)
            .arg(stake)
            .fee(GAME_FEE);
        let confirmation = self.workflow.submit(session, call).await?;

        let game_id: u64 = confirmation
            .return_value
            .as_ref()
            .ok_or_else(|| ValueError::MissingField("return value of create_game".into()))?
            .decode()?;
        info!(game_id, stake, ledger = confirmation.ledger, "game created");
        Ok(game_id)
    }

    pub async fn join_game(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        let player2 = session.identity()?;
        let call = Invocation::new("join_game")
            .arg(game_id)
            .arg(player2)
            .fee(GAME_FEE);
        self.workflow.submit(session, call).await?;
        info!(game_id, "joined game");
        self.required(session, game_id).await
    }

    /// Plays a game and returns it settled.
    pub async fn play_game(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        session.identity()?;
        let call = Invocation::new("play_game").arg(game_id).fee(GAME_FEE);
        let confirmation = self.workflow.submit(session, call).await?;

        if let Some(winner) = &confirmation.return_value {
            debug!(game_id, winner = ?winner, "play_game returned a winner");
        }
        self.required(session, game_id).await
    }

    /// The game with `game_id`, or `None` when the contract has no such game.
    pub async fn view_game(&self, session: &Session, game_id: u64) -> Result<Option<GameRecord>, GameError> {
        session.identity()?;
        self.fetch(session, game_id).await
    }

    /// Games the connected account plays in. Ids are scanned upward from 1
    /// and the scan stops at the first id the contract does not know. A game
    /// that fails to load is logged and skipped.
    pub async fn my_games(&self, session: &Session) -> Result<Vec<GameRecord>, GameError> {
        let me = session.identity()?;
        let mut games = Vec::new();
        for game_id in 1..=MAX_GAME_SCAN {
            match self.fetch(session, game_id).await {
                Ok(Some(game)) if game.involves(&me) => games.push(game),
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(err) => {
                    warn!(game_id, error = %err, "failed to load game, skipping");
                }
            }
        }
        Ok(games)
    }

    async fn fetch(&self, session: &Session, game_id: u64) -> Result<Option<GameRecord>, GameError> {
        let value = self
            .workflow
            .simulate(session, Invocation::new("view_game").arg(game_id))
            .await?;
        let Some(value) = value else {
            return Ok(None);
        };
        let game: GameRecord = value.decode()?;
        Ok((game.game_id != 0).then_some(game))
    }

    async fn required(&self, session: &Session, game_id: u64) -> Result<GameRecord, GameError> {
        self.fetch(session, game_id)
            .await?
            .ok_or(GameError::NotFound(game_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Participant;
    use hourglass_protocol::address::Network;
    use hourglass_protocol::config::TESTNET_PASSPHRASE;
    use hourglass_protocol::ledger::TransactionStatus;
    use hourglass_protocol::testing::{ScriptedLedger, ScriptedWallet};
    use hourglass_protocol::ClientError;
    use std::sync::Arc;

    fn config() -> ClientConfig {
        ClientConfig::testnet(Address::Contract([1u8; 32]))
    }

    fn live() -> LiveDiceGame {
        LiveDiceGame::new(Address::Contract([6u8; 32]), &config())
    }

    fn record(id: u64, player1: &Address, player2: ScValue, winner: &str, done: bool) -> ScValue {
        ScValue::record([
            ("game_id", ScValue::U64(id)),
            ("player1", ScValue::Address(player1.clone())),
            ("player2", player2),
            ("stake_amount", ScValue::i128(10_000_000)),
            ("player1_roll", ScValue::U64(if done { 9 } else { 0 })),
            ("player2_roll", ScValue::U64(if done { 4 } else { 0 })),
            ("winner", ScValue::from(winner)),
            ("is_completed", ScValue::Bool(done)),
        ])
    }

    fn missing() -> ScValue {
        record(0, &Address::Account([0u8; 32]), ScValue::from("none"), "none", false)
    }

    async fn connected(ledger: &Arc<ScriptedLedger>) -> (Session, Address) {
        let wallet = Arc::new(ScriptedWallet::new(Network::new(TESTNET_PASSPHRASE)));
        let me = wallet.address();
        ledger.add_account(me.clone(), 7);
        let session = Session::new(ledger.clone(), Some(wallet));
        session.connect().await.unwrap();
        (session, me)
    }

    #[tokio::test(start_paused = true)]
    async fn create_reads_the_id_from_the_return_value() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("create_game", |_| Ok(Some(ScValue::U64(12))));
        ledger.push_status(Ok(TransactionStatus::Success {
            return_value: Some(ScValue::U64(12)),
            ledger: 3,
        }));
        let (session, me) = connected(&ledger).await;

        assert_eq!(live().create_game(&session, "1.5").await.unwrap(), 12);

        let sent = ledger.submitted();
        assert_eq!(sent[0].fee, u64::from(GAME_FEE) + ScriptedLedger::RESOURCES.min_resource_fee);
        let args = sent[0].operation.args();
        assert_eq!(args[0], ScValue::Address(me));
        assert_eq!(args[1].as_i128(), Some(15_000_000));
    }

    #[tokio::test]
    async fn view_treats_id_zero_as_missing() {
        let ledger = Arc::new(ScriptedLedger::new());
        ledger.on_simulate("view_game", |_| Ok(Some(missing())));
        let (session, _) = connected(&ledger).await;

        assert_eq!(live().view_game(&session, 40).await.unwrap(), None);
    }

    #[tokio::test]
    async fn my_games_scans_until_the_first_gap() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (session, me) = connected(&ledger).await;
        let other = Address::Account([4u8; 32]);
        ledger.on_simulate("view_game", move |args| {
            Ok(Some(match args.first() {
                Some(ScValue::U64(1)) => record(1, &me, ScValue::from("pending"), "none", false),
                Some(ScValue::U64(2)) => record(2, &other, ScValue::from("pending"), "none", false),
                Some(ScValue::U64(3)) => record(3, &other, ScValue::Address(me.clone()), "tie", true),
                _ => missing(),
            }))
        });

        let games = live().my_games(&session).await.unwrap();
        let ids: Vec<u64> = games.iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(games[1].winner, Participant::Tie);
        assert_eq!(ledger.simulated().len(), 4);
    }

    #[tokio::test]
    async fn one_failing_game_does_not_abort_the_listing() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (session, me) = connected(&ledger).await;
        let other = Address::Account([4u8; 32]);
        ledger.on_simulate("view_game", move |args| match args.first() {
            Some(ScValue::U64(1)) => Ok(Some(record(1, &me, ScValue::from("pending"), "none", false))),
            Some(ScValue::U64(2)) => Err("HostError: storage read failed".into()),
            Some(ScValue::U64(3)) => Ok(Some(record(3, &other, ScValue::Address(me.clone()), "tie", true))),
            _ => Ok(Some(missing())),
        });

        let games = live().my_games(&session).await.unwrap();
        let ids: Vec<u64> = games.iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(ledger.simulated().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn play_returns_the_settled_game() {
        let ledger = Arc::new(ScriptedLedger::new());
        let (session, me) = connected(&ledger).await;
        let bob = Address::Account([5u8; 32]);
        ledger.on_simulate("play_game", |_| Ok(None));
        let winner = me.to_string();
        ledger.on_simulate("view_game", move |_| {
            Ok(Some(record(2, &me, ScValue::Address(bob.clone()), &winner, true)))
        });
        ledger.push_status(Ok(TransactionStatus::Success {
            return_value: None,
            ledger: 8,
        }));

        let game = live().play_game(&session, 2).await.unwrap();
        assert!(game.is_completed);
        assert_eq!((game.player1_roll, game.player2_roll), (9, 4));
        assert!(matches!(game.winner, Participant::Player(_)));
    }

    #[tokio::test]
    async fn games_need_a_connection() {
        let ledger = Arc::new(ScriptedLedger::new());
        let session = Session::new(ledger.clone(), None);

        let err = live().view_game(&session, 1).await.unwrap_err();
        assert!(matches!(err, GameError::Client(ClientError::NotConnected)));
        assert_eq!(ledger.call_count(), 0);
    }
}
