//! Integration tests for the simulated dice backend.
//!
//! A full game is played by two sessions through [`GameBackend`], with the
//! store on disk so that state survives between backend instances the way
//! it does between CLI invocations.

use std::path::Path;
use std::sync::Arc;

use hourglass_contracts::render::{render_games, NO_GAMES};
use hourglass_contracts::{GameBackend, GameError, GameStatus, Participant};
use hourglass_protocol::address::{Address, Network};
use hourglass_protocol::config::{ClientConfig, GameBackendKind, TESTNET_PASSPHRASE};
use hourglass_protocol::session::Session;
use hourglass_protocol::testing::{ScriptedLedger, ScriptedWallet};

/// Helper: a fresh backend over the store at `path`.
fn backend(path: &Path) -> GameBackend {
    let config = ClientConfig {
        game_backend: GameBackendKind::Simulated,
        ..ClientConfig::testnet(Address::Contract([1u8; 32]))
    };
    GameBackend::from_config(&config, None, path).unwrap()
}

async fn player() -> (Session, Address) {
    let wallet = Arc::new(ScriptedWallet::new(Network::new(TESTNET_PASSPHRASE)));
    let address = wallet.address();
    let session = Session::new(Arc::new(ScriptedLedger::new()), Some(wallet));
    session.connect().await.unwrap();
    (session, address)
}

#[tokio::test]
async fn game_state_survives_between_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("games.json");
    let (alice, alice_addr) = player().await;
    let (bob, bob_addr) = player().await;

    let id = backend(&path).create_game(&alice, "3").await.unwrap();
    assert_eq!(id, 1);

    let joined = backend(&path).join_game(&bob, id).await.unwrap();
    assert_eq!(joined.status(), GameStatus::Active);
    assert_eq!(joined.player2, Participant::Player(bob_addr.clone()));

    let played = backend(&path).play_game(&alice, id).await.unwrap();
    assert!(played.is_completed);
    assert!((2..=12).contains(&played.player1_roll));
    assert!((2..=12).contains(&played.player2_roll));
    match &played.winner {
        Participant::Tie => assert_eq!(played.player1_roll, played.player2_roll),
        Participant::Player(winner) => assert!(winner == &alice_addr || winner == &bob_addr),
        other => panic!("unexpected winner {other:?}"),
    }

    let again = backend(&path).play_game(&bob, id).await.unwrap_err();
    assert!(matches!(again, GameError::AlreadyCompleted(1)));

    let stored = backend(&path).view_game(&bob, id).await.unwrap().unwrap();
    assert_eq!(stored, played);
}

#[tokio::test]
async fn listing_only_shows_the_players_games() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("games.json");
    let (alice, alice_addr) = player().await;
    let (bob, _) = player().await;
    let (carol, _) = player().await;

    let games = backend(&path);
    games.create_game(&alice, "1").await.unwrap();
    games.create_game(&bob, "2").await.unwrap();
    games.create_game(&alice, "0.5").await.unwrap();

    let mine = games.my_games(&alice).await.unwrap();
    assert_eq!(mine.iter().map(|g| g.game_id).collect::<Vec<_>>(), vec![1, 3]);
    assert!(render_games(&mine, Some(&alice_addr)).contains("Player 1: you"));

    let none = games.my_games(&carol).await.unwrap();
    assert_eq!(render_games(&none, None).trim(), NO_GAMES);
}
