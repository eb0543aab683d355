//! Plain-text rendering of dice games.

use std::fmt::Write;

use hourglass_protocol::address::{short_address, Address};
use hourglass_protocol::amount::format_major;

use crate::game::{GameRecord, GameStatus, Participant};

pub const NO_GAMES: &str = "No games found. Create or join a game to get started!";

fn who(participant: &Participant, me: Option<&Address>) -> String {
    match (participant, me) {
        (Participant::Player(address), Some(me)) if address == me => "you".to_string(),
        (p, _) => short_address(&p.to_string()),
    }
}

/// One game. `me` marks the viewer's own seat and outcome.
pub fn render_game(game: &GameRecord, me: Option<&Address>) -> String {
    let mut out = String::new();
    let player1 = Participant::Player(game.player1.clone());

    let _ = writeln!(out, "Game #{} [{}]", game.game_id, game.status());
    let _ = writeln!(out, "  Stake:    {}", format_major(game.stake));
    let _ = writeln!(out, "  Player 1: {}", who(&player1, me));
    let _ = writeln!(out, "  Player 2: {}", who(&game.player2, me));

    if game.status() == GameStatus::Completed {
        let _ = writeln!(out, "  Rolls:    {} vs {}", game.player1_roll, game.player2_roll);
        let outcome = match (&game.winner, me) {
            (Participant::Tie, _) => "It's a tie!".to_string(),
            (winner, Some(me)) if winner.is(me) => "You won!".to_string(),
            (_, Some(me)) if game.involves(me) => "You lost.".to_string(),
            (winner, _) => format!("Winner: {}", who(winner, None)),
        };
        let _ = writeln!(out, "  {outcome}");
    }
    out
}

pub fn render_games(games: &[GameRecord], me: Option<&Address>) -> String {
    if games.is_empty() {
        return format!("{NO_GAMES}\n");
    }
    games
        .iter()
        .map(|game| render_game(game, me))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::Account([1u8; 32])
    }

    fn played(p1: u64, p2: u64) -> GameRecord {
        let mut game = GameRecord::new(3, alice(), 10_000_000);
        game.player2 = Participant::Player(Address::Account([2u8; 32]));
        game.settle(p1, p2);
        game
    }

    #[test]
    fn empty_list_has_an_explicit_message() {
        assert_eq!(render_games(&[], None).trim(), NO_GAMES);
    }

    #[test]
    fn pending_game_shows_the_sentinel() {
        let text = render_game(&GameRecord::new(1, alice(), 5_000_000), None);
        assert!(text.contains("Game #1 [pending]"));
        assert!(text.contains("Player 2: pending"));
        assert!(text.contains("0.5000000"));
        assert!(!text.contains("Rolls"));
    }

    #[test]
    fn outcome_is_told_from_the_viewer_side() {
        let me = alice();
        assert!(render_game(&played(10, 4), Some(&me)).contains("You won!"));
        assert!(render_game(&played(2, 4), Some(&me)).contains("You lost."));
        assert!(render_game(&played(7, 7), Some(&me)).contains("It's a tie!"));
        assert!(render_game(&played(10, 4), None).contains("Winner: "));
    }
}
