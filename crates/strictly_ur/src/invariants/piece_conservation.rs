//! Piece conservation: no piece is ever created or destroyed.

use super::Invariant;
use crate::rules::RuleSet;
use crate::types::Player;
use crate::typestate::Position;
use strum::IntoEnumIterator;

/// Invariant: for each player, waiting + on board + scored equals the
/// variant's starting piece count.
pub struct PieceConservationInvariant;

impl Invariant<Position> for PieceConservationInvariant {
    fn holds(rules: &RuleSet, position: &Position) -> bool {
        let total = usize::from(*rules.settings().starting_pieces());
        Player::iter().all(|player| {
            let state = position.player(player);
            let on_board = position.board().count_pieces(player);
            usize::from(state.pieces()) + usize::from(state.score()) + on_board == total
        })
    }

    fn description() -> &'static str {
        "Waiting, on-board and scored pieces add up to the starting pieces"
    }
}
