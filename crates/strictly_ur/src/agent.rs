//! Pluggable move selection.
//!
//! An [`Agent`] is handed a `WaitingForMove` state together with the moves
//! the rules offered and must return one of those moves.

use crate::action::Move;
use crate::rules::RuleSet;
use crate::types::Player;
use crate::typestate::{GameState, Position, WaitingForMove};
use anyhow::{Result, anyhow};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

/// Anything that can pick a move.
pub trait Agent {
    /// Display name used in logs.
    fn name(&self) -> &str;

    /// Picks one of `moves`. Must never return a move outside `moves`.
    fn decide_move(&mut self, state: &WaitingForMove, moves: &[Move]) -> Result<Move>;
}

// ─────────────────────────────────────────────────────────────
//  Random
// ─────────────────────────────────────────────────────────────

/// Picks uniformly among the offered moves.
#[derive(Debug, Clone)]
pub struct RandomAgent<R> {
    name: String,
    rng: R,
}

impl<R: Rng> RandomAgent<R> {
    /// Creates a random agent driven by `rng`.
    pub fn new(name: impl Into<String>, rng: R) -> Self {
        Self {
            name: name.into(),
            rng,
        }
    }
}

impl<R: Rng> Agent for RandomAgent<R> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, _state, moves), fields(agent = %self.name, moves = moves.len()))]
    fn decide_move(&mut self, _state: &WaitingForMove, moves: &[Move]) -> Result<Move> {
        moves
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| anyhow!("No moves to choose from"))
    }
}

// ─────────────────────────────────────────────────────────────
//  Greedy
// ─────────────────────────────────────────────────────────────

/// Scores a position from Light's point of view. Higher is better for Light.
pub trait UtilityFunction {
    /// Utility of a position that is not yet won.
    fn score(&self, rules: &RuleSet, position: &Position) -> f64;
}

/// Difference between the players' progress along their paths.
///
/// A scored piece counts as a full path; a piece on the board counts the
/// tiles it has covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiecesAdvancedUtility;

impl PiecesAdvancedUtility {
    fn progress(rules: &RuleSet, position: &Position, player: Player) -> f64 {
        let path_len = rules.paths().get(player).len() as f64;
        let scored = f64::from(position.player(player).score()) * path_len;
        let on_board: f64 = position
            .board()
            .pieces()
            .filter(|(_, piece)| piece.owner == player)
            .map(|(_, piece)| f64::from(piece.path_index) + 1.0)
            .sum();
        scored + on_board
    }
}

impl UtilityFunction for PiecesAdvancedUtility {
    fn score(&self, rules: &RuleSet, position: &Position) -> f64 {
        Self::progress(rules, position, Player::Light) - Self::progress(rules, position, Player::Dark)
    }
}

/// Picks the move whose resulting position has the best utility for the mover.
#[derive(Debug, Clone)]
pub struct GreedyAgent<U> {
    name: String,
    rules: RuleSet,
    utility: U,
}

impl<U: UtilityFunction> GreedyAgent<U> {
    /// Creates a greedy agent for `rules`.
    pub fn new(name: impl Into<String>, rules: RuleSet, utility: U) -> Self {
        Self {
            name: name.into(),
            rules,
            utility,
        }
    }

    fn evaluate(&self, state: &WaitingForMove, mv: &Move) -> Result<f64> {
        let mover = state.position().turn();
        let next = self
            .rules
            .apply_move(state, mv)?
            .pop()
            .ok_or_else(|| anyhow!("Move produced no state"))?;
        let light_utility = match &next {
            GameState::Win(win) if win.winner() == Player::Light => f64::INFINITY,
            GameState::Win(_) => f64::NEG_INFINITY,
            other => self.utility.score(&self.rules, other.position()),
        };
        Ok(match mover {
            Player::Light => light_utility,
            Player::Dark => -light_utility,
        })
    }
}

impl<U: UtilityFunction> Agent for GreedyAgent<U> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, state, moves), fields(agent = %self.name, moves = moves.len()))]
    fn decide_move(&mut self, state: &WaitingForMove, moves: &[Move]) -> Result<Move> {
        let mut best: Option<(Move, f64)> = None;
        for mv in moves {
            let utility = self.evaluate(state, mv)?;
            if best.is_none_or(|(_, best_utility)| utility > best_utility) {
                best = Some((*mv, utility));
            }
        }
        let (mv, utility) = best.ok_or_else(|| anyhow!("No moves to choose from"))?;
        debug!(%mv, utility, "Greedy move chosen");
        Ok(mv)
    }
}
