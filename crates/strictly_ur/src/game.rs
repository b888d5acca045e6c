//! A game and its linear history of states.
//!
//! A [`Game`] is advanced by exactly one caller at a time; independent games
//! share nothing and can be played on separate threads.

use crate::action::Move;
use crate::agent::Agent;
use crate::dice::{Dice, Roll};
use crate::error::InvariantViolation;
use crate::rules::RuleSet;
use crate::types::Player;
use crate::typestate::GameState;
use anyhow::{Result, anyhow};
use tracing::{debug, info, instrument};

/// A game driven by a rule set.
#[derive(Debug, Clone)]
pub struct Game {
    rules: RuleSet,
    history: Vec<GameState>,
}

impl Game {
    /// Starts a game at the rules' initial state.
    #[instrument(skip(rules))]
    pub fn new(rules: RuleSet) -> Self {
        let initial = rules.generate_initial_game_state();
        Self {
            rules,
            history: vec![initial],
        }
    }

    /// The rules of this game.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The most recent state.
    pub fn current_state(&self) -> &GameState {
        // The history always holds the initial state.
        &self.history[self.history.len() - 1]
    }

    /// Every state the game has passed through, oldest first.
    pub fn history(&self) -> &[GameState] {
        &self.history
    }

    /// Returns true if the game has been won.
    pub fn is_finished(&self) -> bool {
        self.current_state().is_finished()
    }

    /// The winner, if the game is over.
    pub fn winner(&self) -> Option<Player> {
        match self.current_state() {
            GameState::Win(win) => Some(win.winner()),
            _ => None,
        }
    }

    /// Whose turn it is, or who won.
    pub fn turn_or_winner(&self) -> Player {
        self.current_state().turn()
    }

    /// Applies a roll to a game waiting for one.
    #[instrument(skip(self), fields(turn = ?self.turn_or_winner()))]
    pub fn roll(&mut self, roll: Roll) -> Result<(), InvariantViolation> {
        let GameState::WaitingForRoll(state) = self.current_state() else {
            return Err(InvariantViolation::new(format!(
                "Cannot roll in this state: {}",
                self.current_state().describe()
            )));
        };
        let states = self.rules.apply_roll(state, roll)?;
        self.history.extend(states);
        Ok(())
    }

    /// Throws `dice` and applies the roll.
    pub fn roll_dice(&mut self, dice: &mut dyn Dice) -> Result<Roll, InvariantViolation> {
        let roll = dice.roll();
        self.roll(roll)?;
        Ok(roll)
    }

    /// Applies a move to a game waiting for one.
    #[instrument(skip(self, mv), fields(turn = ?self.turn_or_winner(), mv = %mv))]
    pub fn make_move(&mut self, mv: &Move) -> Result<(), InvariantViolation> {
        let GameState::WaitingForMove(state) = self.current_state() else {
            return Err(InvariantViolation::new(format!(
                "Cannot move in this state: {}",
                self.current_state().describe()
            )));
        };
        let states = self.rules.apply_move(state, mv)?;
        self.history.extend(states);
        if let Some(winner) = self.winner() {
            info!(?winner, states = self.history.len(), "Game finished");
        }
        Ok(())
    }

    /// Advances the game by one input: a dice roll or an agent's move.
    ///
    /// Does nothing once the game is won.
    pub fn play_turn(
        &mut self,
        light: &mut dyn Agent,
        dark: &mut dyn Agent,
        dice: &mut dyn Dice,
    ) -> Result<()> {
        match self.current_state() {
            GameState::WaitingForRoll(_) => {
                self.roll_dice(dice)?;
            }
            GameState::WaitingForMove(state) => {
                let agent: &mut dyn Agent = match state.position().turn() {
                    Player::Light => light,
                    Player::Dark => dark,
                };
                let mv = agent.decide_move(state, state.moves())?;
                if !state.moves().contains(&mv) {
                    return Err(anyhow!("{} chose a move that was not offered: {}", agent.name(), mv));
                }
                debug!(agent = agent.name(), %mv, "Agent moved");
                self.make_move(&mv)?;
            }
            GameState::Win(_) => {}
            GameState::Rolled(_) | GameState::Moved(_) => {
                return Err(anyhow!("History ends in a non-playable state"));
            }
        }
        Ok(())
    }
}

/// Plays `game` to the end with two agents and returns the winner.
#[instrument(skip_all, fields(light = light.name(), dark = dark.name()))]
pub fn play_autonomously(
    game: &mut Game,
    light: &mut dyn Agent,
    dark: &mut dyn Agent,
    dice: &mut dyn Dice,
) -> Result<Player> {
    loop {
        if let Some(winner) = game.winner() {
            return Ok(winner);
        }
        game.play_turn(light, dark, dice)?;
    }
}
