//! An agent that plays from a solved lookup table.

use crate::error::{InconsistencyError, LutError};
use crate::lut::{StateLUT, light_win_probability};
use crate::store::BigEntryStore;
use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::sync::Arc;
use strictly_ur::{Agent, ConfigError, GameState, Move, Player, RuleSet, WaitingForMove};
use tracing::{debug, instrument};

/// Picks the move whose successor has the best solved value for the mover.
///
/// The table and store are shared, so many agents on many threads can read
/// one loaded store.
#[derive(Debug, Clone)]
pub struct LutAgent {
    name: String,
    rules: RuleSet,
    lut: Arc<StateLUT>,
    store: Arc<BigEntryStore>,
}

impl LutAgent {
    /// Creates an agent for `rules`.
    ///
    /// Fails if the table or the store was built for another variant.
    #[instrument(skip_all, fields(name = %name.as_ref()))]
    pub fn new(
        name: impl AsRef<str>,
        rules: RuleSet,
        lut: Arc<StateLUT>,
        store: Arc<BigEntryStore>,
    ) -> Result<Self, LutError> {
        if lut.settings() != rules.settings() {
            return Err(ConfigError::new(format!(
                "The lookup table was built for {} on {} paths, the game plays {} on {} paths",
                lut.settings().board(),
                lut.settings().paths(),
                rules.settings().board(),
                rules.settings().paths()
            ))
            .into());
        }
        lut.check_header(&store.header())?;
        Ok(Self {
            name: name.as_ref().to_string(),
            rules,
            lut,
            store,
        })
    }

    /// Probability that `mover` wins after making `mv`.
    fn value_after(&self, state: &WaitingForMove, mv: &Move) -> Result<f64, LutError> {
        let mover = state.position().turn();
        let next = self
            .rules
            .apply_move(state, mv)
            .map_err(|e| InconsistencyError::new(e.message))?
            .pop()
            .ok_or_else(|| InconsistencyError::new("Move produced no state"))?;

        let light_wins = match &next {
            GameState::Win(win) => {
                if win.winner() == Player::Light {
                    1.0
                } else {
                    0.0
                }
            }
            other => {
                let key = self.lut.encode(other.position())?;
                let value = self.store.lookup(key).ok_or_else(|| {
                    InconsistencyError::new(format!(
                        "Reachable state with key {} is missing from the store",
                        key
                    ))
                })?;
                light_win_probability(value)
            }
        };
        Ok(match mover {
            Player::Light => light_wins,
            Player::Dark => 1.0 - light_wins,
        })
    }

    /// Checks the offered moves are the ones these rules generate.
    fn check_offered(&self, state: &WaitingForMove, moves: &[Move]) -> Result<(), LutError> {
        let position = state.position();
        let generated = self
            .rules
            .find_available_moves(position.board(), position.turn_player(), state.roll())
            .map_err(|e| InconsistencyError::new(e.message))?;
        let generated: HashSet<&Move> = generated.iter().collect();
        let offered: HashSet<&Move> = moves.iter().collect();
        if generated != offered {
            return Err(ConfigError::new(format!(
                "The lookup table's rules offer {} moves where the game offers {}",
                generated.len(),
                offered.len()
            ))
            .into());
        }
        Ok(())
    }
}

impl Agent for LutAgent {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, state, moves), fields(agent = %self.name, moves = moves.len()))]
    fn decide_move(&mut self, state: &WaitingForMove, moves: &[Move]) -> Result<Move> {
        self.check_offered(state, moves)?;
        let mut best: Option<(Move, f64)> = None;
        for mv in moves {
            let value = self.value_after(state, mv)?;
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((*mv, value));
            }
        }
        let (mv, value) = best.ok_or_else(|| anyhow!("No moves to choose from"))?;
        debug!(%mv, win_probability = value, "Table move chosen");
        Ok(mv)
    }
}
