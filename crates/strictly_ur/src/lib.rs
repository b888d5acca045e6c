//! Rule engine for the Royal Game of Ur.
//!
//! The engine is an immutable state machine: a [`RuleSet`] turns a state and
//! an input (a roll or a move) into the chain of states that follow it.
//!
//! # Architecture
//!
//! - **Model**: [`Tile`], [`Piece`], [`PlayerState`], [`Board`] over a [`BoardShape`]
//! - **Variants**: [`GameSettings`] names a [`BoardType`], a [`PathType`] and the rule flags
//! - **Rules**: [`RuleSet`] generates [`Move`]s and applies rolls and moves
//! - **States**: [`GameState`] tags the typestate phases
//! - **Agents**: [`Agent`] picks one of the offered moves
//!
//! # Example
//!
//! ```
//! use strictly_ur::{Game, GameSettings, RandomAgent, RuleSet, play_autonomously};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn example() -> anyhow::Result<()> {
//! let rules = RuleSet::new(GameSettings::finkel())?;
//! let mut dice = rules.create_dice(StdRng::seed_from_u64(1));
//! let mut game = Game::new(rules);
//! let mut light = RandomAgent::new("light", StdRng::seed_from_u64(2));
//! let mut dark = RandomAgent::new("dark", StdRng::seed_from_u64(3));
//! let winner = play_autonomously(&mut game, &mut light, &mut dark, &mut dice)?;
//! println!("{} won", winner);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod agent;
mod board;
mod dice;
mod error;
mod game;
mod path;
mod rules;
mod settings;
mod shape;
mod types;
mod typestate;

pub mod contracts;
pub mod invariants;

pub use action::Move;
pub use agent::{Agent, GreedyAgent, PiecesAdvancedUtility, RandomAgent, UtilityFunction};
pub use board::Board;
pub use dice::{BinaryDice, Dice, MAX_DICE, Roll, ScriptedDice};
pub use error::{ConfigError, InvariantViolation, UrError};
pub use game::{Game, play_autonomously};
pub use path::{Path, PathPair, PathType};
pub use rules::RuleSet;
pub use settings::GameSettings;
pub use shape::{BoardShape, BoardType};
pub use types::{Piece, Player, PlayerState, Tile};
pub use typestate::{GameState, Moved, Position, Rolled, WaitingForMove, WaitingForRoll, Win};
