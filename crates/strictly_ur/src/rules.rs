//! Move generation and state transitions.
//!
//! A [`RuleSet`] is stateless: every operation takes immutable inputs and
//! returns new values, so one rule set can drive any number of games on
//! any number of threads.

use crate::action::Move;
use crate::board::Board;
use crate::contracts::{Contract, MoveContract};
use crate::dice::{BinaryDice, MAX_DICE, Roll};
use crate::error::{ConfigError, InvariantViolation};
use crate::path::PathPair;
use crate::settings::GameSettings;
use crate::shape::BoardShape;
use crate::types::{Piece, Player, PlayerState, Tile};
use crate::typestate::{GameState, Moved, Position, Rolled, WaitingForMove, WaitingForRoll, Win};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// The rules of one variant of the Royal Game of Ur.
#[derive(Debug, Clone)]
pub struct RuleSet {
    settings: GameSettings,
    shape: Arc<BoardShape>,
    paths: Arc<PathPair>,
}

impl RuleSet {
    /// Builds the rules for a variant.
    ///
    /// Fails if the variant's paths leave its board shape.
    #[instrument]
    pub fn new(settings: GameSettings) -> Result<Self, ConfigError> {
        let shape = settings.board().create_shape()?;
        let paths = settings.paths().create_paths()?;
        if !shape.is_compatible(&paths) {
            return Err(ConfigError::new(format!(
                "The {} paths are not compatible with the {} board shape",
                paths.name(),
                shape.name()
            )));
        }
        if *settings.starting_pieces() == 0 {
            return Err(ConfigError::new("At least one starting piece is required"));
        }
        if !(1..=MAX_DICE).contains(settings.dice_count()) {
            return Err(ConfigError::new(format!(
                "Between 1 and {} dice are required, not {}",
                MAX_DICE,
                settings.dice_count()
            )));
        }
        debug!(
            board = %settings.board(),
            paths = %settings.paths(),
            pieces = settings.starting_pieces(),
            "Rule set created"
        );
        Ok(Self {
            settings,
            shape: Arc::new(shape),
            paths: Arc::new(paths),
        })
    }

    /// The variant settings.
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The board shape.
    pub fn shape(&self) -> &BoardShape {
        &self.shape
    }

    /// The paths of both players.
    pub fn paths(&self) -> &PathPair {
        &self.paths
    }

    /// Dice matching the variant, driven by `rng`.
    pub fn create_dice<R: Rng>(&self, rng: R) -> BinaryDice<R> {
        BinaryDice::new(*self.settings.dice_count(), rng)
    }

    /// Empty board, all pieces waiting, light to roll.
    #[instrument(skip(self))]
    pub fn generate_initial_game_state(&self) -> GameState {
        let pieces = *self.settings.starting_pieces();
        let board = Board::new(Arc::clone(&self.shape));
        WaitingForRoll::new(Position::initial(board, pieces)).into()
    }

    /// Finds every move the player could make with the roll.
    ///
    /// The result is a set: its order carries no meaning.
    #[instrument(level = "trace", skip(self, board))]
    pub fn find_available_moves(
        &self,
        board: &Board,
        player: &PlayerState,
        roll: Roll,
    ) -> Result<Vec<Move>, InvariantViolation> {
        if roll == 0 {
            return Err(InvariantViolation::new(
                "The roll's value must be at least 1, not 0",
            ));
        }

        let mover = player.player();
        let path = self.paths.get(mover);
        let roll = usize::from(roll);
        let mut moves = Vec::new();

        // Introduce a piece from off the board.
        if player.pieces() > 0 && roll <= path.len() {
            if let Some(mv) = self.move_to(board, mover, None, roll - 1) {
                moves.push(mv);
            }
        }

        // Move pieces already on the board.
        for (index, tile) in path.tiles().iter().enumerate() {
            let Some(piece) = board.get(*tile) else {
                continue;
            };
            if piece.owner != mover || usize::from(piece.path_index) != index {
                continue;
            }

            let dest_index = index + roll;
            if dest_index > path.len() {
                continue;
            }
            if dest_index == path.len() {
                moves.push(Move::new(mover, Some((*tile, piece)), None, None));
                continue;
            }
            if let Some(mv) = self.move_to(board, mover, Some((*tile, piece)), dest_index) {
                moves.push(mv);
            }
        }

        trace!(moves = moves.len(), "Available moves found");
        Ok(moves)
    }

    /// Builds the move onto `path[dest_index]`, or `None` if that tile is blocked.
    fn move_to(
        &self,
        board: &Board,
        mover: Player,
        origin: Option<(Tile, Piece)>,
        dest_index: usize,
    ) -> Option<Move> {
        let dest = self.paths.get(mover).get(dest_index)?;
        let occupant = board.get(dest);
        if let Some(occupant) = occupant {
            // Can't capture your own pieces.
            if occupant.owner == mover {
                return None;
            }
            // Can't capture pieces on rosettes.
            if *self.settings.safe_rosettes() && self.shape.is_rosette(dest) {
                return None;
            }
        }
        let moved = Piece::new(mover, dest_index as u8);
        Some(Move::new(mover, origin, Some((dest, moved)), occupant))
    }

    /// Applies a roll, returning `[Rolled, next]`.
    ///
    /// `next` waits for a move if any exist, otherwise the turn passes.
    #[instrument(skip(self, state), fields(turn = ?state.position().turn()))]
    pub fn apply_roll(
        &self,
        state: &WaitingForRoll,
        roll: Roll,
    ) -> Result<Vec<GameState>, InvariantViolation> {
        let position = state.position();
        let rolled = Rolled::new(position.clone(), roll);

        // A zero passes the turn without looking at the board.
        if roll == 0 {
            debug!("Rolled zero, turn passes");
            let next = WaitingForRoll::new(position.with_turn(position.turn().opponent()));
            return Ok(vec![rolled.into(), next.into()]);
        }

        let moves = self.find_available_moves(position.board(), position.turn_player(), roll)?;
        if moves.is_empty() {
            debug!(roll, "No available moves, turn passes");
            let next = WaitingForRoll::new(position.with_turn(position.turn().opponent()));
            return Ok(vec![rolled.into(), next.into()]);
        }

        debug!(roll, moves = moves.len(), "Waiting for move");
        let next = WaitingForMove::new(position.clone(), roll, moves)?;
        Ok(vec![rolled.into(), next.into()])
    }

    /// Applies a move, returning `[Moved, next]`.
    ///
    /// `next` is a `Win` if the mover scored their last piece, otherwise a
    /// `WaitingForRoll` for whoever plays next.
    #[instrument(skip(self, state), fields(turn = ?state.position().turn()))]
    pub fn apply_move(
        &self,
        state: &WaitingForMove,
        mv: &Move,
    ) -> Result<Vec<GameState>, InvariantViolation> {
        MoveContract::pre(self, state, mv)?;

        let position = state.position();
        let turn = position.turn();
        let moved = Moved::new(position.clone(), state.roll(), *mv);

        let mut board = position.board().clone();
        mv.apply(&mut board)?;

        let mut turn_player = *position.turn_player();
        if mv.is_introducing() {
            turn_player = turn_player.with_pieces_change(-1)?;
        }
        if mv.is_scoring() {
            turn_player = turn_player.with_score_change(1)?;
        }

        let mut other_player = *position.waiting_player();
        if mv.captures() {
            other_player = other_player.with_pieces_change(1)?;
        }

        let (light, dark) = match turn {
            Player::Light => (turn_player, other_player),
            Player::Dark => (other_player, turn_player),
        };

        if mv.is_scoring() && turn_player.pieces() == 0 && board.count_pieces(turn) == 0 {
            let after = Position::new(board, light, dark, turn)?;
            #[cfg(debug_assertions)]
            MoveContract::post(self, state, &after)?;
            debug!(winner = ?turn, "Game won");
            return Ok(vec![moved.into(), Win::new(after).into()]);
        }

        let rosette_roll =
            *self.settings.rosettes_grant_extra_rolls() && mv.is_landing_on_rosette(&self.shape);
        let capture_roll = *self.settings.captures_grant_extra_rolls() && mv.captures();
        let next_turn = if rosette_roll || capture_roll {
            turn
        } else {
            turn.opponent()
        };

        let after = Position::new(board, light, dark, next_turn)?;
        #[cfg(debug_assertions)]
        MoveContract::post(self, state, &after)?;

        Ok(vec![moved.into(), WaitingForRoll::new(after).into()])
    }
}
