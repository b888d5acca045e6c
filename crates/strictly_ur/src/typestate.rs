//! Phase-specific typestate structs for the game.
//!
//! Each phase is its own type with phase-specific fields, and
//! [`GameState`] tags them for storage in a history. A `WaitingForMove`
//! state ALWAYS has at least one move; a `Win` always has a winner.
//!
//! Only [`WaitingForRoll`] and [`WaitingForMove`] are playable. [`Rolled`]
//! and [`Moved`] record what happened; [`Win`] is terminal.

use crate::action::Move;
use crate::board::Board;
use crate::dice::Roll;
use crate::error::InvariantViolation;
use crate::types::{Player, PlayerState};
use tracing::instrument;

// ─────────────────────────────────────────────────────────────
//  Shared position
// ─────────────────────────────────────────────────────────────

/// Board, both players and whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    light: PlayerState,
    dark: PlayerState,
    turn: Player,
}

impl Position {
    /// Creates a position, checking the player states belong to the right sides.
    pub fn new(
        board: Board,
        light: PlayerState,
        dark: PlayerState,
        turn: Player,
    ) -> Result<Self, InvariantViolation> {
        if light.player() != Player::Light || dark.player() != Player::Dark {
            return Err(InvariantViolation::new("Player states are swapped"));
        }
        Ok(Self {
            board,
            light,
            dark,
            turn,
        })
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Light's off-board state.
    pub fn light(&self) -> &PlayerState {
        &self.light
    }

    /// Dark's off-board state.
    pub fn dark(&self) -> &PlayerState {
        &self.dark
    }

    /// The player whose turn it is (or who won, in a `Win` state).
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Off-board state of a player.
    pub fn player(&self, player: Player) -> &PlayerState {
        match player {
            Player::Light => &self.light,
            Player::Dark => &self.dark,
        }
    }

    /// Off-board state of the player whose turn it is.
    pub fn turn_player(&self) -> &PlayerState {
        self.player(self.turn)
    }

    /// Off-board state of the player waiting for their turn.
    pub fn waiting_player(&self) -> &PlayerState {
        self.player(self.turn.opponent())
    }

    /// All pieces waiting, no score, light to play.
    pub(crate) fn initial(board: Board, pieces: u8) -> Self {
        Self {
            board,
            light: PlayerState::new(Player::Light, pieces, 0),
            dark: PlayerState::new(Player::Dark, pieces, 0),
            turn: Player::Light,
        }
    }

    pub(crate) fn with_turn(&self, turn: Player) -> Self {
        Self {
            turn,
            ..self.clone()
        }
    }
}

fn side(player: Player) -> String {
    player.to_string().to_lowercase()
}

// ─────────────────────────────────────────────────────────────
//  Phases
// ─────────────────────────────────────────────────────────────

/// Waiting for the current player to roll the dice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaitingForRoll {
    position: Position,
}

impl WaitingForRoll {
    /// Creates the state.
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    /// Board, players and turn.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Narration for diagnostics.
    pub fn describe(&self) -> String {
        format!("Waiting for the {} player to roll the dice.", side(self.position.turn))
    }
}

/// The current player has rolled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rolled {
    position: Position,
    roll: Roll,
}

impl Rolled {
    /// Creates the state.
    pub fn new(position: Position, roll: Roll) -> Self {
        Self { position, roll }
    }

    /// Board, players and turn.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The roll that was made.
    pub fn roll(&self) -> Roll {
        self.roll
    }

    /// Narration for diagnostics.
    pub fn describe(&self) -> String {
        format!("The {} player rolled {}.", side(self.position.turn), self.roll)
    }
}

/// Waiting for the current player to pick one of the offered moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaitingForMove {
    position: Position,
    roll: Roll,
    moves: Vec<Move>,
}

impl WaitingForMove {
    /// Creates the state. Fails if no moves are offered.
    #[instrument(skip(position, moves), fields(moves = moves.len()))]
    pub fn new(position: Position, roll: Roll, moves: Vec<Move>) -> Result<Self, InvariantViolation> {
        if moves.is_empty() {
            return Err(InvariantViolation::new(
                "There must be available moves for a waiting for move state",
            ));
        }
        Ok(Self {
            position,
            roll,
            moves,
        })
    }

    /// Board, players and turn.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The roll being played.
    pub fn roll(&self) -> Roll {
        self.roll
    }

    /// The moves the player may choose from. Never empty.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Narration for diagnostics.
    pub fn describe(&self) -> String {
        format!(
            "Waiting for the {} player to make a move with their roll of {}.",
            side(self.position.turn),
            self.roll
        )
    }
}

/// The current player has moved; the position is from before the move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Moved {
    position: Position,
    roll: Roll,
    mv: Move,
}

impl Moved {
    /// Creates the state.
    pub fn new(position: Position, roll: Roll, mv: Move) -> Self {
        Self { position, roll, mv }
    }

    /// Board, players and turn before the move.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The roll that was played.
    pub fn roll(&self) -> Roll {
        self.roll
    }

    /// The move that was made.
    pub fn mv(&self) -> &Move {
        &self.mv
    }

    /// Narration for diagnostics.
    pub fn describe(&self) -> String {
        format!("The {} player moved: {}.", side(self.position.turn), self.mv)
    }
}

/// A player has scored all their pieces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Win {
    position: Position,
}

impl Win {
    /// Creates the state; the position's turn is the winner.
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    /// Final board and players.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The winning player.
    pub fn winner(&self) -> Player {
        self.position.turn
    }

    /// The losing player.
    pub fn loser(&self) -> Player {
        self.position.turn.opponent()
    }

    /// Narration for diagnostics.
    pub fn describe(&self) -> String {
        format!("The {} player won the game.", side(self.position.turn))
    }
}

// ─────────────────────────────────────────────────────────────
//  Tagged state
// ─────────────────────────────────────────────────────────────

/// Any state in a game's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::From)]
pub enum GameState {
    /// Waiting for a roll.
    WaitingForRoll(WaitingForRoll),
    /// A roll was made.
    Rolled(Rolled),
    /// Waiting for a move.
    WaitingForMove(WaitingForMove),
    /// A move was made.
    Moved(Moved),
    /// The game is over.
    Win(Win),
}

impl GameState {
    /// Board, players and turn of the state.
    pub fn position(&self) -> &Position {
        match self {
            GameState::WaitingForRoll(s) => s.position(),
            GameState::Rolled(s) => s.position(),
            GameState::WaitingForMove(s) => s.position(),
            GameState::Moved(s) => s.position(),
            GameState::Win(s) => s.position(),
        }
    }

    /// The board.
    pub fn board(&self) -> &Board {
        self.position().board()
    }

    /// Whose turn it is (the winner in a `Win` state).
    pub fn turn(&self) -> Player {
        self.position().turn()
    }

    /// Returns true if the state awaits external input.
    pub fn is_playable(&self) -> bool {
        matches!(self, GameState::WaitingForRoll(_) | GameState::WaitingForMove(_))
    }

    /// Returns true if the game is over.
    pub fn is_finished(&self) -> bool {
        matches!(self, GameState::Win(_))
    }

    /// Narration for diagnostics. Has no bearing on the rules.
    pub fn describe(&self) -> String {
        match self {
            GameState::WaitingForRoll(s) => s.describe(),
            GameState::Rolled(s) => s.describe(),
            GameState::WaitingForMove(s) => s.describe(),
            GameState::Moved(s) => s.describe(),
            GameState::Win(s) => s.describe(),
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}
