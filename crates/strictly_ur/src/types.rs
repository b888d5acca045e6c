//! Core domain types for the Royal Game of Ur.

use crate::error::InvariantViolation;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One of the two sides in the game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Player {
    /// The light player (moves first).
    Light,
    /// The dark player.
    Dark,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::Light => Player::Dark,
            Player::Dark => Player::Light,
        }
    }

    /// Single character used when rendering boards.
    pub fn symbol(self) -> char {
        match self {
            Player::Light => 'L',
            Player::Dark => 'D',
        }
    }
}

/// A tile on the board, addressed by 0-based column and row indices.
///
/// Displayed in the traditional notation: column letter, 1-based row
/// (`Tile::new(0, 0)` is `A1`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_new::new,
)]
pub struct Tile {
    ix: u8,
    iy: u8,
}

impl Tile {
    /// 0-based column index.
    pub fn ix(&self) -> u8 {
        self.ix
    }

    /// 0-based row index.
    pub fn iy(&self) -> u8 {
        self.iy
    }

    /// 1-based column coordinate.
    pub fn x(&self) -> u32 {
        u32::from(self.ix) + 1
    }

    /// 1-based row coordinate.
    pub fn y(&self) -> u32 {
        u32::from(self.iy) + 1
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let column = (b'A' + self.ix % 26) as char;
        write!(f, "{}{}", column, self.y())
    }
}

/// A piece on the board.
///
/// `path_index` is the piece's position along its owner's path, not a
/// board coordinate. Paths may revisit tiles, so the tile alone does not
/// determine how far a piece has travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct Piece {
    /// The player who owns the piece.
    pub owner: Player,
    /// Index into the owner's path.
    pub path_index: u8,
}

impl Piece {
    /// Returns the same piece advanced to a new path index.
    pub fn moved_to(self, path_index: u8) -> Self {
        Self {
            owner: self.owner,
            path_index,
        }
    }
}

/// Off-board state of one player: pieces waiting to enter and pieces scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerState {
    player: Player,
    pieces: u8,
    score: u8,
}

impl PlayerState {
    /// Creates a player state.
    pub fn new(player: Player, pieces: u8, score: u8) -> Self {
        Self {
            player,
            pieces,
            score,
        }
    }

    /// Returns the player this state belongs to.
    pub fn player(&self) -> Player {
        self.player
    }

    /// Pieces waiting off the board to be introduced.
    pub fn pieces(&self) -> u8 {
        self.pieces
    }

    /// Pieces that have completed the path.
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Returns a copy with the waiting-piece count changed by `delta`.
    #[instrument]
    pub fn with_pieces_change(self, delta: i32) -> Result<Self, InvariantViolation> {
        let pieces = apply_delta(self.pieces, delta).ok_or_else(|| {
            InvariantViolation::new(format!(
                "{} would have {} + {} waiting pieces",
                self.player, self.pieces, delta
            ))
        })?;
        Ok(Self { pieces, ..self })
    }

    /// Returns a copy with the score changed by `delta`.
    #[instrument]
    pub fn with_score_change(self, delta: i32) -> Result<Self, InvariantViolation> {
        let score = apply_delta(self.score, delta).ok_or_else(|| {
            InvariantViolation::new(format!(
                "{} would have a score of {} + {}",
                self.player, self.score, delta
            ))
        })?;
        Ok(Self { score, ..self })
    }
}

fn apply_delta(value: u8, delta: i32) -> Option<u8> {
    u8::try_from(i32::from(value) + delta).ok()
}
