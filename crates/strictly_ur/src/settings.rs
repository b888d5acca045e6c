//! Variant configuration.
//!
//! A [`GameSettings`] value fully describes one rule variant: board shape,
//! path pair, piece count, rosette behaviour, extra-roll rules and dice.

use crate::dice::MAX_DICE;
use crate::error::ConfigError;
use crate::path::PathType;
use crate::shape::BoardType;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Settings for one rule variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
pub struct GameSettings {
    /// Board shape.
    board: BoardType,

    /// Paths the players take.
    paths: PathType,

    /// Pieces each player starts with.
    #[serde(default = "default_starting_pieces")]
    starting_pieces: u8,

    /// Whether pieces on rosettes are protected from capture.
    #[serde(default = "default_true")]
    safe_rosettes: bool,

    /// Whether landing on a rosette grants another roll.
    #[serde(default = "default_true")]
    rosettes_grant_extra_rolls: bool,

    /// Whether capturing a piece grants another roll.
    #[serde(default)]
    captures_grant_extra_rolls: bool,

    /// Number of binary dice thrown per roll.
    #[serde(default = "default_dice_count")]
    dice_count: u8,
}

fn default_starting_pieces() -> u8 {
    7
}

fn default_true() -> bool {
    true
}

fn default_dice_count() -> u8 {
    4
}

impl GameSettings {
    /// Creates settings from explicit values.
    #[instrument]
    pub fn new(
        board: BoardType,
        paths: PathType,
        starting_pieces: u8,
        safe_rosettes: bool,
        rosettes_grant_extra_rolls: bool,
        captures_grant_extra_rolls: bool,
        dice_count: u8,
    ) -> Self {
        Self {
            board,
            paths,
            starting_pieces,
            safe_rosettes,
            rosettes_grant_extra_rolls,
            captures_grant_extra_rolls,
            dice_count,
        }
    }

    /// The rules of Irving Finkel's reconstruction on Bell's path.
    pub fn finkel() -> Self {
        Self::new(BoardType::Standard, PathType::Bell, 7, true, true, false, 4)
    }

    /// The Masters Traditional Games rules.
    pub fn masters() -> Self {
        Self::new(BoardType::Standard, PathType::Masters, 7, false, true, false, 4)
    }

    /// H. J. R. Murray's rules with the long looping path.
    pub fn murray() -> Self {
        Self::new(BoardType::Standard, PathType::Murray, 7, true, true, false, 4)
    }

    /// A short variant: five pieces, unsafe rosettes, captures roll again.
    pub fn blitz() -> Self {
        Self::new(BoardType::Standard, PathType::Masters, 5, false, true, true, 4)
    }

    /// The historical Aseb variant.
    pub fn aseb() -> Self {
        Self::new(BoardType::Aseb, PathType::Aseb, 5, true, true, false, 4)
    }

    /// Resolves a preset by name (`finkel`, `masters`, `murray`, `blitz`, `aseb`).
    #[instrument]
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "finkel" => Ok(Self::finkel()),
            "masters" => Ok(Self::masters()),
            "murray" => Ok(Self::murray()),
            "blitz" => Ok(Self::blitz()),
            "aseb" => Ok(Self::aseb()),
            other => Err(ConfigError::new(format!("Unknown preset: {}", other))),
        }
    }

    /// Loads settings from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading settings from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read settings file: {}", e)))?;
        let settings = Self::from_toml(&content)?;
        info!(board = %settings.board, paths = %settings.paths, "Settings loaded");
        Ok(settings)
    }

    /// Parses settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse settings: {}", e)))?;
        if settings.starting_pieces == 0 {
            return Err(ConfigError::new("At least one starting piece is required"));
        }
        if !(1..=MAX_DICE).contains(&settings.dice_count) {
            return Err(ConfigError::new(format!(
                "Between 1 and {} dice are required, not {}",
                MAX_DICE, settings.dice_count
            )));
        }
        Ok(settings)
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::finkel()
    }
}
