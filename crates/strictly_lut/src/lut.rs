//! Keys for game positions, and loading stores built with them.
//!
//! A key packs a position into one unsigned integer. Tiles are read in row
//! order, each contributing one mixed-radix digit: `0` for an empty tile,
//! otherwise which of the pieces that can stand there does. The board
//! number is then extended with both scores and the turn:
//!
//! ```text
//! key = ((board * (P + 1) + light_score) * (P + 1) + dark_score) * 2 + turn
//! ```
//!
//! where `P` is the number of starting pieces. Waiting pieces follow from the
//! other counts, so every position has exactly one key.

use crate::buffer::ValueType;
use crate::error::{InconsistencyError, LutError};
use crate::store::{BigEntryStore, StoreHeader};
use strictly_ur::{
    Board, ConfigError, GameSettings, Piece, Player, PlayerState, Position, RuleSet, Tile,
};
use std::path::Path;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument};

/// Width of the stored values: the probability that Light wins.
pub const VALUE_TYPE: ValueType = ValueType::U16;

/// Converts a stored value into the probability that Light wins.
pub fn light_win_probability(value: u64) -> f64 {
    value.min(u64::from(u16::MAX)) as f64 / f64::from(u16::MAX)
}

/// Converts the probability that Light wins into a stored value.
pub fn encode_light_win_probability(probability: f64) -> u64 {
    (probability.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u64
}

/// One tile's digit: which pieces can occupy it.
#[derive(Debug, Clone)]
struct TileDigit {
    tile: Tile,
    occupants: Vec<Piece>,
}

impl TileDigit {
    fn radix(&self) -> u64 {
        self.occupants.len() as u64 + 1
    }
}

/// The key scheme for one variant.
#[derive(Debug, Clone)]
pub struct StateLUT {
    rules: RuleSet,
    empty_board: Board,
    digits: Vec<TileDigit>,
    board_states: u64,
    max_key: u64,
    key_type: ValueType,
}

impl StateLUT {
    /// Builds the key scheme for a variant.
    ///
    /// Fails if the variant is invalid or its keys would not fit 64 bits.
    #[instrument]
    pub fn new(settings: GameSettings) -> Result<Self, ConfigError> {
        let rules = RuleSet::new(settings)?;
        let empty_board = rules.generate_initial_game_state().board().clone();

        let digits: Vec<TileDigit> = rules
            .shape()
            .tiles_by_row()
            .into_iter()
            .map(|tile| {
                let occupants = Player::iter()
                    .flat_map(|player| {
                        rules
                            .paths()
                            .get(player)
                            .tiles()
                            .iter()
                            .enumerate()
                            .filter(move |(_, path_tile)| **path_tile == tile)
                            .map(move |(index, _)| Piece::new(player, index as u8))
                    })
                    .collect();
                TileDigit { tile, occupants }
            })
            .filter(|digit| !digit.occupants.is_empty())
            .collect();

        let too_wide = || ConfigError::new("The variant's keys do not fit in 64 bits");
        let board_states = digits
            .iter()
            .try_fold(1u64, |total, digit| total.checked_mul(digit.radix()))
            .ok_or_else(too_wide)?;
        let score_radix = u64::from(*settings.starting_pieces()) + 1;
        let max_key = board_states
            .checked_mul(score_radix)
            .and_then(|keys| keys.checked_mul(score_radix))
            .and_then(|keys| keys.checked_mul(2))
            .ok_or_else(too_wide)?
            - 1;
        let key_type = ValueType::smallest_for(max_key);

        debug!(tiles = digits.len(), board_states, max_key, %key_type, "Key scheme built");
        Ok(Self {
            rules,
            empty_board,
            digits,
            board_states,
            max_key,
            key_type,
        })
    }

    /// The variant settings.
    pub fn settings(&self) -> &GameSettings {
        self.rules.settings()
    }

    /// Rules of the variant.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Narrowest key width that holds every key.
    pub fn key_type(&self) -> ValueType {
        self.key_type
    }

    /// Largest key the scheme produces.
    pub fn max_key(&self) -> u64 {
        self.max_key
    }

    /// Number of distinct piece layouts the board can encode.
    pub fn board_states(&self) -> u64 {
        self.board_states
    }

    fn score_radix(&self) -> u64 {
        u64::from(*self.settings().starting_pieces()) + 1
    }

    /// Fingerprint of the settings, binding store files to their variant.
    ///
    /// 64-bit FNV-1a over a canonical description of the settings.
    pub fn settings_fingerprint(&self) -> u64 {
        let settings = self.settings();
        let description = format!(
            "board={};paths={};pieces={};safe_rosettes={};rosette_rolls={};capture_rolls={};dice={}",
            settings.board().id(),
            settings.paths().id(),
            settings.starting_pieces(),
            settings.safe_rosettes(),
            settings.rosettes_grant_extra_rolls(),
            settings.captures_grant_extra_rolls(),
            settings.dice_count()
        );
        description
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            })
    }

    /// Key of a position of this variant.
    pub fn encode(&self, position: &Position) -> Result<u64, LutError> {
        let board = position.board();
        let mut key = 0u64;
        for digit in &self.digits {
            let value = match board.get(digit.tile) {
                None => 0,
                Some(piece) => {
                    let index = digit
                        .occupants
                        .iter()
                        .position(|occupant| *occupant == piece)
                        .ok_or_else(|| {
                            InconsistencyError::new(format!(
                                "{:?} cannot stand on {}",
                                piece, digit.tile
                            ))
                        })?;
                    index as u64 + 1
                }
            };
            key = key * digit.radix() + value;
        }

        let score_radix = self.score_radix();
        for player in Player::iter() {
            let state = position.player(player);
            let expected_waiting = u64::from(*self.settings().starting_pieces())
                .checked_sub(u64::from(state.score()) + board.count_pieces(player) as u64);
            if expected_waiting != Some(u64::from(state.pieces())) {
                return Err(InconsistencyError::new(format!(
                    "{} has {} waiting pieces, which does not add up",
                    player,
                    state.pieces()
                ))
                .into());
            }
            key = key * score_radix + u64::from(state.score());
        }

        let turn = match position.turn() {
            Player::Light => 0,
            Player::Dark => 1,
        };
        Ok(key * 2 + turn)
    }

    /// Position a key stands for.
    pub fn decode(&self, key: u64) -> Result<Position, LutError> {
        if key > self.max_key {
            return Err(InconsistencyError::new(format!(
                "Key {} exceeds the largest key {}",
                key, self.max_key
            ))
            .into());
        }
        let score_radix = self.score_radix();
        let turn = if key % 2 == 0 { Player::Light } else { Player::Dark };
        let mut rest = key / 2;
        let dark_score = rest % score_radix;
        rest /= score_radix;
        let light_score = rest % score_radix;
        rest /= score_radix;

        let mut board = self.empty_board.clone();
        for digit in self.digits.iter().rev() {
            let value = rest % digit.radix();
            rest /= digit.radix();
            if value > 0 {
                let piece = digit.occupants[(value - 1) as usize];
                board
                    .set(digit.tile, Some(piece))
                    .map_err(|e| InconsistencyError::new(e.message))?;
            }
        }

        let pieces = u64::from(*self.settings().starting_pieces());
        let player_state = |player: Player, score: u64| -> Result<PlayerState, LutError> {
            let waiting = pieces
                .checked_sub(score + board.count_pieces(player) as u64)
                .ok_or_else(|| {
                    InconsistencyError::new(format!("Key {} gives {} too many pieces", key, player))
                })?;
            Ok(PlayerState::new(player, waiting as u8, score as u8))
        };
        let light = player_state(Player::Light, light_score)?;
        let dark = player_state(Player::Dark, dark_score)?;

        Position::new(board, light, dark, turn).map_err(|e| InconsistencyError::new(e.message).into())
    }

    /// An empty store for this scheme.
    pub fn create_store(&self, shard_capacity: usize) -> BigEntryStore {
        BigEntryStore::new(self.key_type, VALUE_TYPE, self.settings_fingerprint(), shard_capacity)
    }

    /// Loads a store file built for this variant.
    ///
    /// The header is checked before any shard is read: a store for another
    /// variant or key width is a configuration error.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn read_state_store(&self, path: impl AsRef<Path>) -> Result<BigEntryStore, LutError> {
        let header = StoreHeader::read_from_path(path.as_ref())?;
        self.check_header(&header)?;
        let store = BigEntryStore::read(path.as_ref())?;
        info!(entries = store.len(), "State store loaded");
        Ok(store)
    }

    /// Checks a store header was written for this variant.
    pub fn check_header(&self, header: &StoreHeader) -> Result<(), ConfigError> {
        if header.fingerprint != self.settings_fingerprint() {
            return Err(ConfigError::new(format!(
                "The store was built for another variant (fingerprint {:016x}, expected {:016x})",
                header.fingerprint,
                self.settings_fingerprint()
            )));
        }
        if header.key_type != self.key_type {
            return Err(ConfigError::new(format!(
                "The store uses {} keys, the variant needs {}",
                header.key_type, self.key_type
            )));
        }
        if header.value_type != VALUE_TYPE {
            return Err(ConfigError::new(format!(
                "The store holds {} values, expected {}",
                header.value_type, VALUE_TYPE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_ur::GameState;

    #[test]
    fn test_initial_position_is_key_zero_plus_turn() {
        let lut = StateLUT::new(GameSettings::finkel()).expect("valid variant");
        let initial = lut.rules().generate_initial_game_state();
        assert_eq!(lut.encode(initial.position()), Ok(0));
        assert_eq!(lut.decode(0).expect("valid key"), *initial.position());
    }

    #[test]
    fn test_finkel_key_type() {
        let lut = StateLUT::new(GameSettings::finkel()).expect("valid variant");
        // Twelve tiles only one side visits, eight shared by both.
        assert_eq!(lut.board_states(), 2u64.pow(12) * 3u64.pow(8));
        assert_eq!(lut.key_type(), ValueType::U32);
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let lut = StateLUT::new(GameSettings::aseb()).expect("valid variant");
        assert!(lut.decode(lut.max_key() + 1).is_err());
    }

    #[test]
    fn test_decode_rejects_too_many_pieces() {
        let lut = StateLUT::new(GameSettings::finkel()).expect("valid variant");
        // All of Light's pieces scored, Dark to move.
        let full_score = (7 * 8) * 2 + 1;
        assert!(lut.decode(full_score).is_ok());
        // The same scores with a Light piece on the board as well.
        let light_digit = lut.digits.iter().rposition(|digit| {
            digit.occupants.first().is_some_and(|piece| piece.owner == Player::Light)
        });
        let digit = light_digit.expect("light has tiles");
        let place = lut.digits[digit + 1..]
            .iter()
            .map(TileDigit::radix)
            .product::<u64>();
        let key = full_score + place * 64 * 2;
        assert!(lut.decode(key).is_err());
    }

    #[test]
    fn test_fingerprints_differ_between_variants() {
        let finkel = StateLUT::new(GameSettings::finkel()).expect("valid variant");
        let masters = StateLUT::new(GameSettings::masters()).expect("valid variant");
        assert_ne!(finkel.settings_fingerprint(), masters.settings_fingerprint());
        assert_eq!(
            finkel.settings_fingerprint(),
            StateLUT::new(GameSettings::finkel()).expect("valid variant").settings_fingerprint()
        );
    }

    #[test]
    fn test_probability_values() {
        assert_eq!(encode_light_win_probability(1.0), u64::from(u16::MAX));
        assert_eq!(encode_light_win_probability(-0.5), 0);
        assert!((light_win_probability(encode_light_win_probability(0.25)) - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_successor_keys_round_trip() {
        let lut = StateLUT::new(GameSettings::finkel()).expect("valid variant");
        let GameState::WaitingForRoll(start) = lut.rules().generate_initial_game_state() else {
            panic!("Expected waiting for roll");
        };
        let states = lut.rules().apply_roll(&start, 3).expect("valid roll");
        let Some(GameState::WaitingForMove(state)) = states.last() else {
            panic!("Expected waiting for move");
        };
        let next = lut
            .rules()
            .apply_move(state, &state.moves()[0])
            .expect("legal move");
        let position = next.last().expect("next state").position();
        let key = lut.encode(position).expect("encodable");
        assert_eq!(&lut.decode(key).expect("decodable"), position);
    }
}
