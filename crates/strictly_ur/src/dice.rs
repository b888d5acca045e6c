//! Dice that generate rolls.

use rand::Rng;
use std::collections::VecDeque;
use tracing::{instrument, trace};

/// A roll of the dice: the number of tiles a piece may advance.
pub type Roll = u8;

/// Most dice a variant may throw.
pub const MAX_DICE: u8 = 63;

/// Source of rolls for a game.
pub trait Dice {
    /// Throws the dice.
    fn roll(&mut self) -> Roll;

    /// Largest roll the dice can produce.
    fn max_roll(&self) -> Roll;

    /// Probability of throwing exactly `roll`.
    fn probability(&self, roll: Roll) -> f64;
}

/// A set of tetrahedral dice, each with two marked corners out of four.
///
/// Every die shows a marked corner with probability 1/2; the roll is the
/// number of marked corners facing up.
#[derive(Debug, Clone)]
pub struct BinaryDice<R> {
    count: u8,
    rng: R,
}

impl<R: Rng> BinaryDice<R> {
    /// Creates `count` binary dice driven by `rng`.
    pub fn new(count: u8, rng: R) -> Self {
        Self { count, rng }
    }
}

impl<R: Rng> Dice for BinaryDice<R> {
    fn roll(&mut self) -> Roll {
        let roll = (0..self.count).filter(|_| self.rng.random_bool(0.5)).count() as Roll;
        trace!(roll, "Dice thrown");
        roll
    }

    fn max_roll(&self) -> Roll {
        self.count
    }

    fn probability(&self, roll: Roll) -> f64 {
        if roll > self.count {
            return 0.0;
        }
        let n = f64::from(self.count);
        let ways = (0..roll).fold(1.0, |acc, i| acc * (n - f64::from(i)) / f64::from(i + 1));
        ways / 2f64.powi(i32::from(self.count))
    }
}

/// Dice that replay a fixed sequence of rolls, then throw zeros.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<Roll>,
    max_roll: Roll,
}

impl ScriptedDice {
    /// Creates dice that will produce `rolls` in order.
    #[instrument(skip(rolls))]
    pub fn new(rolls: impl IntoIterator<Item = Roll>) -> Self {
        let rolls: VecDeque<Roll> = rolls.into_iter().collect();
        let max_roll = rolls.iter().copied().max().unwrap_or(0);
        Self { rolls, max_roll }
    }

    /// Rolls not yet thrown.
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> Roll {
        self.rolls.pop_front().unwrap_or(0)
    }

    fn max_roll(&self) -> Roll {
        self.max_roll
    }

    fn probability(&self, roll: Roll) -> f64 {
        match self.rolls.front() {
            Some(next) if *next == roll => 1.0,
            Some(_) => 0.0,
            None if roll == 0 => 1.0,
            None => 0.0,
        }
    }
}
