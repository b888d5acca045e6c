//! Solved lookup tables for the Royal Game of Ur.
//!
//! A lookup table maps every reachable position of one variant to the
//! probability that Light wins it with perfect play.
//!
//! # Architecture
//!
//! - **Buffers**: [`U8Buffer`], [`U16Buffer`], [`U32Buffer`], [`U64Buffer`] hold
//!   fixed-width sorted values behind the [`ValueBuffer`] contract
//! - **Store**: [`BigEntryStore`] splits one sorted table over shards and
//!   reads and writes the store file format
//! - **Keys**: [`StateLUT`] turns positions into keys and loads stores built
//!   for its variant
//! - **Agent**: [`LutAgent`] plays the move the table rates best
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_lut::{LutAgent, StateLUT};
//! use strictly_ur::{GameSettings, RuleSet};
//!
//! # fn example() -> anyhow::Result<()> {
//! let lut = StateLUT::new(GameSettings::finkel())?;
//! let store = lut.read_state_store("finkel.urlt")?;
//! let rules = RuleSet::new(GameSettings::finkel())?;
//! let agent = LutAgent::new("solved", rules, Arc::new(lut), Arc::new(store))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod agent;
mod buffer;
mod error;
mod lut;
mod store;

pub use agent::LutAgent;
pub use buffer::{AnyValueBuffer, U8Buffer, U16Buffer, U32Buffer, U64Buffer, ValueBuffer, ValueType};
pub use error::{BufferError, FormatError, InconsistencyError, LutError};
pub use lut::{StateLUT, VALUE_TYPE, encode_light_win_probability, light_win_probability};
pub use store::{BigEntryStore, DEFAULT_SHARD_CAPACITY, STORE_MAGIC, STORE_VERSION, StoreHeader};
