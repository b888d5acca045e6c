//! Error types for lookup tables.

use derive_more::{Display, Error, From};
use strictly_ur::ConfigError;
use tracing::instrument;

/// A store file that cannot be trusted: missing, truncated, corrupt or from
/// another format version. Never partially loaded.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Format error: {} at {}:{}", message, file, line)]
pub struct FormatError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl FormatError {
    /// Creates a new format error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for FormatError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("IO error: {}", err))
    }
}

/// A value or index a buffer cannot hold.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Buffer error: {} at {}:{}", message, file, line)]
pub struct BufferError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl BufferError {
    /// Creates a new buffer error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// The table and the rules disagree about a state that should exist.
///
/// Raised when a reachable state is missing from a store, or a key does not
/// decode to a valid position. Means the table was not generated for these
/// rules.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Inconsistent lookup table: {} at {}:{}", message, file, line)]
pub struct InconsistencyError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InconsistencyError {
    /// Creates a new inconsistency error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Any error raised by a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum LutError {
    /// Corrupt or unreadable store file.
    #[display("{}", _0)]
    Format(FormatError),
    /// Table built for another variant.
    #[display("{}", _0)]
    Config(ConfigError),
    /// Value does not fit a buffer.
    #[display("{}", _0)]
    Buffer(BufferError),
    /// Table and rules disagree.
    #[display("{}", _0)]
    Inconsistent(InconsistencyError),
}

impl LutError {
    /// Returns true if the table was built for another variant.
    pub fn is_config(&self) -> bool {
        matches!(self, LutError::Config(_))
    }

    /// Returns true if the store file could not be read.
    pub fn is_format(&self) -> bool {
        matches!(self, LutError::Format(_))
    }

    /// Returns true if the table is missing a state it should hold.
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, LutError::Inconsistent(_))
    }
}
