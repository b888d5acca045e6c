//! Error types for the rule engine.

use derive_more::{Display, Error, From};
use tracing::instrument;

/// Setup-time configuration error.
///
/// Raised when a variant cannot be assembled, e.g. a path pair that leaves
/// the board shape. Never recoverable: fix the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
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

/// A caller handed the engine something that no legal game can contain.
///
/// Examples: negative piece counts, a roll of zero passed to move
/// generation, a move that was not offered.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invariant violation: {} at {}:{}", message, file, line)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InvariantViolation {
    /// Creates a new invariant violation with caller location tracking.
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

/// Any error raised by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum UrError {
    /// Invalid variant configuration.
    #[display("{}", _0)]
    Config(ConfigError),
    /// Broken game invariant.
    #[display("{}", _0)]
    Invariant(InvariantViolation),
}

impl UrError {
    /// Returns true if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, UrError::Config(_))
    }

    /// Returns true if this is an invariant violation.
    pub fn is_invariant(&self) -> bool {
        matches!(self, UrError::Invariant(_))
    }
}
