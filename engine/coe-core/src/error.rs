//! Error taxonomy shared by the aggregation and playoff stages

use crate::ids::{RunKey, SeasonYear, TeamId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CoeError>;

/// Errors that abort a run for its key
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoeError {
    /// A participant lacks a membership record for the season of play
    #[error("{team} has no membership record for season {season}")]
    MembershipGap { team: TeamId, season: SeasonYear },

    /// Dangling identity reference (unknown team name, conference, season)
    #[error("{0}")]
    Reference(String),

    /// A computed or loaded invariant does not hold
    #[error("{0}")]
    InvariantViolation(String),

    /// A played game ended level; the ledger must resolve a winner
    #[error("game {game_id} in season {season} is level at {score} with no winner")]
    UnresolvedOutcome { game_id: u64, season: SeasonYear, score: u32 },

    /// Ruleset, tier table or formula inconsistent with the fixed constants
    #[error("{0}")]
    Configuration(String),

    /// Bracket draw cannot satisfy its constraints within the retry budget
    #[error("{0}")]
    DrawExhausted(String),
}

/// Kind of a [`CoeError`], as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MembershipGap,
    Reference,
    InvariantViolation,
    Configuration,
    DrawExhausted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MembershipGap => "MembershipGapError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::InvariantViolation => "InvariantViolation",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::DrawExhausted => "DrawExhaustedError",
        };
        f.write_str(name)
    }
}

impl CoeError {
    /// Create a new reference error
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    /// Create a new invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new draw exhausted error
    pub fn draw_exhausted(msg: impl Into<String>) -> Self {
        Self::DrawExhausted(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoeError::MembershipGap { .. } => ErrorKind::MembershipGap,
            CoeError::Reference(_) => ErrorKind::Reference,
            CoeError::InvariantViolation(_) | CoeError::UnresolvedOutcome { .. } => {
                ErrorKind::InvariantViolation
            }
            CoeError::Configuration(_) => ErrorKind::Configuration,
            CoeError::DrawExhausted(_) => ErrorKind::DrawExhausted,
        }
    }

    /// Attach the key of the run this error aborted
    pub fn for_run(self, key: RunKey) -> RunFailure {
        RunFailure { kind: self.kind(), key, source: self }
    }
}

/// A failed run: the key it was computing and the error that aborted it
#[derive(Error, Debug, Clone, PartialEq)]
#[error("run {key} failed: {kind}: {source}")]
pub struct RunFailure {
    pub key: RunKey,
    pub kind: ErrorKind,
    pub source: CoeError,
}
