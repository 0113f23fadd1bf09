//! # CoE Core
//!
//! Shared building blocks of the coefficient & qualification engine:
//!
//! - **ids**: identity newtypes and the run key every derived row is stamped with
//! - **model**: ledger entities as delivered by ingestion and as resolved
//! - **directory**: canonical team identities and alias resolution
//! - **ledger**: the validated, read-only [`GameLedger`] view consumed by every stage
//! - **records**: derived rows (component scores, coefficients, qualifiers, pots, slots)
//! - **artifacts**: complete per-key artifact sets handed to the result store
//! - **error**: the [`CoeError`] taxonomy and [`RunFailure`]

pub mod artifacts;
pub mod directory;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod model;
pub mod records;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

#[cfg(test)]
mod tests;

pub use artifacts::{Bracket, CoefficientRun, Fixture, PlayoffRun, Region};
pub use directory::TeamDirectory;
pub use error::{CoeError, ErrorKind, Result, RunFailure};
pub use ids::{ConferenceId, FormulaVersion, RulesetId, RunKey, SeasonYear, TeamId};
pub use ledger::GameLedger;
pub use model::{
    Conference, Dataset, Game, GamePhase, GameRecord, Membership, MembershipRecord, Outcome,
    Season, SeasonMode, StandingsEntry, StandingsRecord, Team, TeamRef,
};
pub use records::{
    points_per_game, BidType, BracketSlot, Component, ComponentScore, Placement, Pot,
    PotAssignment, Qualifier, RollingCoefficient, SeasonCoefficient, Subject,
};

/// Number of season-years in a full rolling window
pub const DEFAULT_WINDOW_YEARS: u32 = 5;

/// Fixed size of the postseason field
pub const DEFAULT_FIELD_SIZE: usize = 24;

/// Fixed number of first-round byes
pub const DEFAULT_BYE_COUNT: usize = 8;
