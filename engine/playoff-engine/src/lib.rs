//! # Playoff Engine
//!
//! Turns conference and team coefficients plus final standings into a
//! 24-team field, seeding pots and a seeded bracket.
//!
//! ## Pipeline
//!
//! 1. **bids**: rank playoff-eligible conferences and look up bid counts
//! 2. **qualifiers**: take the top-k of each conference's standings
//! 3. **pots**: table placement, auxiliary bid adjustment, balancing
//! 4. **draw**: byes by strength, then a seeded conflict-free draw
//!
//! Structural rules live in data ([`Ruleset`], [`RulesetBook`]), so a new
//! season's rules are a new table rather than new code.
//!
//! ```rust,ignore
//! use playoff_engine::{PlayoffEngine, PlayoffParams};
//!
//! let engine = PlayoffEngine::default();
//! let run = engine.run(&ledger, &coefficients, &PlayoffParams::new(2023, "year2").with_seed(7))?;
//! ```

pub mod bids;
pub mod config;
pub mod draw;
pub mod engine;
pub mod pots;
pub mod qualifiers;
pub mod ruleset;
pub mod strength;

#[cfg(test)]
mod tests;

pub use bids::{allocate_bids, rank_conferences, BidAllocation, ConferenceRank};
pub use config::PlayoffConfig;
pub use draw::{BracketDrawer, DrawSettings};
pub use engine::{PlayoffEngine, PlayoffParams};
pub use pots::{apply_auxiliary_bid, balance_pots, PotAssigner};
pub use qualifiers::select_qualifiers;
pub use ruleset::{AuxiliaryBidRule, Ruleset, RulesetBook, TierRule};
pub use strength::{host, seeding_order, StrengthTable, TeamStrength};
