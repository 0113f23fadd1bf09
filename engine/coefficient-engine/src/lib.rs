//! # Coefficient Engine
//!
//! Turns a closed [`coe_core::GameLedger`] into versioned, reproducible team
//! and conference coefficients.
//!
//! ## Components
//!
//! - **formula**: versioned scoring policies ([`FormulaSpec`], [`FormulaBook`], [`BountyPolicy`])
//! - **season**: per-season game classification and component rows
//! - **rolling**: season and rolling-window sums
//! - **aggregator**: the two-pass [`CoefficientAggregator`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coefficient_engine::{CoefficientAggregator, FormulaBook};
//!
//! let aggregator = CoefficientAggregator::new(FormulaBook::builtin());
//! let run = aggregator.compute(&ledger, 2023, &"v1".into())?;
//! for row in &run.rolling_coefficients {
//!     println!("{} {:.3}", row.subject, row.points_per_game);
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod formula;
pub mod rolling;
pub mod season;

#[cfg(test)]
mod tests;

pub use aggregator::CoefficientAggregator;
pub use config::AggregatorConfig;
pub use formula::{
    BountyPolicy, BountyRule, FinishBonusRule, FormulaBook, FormulaSpec, OpponentStrength,
    PlayoffBonusRule, PointTable,
};
