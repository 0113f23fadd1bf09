//! Derived rows produced by the engine
//!
//! Every row carries the formula version (and ruleset for playoff artifacts)
//! that produced it, so several methodology generations coexist.

use crate::ids::{ConferenceId, FormulaVersion, RulesetId, SeasonYear, TeamId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whose coefficient a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Team(TeamId),
    Conference(ConferenceId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Team(team) => team.fmt(f),
            Subject::Conference(conference) => conference.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// In-conference base points (team only)
    ConfBase,
    /// Non-conference base points, bounty applied
    NonconfBase,
    PlayoffParticipation,
    PlayoffGames,
    TopFinish,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::ConfBase => "conf_base",
            Component::NonconfBase => "nonconf_base",
            Component::PlayoffParticipation => "playoff_participation",
            Component::PlayoffGames => "playoff_games",
            Component::TopFinish => "top_finish",
        }
    }

    /// Bonus components never count games
    pub fn is_bonus(&self) -> bool {
        !matches!(self, Component::ConfBase | Component::NonconfBase)
    }
}

/// Atomic, auditable contribution to a coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub season: SeasonYear,
    pub subject: Subject,
    pub component: Component,
    /// Team whose playoff appearance produced this row, for conference bonus rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<TeamId>,
    pub points: f64,
    pub raw_points: f64,
    pub games_counted: u32,
    pub formula_version: FormulaVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonCoefficient {
    pub season: SeasonYear,
    pub subject: Subject,
    pub total_points: f64,
    pub games_counted: u32,
    pub points_per_game: f64,
    pub formula_version: FormulaVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingCoefficient {
    pub season: SeasonYear,
    pub subject: Subject,
    pub window_start: SeasonYear,
    pub window_end: SeasonYear,
    /// Number of seasons actually present in the window
    pub seasons_counted: u32,
    pub total_points: f64,
    pub games_counted: u32,
    pub points_per_game: f64,
    pub formula_version: FormulaVersion,
}

/// Points per game, zero for a subject without counted games
pub fn points_per_game(total_points: f64, games_counted: u32) -> f64 {
    if games_counted == 0 {
        0.0
    } else {
        total_points / f64::from(games_counted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidType {
    Champion,
    AtLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub season: SeasonYear,
    pub conference: ConferenceId,
    pub team: TeamId,
    pub conf_rank: u32,
    /// 1-based position of the conference in the coefficient ranking
    pub tier: u32,
    pub bid_type: BidType,
    pub formula_version: FormulaVersion,
    pub ruleset: RulesetId,
}

/// Seeding bucket; serialized as 0 (bye), 1, 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Pot {
    Bye,
    One,
    Two,
}

impl From<Pot> for u8 {
    fn from(pot: Pot) -> Self {
        match pot {
            Pot::Bye => 0,
            Pot::One => 1,
            Pot::Two => 2,
        }
    }
}

impl TryFrom<u8> for Pot {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Pot::Bye),
            1 => Ok(Pot::One),
            2 => Ok(Pot::Two),
            other => Err(format!("invalid pot {other}, expected 0, 1 or 2")),
        }
    }
}

impl fmt::Display for Pot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pot::Bye => f.write_str("bye"),
            Pot::One => f.write_str("pot 1"),
            Pot::Two => f.write_str("pot 2"),
        }
    }
}

/// Which step of the pot assigner decided a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Table,
    AuxiliaryWinner,
    AuxiliaryPromotion,
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotAssignment {
    pub season: SeasonYear,
    pub team: TeamId,
    pub conference: ConferenceId,
    pub pot: Pot,
    pub placement: Placement,
    pub formula_version: FormulaVersion,
    pub ruleset: RulesetId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub season: SeasonYear,
    pub slot: u32,
    pub region: u32,
    pub team: TeamId,
    pub pot: Pot,
    pub draw_seed: u64,
    pub formula_version: FormulaVersion,
    pub ruleset: RulesetId,
}
