//! Ledger entities
//!
//! Input records (`*Record`) are what ingestion collaborators deliver; team
//! references in them may be canonical ids or display names/aliases. The
//! resolved entities hold canonical ids only and are what the ledger exposes.

use crate::error::{CoeError, Result};
use crate::ids::{ConferenceId, SeasonYear, TeamId};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A team identity with its display name and aliases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub id: ConferenceId,
    pub name: String,
    /// Groupings without a standings table (independents) are never ranked for bids
    #[serde(default = "default_true")]
    pub playoff_eligible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonMode {
    #[default]
    Historical,
    Rebuild,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub year: SeasonYear,
    #[serde(default)]
    pub mode: SeasonMode,
    /// Irregular years skipped by every rolling window
    #[serde(default)]
    pub excluded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Regular,
    ConferenceTournament,
    Playoff,
}

/// Reference to a team as delivered by ingestion: canonical id or name/alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamRef {
    Id(TeamId),
    Name(String),
}

impl From<TeamId> for TeamRef {
    fn from(id: TeamId) -> Self {
        TeamRef::Id(id)
    }
}

impl From<&str> for TeamRef {
    fn from(name: &str) -> Self {
        TeamRef::Name(name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub team: TeamRef,
    pub season: SeasonYear,
    pub conference: ConferenceId,
    #[serde(default = "default_true")]
    pub fbs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: u64,
    pub season: SeasonYear,
    pub home: TeamRef,
    pub away: TeamRef,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    #[serde(default)]
    pub overtime: bool,
    #[serde(default)]
    pub phase: GamePhase,
    #[serde(default)]
    pub neutral_site: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRecord {
    pub season: SeasonYear,
    pub conference: ConferenceId,
    pub team: TeamRef,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRankingRecord {
    pub season: SeasonYear,
    pub team: TeamRef,
    pub rank: u32,
}

/// Closed, fully materialized input of one engine invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub teams: Vec<Team>,
    pub conferences: Vec<Conference>,
    pub seasons: Vec<Season>,
    pub memberships: Vec<MembershipRecord>,
    pub games: Vec<GameRecord>,
    #[serde(default)]
    pub standings: Vec<StandingsRecord>,
    #[serde(default)]
    pub final_rankings: Vec<FinalRankingRecord>,
}

/// (team, season) → conference, resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub team: TeamId,
    pub season: SeasonYear,
    pub conference: ConferenceId,
    pub fbs: bool,
}

/// A game with canonical participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    pub season: SeasonYear,
    pub home: TeamId,
    pub away: TeamId,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub overtime: bool,
    pub phase: GamePhase,
    pub neutral_site: bool,
}

/// Resolved result of a played game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub winner: TeamId,
    pub loser: TeamId,
    pub overtime: bool,
}

impl Game {
    /// Games with a null score are unplayed and never aggregated
    pub fn is_played(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    pub fn participants(&self) -> [TeamId; 2] {
        [self.home, self.away]
    }

    pub fn is_playoff(&self) -> bool {
        self.phase == GamePhase::Playoff
    }

    /// Winner and loser of a played game, `None` when unplayed.
    ///
    /// A level score is an input error, not a zero-point outcome.
    pub fn outcome(&self) -> Result<Option<Outcome>> {
        let (Some(home), Some(away)) = (self.home_score, self.away_score) else {
            return Ok(None);
        };
        if home == away {
            return Err(CoeError::UnresolvedOutcome {
                game_id: self.id,
                season: self.season,
                score: home,
            });
        }
        let (winner, loser) = if home > away { (self.home, self.away) } else { (self.away, self.home) };
        Ok(Some(Outcome { winner, loser, overtime: self.overtime }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub season: SeasonYear,
    pub conference: ConferenceId,
    pub team: TeamId,
    pub rank: u32,
}
