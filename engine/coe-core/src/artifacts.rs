//! Complete artifact sets of a run, committed replace-by-key

use crate::ids::{ConferenceId, RunKey, TeamId};
use crate::records::{
    BracketSlot, ComponentScore, PotAssignment, Qualifier, RollingCoefficient, SeasonCoefficient,
    Subject,
};
use serde::{Deserialize, Serialize};

/// Everything a coefficient run produces for its (season, formula_version) key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRun {
    pub key: RunKey,
    pub components: Vec<ComponentScore>,
    pub season_coefficients: Vec<SeasonCoefficient>,
    pub rolling_coefficients: Vec<RollingCoefficient>,
}

impl CoefficientRun {
    pub fn rolling(&self, subject: Subject) -> Option<&RollingCoefficient> {
        self.rolling_coefficients.iter().find(|row| row.subject == subject)
    }

    pub fn team_rolling(&self, team: TeamId) -> Option<&RollingCoefficient> {
        self.rolling(Subject::Team(team))
    }

    pub fn conference_rolling(&self) -> impl Iterator<Item = (ConferenceId, &RollingCoefficient)> {
        self.rolling_coefficients.iter().filter_map(|row| match row.subject {
            Subject::Conference(conference) => Some((conference, row)),
            Subject::Team(_) => None,
        })
    }
}

/// A scheduled game of the initial bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub home: TeamId,
    pub away: TeamId,
}

/// One bye team and the drawn pair whose winner it meets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub index: u32,
    pub bye: TeamId,
    pub pot1: TeamId,
    pub pot2: TeamId,
    /// Opening-round game between the drawn pair
    pub opening: Fixture,
    /// Second-round game if the pot-1 team advances
    pub bye_vs_pot1: Fixture,
    /// Second-round game if the pot-2 team advances
    pub bye_vs_pot2: Fixture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub draw_seed: u64,
    pub slots: Vec<BracketSlot>,
    pub regions: Vec<Region>,
}

/// Everything a playoff run produces for its (season, formula_version, ruleset) key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffRun {
    pub key: RunKey,
    pub qualifiers: Vec<Qualifier>,
    pub pots: Vec<PotAssignment>,
    pub bracket: Bracket,
}
