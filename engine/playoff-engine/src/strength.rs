//! Rolling team strength used for seeding and home field

use coe_core::{CoeError, CoefficientRun, Fixture, Result, Subject, TeamId};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamStrength {
    pub team: TeamId,
    pub total_points: f64,
    pub points_per_game: f64,
}

/// Rolling team coefficients of one run, indexed by team
#[derive(Debug, Clone, Default)]
pub struct StrengthTable {
    teams: HashMap<TeamId, TeamStrength>,
}

impl StrengthTable {
    pub fn from_run(run: &CoefficientRun) -> Self {
        let teams = run
            .rolling_coefficients
            .iter()
            .filter_map(|row| match row.subject {
                Subject::Team(team) => Some((
                    team,
                    TeamStrength { team, total_points: row.total_points, points_per_game: row.points_per_game },
                )),
                Subject::Conference(_) => None,
            })
            .collect();
        Self { teams }
    }

    pub fn insert(&mut self, strength: TeamStrength) {
        self.teams.insert(strength.team, strength);
    }

    /// Strength of a team; seeding never falls back to a default value
    pub fn get(&self, team: TeamId) -> Result<&TeamStrength> {
        self.teams
            .get(&team)
            .ok_or_else(|| CoeError::reference(format!("{team} has no rolling team coefficient")))
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// Seeding order: higher rolling PPG first, then better standings rank, then lower id
pub fn seeding_order(a: (&TeamStrength, u32), b: (&TeamStrength, u32)) -> Ordering {
    b.0.points_per_game
        .total_cmp(&a.0.points_per_game)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.0.team.cmp(&b.0.team))
}

/// Home field goes to the stronger side by rolling PPG; pot is never consulted
pub fn host(a: (&TeamStrength, u32), b: (&TeamStrength, u32)) -> Fixture {
    match seeding_order(a, b) {
        Ordering::Greater => Fixture { home: b.0.team, away: a.0.team },
        _ => Fixture { home: a.0.team, away: b.0.team },
    }
}
