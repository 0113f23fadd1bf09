//! Per-season facts and component rows
//!
//! [`SeasonFacts`] classifies every played game of one season from both
//! participants' point of view, using membership at time of play. Component
//! rows are then built from the facts, with or without bounty multipliers.

use crate::formula::FormulaSpec;
use coe_core::{
    CoeError, Component, ComponentScore, ConferenceId, GameLedger, Result, SeasonYear, Subject,
    TeamId,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One participant's view of a played game
#[derive(Debug, Clone, PartialEq)]
pub struct GameSide {
    pub game_id: u64,
    pub team: TeamId,
    pub opponent: TeamId,
    pub conference: ConferenceId,
    pub fbs: bool,
    /// Both participants belonged to the same conference that season
    pub in_conference: bool,
    pub playoff: bool,
    pub base_points: f64,
}

impl GameSide {
    /// Only non-conference and playoff games reach a conference coefficient
    pub fn credits_conference(&self) -> bool {
        self.fbs && (!self.in_conference || self.playoff)
    }
}

#[derive(Debug, Clone)]
pub struct SeasonFacts {
    pub season: SeasonYear,
    pub sides: Vec<GameSide>,
    /// Teams with an FBS membership this season
    pub fbs_teams: BTreeSet<TeamId>,
    /// Teams inside the finish bonus cut, if the formula defines one
    pub finishers: BTreeSet<TeamId>,
}

impl SeasonFacts {
    pub fn collect(ledger: &GameLedger, season: SeasonYear, formula: &FormulaSpec) -> Result<Self> {
        let mut sides = Vec::new();
        let mut fbs_teams = BTreeSet::new();
        let mut finishers = BTreeSet::new();

        for game in ledger.games(season) {
            let Some(outcome) = game.outcome()? else {
                continue;
            };
            let home = ledger.membership(game.home, season)?;
            let away = ledger.membership(game.away, season)?;
            let in_conference = home.conference == away.conference;

            for (member, opponent) in [(home, game.away), (away, game.home)] {
                if member.fbs {
                    fbs_teams.insert(member.team);
                }
                sides.push(GameSide {
                    game_id: game.id,
                    team: member.team,
                    opponent,
                    conference: member.conference,
                    fbs: member.fbs,
                    in_conference,
                    playoff: game.is_playoff(),
                    base_points: formula.points.points_for(member.team, &outcome),
                });
            }
        }

        if let Some(finish) = &formula.finish_bonus {
            finishers.extend(fbs_teams.iter().copied().filter(|team| {
                ledger.final_rank(season, *team).is_some_and(|rank| rank <= finish.top_n)
            }));
        }

        debug!("Season {season}: {} scored game sides, {} FBS teams", sides.len(), fbs_teams.len());
        Ok(Self { season, sides, fbs_teams, finishers })
    }

    /// Component rows for every team and conference of the season.
    ///
    /// `multiplier` prices a non-conference game against its opponent; pass
    /// `|_| Ok(1.0)` for raw rows. Rows for non-FBS teams are included so their
    /// rolling strength is available as opponents; callers filter them out of
    /// published output.
    pub fn components<F>(&self, formula: &FormulaSpec, multiplier: F) -> Result<Vec<ComponentScore>>
    where
        F: Fn(TeamId) -> Result<f64>,
    {
        let mut rows: BTreeMap<(Subject, Component, Option<TeamId>), Accumulator> = BTreeMap::new();
        let mut playoff_teams: BTreeSet<TeamId> = BTreeSet::new();

        for side in &self.sides {
            let (component, points) = if side.in_conference {
                (Component::ConfBase, side.base_points)
            } else {
                (Component::NonconfBase, side.base_points * multiplier(side.opponent)?)
            };

            let mut subjects = vec![Subject::Team(side.team)];
            if side.credits_conference() {
                subjects.push(Subject::Conference(side.conference));
            }
            for subject in &subjects {
                rows.entry((*subject, component, None)).or_default().add(points, side.base_points, 1);
            }

            if side.playoff {
                playoff_teams.insert(side.team);
                let bonus = formula.playoff.per_game_points;
                for subject in &subjects {
                    rows.entry((*subject, Component::PlayoffGames, None)).or_default().add(bonus, bonus, 0);
                }
            }
        }

        let participation = formula.playoff.participation_points;
        for team in &playoff_teams {
            rows.entry((Subject::Team(*team), Component::PlayoffParticipation, None))
                .or_default()
                .add(participation, participation, 0);
            if let Some(side) = self.sides.iter().find(|side| side.team == *team && side.fbs) {
                rows.entry((Subject::Conference(side.conference), Component::PlayoffParticipation, Some(*team)))
                    .or_default()
                    .add(participation, participation, 0);
            }
        }

        if let Some(finish) = &formula.finish_bonus {
            for team in &self.finishers {
                rows.entry((Subject::Team(*team), Component::TopFinish, None))
                    .or_default()
                    .add(finish.points, finish.points, 0);
            }
        }

        rows.into_iter()
            .map(|((subject, component, contributor), acc)| {
                let row = ComponentScore {
                    season: self.season,
                    subject,
                    component,
                    contributor,
                    points: acc.points,
                    raw_points: acc.raw_points,
                    games_counted: acc.games,
                    formula_version: formula.version.clone(),
                };
                check_row(&row)?;
                Ok(row)
            })
            .collect()
    }

    /// Published subjects: FBS teams and conferences credited by FBS sides
    pub fn is_published(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Team(team) => self.fbs_teams.contains(team),
            Subject::Conference(_) => true,
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    points: f64,
    raw_points: f64,
    games: u32,
}

impl Accumulator {
    fn add(&mut self, points: f64, raw_points: f64, games: u32) {
        self.points += points;
        self.raw_points += raw_points;
        self.games += games;
    }
}

fn check_row(row: &ComponentScore) -> Result<()> {
    for value in [row.points, row.raw_points] {
        if !value.is_finite() || value < 0.0 {
            return Err(CoeError::invariant(format!(
                "{} {} in season {} computed {value} points",
                row.subject,
                row.component.as_str(),
                row.season
            )));
        }
    }
    Ok(())
}
