//! Synthetic league for tests and benches.
//!
//! Ten playoff-eligible conferences of six teams (team id = conference * 100 +
//! seat), one independents grouping (ids 1101, 1102) and two non-FBS teams
//! (ids 2001, 2002) in conference 20. Results follow a fixed strength table,
//! so conference 1 is the strongest and conference 10 the weakest every year.
//! Each season holds a conference round robin, a conference title game, a
//! ring of non-conference games (conference c hosts c + 1), a four-team
//! playoff between the champions of conferences 1 to 4 and one unplayed game.

use crate::error::Result;
use crate::ids::{ConferenceId, SeasonYear, TeamId};
use crate::ledger::GameLedger;
use crate::model::{
    Conference, Dataset, FinalRankingRecord, GamePhase, GameRecord, MembershipRecord, Season,
    StandingsRecord, Team, TeamRef,
};

pub const CONFERENCES: u32 = 10;
pub const TEAMS_PER_CONFERENCE: u32 = 6;
pub const INDEPENDENTS: ConferenceId = ConferenceId(11);
pub const NON_FBS: ConferenceId = ConferenceId(20);

pub fn team_id(conference: u32, seat: u32) -> TeamId {
    TeamId(conference * 100 + seat)
}

fn conference_of(team: TeamId) -> u32 {
    match team.0 {
        1101 | 1102 => INDEPENDENTS.0,
        2001 | 2002 => NON_FBS.0,
        id => id / 100,
    }
}

/// Deterministic strength; conference gaps dominate the per-season wobble
pub fn strength(team: TeamId, season: SeasonYear) -> i64 {
    let wobble = (i64::from(team.0) * 7 + i64::from(season) * 13).rem_euclid(9);
    match conference_of(team) {
        c if c == INDEPENDENTS.0 => 700 - 10 * i64::from(team.0 % 100) + wobble,
        c if c == NON_FBS.0 => 200 + wobble,
        c => 1000 - 60 * i64::from(c) - 10 * i64::from(team.0 % 100) + wobble,
    }
}

struct GameBuilder {
    next_id: u64,
    games: Vec<GameRecord>,
}

impl GameBuilder {
    fn play(&mut self, season: SeasonYear, home: TeamId, away: TeamId, phase: GamePhase, neutral: bool) -> TeamId {
        let (home_strength, away_strength) = (strength(home, season), strength(away, season));
        let home_wins = home_strength >= away_strength;
        let overtime = (home_strength - away_strength).abs() < 5;
        let (winning, losing) = if overtime { (30, 27) } else { (31, 24) };
        let (home_score, away_score) = if home_wins { (winning, losing) } else { (losing, winning) };
        self.push(season, home, away, Some(home_score), Some(away_score), overtime, phase, neutral);
        if home_wins {
            home
        } else {
            away
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        season: SeasonYear,
        home: TeamId,
        away: TeamId,
        home_score: Option<u32>,
        away_score: Option<u32>,
        overtime: bool,
        phase: GamePhase,
        neutral_site: bool,
    ) {
        self.next_id += 1;
        self.games.push(GameRecord {
            id: self.next_id,
            season,
            home: TeamRef::Id(home),
            away: TeamRef::Id(away),
            home_score,
            away_score,
            overtime,
            phase,
            neutral_site,
        });
    }
}

/// Build the synthetic league for the inclusive season range
pub fn league(first: SeasonYear, last: SeasonYear) -> Dataset {
    let mut dataset = Dataset::default();

    for c in 1..=CONFERENCES {
        dataset.conferences.push(Conference {
            id: ConferenceId(c),
            name: format!("Conference {c}"),
            playoff_eligible: true,
        });
        for seat in 1..=TEAMS_PER_CONFERENCE {
            let id = team_id(c, seat);
            dataset.teams.push(Team {
                id,
                name: format!("Team {c}-{seat}"),
                aliases: vec![format!("T{}", id.0)],
            });
        }
    }
    dataset.conferences.push(Conference {
        id: INDEPENDENTS,
        name: "Independents".to_string(),
        playoff_eligible: false,
    });
    dataset.conferences.push(Conference {
        id: NON_FBS,
        name: "Division II".to_string(),
        playoff_eligible: false,
    });
    for (id, name) in [(1101, "Independent A"), (1102, "Independent B"), (2001, "Lower A"), (2002, "Lower B")] {
        dataset.teams.push(Team { id: TeamId(id), name: name.to_string(), aliases: Vec::new() });
    }

    let mut builder = GameBuilder { next_id: 0, games: Vec::new() };
    for season in first..=last {
        dataset.seasons.push(Season { year: season, mode: Default::default(), excluded: false });

        for team in dataset.teams.iter().map(|team| team.id) {
            let conference = conference_of(team);
            dataset.memberships.push(MembershipRecord {
                team: TeamRef::Id(team),
                season,
                conference: ConferenceId(conference),
                fbs: conference != NON_FBS.0,
            });
        }

        for c in 1..=CONFERENCES {
            for a in 1..=TEAMS_PER_CONFERENCE {
                for b in (a + 1)..=TEAMS_PER_CONFERENCE {
                    let (home, away) = if (i64::from(a + b) + i64::from(season)) % 2 == 0 {
                        (team_id(c, a), team_id(c, b))
                    } else {
                        (team_id(c, b), team_id(c, a))
                    };
                    builder.play(season, home, away, GamePhase::Regular, false);
                }
            }
            builder.play(season, team_id(c, 1), team_id(c, 2), GamePhase::ConferenceTournament, true);

            for seat in 1..=TEAMS_PER_CONFERENCE {
                builder.play(season, team_id(c, seat), team_id(c % CONFERENCES + 1, seat), GamePhase::Regular, false);
            }

            let mut ranked: Vec<TeamId> = (1..=TEAMS_PER_CONFERENCE).map(|seat| team_id(c, seat)).collect();
            ranked.sort_by_key(|team| (-strength(*team, season), *team));
            for (index, team) in ranked.into_iter().enumerate() {
                dataset.standings.push(StandingsRecord {
                    season,
                    conference: ConferenceId(c),
                    team: TeamRef::Id(team),
                    rank: index as u32 + 1,
                });
            }
        }

        builder.play(season, TeamId(1101), team_id(3, 1), GamePhase::Regular, false);
        builder.play(season, TeamId(1102), team_id(7, 1), GamePhase::Regular, false);
        builder.play(season, TeamId(1101), TeamId(1102), GamePhase::Regular, false);
        builder.play(season, team_id(10, 1), TeamId(2001), GamePhase::Regular, false);
        builder.play(season, team_id(9, 1), TeamId(2002), GamePhase::Regular, false);

        let semi_one = builder.play(season, team_id(1, 1), team_id(4, 1), GamePhase::Playoff, true);
        let semi_two = builder.play(season, team_id(2, 1), team_id(3, 1), GamePhase::Playoff, true);
        builder.play(season, semi_one, semi_two, GamePhase::Playoff, true);

        builder.push(season, team_id(1, 2), team_id(2, 2), None, None, false, GamePhase::Regular, false);

        let mut overall: Vec<TeamId> = dataset
            .teams
            .iter()
            .map(|team| team.id)
            .filter(|team| conference_of(*team) <= CONFERENCES)
            .collect();
        overall.sort_by_key(|team| (-strength(*team, season), *team));
        for (index, team) in overall.into_iter().take(10).enumerate() {
            dataset.final_rankings.push(FinalRankingRecord {
                season,
                team: TeamRef::Id(team),
                rank: index as u32 + 1,
            });
        }
    }
    dataset.games = builder.games;
    dataset
}

/// The synthetic league as a validated ledger
pub fn ledger(first: SeasonYear, last: SeasonYear) -> Result<GameLedger> {
    GameLedger::from_dataset(league(first, last))
}
