//! Aggregator tests over hand-built ledgers and the fixture league

use crate::{AggregatorConfig, CoefficientAggregator, FormulaBook, FormulaSpec};
use coe_core::fixtures;
use coe_core::{
    CoeError, Component, ConferenceId, Dataset, ErrorKind, FormulaVersion, GameLedger, GamePhase,
    GameRecord, MembershipRecord, Season, SeasonMode, SeasonYear, Subject, Team, TeamId, TeamRef,
};
use std::collections::HashMap;

/// Small hand-built league: every team is a member of its conference in every season
struct MiniLeague {
    dataset: Dataset,
    next_game: u64,
}

impl MiniLeague {
    fn new(seasons: &[SeasonYear]) -> Self {
        let mut dataset = Dataset::default();
        dataset.seasons = seasons
            .iter()
            .map(|year| Season { year: *year, mode: SeasonMode::Historical, excluded: false })
            .collect();
        Self { dataset, next_game: 0 }
    }

    fn conference(mut self, id: u32, teams: &[u32]) -> Self {
        self.dataset.conferences.push(coe_core::Conference {
            id: ConferenceId(id),
            name: format!("C{id}"),
            playoff_eligible: true,
        });
        for team in teams {
            self.dataset.teams.push(Team { id: TeamId(*team), name: format!("T{team}"), aliases: vec![] });
            for season in &self.dataset.seasons {
                self.dataset.memberships.push(MembershipRecord {
                    team: TeamRef::Id(TeamId(*team)),
                    season: season.year,
                    conference: ConferenceId(id),
                    fbs: true,
                });
            }
        }
        self
    }

    fn game(mut self, season: SeasonYear, winner: u32, loser: u32, overtime: bool, phase: GamePhase) -> Self {
        self.next_game += 1;
        self.dataset.games.push(GameRecord {
            id: self.next_game,
            season,
            home: TeamRef::Id(TeamId(winner)),
            away: TeamRef::Id(TeamId(loser)),
            home_score: Some(28),
            away_score: Some(21),
            overtime,
            phase,
            neutral_site: false,
        });
        self
    }

    fn win(self, season: SeasonYear, winner: u32, loser: u32) -> Self {
        self.game(season, winner, loser, false, GamePhase::Regular)
    }

    fn ledger(self) -> GameLedger {
        GameLedger::from_dataset(self.dataset).unwrap()
    }
}

fn aggregator() -> CoefficientAggregator {
    CoefficientAggregator::new(FormulaBook::builtin())
}

fn v0() -> FormulaVersion {
    FormulaVersion::new("v0")
}

fn v1() -> FormulaVersion {
    FormulaVersion::new("v1")
}

/// Opponent 1 goes 3-1 (1.5 PPG) and loses its only non-conference game to team 10
fn bounty_league() -> MiniLeague {
    MiniLeague::new(&[2023])
        .conference(1, &[1, 2, 3, 4])
        .conference(2, &[10])
        .win(2023, 1, 2)
        .win(2023, 1, 3)
        .win(2023, 1, 4)
        .win(2023, 10, 1)
}

fn component(run: &coe_core::CoefficientRun, subject: Subject, component: Component) -> &coe_core::ComponentScore {
    run.components
        .iter()
        .find(|row| row.subject == subject && row.component == component)
        .unwrap()
}

#[cfg(test)]
mod bounty_tests {
    use super::*;

    #[test]
    fn test_nonconference_win_against_1_5_ppg_opponent_is_worth_3() {
        let ledger = bounty_league().ledger();

        let run = aggregator().compute(&ledger, 2023, &v1()).unwrap();

        let row = component(&run, Subject::Team(TeamId(10)), Component::NonconfBase);
        assert_eq!(row.raw_points, 2.0);
        assert_eq!(row.points, 3.0);
        assert_eq!(row.games_counted, 1);

        let conference = component(&run, Subject::Conference(ConferenceId(2)), Component::NonconfBase);
        assert_eq!(conference.points, 3.0);
    }

    #[test]
    fn test_v0_has_no_bounty() {
        let ledger = bounty_league().ledger();

        let run = aggregator().compute(&ledger, 2023, &v0()).unwrap();

        let row = component(&run, Subject::Team(TeamId(10)), Component::NonconfBase);
        assert_eq!(row.points, 2.0);
        assert_eq!(row.formula_version, v0());
    }

    #[test]
    fn test_opponent_strength_changes_only_bountied_points() {
        let baseline = aggregator().compute(&bounty_league().ledger(), 2023, &v1()).unwrap();
        let stronger = aggregator()
            .compute(&bounty_league().conference(3, &[20]).win(2023, 1, 20).ledger(), 2023, &v1())
            .unwrap();

        let before = component(&baseline, Subject::Team(TeamId(10)), Component::NonconfBase);
        let after = component(&stronger, Subject::Team(TeamId(10)), Component::NonconfBase);
        assert_eq!(before.raw_points, after.raw_points);
        assert_ne!(before.points, after.points);
        // 8 points over 5 games
        assert!((after.points - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_conference_games_never_reach_the_conference() {
        let ledger = bounty_league().ledger();

        let run = aggregator().compute(&ledger, 2023, &v0()).unwrap();

        let conference = run
            .season_coefficients
            .iter()
            .find(|row| row.subject == Subject::Conference(ConferenceId(1)))
            .unwrap();
        assert_eq!(conference.total_points, 0.0);
        assert_eq!(conference.games_counted, 1);

        let team = run.season_coefficients.iter().find(|row| row.subject == Subject::Team(TeamId(1))).unwrap();
        assert_eq!(team.total_points, 6.0);
        assert_eq!(team.games_counted, 4);
    }

    #[test]
    fn test_overtime_loss_earns_one_point() {
        let ledger = MiniLeague::new(&[2023])
            .conference(1, &[1, 2])
            .game(2023, 1, 2, true, GamePhase::Regular)
            .ledger();

        let run = aggregator().compute(&ledger, 2023, &v0()).unwrap();

        assert_eq!(component(&run, Subject::Team(TeamId(2)), Component::ConfBase).points, 1.0);
        assert_eq!(component(&run, Subject::Team(TeamId(1)), Component::ConfBase).points, 2.0);
    }
}

#[cfg(test)]
mod window_tests {
    use super::*;

    #[test]
    fn test_bootstrap_with_two_seasons() {
        let ledger = MiniLeague::new(&[2022, 2023])
            .conference(1, &[1, 2])
            .win(2022, 1, 2)
            .win(2023, 2, 1)
            .ledger();

        let run = aggregator().compute(&ledger, 2023, &v1()).unwrap();

        let rolling = run.team_rolling(TeamId(1)).unwrap();
        assert_eq!(rolling.window_end, 2023);
        assert_eq!(rolling.window_end - rolling.window_start, 1);
        assert_eq!(rolling.seasons_counted, 2);
        assert_eq!(rolling.games_counted, 2);
        assert_eq!(rolling.total_points, 2.0);
    }

    #[test]
    fn test_excluded_season_is_skipped() {
        let mut league = MiniLeague::new(&[2019, 2020, 2021])
            .conference(1, &[1, 2])
            .win(2019, 1, 2)
            .win(2020, 1, 2)
            .win(2021, 1, 2);
        league.dataset.seasons[1].excluded = true;
        let ledger = league.ledger();

        let run = aggregator().compute(&ledger, 2021, &v0()).unwrap();

        let rolling = run.team_rolling(TeamId(1)).unwrap();
        assert_eq!(rolling.window_start, 2019);
        assert_eq!(rolling.seasons_counted, 2);
        assert_eq!(rolling.games_counted, 2);

        let err = aggregator().compute(&ledger, 2020, &v0()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn test_window_is_capped_at_five_seasons() {
        let ledger = fixtures::ledger(2015, 2023).unwrap();

        let run = aggregator().compute(&ledger, 2023, &v1()).unwrap();

        for row in &run.rolling_coefficients {
            assert_eq!(row.window_start, 2019);
            assert_eq!(row.window_end, 2023);
        }
    }

    #[test]
    fn test_rolling_games_match_scorable_games() {
        let ledger = fixtures::ledger(2019, 2023).unwrap();
        let run = aggregator().compute(&ledger, 2023, &v1()).unwrap();

        let mut team_games: HashMap<TeamId, u32> = HashMap::new();
        let mut conference_games: HashMap<ConferenceId, u32> = HashMap::new();
        for season in 2019..=2023 {
            for game in ledger.games(season).iter().filter(|game| game.is_played()) {
                let home = ledger.membership(game.home, season).unwrap();
                let away = ledger.membership(game.away, season).unwrap();
                for member in [home, away] {
                    *team_games.entry(member.team).or_default() += 1;
                    let credits = home.conference != away.conference || game.is_playoff();
                    if member.fbs && credits {
                        *conference_games.entry(member.conference).or_default() += 1;
                    }
                }
            }
        }

        for row in &run.rolling_coefficients {
            let expected = match row.subject {
                Subject::Team(team) => team_games[&team],
                Subject::Conference(conference) => conference_games[&conference],
            };
            assert_eq!(row.games_counted, expected, "{}", row.subject);
        }
    }

    #[test]
    fn test_conference_rolling_with_capped_participation() {
        let ledger = fixtures::ledger(2019, 2023).unwrap();

        let run = aggregator().compute(&ledger, 2023, &v0()).unwrap();

        // 24 ring points + 4 playoff base points, 3 playoff game points per season,
        // participation counted for two of five seasons
        let conference_one = run.rolling(Subject::Conference(ConferenceId(1))).unwrap();
        assert_eq!(conference_one.total_points, 5.0 * 31.0 + 12.0);
        assert_eq!(conference_one.games_counted, 70);

        let conference_five = run
            .season_coefficients
            .iter()
            .find(|row| row.subject == Subject::Conference(ConferenceId(5)))
            .unwrap();
        assert_eq!(conference_five.total_points, 12.0);
        assert_eq!(conference_five.games_counted, 12);
    }
}

#[cfg(test)]
mod output_tests {
    use super::*;

    #[test]
    fn test_recompute_is_byte_identical() {
        let ledger = fixtures::ledger(2019, 2023).unwrap();

        let first = serde_json::to_string(&aggregator().compute(&ledger, 2023, &v1()).unwrap()).unwrap();
        let second = serde_json::to_string(&aggregator().compute(&ledger, 2023, &v1()).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let ledger = fixtures::ledger(2019, 2023).unwrap();
        let sequential = CoefficientAggregator::with_config(
            AggregatorConfig { parallel: false, ..AggregatorConfig::default() },
            FormulaBook::builtin(),
        );

        assert_eq!(
            sequential.compute(&ledger, 2022, &v1()).unwrap(),
            aggregator().compute(&ledger, 2022, &v1()).unwrap()
        );
    }

    #[test]
    fn test_only_fbs_subjects_are_published() {
        let ledger = fixtures::ledger(2021, 2023).unwrap();

        let run = aggregator().compute(&ledger, 2023, &v1()).unwrap();

        assert!(run.team_rolling(TeamId(2001)).is_none());
        assert!(run.rolling(Subject::Conference(fixtures::NON_FBS)).is_none());
        assert!(run.team_rolling(TeamId(1101)).is_some());
        assert!(run.rolling(Subject::Conference(fixtures::INDEPENDENTS)).is_some());
        assert!(run.components.iter().all(|row| row.season == 2023 && row.points >= 0.0));
    }

    #[test]
    fn test_finish_bonus_is_pluggable() {
        let ledger = fixtures::ledger(2023, 2023).unwrap();
        let mut book = FormulaBook::builtin();
        book.insert(FormulaSpec {
            version: FormulaVersion::new("v0-finish"),
            finish_bonus: Some(crate::FinishBonusRule { top_n: 8, points: 3.0 }),
            ..FormulaSpec::v0()
        })
        .unwrap();

        let run = CoefficientAggregator::new(book).compute(&ledger, 2023, &FormulaVersion::new("v0-finish")).unwrap();

        let finishers: Vec<_> =
            run.components.iter().filter(|row| row.component == Component::TopFinish).collect();
        assert_eq!(finishers.len(), 8);
        assert!(finishers.iter().all(|row| row.points == 3.0 && row.games_counted == 0));
    }

    #[test]
    fn test_range_produces_one_run_per_season() {
        let ledger = fixtures::ledger(2020, 2023).unwrap();

        let runs = aggregator().compute_range(&ledger, 2019, 2023, &v1()).unwrap();

        let seasons: Vec<_> = runs.iter().map(|run| run.key.season).collect();
        assert_eq!(seasons, vec![2020, 2021, 2022, 2023]);
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_missing_membership_aborts_the_run() {
        let mut league = MiniLeague::new(&[2023]).conference(1, &[1, 2]).win(2023, 1, 2);
        league.dataset.memberships.retain(|m| m.team != TeamRef::Id(TeamId(2)));
        let ledger = league.ledger();

        let err = aggregator().compute(&ledger, 2023, &v1()).unwrap_err();
        assert_eq!(err, CoeError::MembershipGap { team: TeamId(2), season: 2023 });
    }

    #[test]
    fn test_level_game_aborts_the_run() {
        let mut league = MiniLeague::new(&[2023]).conference(1, &[1, 2]).win(2023, 1, 2);
        league.dataset.games[0].away_score = Some(28);

        let err = aggregator().compute(&league.ledger(), 2023, &v1()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_unknown_formula_is_configuration_error() {
        let ledger = bounty_league().ledger();

        let err = aggregator().compute(&ledger, 2023, &FormulaVersion::new("v7")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_season_is_reference_error() {
        let ledger = bounty_league().ledger();

        let err = aggregator().compute(&ledger, 1999, &v1()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Round robin of three 3-team conferences over three seasons; each bit
    /// decides a game, every third game goes to overtime
    fn league_from_bits(bits: &[bool]) -> GameLedger {
        let mut league = MiniLeague::new(&[2021, 2022, 2023])
            .conference(1, &[11, 12, 13])
            .conference(2, &[21, 22, 23])
            .conference(3, &[31, 32, 33]);
        let teams = [11, 12, 13, 21, 22, 23, 31, 32, 33];
        let mut index = 0;
        for season in 2021..=2023 {
            for a in 0..teams.len() {
                for b in (a + 1)..teams.len() {
                    let (winner, loser) = if bits[index % bits.len()] { (teams[a], teams[b]) } else { (teams[b], teams[a]) };
                    let phase = if index % 17 == 0 { GamePhase::Playoff } else { GamePhase::Regular };
                    league = league.game(season, winner, loser, index % 3 == 0, phase);
                    index += 1;
                }
            }
        }
        league.ledger()
    }

    proptest! {
        #[test]
        fn prop_rolling_rows_are_consistent(bits in proptest::collection::vec(any::<bool>(), 36)) {
            let ledger = league_from_bits(&bits);
            let run = aggregator().compute(&ledger, 2023, &FormulaVersion::new("v1")).unwrap();

            for row in &run.rolling_coefficients {
                prop_assert!(row.total_points.is_finite() && row.total_points >= 0.0);
                prop_assert!((0..=4).contains(&(row.window_end - row.window_start)));
                prop_assert_eq!(row.window_end, 2023);
            }
            for row in &run.components {
                prop_assert!(row.points >= 0.0 && row.raw_points >= 0.0);
            }
            for team in [11, 21, 31] {
                let rolling = run.team_rolling(TeamId(team)).unwrap();
                // eight round-robin games per season
                prop_assert_eq!(rolling.games_counted, 24);
            }
        }

        #[test]
        fn prop_v0_points_equal_raw_points(bits in proptest::collection::vec(any::<bool>(), 36)) {
            let ledger = league_from_bits(&bits);
            let run = aggregator().compute(&ledger, 2023, &FormulaVersion::new("v0")).unwrap();

            for row in &run.components {
                prop_assert_eq!(row.points, row.raw_points);
            }
        }
    }
}
