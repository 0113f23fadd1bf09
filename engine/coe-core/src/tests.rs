//! Unit tests for the ledger view, the entity model and the error taxonomy

use crate::fixtures;
use crate::model::{FinalRankingRecord, GameRecord, MembershipRecord, StandingsRecord};
use crate::{
    CoeError, Conference, ConferenceId, Dataset, ErrorKind, FormulaVersion, GameLedger, GamePhase,
    Pot, RulesetId, RunKey, Season, SeasonMode, Team, TeamId, TeamRef,
};

fn small_dataset() -> Dataset {
    Dataset {
        teams: vec![
            Team { id: TeamId(1), name: "Alpha".into(), aliases: vec!["ALP".into()] },
            Team { id: TeamId(2), name: "Beta".into(), aliases: vec![] },
        ],
        conferences: vec![Conference { id: ConferenceId(1), name: "East".into(), playoff_eligible: true }],
        seasons: vec![
            Season { year: 2019, mode: SeasonMode::Historical, excluded: false },
            Season { year: 2020, mode: SeasonMode::Historical, excluded: true },
            Season { year: 2021, mode: SeasonMode::Rebuild, excluded: false },
        ],
        memberships: vec![MembershipRecord {
            team: TeamRef::Name("alp".into()),
            season: 2019,
            conference: ConferenceId(1),
            fbs: true,
        }],
        games: vec![GameRecord {
            id: 7,
            season: 2019,
            home: TeamRef::Name("Alpha".into()),
            away: TeamRef::Id(TeamId(2)),
            home_score: Some(21),
            away_score: Some(14),
            overtime: false,
            phase: GamePhase::Regular,
            neutral_site: false,
        }],
        standings: vec![StandingsRecord {
            season: 2019,
            conference: ConferenceId(1),
            team: TeamRef::Id(TeamId(1)),
            rank: 1,
        }],
        final_rankings: vec![FinalRankingRecord { season: 2019, team: TeamRef::Name("Beta".into()), rank: 4 }],
    }
}

#[cfg(test)]
mod ledger_tests {
    use super::*;

    #[test]
    fn test_ledger_resolves_aliases() {
        let ledger = GameLedger::from_dataset(small_dataset()).unwrap();

        let games = ledger.games(2019);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home, TeamId(1));
        assert_eq!(ledger.membership(TeamId(1), 2019).unwrap().conference, ConferenceId(1));
        assert_eq!(ledger.final_rank(2019, TeamId(2)), Some(4));
    }

    #[test]
    fn test_missing_membership_is_a_gap() {
        let ledger = GameLedger::from_dataset(small_dataset()).unwrap();

        let err = ledger.membership(TeamId(2), 2019).unwrap_err();
        assert_eq!(err, CoeError::MembershipGap { team: TeamId(2), season: 2019 });
        assert_eq!(err.kind(), ErrorKind::MembershipGap);
    }

    #[test]
    fn test_window_skips_excluded_seasons() {
        let ledger = GameLedger::from_dataset(small_dataset()).unwrap();

        assert_eq!(ledger.window_seasons(2021, 5), vec![2019, 2021]);
        assert_eq!(ledger.window_seasons(2019, 5), vec![2019]);
        assert!(!ledger.is_scorable(2020));
        assert!(ledger.is_scorable(2021));
    }

    #[test]
    fn test_unknown_game_participant_is_reference_error() {
        let mut dataset = small_dataset();
        dataset.games[0].away = TeamRef::Name("Gamma".into());

        let err = GameLedger::from_dataset(dataset).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn test_game_in_unknown_season_is_reference_error() {
        let mut dataset = small_dataset();
        dataset.games[0].season = 2030;

        assert!(matches!(GameLedger::from_dataset(dataset), Err(CoeError::Reference(_))));
    }

    #[test]
    fn test_duplicate_standings_rank_is_rejected() {
        let mut dataset = small_dataset();
        dataset.standings.push(StandingsRecord {
            season: 2019,
            conference: ConferenceId(1),
            team: TeamRef::Id(TeamId(2)),
            rank: 1,
        });

        assert!(matches!(GameLedger::from_dataset(dataset), Err(CoeError::InvariantViolation(_))));
    }

    #[test]
    fn test_duplicate_membership_is_rejected() {
        let mut dataset = small_dataset();
        dataset.memberships.push(MembershipRecord {
            team: TeamRef::Id(TeamId(1)),
            season: 2019,
            conference: ConferenceId(1),
            fbs: true,
        });

        assert!(matches!(GameLedger::from_dataset(dataset), Err(CoeError::InvariantViolation(_))));
    }

    #[test]
    fn test_fixture_league_is_valid() {
        let ledger = fixtures::ledger(2019, 2023).unwrap();

        for season in 2019..=2023 {
            assert!(!ledger.games(season).is_empty());
            for c in 1..=fixtures::CONFERENCES {
                let standings = ledger.standings(season, ConferenceId(c));
                assert_eq!(standings.len(), fixtures::TEAMS_PER_CONFERENCE as usize);
                assert_eq!(standings[0].rank, 1);
            }
        }
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_level_score_is_unresolved() {
        let ledger = GameLedger::from_dataset({
            let mut dataset = small_dataset();
            dataset.games[0].away_score = Some(21);
            dataset
        })
        .unwrap();

        let err = ledger.games(2019)[0].outcome().unwrap_err();
        assert!(matches!(err, CoeError::UnresolvedOutcome { game_id: 7, season: 2019, score: 21 }));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_unplayed_game_has_no_outcome() {
        let ledger = GameLedger::from_dataset({
            let mut dataset = small_dataset();
            dataset.games[0].home_score = None;
            dataset
        })
        .unwrap();

        let game = &ledger.games(2019)[0];
        assert!(!game.is_played());
        assert_eq!(game.outcome().unwrap(), None);
    }

    #[test]
    fn test_dataset_json_accepts_ids_and_names() {
        let json = r#"{
            "teams": [{"id": 1, "name": "Alpha"}, {"id": 2, "name": "Beta"}],
            "conferences": [{"id": 1, "name": "East"}],
            "seasons": [{"year": 2022}],
            "memberships": [{"team": "Alpha", "season": 2022, "conference": 1}],
            "games": [{"id": 1, "season": 2022, "home": 1, "away": "beta",
                       "home_score": 10, "away_score": 13, "overtime": true}]
        }"#;

        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert!(dataset.conferences[0].playoff_eligible);
        assert!(dataset.memberships[0].fbs);
        let ledger = GameLedger::from_dataset(dataset).unwrap();
        let outcome = ledger.games(2022)[0].outcome().unwrap().unwrap();
        assert_eq!(outcome.winner, TeamId(2));
        assert!(outcome.overtime);
    }

    #[test]
    fn test_pot_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Pot::Bye).unwrap(), "0");
        assert_eq!(serde_json::from_str::<Pot>("2").unwrap(), Pot::Two);
        assert!(serde_json::from_str::<Pot>("3").is_err());
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_run_failure_reports_key_and_kind() {
        let key = RunKey::playoff(2023, FormulaVersion::new("v1"), RulesetId::new("year2"));
        let failure = CoeError::config("tier table grants 23 bids").for_run(key.clone());

        assert_eq!(failure.kind, ErrorKind::Configuration);
        assert_eq!(failure.key, key);
        assert_eq!(
            failure.to_string(),
            "run (season=2023, formula=v1, ruleset=year2) failed: ConfigurationError: tier table grants 23 bids"
        );
        assert_eq!(key.slug(), "2023_v1_year2");
    }
}
