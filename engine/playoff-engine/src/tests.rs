use crate::*;
use coe_core::{
    fixtures, BidType, CoeError, CoefficientRun, ConferenceId, FormulaVersion, GameLedger,
    Placement, PlayoffRun, Pot, PotAssignment, Qualifier, RulesetId, RunKey, TeamId, TeamRef,
};
use coefficient_engine::{CoefficientAggregator, FormulaBook};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn league() -> &'static (GameLedger, CoefficientRun) {
    static LEAGUE: OnceLock<(GameLedger, CoefficientRun)> = OnceLock::new();
    LEAGUE.get_or_init(|| {
        let ledger = fixtures::ledger(2019, 2023).unwrap();
        let run = CoefficientAggregator::new(FormulaBook::builtin())
            .compute(&ledger, 2023, &FormulaVersion::new("v1"))
            .unwrap();
        (ledger, run)
    })
}

fn playoff(params: PlayoffParams) -> coe_core::Result<PlayoffRun> {
    let (ledger, run) = league();
    PlayoffEngine::default().run(ledger, run, &params)
}

fn count(run: &PlayoffRun, pot: Pot) -> usize {
    run.pots.iter().filter(|row| row.pot == pot).count()
}

fn assert_valid_bracket(run: &PlayoffRun) {
    let conferences: HashMap<TeamId, ConferenceId> =
        run.qualifiers.iter().map(|q| (q.team, q.conference)).collect();

    let slots: Vec<u32> = run.bracket.slots.iter().map(|slot| slot.slot).collect();
    assert_eq!(slots, (1..=24).collect::<Vec<_>>());
    let teams: HashSet<TeamId> = run.bracket.slots.iter().map(|slot| slot.team).collect();
    assert_eq!(teams.len(), 24);
    assert!(run.bracket.slots.iter().all(|slot| slot.draw_seed == run.bracket.draw_seed));

    assert_eq!(run.bracket.regions.len(), 8);
    for region in &run.bracket.regions {
        let members = [conferences[&region.bye], conferences[&region.pot1], conferences[&region.pot2]];
        assert_ne!(members[0], members[1], "region {}", region.index);
        assert_ne!(members[0], members[2], "region {}", region.index);
        assert_ne!(members[1], members[2], "region {}", region.index);
        let bye_slot = &run.bracket.slots[region.index as usize - 1];
        assert_eq!((bye_slot.team, bye_slot.pot), (region.bye, Pot::Bye));
    }
}

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_year1_field_on_fixture_league() {
        let run = playoff(PlayoffParams::new(2023, "year1").with_seed(11)).unwrap();

        assert_eq!(run.key, RunKey::playoff(2023, FormulaVersion::new("v1"), RulesetId::new("year1")));
        assert_eq!(run.qualifiers.len(), 24);
        assert_eq!((count(&run, Pot::Bye), count(&run, Pot::One), count(&run, Pot::Two)), (8, 8, 8));
        assert!(run.pots.iter().all(|row| row.placement == Placement::Table));
        assert_valid_bracket(&run);
    }

    #[test]
    fn test_every_tier_sends_its_champion() {
        let run = playoff(PlayoffParams::new(2023, "year2").with_seed(3)).unwrap();

        for tier in 1..=10 {
            let champion = run
                .qualifiers
                .iter()
                .find(|q| q.tier == tier && q.bid_type == BidType::Champion)
                .unwrap_or_else(|| panic!("tier {tier} has no champion"));
            assert_eq!(champion.conf_rank, 1);
        }
        assert!(run.qualifiers.iter().all(|q| q.conference != fixtures::INDEPENDENTS));
        let tier5: Vec<u32> = run.qualifiers.iter().filter(|q| q.tier == 5).map(|q| q.conf_rank).collect();
        assert_eq!(tier5, vec![1, 2, 3]);
    }

    #[test]
    fn test_qualifiers_are_ordered_by_tier_then_rank() {
        let run = playoff(PlayoffParams::new(2023, "year1")).unwrap();

        let order: Vec<(u32, u32)> = run.qualifiers.iter().map(|q| (q.tier, q.conf_rank)).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert!(run.qualifiers.iter().all(|q| q.ruleset == RulesetId::new("year1")));
    }

    #[test]
    fn test_byes_fill_first_slots_in_strength_order() {
        let (_, coefficients) = league();
        let strengths = StrengthTable::from_run(coefficients);
        let run = playoff(PlayoffParams::new(2023, "year1").with_seed(5)).unwrap();

        let byes: Vec<f64> = run.bracket.slots[..8]
            .iter()
            .map(|slot| strengths.get(slot.team).unwrap().points_per_game)
            .collect();
        assert!(byes.windows(2).all(|pair| pair[0] >= pair[1]), "{byes:?}");
    }

    #[test]
    fn test_stronger_side_hosts() {
        let (_, coefficients) = league();
        let strengths = StrengthTable::from_run(coefficients);
        let run = playoff(PlayoffParams::new(2023, "year1").with_seed(9)).unwrap();

        for region in &run.bracket.regions {
            for fixture in [region.opening, region.bye_vs_pot1, region.bye_vs_pot2] {
                let home = strengths.get(fixture.home).unwrap().points_per_game;
                let away = strengths.get(fixture.away).unwrap().points_per_game;
                assert!(home >= away, "region {}: {fixture:?}", region.index);
            }
        }
    }

    #[test]
    fn test_same_seed_same_bracket() {
        let a = playoff(PlayoffParams::new(2023, "year1").with_seed(42)).unwrap();
        let b = playoff(PlayoffParams::new(2023, "year1").with_seed(42)).unwrap();

        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_seed_only_moves_drawn_slots() {
        let a = playoff(PlayoffParams::new(2023, "year1").with_seed(1)).unwrap();
        let b = playoff(PlayoffParams::new(2023, "year1").with_seed(2)).unwrap();

        assert_eq!(a.qualifiers, b.qualifiers);
        assert_eq!(a.pots, b.pots);
        let byes = |run: &PlayoffRun| run.bracket.slots[..8].iter().map(|slot| slot.team).collect::<Vec<_>>();
        assert_eq!(byes(&a), byes(&b));
        assert_eq!((a.bracket.draw_seed, b.bracket.draw_seed), (1, 2));
    }

    #[test]
    fn test_season_mismatch_is_rejected() {
        let (ledger, coefficients) = league();

        let err = PlayoffEngine::default()
            .run(ledger, coefficients, &PlayoffParams::new(2022, "year1"))
            .unwrap_err();

        assert!(matches!(err, CoeError::Configuration(_)));
    }

    #[test]
    fn test_unknown_ruleset_is_configuration_error() {
        let err = playoff(PlayoffParams::new(2023, "year9")).unwrap_err();

        assert!(matches!(err, CoeError::Configuration(_)));
    }

    #[test]
    fn test_default_params_follow_config() {
        let engine = PlayoffEngine::with_config(
            PlayoffConfig { default_seed: 17, ..PlayoffConfig::default() },
            RulesetBook::builtin(),
        );

        let params = engine.default_params(2023);

        assert_eq!(params, PlayoffParams::new(2023, "year2").with_seed(17));
    }
}

mod auxiliary_tests {
    use super::*;

    fn qualifier(run: &PlayoffRun, tier: u32, rank: u32) -> &Qualifier {
        run.qualifiers.iter().find(|q| q.tier == tier && q.conf_rank == rank).unwrap()
    }

    fn pot_of(run: &PlayoffRun, team: TeamId) -> &PotAssignment {
        run.pots.iter().find(|row| row.team == team).unwrap()
    }

    #[test]
    fn test_lower_tier_winner_stays_in_pot_two_and_promotes_tier_seven_champion() {
        let base = playoff(PlayoffParams::new(2023, "year2")).unwrap();
        let winner = qualifier(&base, 9, 1).team;
        let promoted = qualifier(&base, 7, 1).team;

        let run = playoff(PlayoffParams::new(2023, "year2").with_seed(3).with_auxiliary_winner(TeamRef::Id(winner)))
            .unwrap();

        let row = pot_of(&run, winner);
        assert_eq!((row.pot, row.placement), (Pot::Two, Placement::Table));
        let row = pot_of(&run, promoted);
        assert_eq!((row.pot, row.placement), (Pot::One, Placement::AuxiliaryPromotion));
        assert_eq!((count(&run, Pot::Bye), count(&run, Pot::One), count(&run, Pot::Two)), (8, 8, 8));
        assert!(run.pots.iter().all(|row| row.placement != Placement::Balanced));
        assert_valid_bracket(&run);
    }

    #[test]
    fn test_tier_seven_champion_as_winner_is_promoted() {
        let base = playoff(PlayoffParams::new(2023, "year2")).unwrap();
        let winner = qualifier(&base, 7, 1).team;

        let run = playoff(PlayoffParams::new(2023, "year2").with_auxiliary_winner(TeamRef::Id(winner))).unwrap();

        let row = pot_of(&run, winner);
        assert_eq!((row.pot, row.placement), (Pot::One, Placement::AuxiliaryPromotion));
        assert_eq!(run.pots.iter().filter(|row| row.placement == Placement::AuxiliaryPromotion).count(), 1);
    }

    #[test]
    fn test_upper_tier_winner_moves_to_pot_one() {
        let base = playoff(PlayoffParams::new(2023, "year2")).unwrap();
        let winner = qualifier(&base, 5, 3).team;

        let run = playoff(PlayoffParams::new(2023, "year2").with_auxiliary_winner(TeamRef::Id(winner))).unwrap();

        let row = pot_of(&run, winner);
        assert_eq!((row.pot, row.placement), (Pot::One, Placement::AuxiliaryWinner));
        assert_eq!(count(&run, Pot::One), 8);
        assert!(run.pots.iter().all(|row| row.placement != Placement::AuxiliaryPromotion));
    }

    #[test]
    fn test_winner_holding_a_bye_keeps_it() {
        let base = playoff(PlayoffParams::new(2023, "year2")).unwrap();
        let winner = qualifier(&base, 6, 1).team;

        let run = playoff(PlayoffParams::new(2023, "year2").with_auxiliary_winner(TeamRef::Id(winner))).unwrap();

        assert_eq!(pot_of(&run, winner).pot, Pot::Bye);
        assert_eq!(count(&run, Pot::Bye), 8);
    }

    #[test]
    fn test_without_winner_pots_are_balanced() {
        let run = playoff(PlayoffParams::new(2023, "year2").with_seed(4)).unwrap();

        let balanced: Vec<&PotAssignment> =
            run.pots.iter().filter(|row| row.placement == Placement::Balanced).collect();
        assert_eq!(balanced.len(), 1);
        assert_eq!(balanced[0].pot, Pot::One);
        assert_eq!((count(&run, Pot::One), count(&run, Pot::Two)), (8, 8));
    }

    #[test]
    fn test_winner_resolved_by_alias() {
        let base = playoff(PlayoffParams::new(2023, "year2")).unwrap();
        let champion = qualifier(&base, 9, 1).team;
        let promoted = qualifier(&base, 7, 1).team;

        let run = playoff(
            PlayoffParams::new(2023, "year2").with_auxiliary_winner(TeamRef::Name(format!("T{}", champion.0))),
        )
        .unwrap();

        assert_eq!(pot_of(&run, champion).pot, Pot::Two);
        assert_eq!(pot_of(&run, promoted).placement, Placement::AuxiliaryPromotion);
    }

    #[test]
    fn test_winner_outside_the_field_is_reference_error() {
        let err = playoff(PlayoffParams::new(2023, "year2").with_auxiliary_winner(TeamRef::Name("T806".into())))
            .unwrap_err();

        assert!(matches!(err, CoeError::Reference(_)));
    }

    #[test]
    fn test_unknown_winner_name_is_reference_error() {
        let err = playoff(PlayoffParams::new(2023, "year2").with_auxiliary_winner(TeamRef::Name("Nobody".into())))
            .unwrap_err();

        assert!(matches!(err, CoeError::Reference(_)));
    }
}

mod draw_tests {
    use super::*;

    fn key() -> RunKey {
        RunKey::playoff(2023, FormulaVersion::new("v1"), RulesetId::new("year1"))
    }

    fn entry(team: u32, conference: u32, rank: u32, pot: Pot) -> (Qualifier, PotAssignment) {
        let key = key();
        let ruleset = RulesetId::new("year1");
        (
            Qualifier {
                season: 2023,
                conference: ConferenceId(conference),
                team: TeamId(team),
                conf_rank: rank,
                tier: conference,
                bid_type: if rank == 1 { BidType::Champion } else { BidType::AtLarge },
                formula_version: key.formula_version.clone(),
                ruleset: ruleset.clone(),
            },
            PotAssignment {
                season: 2023,
                team: TeamId(team),
                conference: ConferenceId(conference),
                pot,
                placement: Placement::Table,
                formula_version: key.formula_version,
                ruleset,
            },
        )
    }

    fn strengths(teams: &[u32]) -> StrengthTable {
        let mut table = StrengthTable::default();
        for team in teams {
            table.insert(TeamStrength { team: TeamId(*team), total_points: 10.0, points_per_game: f64::from(*team) });
        }
        table
    }

    fn split(entries: Vec<(Qualifier, PotAssignment)>) -> (Vec<Qualifier>, Vec<PotAssignment>) {
        entries.into_iter().unzip()
    }

    #[test]
    fn test_forced_draw_is_found_for_every_seed() {
        // Only one conflict-free bracket exists
        let (qualifiers, pots) = split(vec![
            entry(1, 1, 1, Pot::Bye),
            entry(2, 2, 1, Pot::Bye),
            entry(3, 2, 2, Pot::One),
            entry(4, 1, 2, Pot::One),
            entry(5, 3, 1, Pot::Two),
            entry(6, 3, 2, Pot::Two),
        ]);
        let table = strengths(&[1, 2, 3, 4, 5, 6]);
        let drawer = BracketDrawer::new(DrawSettings::default());

        for seed in 0..20 {
            let bracket = drawer.draw(&key(), &qualifiers, &pots, &table, seed).unwrap();
            assert_eq!(bracket.regions[0].bye, TeamId(2));
            assert_eq!(bracket.regions[0].pot1, TeamId(4));
            assert_eq!(bracket.regions[1].pot1, TeamId(3));
        }
    }

    #[test]
    fn test_impossible_draw_is_exhausted() {
        let (qualifiers, pots) = split(vec![
            entry(1, 1, 1, Pot::Bye),
            entry(2, 1, 2, Pot::Bye),
            entry(3, 1, 3, Pot::One),
            entry(4, 2, 1, Pot::One),
            entry(5, 2, 2, Pot::Two),
            entry(6, 2, 3, Pot::Two),
        ]);
        let table = strengths(&[1, 2, 3, 4, 5, 6]);

        let err = BracketDrawer::new(DrawSettings::default()).draw(&key(), &qualifiers, &pots, &table, 0).unwrap_err();

        assert!(matches!(err, CoeError::DrawExhausted(_)));
    }

    #[test]
    fn test_uneven_pots_are_configuration_error() {
        let (qualifiers, pots) = split(vec![
            entry(1, 1, 1, Pot::Bye),
            entry(2, 2, 1, Pot::One),
            entry(3, 3, 1, Pot::One),
        ]);

        let err = BracketDrawer::new(DrawSettings::default())
            .draw(&key(), &qualifiers, &pots, &strengths(&[1, 2, 3]), 0)
            .unwrap_err();

        assert!(matches!(err, CoeError::Configuration(_)));
    }

    #[test]
    fn test_missing_strength_is_reference_error() {
        let (qualifiers, pots) = split(vec![
            entry(1, 1, 1, Pot::Bye),
            entry(2, 2, 1, Pot::Bye),
            entry(3, 3, 1, Pot::One),
            entry(4, 4, 1, Pot::One),
            entry(5, 5, 1, Pot::Two),
            entry(6, 6, 1, Pot::Two),
        ]);

        let err = BracketDrawer::new(DrawSettings::default())
            .draw(&key(), &qualifiers, &pots, &strengths(&[1, 3, 4, 5, 6]), 0)
            .unwrap_err();

        assert!(matches!(err, CoeError::Reference(_)));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_defective_ruleset_is_rejected_by_the_book() {
        let mut ruleset = Ruleset::year1();
        ruleset.id = RulesetId::new("broken");
        ruleset.tiers[0] = TierRule::new(1, 2, &[Pot::Bye, Pot::One, Pot::One, Pot::Two]);

        let err = RulesetBook::from_rulesets(vec![ruleset]).unwrap_err();

        assert!(matches!(err, CoeError::Configuration(_)));
    }

    #[test]
    fn test_wrong_field_size_is_configuration_error() {
        let (ledger, coefficients) = league();
        let ranked = rank_conferences(coefficients.conference_rolling().filter(|(c, _)| c.0 <= 5));
        let ruleset = Ruleset::year1();
        let allocations = allocate_bids(&ranked, &ruleset);

        let err =
            select_qualifiers(ledger, 2023, &allocations, &ruleset, &FormulaVersion::new("v1")).unwrap_err();

        assert!(matches!(err, CoeError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_ruleset_is_rejected() {
        let err = RulesetBook::from_rulesets(vec![Ruleset::year1(), Ruleset::year1()]).unwrap_err();

        assert!(matches!(err, CoeError::Configuration(_)));
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_any_seed_yields_a_valid_bracket(seed in any::<u64>(), year2 in any::<bool>()) {
            let ruleset = if year2 { "year2" } else { "year1" };
            let run = playoff(PlayoffParams::new(2023, ruleset).with_seed(seed)).unwrap();

            prop_assert_eq!(run.bracket.draw_seed, seed);
            assert_valid_bracket(&run);
        }
    }
}
