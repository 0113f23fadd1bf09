//! Season and rolling-window sums over component rows

use coe_core::{
    points_per_game, CoeError, Component, ComponentScore, FormulaVersion, Result,
    RollingCoefficient, SeasonCoefficient, SeasonYear, Subject, TeamId,
};
use std::collections::{BTreeMap, BTreeSet};

/// Sum component rows of one season per subject
pub fn season_coefficients(
    season: SeasonYear,
    components: &[ComponentScore],
    formula_version: &FormulaVersion,
) -> Vec<SeasonCoefficient> {
    let mut totals: BTreeMap<Subject, (f64, u32)> = BTreeMap::new();
    for row in components.iter().filter(|row| row.season == season) {
        let total = totals.entry(row.subject).or_default();
        total.0 += row.points;
        total.1 += row.games_counted;
    }
    totals
        .into_iter()
        .map(|(subject, (total_points, games_counted))| SeasonCoefficient {
            season,
            subject,
            total_points,
            games_counted,
            points_per_game: points_per_game(total_points, games_counted),
            formula_version: formula_version.clone(),
        })
        .collect()
}

/// Rolling coefficients for `season` over the given window seasons.
///
/// Only subjects with rows in `season` itself get a rolling row. Each
/// subject's window starts at the earliest window season holding one of its
/// rows; bootstrap windows are never padded. Playoff participation counts for
/// at most `participation_cap` seasons per (subject, contributing team), the
/// most recent ones first.
pub fn rolling_coefficients(
    season: SeasonYear,
    window: &[SeasonYear],
    components_by_season: &BTreeMap<SeasonYear, Vec<ComponentScore>>,
    participation_cap: u32,
    formula_version: &FormulaVersion,
) -> Result<Vec<RollingCoefficient>> {
    if window.last() != Some(&season) {
        return Err(CoeError::invariant(format!(
            "rolling window {window:?} does not end at season {season}"
        )));
    }

    let active: BTreeSet<Subject> = components_by_season
        .get(&season)
        .map(|rows| rows.iter().map(|row| row.subject).collect())
        .unwrap_or_default();

    let mut sums: BTreeMap<Subject, WindowSum> = BTreeMap::new();
    let mut participation: BTreeMap<(Subject, Option<TeamId>), Vec<(SeasonYear, f64)>> = BTreeMap::new();

    for year in window {
        let Some(rows) = components_by_season.get(year) else {
            continue;
        };
        for row in rows.iter().filter(|row| active.contains(&row.subject)) {
            let sum = sums.entry(row.subject).or_default();
            sum.seasons.insert(row.season);
            sum.games += row.games_counted;
            if row.component == Component::PlayoffParticipation {
                participation.entry((row.subject, row.contributor)).or_default().push((row.season, row.points));
            } else {
                sum.points += row.points;
            }
        }
    }

    for ((subject, _), mut seasons) in participation {
        seasons.sort_by(|a, b| b.0.cmp(&a.0));
        if let Some(sum) = sums.get_mut(&subject) {
            sum.points += seasons.iter().take(participation_cap as usize).map(|(_, points)| points).sum::<f64>();
        }
    }

    sums.into_iter()
        .map(|(subject, sum)| {
            let window_start = sum.seasons.first().copied().unwrap_or(season);
            let row = RollingCoefficient {
                season,
                subject,
                window_start,
                window_end: season,
                seasons_counted: sum.seasons.len() as u32,
                total_points: sum.points,
                games_counted: sum.games,
                points_per_game: points_per_game(sum.points, sum.games),
                formula_version: formula_version.clone(),
            };
            check_window(&row)?;
            Ok(row)
        })
        .collect()
}

#[derive(Debug, Default)]
struct WindowSum {
    points: f64,
    games: u32,
    seasons: BTreeSet<SeasonYear>,
}

fn check_window(row: &RollingCoefficient) -> Result<()> {
    let span = row.window_end - row.window_start;
    if row.window_end != row.season || !(0..=4).contains(&span) {
        return Err(CoeError::invariant(format!(
            "{} rolling window [{}, {}] is invalid for season {}",
            row.subject, row.window_start, row.window_end, row.season
        )));
    }
    if !row.total_points.is_finite() || row.total_points < 0.0 {
        return Err(CoeError::invariant(format!(
            "{} rolling total {} is not a finite non-negative number",
            row.subject, row.total_points
        )));
    }
    Ok(())
}
