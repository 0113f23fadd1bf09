//! Coefficient Aggregator
//!
//! Two passes per run for target season N:
//!
//! 1. raw component rows (no bounty) for every season the bounty can look
//!    at, then each team's raw rolling PPG as of every season S in N's window;
//! 2. component rows for the window seasons with non-conference base points
//!    multiplied by the opponent's pass-1 rolling PPG as of S.
//!
//! A team's base points never depend on another team's rolling value; only
//! the multiplied figure does.

use crate::config::AggregatorConfig;
use crate::formula::{BountyPolicy, FormulaBook, FormulaSpec, OpponentStrength};
use crate::rolling::{rolling_coefficients, season_coefficients};
use crate::season::SeasonFacts;
use coe_core::{
    CoeError, CoefficientRun, ComponentScore, FormulaVersion, GameLedger, Result, RunFailure,
    RunKey, SeasonYear, Subject, TeamId,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CoefficientAggregator {
    config: AggregatorConfig,
    formulas: FormulaBook,
    bounty_override: Option<Arc<dyn BountyPolicy>>,
}

impl CoefficientAggregator {
    pub fn new(formulas: FormulaBook) -> Self {
        Self::with_config(AggregatorConfig::default(), formulas)
    }

    pub fn with_config(config: AggregatorConfig, formulas: FormulaBook) -> Self {
        Self { config, formulas, bounty_override: None }
    }

    /// Replace the formula's bounty rule with a custom policy
    pub fn with_bounty_policy(mut self, policy: Arc<dyn BountyPolicy>) -> Self {
        self.bounty_override = Some(policy);
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn formulas(&self) -> &FormulaBook {
        &self.formulas
    }

    /// Compute every row of the (season, formula_version) key
    pub fn compute(
        &self,
        ledger: &GameLedger,
        season: SeasonYear,
        version: &FormulaVersion,
    ) -> Result<CoefficientRun> {
        let formula = self.formulas.get(version)?;
        match ledger.season(season) {
            None => return Err(CoeError::reference(format!("season {season} is not in the ledger"))),
            Some(s) if s.excluded => {
                return Err(CoeError::reference(format!("season {season} is excluded from analysis")))
            }
            Some(_) => {}
        }
        let window = ledger.window_seasons(season, formula.window_years);
        info!(
            "Computing coefficients for season {season} with formula {version} over {:?}",
            window
        );

        // Seasons the bounty can reach: the windows of every window season
        let lookback = ledger.window_seasons(season, 2 * formula.window_years - 1);
        let facts: BTreeMap<SeasonYear, SeasonFacts> = self
            .map_seasons(&lookback, |year| SeasonFacts::collect(ledger, year, formula))?
            .into_iter()
            .map(|facts| (facts.season, facts))
            .collect();

        let raw: BTreeMap<SeasonYear, Vec<ComponentScore>> = self
            .map_seasons(&lookback, |year| {
                facts_for(&facts, year)?.components(formula, |_| Ok(1.0)).map(|rows| (year, rows))
            })?
            .into_iter()
            .collect();

        let bountied: BTreeMap<SeasonYear, Vec<ComponentScore>> = self
            .map_seasons(&window, |year| {
                let strengths = opponent_strengths(ledger, &raw, year, formula)?;
                let season_facts = facts_for(&facts, year)?;
                let rows = season_facts.components(formula, |opponent| {
                    let strength = strengths.get(&opponent).ok_or_else(|| {
                        CoeError::invariant(format!("{opponent} has no rolling strength in season {year}"))
                    })?;
                    Ok(self.bounty(formula).multiplier(strength))
                })?;
                let published =
                    rows.into_iter().filter(|row| season_facts.is_published(&row.subject)).collect();
                Ok((year, published))
            })?
            .into_iter()
            .collect();

        let components = bountied.get(&season).cloned().unwrap_or_default();
        let season_rows = season_coefficients(season, &components, &formula.version);
        let rolling = rolling_coefficients(
            season,
            &window,
            &bountied,
            formula.playoff.participation_cap_seasons,
            &formula.version,
        )?;
        check_rolling_games(&rolling, &bountied, &window)?;

        info!(
            "Season {season} formula {version}: {} component rows, {} season rows, {} rolling rows",
            components.len(),
            season_rows.len(),
            rolling.len()
        );

        Ok(CoefficientRun {
            key: RunKey::coefficients(season, formula.version.clone()),
            components,
            season_coefficients: season_rows,
            rolling_coefficients: rolling,
        })
    }

    /// Compute every scorable season of an inclusive range, one run per season.
    /// Excluded seasons are skipped; the first failing season aborts the range.
    pub fn compute_range(
        &self,
        ledger: &GameLedger,
        first: SeasonYear,
        last: SeasonYear,
        version: &FormulaVersion,
    ) -> std::result::Result<Vec<CoefficientRun>, RunFailure> {
        (first..=last)
            .filter(|season| ledger.is_scorable(*season))
            .map(|season| {
                self.compute(ledger, season, version)
                    .map_err(|err| err.for_run(RunKey::coefficients(season, version.clone())))
            })
            .collect()
    }

    fn bounty<'a>(&'a self, formula: &'a FormulaSpec) -> &'a dyn BountyPolicy {
        match &self.bounty_override {
            Some(policy) => policy.as_ref(),
            None => &formula.bounty,
        }
    }

    fn map_seasons<T, F>(&self, seasons: &[SeasonYear], f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(SeasonYear) -> Result<T> + Sync + Send,
    {
        if self.config.parallel {
            seasons.par_iter().map(|year| f(*year)).collect()
        } else {
            seasons.iter().map(|year| f(*year)).collect()
        }
    }
}

fn facts_for(facts: &BTreeMap<SeasonYear, SeasonFacts>, year: SeasonYear) -> Result<&SeasonFacts> {
    facts
        .get(&year)
        .ok_or_else(|| CoeError::invariant(format!("season {year} was not collected before scoring")))
}

/// Pass-1 rolling PPG of every team (FBS or not) as of `season`
fn opponent_strengths(
    ledger: &GameLedger,
    raw: &BTreeMap<SeasonYear, Vec<ComponentScore>>,
    season: SeasonYear,
    formula: &FormulaSpec,
) -> Result<HashMap<TeamId, OpponentStrength>> {
    let window = ledger.window_seasons(season, formula.window_years);
    let rolling = rolling_coefficients(
        season,
        &window,
        raw,
        formula.playoff.participation_cap_seasons,
        &formula.version,
    )?;
    let strengths: HashMap<TeamId, OpponentStrength> = rolling
        .into_iter()
        .filter_map(|row| match row.subject {
            Subject::Team(team) => Some((
                team,
                OpponentStrength { team, rolling_ppg: row.points_per_game, games_counted: row.games_counted },
            )),
            Subject::Conference(_) => None,
        })
        .collect();
    debug!("Season {season}: pass-1 strength for {} teams", strengths.len());
    Ok(strengths)
}

/// Rolling games must equal the games of the constituent seasons
fn check_rolling_games(
    rolling: &[coe_core::RollingCoefficient],
    components: &BTreeMap<SeasonYear, Vec<ComponentScore>>,
    window: &[SeasonYear],
) -> Result<()> {
    for row in rolling {
        let games: u32 = window
            .iter()
            .filter_map(|year| components.get(year))
            .flat_map(|rows| rows.iter())
            .filter(|component| component.subject == row.subject)
            .map(|component| component.games_counted)
            .sum();
        if games != row.games_counted {
            return Err(CoeError::invariant(format!(
                "{} rolling games {} differ from window games {games}",
                row.subject, row.games_counted
            )));
        }
    }
    Ok(())
}
