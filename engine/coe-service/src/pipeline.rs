//! Run orchestration
//!
//! Every artifact of a command is computed in memory first; the store is only
//! touched once the whole command has succeeded.

use anyhow::{anyhow, Context, Result};
use coe_core::{
    CoeError, CoefficientRun, FormulaVersion, GameLedger, PlayoffRun, RulesetId, RunKey, SeasonYear,
    TeamRef,
};
use coefficient_engine::CoefficientAggregator;
use playoff_engine::{PlayoffEngine, PlayoffParams};
use result_store::{ResultStore, StoreError};
use std::sync::Arc;
use tracing::info;

use crate::config::ServiceConfig;
use crate::dataset::{load_formulas, load_ledger, load_rulesets};

/// Playoff options as given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayoffRequest {
    pub ruleset: Option<String>,
    pub seed: Option<u64>,
    /// Team id or name/alias
    pub auxiliary_winner: Option<String>,
}

pub struct Pipeline {
    ledger: GameLedger,
    aggregator: CoefficientAggregator,
    playoff: PlayoffEngine,
    store: Arc<dyn ResultStore>,
}

impl Pipeline {
    pub fn new(
        ledger: GameLedger,
        aggregator: CoefficientAggregator,
        playoff: PlayoffEngine,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self { ledger, aggregator, playoff, store }
    }

    /// Load every input named by the configuration
    pub fn from_config(config: &ServiceConfig, store: Arc<dyn ResultStore>) -> Result<Self> {
        let ledger = load_ledger(&config.data.dataset)?;
        let formulas = load_formulas(config.data.formulas.as_deref())?;
        let rulesets = load_rulesets(config.data.rulesets.as_deref())?;
        let aggregator = CoefficientAggregator::with_config(config.aggregator.clone(), formulas);
        let playoff = PlayoffEngine::with_config(config.playoff.clone(), rulesets);
        Ok(Self::new(ledger, aggregator, playoff, store))
    }

    pub fn ledger(&self) -> &GameLedger {
        &self.ledger
    }

    fn formula(&self, formula: Option<&str>) -> FormulaVersion {
        formula
            .map(FormulaVersion::new)
            .unwrap_or_else(|| self.aggregator.config().default_formula.clone())
    }

    fn compute_coefficients(&self, season: SeasonYear, formula: &FormulaVersion) -> Result<CoefficientRun> {
        self.aggregator
            .compute(&self.ledger, season, formula)
            .map_err(|err| err.for_run(RunKey::coefficients(season, formula.clone())).into())
    }

    fn playoff_params(&self, season: SeasonYear, request: &PlayoffRequest) -> PlayoffParams {
        let mut params = self.playoff.default_params(season);
        if let Some(ruleset) = &request.ruleset {
            params.ruleset = RulesetId::new(ruleset.as_str());
        }
        if let Some(seed) = request.seed {
            params.draw_seed = seed;
        }
        params.auxiliary_winner = request.auxiliary_winner.as_deref().map(parse_team);
        params
    }

    fn compute_playoff(&self, coefficients: &CoefficientRun, params: &PlayoffParams) -> Result<PlayoffRun> {
        self.playoff.run(&self.ledger, coefficients, params).map_err(|err| {
            let key = RunKey::playoff(params.season, coefficients.key.formula_version.clone(), params.ruleset.clone());
            err.for_run(key).into()
        })
    }

    /// Compute and commit coefficients for `season..=through`
    pub async fn coefficients(
        &self,
        season: SeasonYear,
        through: Option<SeasonYear>,
        formula: Option<&str>,
    ) -> Result<Vec<CoefficientRun>> {
        let formula = self.formula(formula);
        let through = through.unwrap_or(season);
        if through < season {
            return Err(anyhow!("--through {through} precedes --season {season}"));
        }

        // A season named on its own must be scorable; ranges skip excluded years
        let runs = if through == season {
            vec![self.compute_coefficients(season, &formula)?]
        } else {
            let skipped: Vec<SeasonYear> =
                (season..=through).filter(|year| !self.ledger.is_scorable(*year)).collect();
            if skipped.len() == (season..=through).count() {
                return Err(anyhow!("No scorable season in {season}..={through}"));
            }
            if !skipped.is_empty() {
                info!("Skipping excluded or missing seasons {skipped:?}");
            }
            self.aggregator.compute_range(&self.ledger, season, through, &formula)?
        };
        for run in &runs {
            self.store
                .commit_coefficients(run)
                .await
                .with_context(|| format!("Failed to commit coefficients {}", run.key))?;
        }
        info!("Committed {} coefficient runs under {formula}", runs.len());
        Ok(runs)
    }

    /// Seed a playoff from previously committed coefficients
    pub async fn playoff(&self, season: SeasonYear, formula: Option<&str>, request: &PlayoffRequest) -> Result<PlayoffRun> {
        let key = RunKey::coefficients(season, self.formula(formula));
        let coefficients = match self.store.load_coefficients(&key).await {
            Ok(run) => run,
            Err(StoreError::NotFound(_)) => {
                return Err(anyhow!("No committed coefficients for {key}; run `coefficients --season {season}` first"))
            }
            Err(err) => return Err(err).with_context(|| format!("Failed to load coefficients {key}")),
        };

        let run = self.compute_playoff(&coefficients, &self.playoff_params(season, request))?;
        self.store.commit_playoff(&run).await.with_context(|| format!("Failed to commit playoff {}", run.key))?;
        Ok(run)
    }

    /// Coefficients and playoff for one key, committed together
    pub async fn run(
        &self,
        season: SeasonYear,
        formula: Option<&str>,
        request: &PlayoffRequest,
    ) -> Result<(CoefficientRun, PlayoffRun)> {
        let formula = self.formula(formula);
        let coefficients = self.compute_coefficients(season, &formula)?;
        let playoff = self.compute_playoff(&coefficients, &self.playoff_params(season, request))?;

        self.store
            .commit_coefficients(&coefficients)
            .await
            .with_context(|| format!("Failed to commit coefficients {}", coefficients.key))?;
        self.store
            .commit_playoff(&playoff)
            .await
            .with_context(|| format!("Failed to commit playoff {}", playoff.key))?;
        Ok((coefficients, playoff))
    }
}

/// Numeric input is a team id, anything else a name or alias
pub fn parse_team(input: &str) -> TeamRef {
    match input.trim().parse::<u32>() {
        Ok(id) => TeamRef::Id(coe_core::TeamId(id)),
        Err(_) => TeamRef::Name(input.trim().to_string()),
    }
}

/// Load and cross-check every input without computing anything
pub fn validate_inputs(config: &ServiceConfig) -> Result<ValidationReport> {
    let ledger = load_ledger(&config.data.dataset)?;
    let formulas = load_formulas(config.data.formulas.as_deref())?;
    let rulesets = load_rulesets(config.data.rulesets.as_deref())?;

    formulas
        .get(&config.aggregator.default_formula)
        .map_err(|err: CoeError| anyhow!("Default formula is not defined: {err}"))?;
    rulesets
        .get(&config.playoff.default_ruleset)
        .map_err(|err: CoeError| anyhow!("Default ruleset is not defined: {err}"))?;

    Ok(ValidationReport {
        teams: ledger.directory().len(),
        conferences: ledger.conferences().count(),
        formulas: formulas.versions().map(ToString::to_string).collect(),
        rulesets: rulesets.ids().map(ToString::to_string).collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub teams: usize,
    pub conferences: usize,
    pub formulas: Vec<String>,
    pub rulesets: Vec<String>,
}

