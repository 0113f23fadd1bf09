//! Playoff Engine
//!
//! Composes bid allocation, qualifier selection, pot assignment and the
//! bracket draw for one (season, formula_version, ruleset) key. The
//! coefficient run is an input; nothing here recomputes coefficients.

use crate::bids::{allocate_bids, rank_conferences};
use crate::config::PlayoffConfig;
use crate::draw::BracketDrawer;
use crate::pots::PotAssigner;
use crate::qualifiers::select_qualifiers;
use crate::ruleset::RulesetBook;
use crate::strength::StrengthTable;
use coe_core::{
    CoeError, CoefficientRun, GameLedger, PlayoffRun, Result, RulesetId, RunKey, SeasonYear,
    TeamRef,
};
use tracing::{debug, info};

/// Parameters of one playoff run
#[derive(Debug, Clone, PartialEq)]
pub struct PlayoffParams {
    pub season: SeasonYear,
    pub ruleset: RulesetId,
    pub draw_seed: u64,
    /// Winner of the secondary bid-granting tournament, by id or name
    pub auxiliary_winner: Option<TeamRef>,
}

impl PlayoffParams {
    pub fn new(season: SeasonYear, ruleset: impl Into<RulesetId>) -> Self {
        Self { season, ruleset: ruleset.into(), draw_seed: 0, auxiliary_winner: None }
    }

    pub fn with_seed(mut self, draw_seed: u64) -> Self {
        self.draw_seed = draw_seed;
        self
    }

    pub fn with_auxiliary_winner(mut self, winner: TeamRef) -> Self {
        self.auxiliary_winner = Some(winner);
        self
    }
}

pub struct PlayoffEngine {
    config: PlayoffConfig,
    rulesets: RulesetBook,
}

impl PlayoffEngine {
    pub fn new(rulesets: RulesetBook) -> Self {
        Self::with_config(PlayoffConfig::default(), rulesets)
    }

    pub fn with_config(config: PlayoffConfig, rulesets: RulesetBook) -> Self {
        Self { config, rulesets }
    }

    pub fn config(&self) -> &PlayoffConfig {
        &self.config
    }

    pub fn rulesets(&self) -> &RulesetBook {
        &self.rulesets
    }

    /// Parameters for `season` using the configured default ruleset and seed
    pub fn default_params(&self, season: SeasonYear) -> PlayoffParams {
        PlayoffParams::new(season, self.config.default_ruleset.clone()).with_seed(self.config.default_seed)
    }

    pub fn run(&self, ledger: &GameLedger, coefficients: &CoefficientRun, params: &PlayoffParams) -> Result<PlayoffRun> {
        if coefficients.key.season != params.season {
            return Err(CoeError::config(format!(
                "coefficients {} cannot seed the {} playoff",
                coefficients.key, params.season
            )));
        }
        let ruleset = self.rulesets.get(&params.ruleset)?;
        let key = RunKey::playoff(params.season, coefficients.key.formula_version.clone(), ruleset.id.clone());
        info!("Running playoff {key}");

        let mut eligible = Vec::new();
        for (conference, row) in coefficients.conference_rolling() {
            if ledger.conference(conference)?.playoff_eligible {
                eligible.push((conference, row));
            } else {
                debug!("{conference} is not playoff eligible, leaving it unranked");
            }
        }
        let ranked = rank_conferences(eligible);
        let allocations = allocate_bids(&ranked, ruleset);
        let qualifiers =
            select_qualifiers(ledger, params.season, &allocations, ruleset, &coefficients.key.formula_version)?;

        let strengths = StrengthTable::from_run(coefficients);
        let winner = params
            .auxiliary_winner
            .as_ref()
            .map(|winner| ledger.directory().resolve(winner))
            .transpose()?;
        let pots = PotAssigner::new(ruleset).assign(&qualifiers, winner, &strengths)?;

        let bracket = BracketDrawer::new(self.config.draw).draw(&key, &qualifiers, &pots, &strengths, params.draw_seed)?;
        info!(
            "Playoff {key} complete: {} qualifiers, {} regions",
            qualifiers.len(),
            bracket.regions.len()
        );
        Ok(PlayoffRun { key, qualifiers, pots, bracket })
    }
}

impl Default for PlayoffEngine {
    fn default() -> Self {
        Self::new(RulesetBook::builtin())
    }
}
