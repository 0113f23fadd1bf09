//! Loading the ledger dataset, formula book and ruleset tables

use anyhow::{Context, Result};
use coe_core::{Dataset, GameLedger};
use coefficient_engine::{FormulaBook, FormulaSpec};
use playoff_engine::{Ruleset, RulesetBook};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Formula book file: a list of `[[formula]]` tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulaFile {
    #[serde(default)]
    pub formula: Vec<FormulaSpec>,
}

/// Ruleset file: a list of `[[ruleset]]` tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesetFile {
    #[serde(default)]
    pub ruleset: Vec<Ruleset>,
}

/// Read and validate the ledger dataset
pub fn load_ledger(path: &Path) -> Result<GameLedger> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read dataset {path:?}"))?;
    let dataset: Dataset =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse dataset {path:?}"))?;
    let ledger = GameLedger::from_dataset(dataset).with_context(|| format!("Dataset {path:?} is invalid"))?;
    info!("Loaded ledger from {:?}", path);
    Ok(ledger)
}

/// The formula book from a TOML file, or the built-in formulas
pub fn load_formulas(path: Option<&Path>) -> Result<FormulaBook> {
    let Some(path) = path else {
        return Ok(FormulaBook::builtin());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read formulas {path:?}"))?;
    let file: FormulaFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse formulas {path:?}"))?;
    let count = file.formula.len();
    let book = FormulaBook::from_specs(file.formula).with_context(|| format!("Formulas in {path:?} are invalid"))?;
    info!("Loaded {count} formulas from {:?}", path);
    Ok(book)
}

/// Ruleset tables from a TOML file, or the built-in rulesets
pub fn load_rulesets(path: Option<&Path>) -> Result<RulesetBook> {
    let Some(path) = path else {
        return Ok(RulesetBook::builtin());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read rulesets {path:?}"))?;
    let file: RulesetFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse rulesets {path:?}"))?;
    let count = file.ruleset.len();
    let book =
        RulesetBook::from_rulesets(file.ruleset).with_context(|| format!("Rulesets in {path:?} are invalid"))?;
    info!("Loaded {count} rulesets from {:?}", path);
    Ok(book)
}
