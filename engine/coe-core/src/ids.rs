//! Identity newtypes shared by every stage of the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Season label (calendar year the season starts in)
pub type SeasonYear = i32;

/// Canonical team identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

/// Canonical conference identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConferenceId(pub u32);

/// Tag of one frozen revision of the scoring methodology
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaVersion(String);

/// Tag of one revision of the playoff structural rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RulesetId(String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

impl fmt::Display for ConferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conference#{}", self.0)
    }
}

impl FormulaVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RulesetId {
    pub fn new(ruleset: impl Into<String>) -> Self {
        Self(ruleset.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormulaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RulesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormulaVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RulesetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of one engine run.
///
/// Coefficient runs are keyed by (season, formula_version); playoff runs add
/// the ruleset. Every derived row produced by a run is stamped with its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunKey {
    pub season: SeasonYear,
    pub formula_version: FormulaVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<RulesetId>,
}

impl RunKey {
    /// Key of a coefficient run
    pub fn coefficients(season: SeasonYear, formula_version: FormulaVersion) -> Self {
        Self { season, formula_version, ruleset: None }
    }

    /// Key of a playoff run
    pub fn playoff(season: SeasonYear, formula_version: FormulaVersion, ruleset: RulesetId) -> Self {
        Self { season, formula_version, ruleset: Some(ruleset) }
    }

    /// File-name friendly form, e.g. `2023_v1_year2`
    pub fn slug(&self) -> String {
        match &self.ruleset {
            Some(ruleset) => format!("{}_{}_{}", self.season, self.formula_version, ruleset),
            None => format!("{}_{}", self.season, self.formula_version),
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(season={}, formula={}", self.season, self.formula_version)?;
        if let Some(ruleset) = &self.ruleset {
            write!(f, ", ruleset={ruleset}")?;
        }
        f.write_str(")")
    }
}
