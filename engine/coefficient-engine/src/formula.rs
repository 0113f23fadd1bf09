//! Versioned scoring policies
//!
//! A [`FormulaSpec`] is one frozen revision of the methodology. Formulas are
//! data: new versions are added to a [`FormulaBook`] without touching the
//! aggregator, and every row the aggregator emits carries the version tag.

use coe_core::{CoeError, FormulaVersion, Outcome, Result, TeamId, DEFAULT_WINDOW_YEARS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Team-facing base points per game result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointTable {
    pub win: f64,
    pub overtime_loss: f64,
    pub loss: f64,
}

impl Default for PointTable {
    fn default() -> Self {
        Self { win: 2.0, overtime_loss: 1.0, loss: 0.0 }
    }
}

impl PointTable {
    pub fn points_for(&self, team: TeamId, outcome: &Outcome) -> f64 {
        if outcome.winner == team {
            self.win
        } else if outcome.overtime {
            self.overtime_loss
        } else {
            self.loss
        }
    }
}

/// Rolling strength of the opponent a bounty is priced against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentStrength {
    pub team: TeamId,
    /// Raw (pre-bounty) rolling points per game as of the season being scored
    pub rolling_ppg: f64,
    pub games_counted: u32,
}

/// Scaling applied to non-conference base points by opponent strength
pub trait BountyPolicy: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn multiplier(&self, opponent: &OpponentStrength) -> f64;
}

/// Built-in bounty policies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BountyRule {
    /// Base points count as-is
    None,
    /// Base points times the opponent's rolling PPG, optionally clamped
    OpponentRollingPpg {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        floor: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cap: Option<f64>,
    },
}

impl BountyPolicy for BountyRule {
    fn name(&self) -> &str {
        match self {
            BountyRule::None => "none",
            BountyRule::OpponentRollingPpg { .. } => "opponent_rolling_ppg",
        }
    }

    fn multiplier(&self, opponent: &OpponentStrength) -> f64 {
        match *self {
            BountyRule::None => 1.0,
            BountyRule::OpponentRollingPpg { floor, cap } => {
                let mut multiplier = opponent.rolling_ppg;
                if let Some(floor) = floor {
                    multiplier = multiplier.max(floor);
                }
                if let Some(cap) = cap {
                    multiplier = multiplier.min(cap);
                }
                multiplier
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayoffBonusRule {
    /// Awarded once per playoff season
    pub participation_points: f64,
    /// Seasons of participation counted per contributing team in one window
    pub participation_cap_seasons: u32,
    pub per_game_points: f64,
}

impl Default for PlayoffBonusRule {
    fn default() -> Self {
        Self { participation_points: 6.0, participation_cap_seasons: 2, per_game_points: 1.5 }
    }
}

/// Bonus for a final ranking inside the top `top_n`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishBonusRule {
    pub top_n: u32,
    pub points: f64,
}

fn default_window_years() -> u32 {
    DEFAULT_WINDOW_YEARS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSpec {
    pub version: FormulaVersion,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_window_years")]
    pub window_years: u32,
    #[serde(default)]
    pub points: PointTable,
    pub bounty: BountyRule,
    #[serde(default)]
    pub playoff: PlayoffBonusRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_bonus: Option<FinishBonusRule>,
}

impl FormulaSpec {
    /// Base points and playoff bonuses, no opponent weighting
    pub fn v0() -> Self {
        Self {
            version: FormulaVersion::new("v0"),
            description: "base points with playoff bonuses".to_string(),
            window_years: DEFAULT_WINDOW_YEARS,
            points: PointTable::default(),
            bounty: BountyRule::None,
            playoff: PlayoffBonusRule::default(),
            finish_bonus: None,
        }
    }

    /// v0 plus the opponent rolling PPG bounty on non-conference games
    pub fn v1() -> Self {
        Self {
            version: FormulaVersion::new("v1"),
            description: "v0 with opponent rolling PPG bounty".to_string(),
            bounty: BountyRule::OpponentRollingPpg { floor: None, cap: None },
            ..Self::v0()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let version = &self.version;
        if version.as_str().trim().is_empty() {
            return Err(CoeError::config("formula version must not be empty"));
        }
        if self.window_years == 0 || self.window_years > DEFAULT_WINDOW_YEARS {
            return Err(CoeError::config(format!(
                "formula {version}: window_years must be within 1..={DEFAULT_WINDOW_YEARS}, got {}",
                self.window_years
            )));
        }

        let mut amounts = vec![
            ("points.win", self.points.win),
            ("points.overtime_loss", self.points.overtime_loss),
            ("points.loss", self.points.loss),
            ("playoff.participation_points", self.playoff.participation_points),
            ("playoff.per_game_points", self.playoff.per_game_points),
        ];
        if let BountyRule::OpponentRollingPpg { floor, cap } = self.bounty {
            amounts.extend(floor.map(|floor| ("bounty.floor", floor)));
            amounts.extend(cap.map(|cap| ("bounty.cap", cap)));
            if let (Some(floor), Some(cap)) = (floor, cap) {
                if floor > cap {
                    return Err(CoeError::config(format!(
                        "formula {version}: bounty floor {floor} exceeds cap {cap}"
                    )));
                }
            }
        }
        if let Some(finish) = &self.finish_bonus {
            if finish.top_n == 0 {
                return Err(CoeError::config(format!("formula {version}: finish_bonus.top_n must be positive")));
            }
            amounts.push(("finish_bonus.points", finish.points));
        }
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(CoeError::config(format!(
                    "formula {version}: {field} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Registry of known formula versions
#[derive(Debug, Clone)]
pub struct FormulaBook {
    formulas: BTreeMap<FormulaVersion, FormulaSpec>,
}

impl FormulaBook {
    /// The built-in `v0` and `v1` formulas
    pub fn builtin() -> Self {
        let formulas = [FormulaSpec::v0(), FormulaSpec::v1()]
            .into_iter()
            .map(|spec| (spec.version.clone(), spec))
            .collect();
        Self { formulas }
    }

    /// Build a book from validated specs; duplicate versions are rejected
    pub fn from_specs(specs: Vec<FormulaSpec>) -> Result<Self> {
        let mut book = Self { formulas: BTreeMap::new() };
        for spec in specs {
            book.insert(spec)?;
        }
        Ok(book)
    }

    /// Register a new version. A frozen version is never redefined.
    pub fn insert(&mut self, spec: FormulaSpec) -> Result<()> {
        spec.validate()?;
        if self.formulas.contains_key(&spec.version) {
            return Err(CoeError::config(format!("formula {} is defined twice", spec.version)));
        }
        self.formulas.insert(spec.version.clone(), spec);
        Ok(())
    }

    pub fn get(&self, version: &FormulaVersion) -> Result<&FormulaSpec> {
        self.formulas
            .get(version)
            .ok_or_else(|| CoeError::config(format!("unknown formula version '{version}'")))
    }

    pub fn versions(&self) -> impl Iterator<Item = &FormulaVersion> {
        self.formulas.keys()
    }
}

impl Default for FormulaBook {
    fn default() -> Self {
        Self::builtin()
    }
}
