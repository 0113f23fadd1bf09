use crate::draw::DrawSettings;
use coe_core::RulesetId;
use serde::{Deserialize, Serialize};

/// Configuration for the Playoff Engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayoffConfig {
    /// Ruleset used when a caller does not name one
    pub default_ruleset: RulesetId,

    /// Draw seed used when a caller does not supply one
    pub default_seed: u64,

    pub draw: DrawSettings,
}

impl Default for PlayoffConfig {
    fn default() -> Self {
        Self { default_ruleset: RulesetId::new("year2"), default_seed: 0, draw: DrawSettings::default() }
    }
}
