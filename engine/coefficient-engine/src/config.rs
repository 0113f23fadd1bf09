use coe_core::FormulaVersion;
use serde::{Deserialize, Serialize};

/// Configuration for the Coefficient Aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Formula used when a caller does not name one
    pub default_formula: FormulaVersion,

    /// Score independent seasons on the rayon pool
    pub parallel: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { default_formula: FormulaVersion::new("v1"), parallel: true }
    }
}
