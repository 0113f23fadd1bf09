//! Runner configuration management
//!
//! Defaults, overlaid by an optional TOML file, overlaid by `COE__*`
//! environment variables (`COE__PLAYOFF__DEFAULT_SEED=7` sets
//! `playoff.default_seed`).

use anyhow::{bail, Context, Result};
use coefficient_engine::AggregatorConfig;
use playoff_engine::PlayoffConfig;
use result_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "COE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Input locations
    pub data: DataSettings,

    pub store: StoreConfig,

    pub aggregator: AggregatorConfig,

    pub playoff: PlayoffConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Ledger dataset (JSON)
    pub dataset: PathBuf,

    /// Formula book (TOML); the built-in formulas when unset
    pub formulas: Option<PathBuf>,

    /// Ruleset tables (TOML); the built-in rulesets when unset
    pub rulesets: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { dataset: PathBuf::from("./data/dataset.json"), formulas: None, rulesets: None }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data.dataset.as_os_str().is_empty() {
            bail!("data.dataset must name a file");
        }
        self.store.validate().map_err(|msg| anyhow::anyhow!("Invalid store configuration: {msg}"))?;

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            level => bail!("Invalid log level: {level}"),
        }
        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            format => bail!("Invalid log format: {format}"),
        }
        Ok(())
    }
}

/// Load configuration from an optional file and the environment
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml).required(true));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__").try_parsing(true),
    );

    let config: ServiceConfig = builder
        .build()
        .and_then(|settings| settings.try_deserialize())
        .with_context(|| match path {
            Some(path) => format!("Failed to load configuration from {path:?}"),
            None => "Failed to load configuration from the environment".to_string(),
        })?;
    config.validate()?;
    Ok(config)
}
