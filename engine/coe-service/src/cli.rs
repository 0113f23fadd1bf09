//! Command-line interface of `coe-engine`

use crate::pipeline::PlayoffRequest;
use clap::{Args, Parser, Subcommand};
use coe_core::SeasonYear;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "coe-engine", version, about = "Coefficient of Excellence and playoff qualification engine")]
pub struct Cli {
    /// TOML configuration file (COE__* environment variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute and commit coefficients for one season or a range
    Coefficients {
        #[arg(long)]
        season: SeasonYear,

        /// Last season of an inclusive range
        #[arg(long)]
        through: Option<SeasonYear>,

        #[arg(long)]
        formula: Option<String>,
    },

    /// Seed a playoff from committed coefficients
    Playoff(PlayoffArgs),

    /// Compute coefficients and the playoff for one key, then commit both
    Run(PlayoffArgs),

    /// Load and validate the dataset, formulas and rulesets
    Validate,
}

#[derive(Debug, Clone, Args)]
pub struct PlayoffArgs {
    #[arg(long)]
    pub season: SeasonYear,

    #[arg(long)]
    pub formula: Option<String>,

    #[arg(long)]
    pub ruleset: Option<String>,

    /// Draw seed; the configured default when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Auxiliary bid winner, by team id or name. The winning team is required;
    /// naming only its conference is not supported.
    #[arg(long, value_name = "TEAM")]
    pub auxiliary_winner: Option<String>,
}

impl PlayoffArgs {
    pub fn request(&self) -> PlayoffRequest {
        PlayoffRequest {
            ruleset: self.ruleset.clone(),
            seed: self.seed,
            auxiliary_winner: self.auxiliary_winner.clone(),
        }
    }
}
