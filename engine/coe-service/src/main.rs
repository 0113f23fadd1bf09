//! CoE Engine
//!
//! Batch runner: computes coefficients and playoff artifacts for a key and
//! commits them to the local result store.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use coe_core::PlayoffRun;
use coe_service::{initialize_logging, load_config, validate_inputs, Cli, Command, Pipeline};
use result_store::{LocalStore, ResultStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    initialize_logging(&config.logging)?;
    info!("Starting CoE Engine v{}", env!("CARGO_PKG_VERSION"));

    if let Command::Validate = cli.command {
        let report = validate_inputs(&config)?;
        println!(
            "ok: {} teams, {} conferences, formulas [{}], rulesets [{}]",
            report.teams,
            report.conferences,
            report.formulas.join(", "),
            report.rulesets.join(", ")
        );
        return Ok(());
    }

    let store: Arc<dyn ResultStore> =
        Arc::new(LocalStore::open(config.store.clone()).await.context("Failed to open result store")?);
    let pipeline = Pipeline::from_config(&config, store)?;

    match cli.command {
        Command::Coefficients { season, through, formula } => {
            for run in pipeline.coefficients(season, through, formula.as_deref()).await? {
                println!(
                    "{}: {} components, {} rolling coefficients",
                    run.key,
                    run.components.len(),
                    run.rolling_coefficients.len()
                );
            }
        }
        Command::Playoff(args) => {
            let run = pipeline.playoff(args.season, args.formula.as_deref(), &args.request()).await?;
            print_bracket(&pipeline, &run);
        }
        Command::Run(args) => {
            let (coefficients, run) = pipeline.run(args.season, args.formula.as_deref(), &args.request()).await?;
            println!("{}: {} rolling coefficients", coefficients.key, coefficients.rolling_coefficients.len());
            print_bracket(&pipeline, &run);
        }
        Command::Validate => {}
    }

    info!("CoE Engine finished");
    Ok(())
}

fn print_bracket(pipeline: &Pipeline, run: &PlayoffRun) {
    let directory = pipeline.ledger().directory();
    println!("{}: draw seed {}", run.key, run.bracket.draw_seed);
    for region in &run.bracket.regions {
        println!(
            "  region {}: {} awaits {} @ {}",
            region.index,
            directory.display_name(region.bye),
            directory.display_name(region.opening.away),
            directory.display_name(region.opening.home)
        );
    }
}
