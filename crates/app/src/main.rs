//! Platter Application CLI

use std::{io, process};

use platter::prelude::*;
use tracing::{error, info};

use platter_app::{
    config::{AppConfig, CatalogConfig, Command, RunArgs},
    observability,
    scenario::{self, Scenario, ScenarioError},
};

/// Platter CLI entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = AppConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Logging error: {init_error}");
        }

        process::exit(1);
    }

    let result = match &config.command {
        Command::Run(args) => run(&config.catalog, args).await,
    };

    if let Err(run_error) = result {
        error!("scenario failed: {run_error}");

        process::exit(1);
    }
}

async fn run(catalog: &CatalogConfig, args: &RunArgs) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(&catalog.fixtures_path, &args.scenario)?;
    let catalog_name = catalog.catalog.as_deref().unwrap_or(&scenario.catalog);

    let mut fixture = Fixture::with_base_path(catalog.fixtures_path.clone());
    fixture.load_catalog(catalog_name)?;

    info!(catalog = catalog_name, "loaded catalog");

    let outcome = scenario::run(&scenario, &fixture, io::stdout().lock()).await?;

    info!(orders = outcome.orders.len(), "scenario finished");

    Ok(())
}
