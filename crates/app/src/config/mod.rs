//! Platter CLI configuration

use clap::{Args, Parser, Subcommand};

pub use crate::config::{
    catalog::CatalogConfig,
    observability::{LogFormat, LoggingConfig},
};

pub(crate) mod catalog;
pub(crate) mod observability;

/// Platter cart and checkout CLI
#[derive(Debug, Parser)]
#[command(name = "platter-app", about = "Platter cart pricing and checkout", long_about = None)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Catalog fixture settings.
    #[command(flatten)]
    pub catalog: CatalogConfig,

    /// What to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a cart scenario against an in-memory store.
    Run(RunArgs),
}

/// Arguments for `run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Scenario name, read from `<fixtures>/scenarios/<name>.yml`
    #[arg(long)]
    pub scenario: String,
}

impl AppConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
