//! Catalog Config

use std::path::PathBuf;

use clap::Args;

/// Where catalog and scenario fixtures are read from.
#[derive(Debug, Args)]
pub struct CatalogConfig {
    /// Fixture root containing `catalogs/` and `scenarios/`
    #[arg(long, env = "PLATTER_FIXTURES", default_value = "./fixtures")]
    pub fixtures_path: PathBuf,

    /// Catalog to load; defaults to the one named by the scenario
    #[arg(long, env = "PLATTER_CATALOG")]
    pub catalog: Option<String>,
}
