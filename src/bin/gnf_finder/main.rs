//! gnf-finder: rank reference-catalog neighbors of every target galaxy
//!
//! Loads both catalogs, searches neighbors within the projected-separation and
//! velocity-difference cutoffs and writes one CSV row per (target, neighbor) pair.

mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use gnf::{config::GnfConfig, Catalog, NeighborFinder};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GnfConfig::from_file(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => GnfConfig::default(),
    };
    config.apply_overrides(&cli.overrides());
    config.validate()?;

    logging::init(&config.logging)?;

    if let Err(e) = run(&cli, &config) {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

fn run(cli: &Cli, config: &GnfConfig) -> anyhow::Result<()> {
    let params = config.search_params()?;
    info!("Configuration: {params}");
    info!(
        "Cosmology: H0={} km/s/Mpc, Om0={}",
        config.cosmology.h0, config.cosmology.om0
    );

    info!("Loading target catalog {}", cli.target.display());
    let target = Catalog::from_csv_path(
        &cli.target,
        "Target",
        &config.catalogs.target.column_mapping,
    )?;
    info!("Loading reference catalog {}", cli.reference.display());
    let reference = Catalog::from_csv_path(
        &cli.reference,
        "Reference",
        &config.catalogs.reference.column_mapping,
    )?;
    info!("{target}, {reference}");

    let finder = NeighborFinder::new(target, reference, config.cosmology)?;
    let table = finder.find_neighbors(&params)?;

    table
        .to_csv_path(&cli.output, config.output.float_precision)
        .with_context(|| format!("cannot write {}", cli.output.display()))?;
    info!("Wrote {} rows to {}", table.len(), cli.output.display());

    if let Some(stats) = table.neighbor_count_stats() {
        info!("First rows:\n{}", table.preview(config.output.preview_rows));
        info!("{stats:#}");
    }
    Ok(())
}
