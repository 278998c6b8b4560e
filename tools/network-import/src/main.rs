use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tissea_network::{LineId, NetworkService, SqliteStore, StoreConfig};

mod import;
mod manifest;
mod output;

use import::import_network;
use manifest::NetworkManifest;
use output::write_line_geojson;

#[derive(Parser, Debug)]
#[command(
    name = "network-import",
    author,
    version,
    about = "Load a transit network into a database and export line routes",
    long_about = "Reads a JSON description of categories, lines and their ordered stops and \
                  writes it to the network database through the same service the HTTP API \
                  uses, so stop ordering and stop reuse by name follow the usual rules.\n\n\
                  Lines can be exported back out as GeoJSON for inspection on a map."
)]
struct Args {
    /// SQLite database file, created if missing
    #[arg(short, long, global = true, default_value = "tissea.db")]
    database: PathBuf,

    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import categories, lines and stops from a network JSON file
    Import {
        /// Network description file
        input: PathBuf,
    },
    /// Export one line's route and stops as GeoJSON
    Export {
        /// Line id
        #[arg(short, long)]
        line: i64,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("Database: {}", args.database.display());
    let store = SqliteStore::open(StoreConfig::new(&args.database))
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    let service = NetworkService::new(store);

    match args.command {
        Command::Import { input } => {
            if !input.exists() {
                bail!("Input file does not exist: {}", input.display());
            }

            let manifest = NetworkManifest::read(&input)?;
            log::info!(
                "Importing {} categories, {} lines from {}",
                manifest.categories.len(),
                manifest.line_count(),
                input.display()
            );

            let stats = import_network(&service, &manifest)?;
            stats.log_summary();
        }
        Command::Export { line, output } => {
            let line_id = LineId::new(line);
            let detail = service
                .line(line_id)
                .with_context(|| format!("Failed to load line {line_id}"))?;
            let length_km = service.line_distance_km(line_id)?;

            write_line_geojson(&detail, length_km, &output)
                .context("Failed to write line GeoJSON")?;
            log::info!("Line {} is {length_km} km long", detail.line.number);
        }
    }

    log::info!("Done!");
    Ok(())
}
