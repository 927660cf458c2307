//! # Heritage Harvest
//!
//! Harvests historic-site records from Polish heritage registers and guides
//! and writes them out as GeoJSON point features.
//!
//! ## Features
//!
//! - Walks offset-paginated listings until the first empty page
//! - Resolves county and municipality codes against lookup tables fetched
//!   from the same site
//! - Reads irregular label/value tables on detail pages by label containment
//! - Normalizes coordinates and dates from free text
//! - One configurable harvester for every site; site definitions are data
//!   and can be dumped to and loaded from YAML
//!
//! ## Usage
//!
//! ```sh
//! heritage_harvest dworysp -o ./geojson
//! ```
//!
//! ## Architecture
//!
//! A run follows a pipeline:
//! 1. **Lookups**: Build the code tables the pipeline needs
//! 2. **Listing**: Walk the listing page by page
//! 3. **Details**: Extract each row's detail page and assemble a record
//! 4. **Output**: Write one GeoJSON file, only if every step succeeded

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod geo;
mod harvest;
mod models;
mod outputs;
mod sites;
mod utils;

use cli::Cli;
use config::PipelineConfig;
use fetch::{HttpFetcher, Limited};
use outputs::geojson;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    // Parse CLI
    let args = Cli::parse();
    debug!(pipeline = args.pipeline.name(), ?args.output_dir, ?args.config, "Parsed CLI arguments");

    // ---- Pipeline definition ----
    let pipeline = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => sites::by_name(args.pipeline.name())
            .ok_or_else(|| {
                format!(
                    "no built-in pipeline '{}' (known: {})",
                    args.pipeline.name(),
                    sites::NAMES.join(", ")
                )
            })?,
    };

    if args.print_config {
        print!("{}", pipeline.to_yaml()?);
        return Ok(());
    }
    info!(pipeline = %pipeline.name, "heritage_harvest starting up");

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Harvest ----
    let fetcher = Limited::new(
        HttpFetcher::new(&pipeline.transport)?,
        pipeline.transport.max_connections,
    );
    let records = match harvest::run(&fetcher, &pipeline).await {
        Ok(records) => records,
        Err(e) => {
            error!(pipeline = %pipeline.name, error = %e, "Harvest failed; no output written");
            return Err(e.into());
        }
    };

    // ---- GeoJSON output ----
    let collection = geojson::to_feature_collection(&records, &pipeline.schema);
    let path = geojson::output_path(&args.output_dir, &pipeline.name, Local::now().date_naive());
    geojson::write_collection(&collection, &path).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = records.len(),
        features = collection.features.len(),
        "Execution complete"
    );

    Ok(())
}
