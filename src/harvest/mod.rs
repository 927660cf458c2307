//! The harvester core shared by every pipeline.
//!
//! A run has two phases:
//!
//! 1. **Lookups** ([`lookup`]): every auxiliary code table is fetched and
//!    built, in order, before anything else happens.
//! 2. **Listing + detail** ([`listing`], [`detail`], [`assemble`]): the
//!    listing is walked page by page; each row's detail page is extracted
//!    and merged with the row's inline fields into a [`Record`].
//!
//! Any error ends the run. Nothing is returned for a failed run.

pub mod assemble;
pub mod detail;
pub mod fields;
pub mod listing;
pub mod lookup;
pub mod markup;
pub mod pager;

use crate::config::PipelineConfig;
use crate::error::HarvestError;
use crate::fetch::PageFetcher;
use crate::models::Record;
use detail::DetailExtractor;
use listing::ListingRow;
use tracing::{info, instrument};

/// Harvest every record of one pipeline, in listing order.
#[instrument(level = "info", skip_all, fields(pipeline = %config.name))]
pub async fn run<F: PageFetcher>(
    fetcher: &F,
    config: &PipelineConfig,
) -> Result<Vec<Record>, HarvestError> {
    config.validate()?;
    let extractor = DetailExtractor::new(&config.detail)?;

    let lookups = lookup::build_all(fetcher, config).await?;
    info!(
        counties = lookups.counties.len(),
        municipalities = lookups.municipalities.len(),
        "Lookup tables ready"
    );

    let extractor = &extractor;
    let lookups = &lookups;
    let schema = &config.schema;
    let records = listing::paginate(
        fetcher,
        &config.listing,
        lookups,
        config.fan_out,
        move |row: ListingRow| async move {
            let detail = extractor.extract(fetcher, &row.detail_url, lookups).await?;
            assemble::assemble(schema, &row.detail_url, row.fields, detail)
        },
    )
    .await?;

    info!(count = records.len(), "Harvested records");
    Ok(records)
}
