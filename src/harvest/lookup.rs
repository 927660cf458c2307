//! Lookup Builder: administrative code tables fetched from the source site.

use super::markup;
use super::pager::Pager;
use crate::config::{LookupSource, PipelineConfig};
use crate::error::HarvestError;
use crate::fetch::PageFetcher;
use crate::models::{LookupKey, LookupLevel, LookupTable, LookupTables};
use tracing::{info, instrument, warn};

/// Build one level's table by walking every page of its listing.
///
/// Codes are read by fixed cell position. Rows lacking either of the first
/// two codes are skipped; a cell that does not exist reads as empty.
#[instrument(level = "info", skip_all, fields(level = ?source.level))]
pub async fn build<F: PageFetcher>(
    fetcher: &F,
    source: &LookupSource,
) -> Result<LookupTable, HarvestError> {
    let mut table = LookupTable::default();
    let mut pager = Pager::new(&source.table);
    let mut skipped = 0usize;

    while let Some(page) = pager.next_page(fetcher, "lookup").await? {
        for row in page.rows(&source.table)? {
            let cells = markup::cells(row);
            let read = |i: usize| cells.get(i).map(|c| markup::trimmed(*c)).unwrap_or_default();

            let codes = source.code_columns.iter().map(|&i| read(i)).collect::<Vec<_>>();
            if codes.iter().take(2).any(String::is_empty) {
                skipped += 1;
                continue;
            }
            table.insert(LookupKey::new(codes), read(source.name_column));
        }
    }

    if table.is_empty() {
        warn!(url = %source.table.page_url(0), "Lookup table is empty");
    }
    info!(
        entries = table.len(),
        skipped,
        overwritten = table.overwritten(),
        pages = pager.pages_fetched(),
        "Built lookup table"
    );
    Ok(table)
}

/// Build every lookup level of a pipeline, in declaration order, before any
/// listing work starts.
#[instrument(level = "info", skip_all, fields(pipeline = %config.name))]
pub async fn build_all<F: PageFetcher>(
    fetcher: &F,
    config: &PipelineConfig,
) -> Result<LookupTables, HarvestError> {
    let mut tables = LookupTables::default();

    if let Some(name) = &config.region_dictionary {
        tables.regions = config
            .dictionary(name)
            .ok_or_else(|| HarvestError::Config(format!("unknown dictionary '{name}'")))?;
    }
    for name in config.dictionaries.keys() {
        if let Some(dictionary) = config.dictionary(name) {
            tables.dictionaries.insert(name.clone(), dictionary);
        }
    }

    for source in &config.lookups {
        if source.level == LookupLevel::Region {
            return Err(HarvestError::Config(
                "the region level comes from a fixed dictionary".to_string(),
            ));
        }
        let table = build(fetcher, source).await?;
        *tables.level_mut(source.level) = table;
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::CannedFetcher;
    use crate::harvest::pager::fixtures::*;

    const TEMPLATE: &str = "https://example.com/powiaty?limitstart={limitstart}";

    fn county_source() -> LookupSource {
        LookupSource {
            level: LookupLevel::County,
            table: paged_table(TEMPLATE, "ja-content"),
            code_columns: vec![1, 2],
            name_column: 3,
        }
    }

    fn url(offset: usize) -> String {
        TEMPLATE.replace("{limitstart}", &offset.to_string())
    }

    #[tokio::test]
    async fn test_three_pages_yield_two_hundred_rows() {
        let page = |start: usize| {
            (start..start + 100)
                .map(|i| row(&["", "M", &format!("{i:03}"), &format!("powiat {i}")]))
                .collect::<Vec<_>>()
        };
        let fetcher = CannedFetcher::new()
            .page(&url(0), listing_page("ja-content", &page(0)))
            .page(&url(100), listing_page("ja-content", &page(100)))
            .page(&url(200), listing_page("ja-content", &[]));

        let table = build(&fetcher, &county_source()).await.unwrap();
        assert_eq!(table.len(), 200);
        assert_eq!(fetcher.request_count(), 3);
        assert_eq!(
            table.resolve(&LookupKey::new(["M", "150"])),
            Some("powiat 150")
        );
    }

    #[tokio::test]
    async fn test_rows_missing_key_codes_are_skipped() {
        let rows = vec![
            row(&["1", "M", "01", "krakowski"]),
            row(&["2", "", "02", "bez województwa"]),
            row(&["3", "M", "", "bez kodu"]),
            row(&["4"]),
            row(&["5", "M", "01", "krakowski (nowy)"]),
        ];
        let fetcher = CannedFetcher::new()
            .page(&url(0), listing_page("ja-content", &rows))
            .page(&url(100), listing_page("ja-content", &[]));

        let table = build(&fetcher, &county_source()).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.overwritten(), 1);
        assert_eq!(
            table.resolve(&LookupKey::new(["M", "01"])),
            Some("krakowski (nowy)")
        );
    }

    #[tokio::test]
    async fn test_failure_returns_no_partial_table() {
        let rows = vec![row(&["1", "M", "01", "krakowski"])];
        let fetcher = CannedFetcher::new().page(&url(0), listing_page("ja-content", &rows));
        let err = build(&fetcher, &county_source()).await.unwrap_err();
        assert!(matches!(err, HarvestError::Status { .. }));
    }

    #[tokio::test]
    async fn test_build_all_loads_dictionaries() {
        let mut config = crate::sites::zamkisp();
        config.lookups.clear();
        let fetcher = CannedFetcher::new();
        let tables = build_all(&fetcher, &config).await.unwrap();
        assert_eq!(tables.regions.resolve(&LookupKey::new(["M"])), Some("małopolskie"));
        assert_eq!(tables.translate("typ", "Z"), Some("zachowany"));
        assert_eq!(fetcher.request_count(), 0);
    }
}
