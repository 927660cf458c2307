//! Offset pagination over `limitstart`-style listing tables.
//!
//! Pages are requested at offsets `0, page_size, 2 * page_size, ...`. The
//! source markup carries no "last page" marker; the walk ends at the first
//! page whose data table has no rows. That empty page is still fetched.

use super::markup;
use crate::config::PagedTable;
use crate::error::HarvestError;
use crate::fetch::PageFetcher;
use crate::utils::truncate_for_log;
use scraper::{ElementRef, Html};
use tracing::{info, warn};

/// One fetched, structurally checked listing page.
#[derive(Debug)]
pub struct Page {
    pub url: String,
    pub offset: usize,
    document: Html,
}

impl Page {
    /// Data rows of the page's listing table.
    pub fn rows(&self, table: &PagedTable) -> Result<Vec<ElementRef<'_>>, HarvestError> {
        let container = markup::by_id(&self.document, &table.container_id, &self.url)?;
        let data = markup::nth_table(container, table.table_index, &self.url)?;
        Ok(markup::table_rows(data))
    }
}

/// Walks a [`PagedTable`] one page at a time.
#[derive(Debug)]
pub struct Pager<'a> {
    table: &'a PagedTable,
    offset: usize,
    done: bool,
    pages_fetched: usize,
}

impl<'a> Pager<'a> {
    pub fn new(table: &'a PagedTable) -> Self {
        Self {
            table,
            offset: 0,
            done: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or `None` once an empty page has been seen.
    pub async fn next_page<F: PageFetcher>(
        &mut self,
        fetcher: &F,
        caller: &str,
    ) -> Result<Option<Page>, HarvestError> {
        if self.done {
            return Ok(None);
        }
        let url = self.table.page_url(self.offset);
        let body = fetcher.fetch(&url, &[]).await?;
        self.pages_fetched += 1;

        let page = Page {
            url,
            offset: self.offset,
            document: Html::parse_document(&body),
        };
        let rows = page
            .rows(self.table)
            .inspect_err(|_| warn!(url = %page.url, preview = %truncate_for_log(&body, 300), "Unexpected listing markup"))?
            .len();
        info!(caller, offset = page.offset, rows, url = %page.url, "Fetched listing page");

        if rows == 0 {
            self.done = true;
            return Ok(None);
        }
        self.offset += self.table.page_size;
        Ok(Some(page))
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Synthetic listing pages shaped like the source sites.

    use crate::config::PagedTable;

    pub fn paged_table(template: &str, container: &str) -> PagedTable {
        PagedTable {
            url_template: template.to_string(),
            page_size: 100,
            container_id: container.to_string(),
            table_index: 1,
        }
    }

    /// A listing page: a header table, then the data table without `tbody`.
    pub fn listing_page(container: &str, rows: &[String]) -> String {
        format!(
            "<html><body><div id=\"{container}\">\
             <table><tr><td>Nagłówek</td></tr></table>\
             <table>{}</table></div></body></html>",
            rows.concat()
        )
    }

    pub fn row(cells: &[&str]) -> String {
        let cells = cells
            .iter()
            .map(|c| format!("<td>{c}</td>"))
            .collect::<String>();
        format!("<tr>{cells}</tr>")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::fetch::testing::CannedFetcher;

    #[tokio::test]
    async fn test_walk_stops_at_first_empty_page() {
        let table = paged_table("https://example.com/l?limitstart={limitstart}", "main_full");
        let full = (0..100).map(|i| row(&[&i.to_string()])).collect::<Vec<_>>();
        let fetcher = CannedFetcher::new()
            .page("https://example.com/l?limitstart=0", listing_page("main_full", &full))
            .page("https://example.com/l?limitstart=100", listing_page("main_full", &full))
            .page("https://example.com/l?limitstart=200", listing_page("main_full", &[]));

        let mut pager = Pager::new(&table);
        let mut total = 0;
        while let Some(page) = pager.next_page(&fetcher, "test").await.unwrap() {
            total += page.rows(&table).unwrap().len();
        }
        assert_eq!(total, 200);
        assert_eq!(pager.pages_fetched(), 3);
        assert_eq!(fetcher.request_count(), 3);
        assert!(pager.next_page(&fetcher, "test").await.unwrap().is_none());
        assert_eq!(fetcher.request_count(), 3);
    }

    #[tokio::test]
    async fn test_page_without_data_table_is_structural() {
        let table = paged_table("https://example.com/l?limitstart={limitstart}", "main_full");
        let fetcher = CannedFetcher::new().page(
            "https://example.com/l?limitstart=0",
            "<div id=\"main_full\"><table></table></div>",
        );
        let err = Pager::new(&table).next_page(&fetcher, "test").await.unwrap_err();
        assert!(matches!(err, HarvestError::Structure { .. }));
    }

    #[tokio::test]
    async fn test_http_failure_aborts_walk() {
        let table = paged_table("https://example.com/l?limitstart={limitstart}", "main_full");
        let fetcher = CannedFetcher::new();
        let err = Pager::new(&table).next_page(&fetcher, "test").await.unwrap_err();
        assert!(matches!(err, HarvestError::Status { status: 404, .. }));
    }
}
