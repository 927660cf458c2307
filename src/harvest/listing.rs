//! Listing Paginator: walks the results listing and hands every row's detail
//! reference to a handler, page by page.
//!
//! Listing rows carry no labels, so inline fields are read by fixed cell
//! position. Within a page, detail handlers run one at a time or all at once
//! depending on [`FanOut`]; results always come back in page-then-row order.

use super::fields::{self, Cell, CodeTrail, RuleContext};
use super::markup::{self, LINK};
use super::pager::Pager;
use crate::config::{ColumnRule, FanOut, ListingSource};
use crate::error::HarvestError;
use crate::fetch::PageFetcher;
use crate::models::{Fragment, LookupTables};
use futures::stream::{self, StreamExt, TryStreamExt};
use scraper::{ElementRef, Html};
use std::future::Future;
use tracing::{info, instrument};
use url::Url;

/// One listing row: where its detail page lives, plus inline fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub detail_url: String,
    pub fields: Fragment,
}

/// Walk the listing and resolve every row through `handler`.
#[instrument(level = "info", skip_all)]
pub async fn paginate<F, H, Fut, T>(
    fetcher: &F,
    listing: &ListingSource,
    lookups: &LookupTables,
    fan_out: FanOut,
    handler: H,
) -> Result<Vec<T>, HarvestError>
where
    F: PageFetcher,
    H: Fn(ListingRow) -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let mut results = Vec::new();

    match listing {
        ListingSource::Paginated {
            table,
            base_url,
            link_column,
            columns,
        } => {
            let base = parse_base(base_url)?;
            let mut pager = Pager::new(table);
            while let Some(page) = pager.next_page(fetcher, "listing").await? {
                let rows = page
                    .rows(table)?
                    .into_iter()
                    .filter(|row| !markup::cells(*row).is_empty())
                    .map(|row| read_row(row, *link_column, columns, &base, &page.url, lookups))
                    .collect::<Result<Vec<_>, _>>()?;
                let resolved = resolve_batch(rows, fan_out, &handler).await?;
                info!(offset = page.offset, records = resolved.len(), "Resolved listing page");
                results.extend(resolved);
            }
        }
        ListingSource::Index { url, anchors } => {
            let body = fetcher.fetch(url, &[]).await?;
            let rows = read_index(&body, url, anchors)?;
            info!(count = rows.len(), %url, "Found detail pages to harvest");
            results = resolve_batch(rows, fan_out, &handler).await?;
        }
    }
    Ok(results)
}

/// Resolve one page's rows, keeping submission order whatever the
/// completion order. The first failure aborts the batch.
async fn resolve_batch<H, Fut, T>(
    rows: Vec<ListingRow>,
    fan_out: FanOut,
    handler: &H,
) -> Result<Vec<T>, HarvestError>
where
    H: Fn(ListingRow) -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let width = fan_out.width(rows.len());
    stream::iter(rows)
        .map(handler)
        .buffered(width)
        .try_collect()
        .await
}

/// Read one data row by position. A row without a detail link is fatal.
fn read_row(
    row: ElementRef<'_>,
    link_column: usize,
    columns: &[ColumnRule],
    base: &Url,
    page_url: &str,
    lookups: &LookupTables,
) -> Result<ListingRow, HarvestError> {
    let cells = markup::cells(row);
    let href = cells
        .get(link_column)
        .and_then(|cell| cell.select(&LINK).next())
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| {
            HarvestError::structure(page_url, format!("listing row has no detail link in cell {link_column}"))
        })?;
    let detail_url = resolve(base, href, page_url)?;

    let ctx = RuleContext {
        url: &detail_url,
        lookups,
    };
    let mut fragment = Fragment::default();
    let mut trail = CodeTrail::default();
    for column in columns {
        let Some(cell) = cells.get(column.column) else {
            continue;
        };
        for spec in &column.fields {
            fields::apply(spec, Cell::plain(*cell), &mut trail, &ctx, &mut fragment)?;
        }
    }
    Ok(ListingRow {
        detail_url,
        fields: fragment,
    })
}

/// Every anchor matching `anchors` on an unpaginated index page.
fn read_index(body: &str, url: &str, anchors: &str) -> Result<Vec<ListingRow>, HarvestError> {
    let base = parse_base(url)?;
    let sel = markup::selector(anchors)?;
    let document = Html::parse_document(body);
    let rows = document
        .select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| {
            Ok(ListingRow {
                detail_url: resolve(&base, href, url)?,
                fields: Fragment::default(),
            })
        })
        .collect::<Result<Vec<_>, HarvestError>>()?;
    if rows.is_empty() {
        return Err(HarvestError::structure(url, format!("no '{anchors}' links on index page")));
    }
    Ok(rows)
}

fn parse_base(base: &str) -> Result<Url, HarvestError> {
    Url::parse(base).map_err(|e| HarvestError::Config(format!("invalid base url '{base}': {e}")))
}

fn resolve(base: &Url, href: &str, page_url: &str) -> Result<String, HarvestError> {
    base.join(href.trim())
        .map(String::from)
        .map_err(|e| HarvestError::structure(page_url, format!("bad detail link '{href}': {e}")))
}
