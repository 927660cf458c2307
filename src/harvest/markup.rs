//! Helpers for the source sites' table markup.
//!
//! The listing tables are written without `<tbody>`. An HTML5 parser inserts
//! one anyway, so rows are collected from the table's direct `tr` children and
//! from the `tr` children of its direct row groups, never from nested tables.

use crate::error::HarvestError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

pub static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
pub static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
pub static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
pub static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
pub static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
pub static TEXTAREA: Lazy<Selector> = Lazy::new(|| Selector::parse("textarea").unwrap());

/// Parse a CSS selector coming from configuration.
pub fn selector(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css)
        .map_err(|e| HarvestError::Config(format!("invalid selector '{css}': {e}")))
}

/// Find the element with `id` or fail with a structural error naming `url`.
pub fn by_id<'a>(document: &'a Html, id: &str, url: &str) -> Result<ElementRef<'a>, HarvestError> {
    let sel = selector(&format!("#{id}"))?;
    document
        .select(&sel)
        .next()
        .ok_or_else(|| HarvestError::structure(url, format!("no element with id '{id}'")))
}

/// The `index`-th table (document order) inside `container`.
pub fn nth_table<'a>(
    container: ElementRef<'a>,
    index: usize,
    url: &str,
) -> Result<ElementRef<'a>, HarvestError> {
    let tables = container.select(&TABLE).collect::<Vec<_>>();
    tables.get(index).copied().ok_or_else(|| {
        HarvestError::structure(
            url,
            format!("expected at least {} tables, found {}", index + 1, tables.len()),
        )
    })
}

/// Rows that belong to `table` itself, with or without a row group.
pub fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "tbody" | "thead" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

/// All `td` cells of a row, in document order.
pub fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.select(&CELL).collect()
}

/// Concatenated text content of an element.
pub fn text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trimmed text content of an element.
pub fn trimmed(element: ElementRef<'_>) -> String {
    text(element).trim().to_string()
}
