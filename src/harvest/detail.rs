//! Detail Extractor: reads one record's label/value table.
//!
//! The first table inside the configured container is the label/value table.
//! Each row's label is matched by substring containment against the label
//! rules in declaration order; the first match wins and its field specs are
//! applied to the row's value cell. Unknown labels and short layout rows are
//! ignored.

use super::fields::{self, Cell, CodeTrail, RuleContext};
use super::markup::{self, ROW, TABLE};
use crate::config::{CoordinateView, DetailSource, LabelRule, RowLayout};
use crate::error::HarvestError;
use crate::fetch::{PageFetcher, full_url};
use crate::geo::Coordinates;
use crate::models::{FieldValue, Fragment, LookupTables};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, instrument, warn};

/// A detail source with its selectors and patterns compiled once.
#[derive(Debug)]
pub struct DetailExtractor<'a> {
    source: &'a DetailSource,
    container: Selector,
    title: Option<Selector>,
    coordinates: Option<CompiledView<'a>>,
}

#[derive(Debug)]
struct CompiledView<'a> {
    view: &'a CoordinateView,
    element: Selector,
    latitude: Regex,
    longitude: Regex,
}

/// One table row split into its label and the cells rules read from.
struct LabelledRow<'a> {
    label: String,
    cell: Cell<'a>,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(source: &'a DetailSource) -> Result<Self, HarvestError> {
        let coordinates = match &source.coordinate_view {
            Some(view) => Some(CompiledView {
                view,
                element: markup::selector(&format!("#{}", view.element_id))?,
                latitude: compile(&view.latitude_pattern)?,
                longitude: compile(&view.longitude_pattern)?,
            }),
            None => None,
        };
        Ok(Self {
            source,
            container: markup::selector(&source.container)?,
            title: source
                .title
                .as_ref()
                .map(|t| markup::selector(&t.selector))
                .transpose()?,
            coordinates,
        })
    }

    /// Fetch and read the detail page at `url`.
    ///
    /// Failures are logged with the offending URL before they propagate.
    #[instrument(level = "info", skip(self, fetcher, lookups))]
    pub async fn extract<F: PageFetcher>(
        &self,
        fetcher: &F,
        url: &str,
        lookups: &LookupTables,
    ) -> Result<Fragment, HarvestError> {
        self.extract_inner(fetcher, url, lookups)
            .await
            .inspect_err(|e| error!(%url, error = %e, "Problem with parsing entry"))
    }

    async fn extract_inner<F: PageFetcher>(
        &self,
        fetcher: &F,
        url: &str,
        lookups: &LookupTables,
    ) -> Result<Fragment, HarvestError> {
        let body = fetcher.fetch(url, &self.source.params).await?;
        let mut fragment = self.read_page(&body, url, lookups)?;

        if let Some(view) = &self.coordinates {
            let body = fetcher.fetch(url, &view.view.params).await?;
            let located = view.locate(&body, &full_url(url, &view.view.params));
            let (lat, lon) = match located {
                Some(c) => (FieldValue::Float(c.latitude()), FieldValue::Float(c.longitude())),
                None => (FieldValue::Null, FieldValue::Null),
            };
            fragment.set(&view.view.latitude_field, lat);
            fragment.set(&view.view.longitude_field, lon);
        }
        Ok(fragment)
    }

    /// Read the descriptive view of a detail page.
    pub fn read_page(
        &self,
        body: &str,
        url: &str,
        lookups: &LookupTables,
    ) -> Result<Fragment, HarvestError> {
        let document = Html::parse_document(body);
        let container = document
            .select(&self.container)
            .next()
            .ok_or_else(|| {
                HarvestError::structure(url, format!("no '{}' element", self.source.container))
            })?;
        let table = container
            .select(&TABLE)
            .next()
            .ok_or_else(|| HarvestError::structure(url, "no label/value table"))?;

        let ctx = RuleContext { url, lookups };
        let mut fragment = Fragment::default();
        let mut trail = CodeTrail::default();

        if let (Some(rule), Some(sel)) = (&self.source.title, &self.title) {
            let heading = document
                .select(sel)
                .next()
                .ok_or_else(|| HarvestError::structure(url, format!("no '{}' heading", rule.selector)))?;
            fragment.set(&rule.field, FieldValue::Text(markup::trimmed(heading)));
        }

        for row in table.select(&ROW) {
            let Some(labelled) = self.split_row(row)? else {
                continue;
            };
            let Some(rule) = match_label(&self.source.labels, &labelled.label) else {
                continue;
            };
            for spec in &rule.fields {
                fields::apply(spec, labelled.cell, &mut trail, &ctx, &mut fragment)?;
            }
        }
        if fragment.is_empty() {
            warn!(%url, "No recognized labels on detail page");
        } else {
            debug!(%url, fields = fragment.len(), "Read detail page");
        }
        Ok(fragment)
    }

    fn split_row<'r>(&self, row: ElementRef<'r>) -> Result<Option<LabelledRow<'r>>, HarvestError> {
        match &self.source.layout {
            RowLayout::Positional { label, value } => {
                let cells = markup::cells(row);
                match (cells.get(*label), cells.get(*value)) {
                    (Some(l), Some(v)) => Ok(Some(LabelledRow {
                        label: markup::text(*l),
                        cell: Cell::plain(*v),
                    })),
                    _ => Ok(None),
                }
            }
            RowLayout::Classed { label, icon, value } => {
                let by_class = |class: &str| -> Result<Option<ElementRef<'r>>, HarvestError> {
                    let sel = markup::selector(&format!("td.{class}"))?;
                    Ok(row.select(&sel).next())
                };
                match (by_class(label)?, by_class(value)?) {
                    (Some(l), Some(v)) => Ok(Some(LabelledRow {
                        label: markup::text(l),
                        cell: Cell {
                            value: v,
                            icon: by_class(icon)?,
                        },
                    })),
                    _ => Ok(None),
                }
            }
        }
    }
}

/// First rule whose label is contained in `label`.
pub fn match_label<'r>(rules: &'r [LabelRule], label: &str) -> Option<&'r LabelRule> {
    rules.iter().find(|rule| label.contains(rule.label.as_str()))
}

impl CompiledView<'_> {
    /// Coordinates from the location view. Anything but exactly one match per
    /// axis leaves the record without coordinates.
    fn locate(&self, body: &str, url: &str) -> Option<Coordinates> {
        let document = Html::parse_document(body);
        let Some(element) = document.select(&self.element).next() else {
            warn!(%url, "Coordinates not found");
            return None;
        };
        let text = markup::text(element);
        let single = |re: &Regex| -> Option<f64> {
            let mut found = re.captures_iter(&text).filter_map(|c| c.get(1));
            match (found.next(), found.next()) {
                (Some(m), None) => m.as_str().parse().ok(),
                _ => None,
            }
        };
        let located = match (single(&self.latitude), single(&self.longitude)) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).ok(),
            _ => None,
        };
        if located.is_none() {
            warn!(%url, "Coordinates could not be parsed");
        }
        located
    }
}

fn compile(pattern: &str) -> Result<Regex, HarvestError> {
    Regex::new(pattern).map_err(|e| HarvestError::Config(format!("bad pattern '{pattern}': {e}")))
}
