//! Pipeline definitions.
//!
//! A [`PipelineConfig`] is everything that differs between source sites: URL
//! templates, page size, container ids, column-index maps, label-dispatch
//! tables, the output schema and the concurrency settings. The harvester core
//! in [`crate::harvest`] is the same for every site.
//!
//! Built-in definitions live in [`crate::sites`]; a full definition can also
//! be loaded from YAML with [`PipelineConfig::from_yaml_file`].

use crate::error::HarvestError;
use crate::models::{LookupLevel, LookupTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Placeholder in URL templates that receives the zero-based row offset.
pub const OFFSET_PLACEHOLDER: &str = "{limitstart}";

/// Page size used by every paginated source seen so far.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Literal used by source sites for "no related site".
pub const EMPTY_REFERENCE: &str = "---";

/// Date string used by source sites for "no date recorded".
pub const SENTINEL_DATE: &str = "0000-00-00";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Tool name, used for the output file name.
    pub name: String,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Fixed dictionaries (region names, type names) keyed by table name.
    #[serde(default)]
    pub dictionaries: BTreeMap<String, BTreeMap<String, String>>,
    /// Which dictionary holds the region level, if codes are resolved at all.
    #[serde(default)]
    pub region_dictionary: Option<String>,
    #[serde(default)]
    pub lookups: Vec<LookupSource>,
    pub listing: ListingSource,
    pub detail: DetailSource,
    pub schema: OutputSchema,
    #[serde(default)]
    pub fan_out: FanOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    pub max_connections: usize,
    pub max_keepalive: usize,
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connections: 3,
            max_keepalive: 1,
            timeout_secs: 60,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A paginated HTML table: `url_template` with [`OFFSET_PLACEHOLDER`], read
/// from the `table_index`-th table inside the element with `container_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedTable {
    pub url_template: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub container_id: String,
    #[serde(default = "default_table_index")]
    pub table_index: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_table_index() -> usize {
    1
}

impl PagedTable {
    pub fn page_url(&self, offset: usize) -> String {
        self.url_template
            .replace(OFFSET_PLACEHOLDER, &offset.to_string())
    }
}

/// An auxiliary code table for one lookup level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupSource {
    pub level: LookupLevel,
    pub table: PagedTable,
    /// Cell positions of the key codes, outermost first.
    pub code_columns: Vec<usize>,
    pub name_column: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    /// Offset-paginated results table with a detail link in a fixed cell.
    Paginated {
        table: PagedTable,
        /// Base for resolving relative detail links.
        base_url: String,
        link_column: usize,
        #[serde(default)]
        columns: Vec<ColumnRule>,
    },
    /// A single unpaginated page whose anchors are all detail references.
    Index { url: String, anchors: String },
}

/// Fields read from one listing cell by position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnRule {
    pub column: usize,
    pub fields: Vec<FieldSpec>,
}

/// Fields read from one label/value row, selected by label containment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelRule {
    pub label: String,
    pub fields: Vec<FieldSpec>,
}

impl LabelRule {
    pub fn new(label: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            label: label.to_string(),
            fields,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub field: String,
    pub rule: Rule,
}

impl FieldSpec {
    pub fn new(field: &str, rule: Rule) -> Self {
        Self {
            field: field.to_string(),
            rule,
        }
    }
}

/// How a cell's content becomes a [`crate::models::FieldValue`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Trimmed text, verbatim.
    Text,
    /// Trimmed text; empty or [`EMPTY_REFERENCE`] is absent.
    OptionalReference,
    /// Administrative code resolved against the lookup tables.
    Code(LookupLevel),
    /// Code translated through a fixed dictionary.
    Translate(String),
    /// Annotated `lat, lon` string. The owning field receives the latitude,
    /// `longitude` names the field receiving the longitude.
    CoordinatePair { longitude: String },
    /// Plain decimal cell.
    Decimal,
    /// ISO date; [`SENTINEL_DATE`] is absent.
    Date,
    /// Text of the `textarea` nested in the value cell.
    RichText,
    /// `alt` attribute of the row's icon image.
    IconAlt,
    /// Digit right before the file extension of the row's icon image.
    IconScore,
}

/// How a detail page is fetched and where its label/value table lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailSource {
    /// Extra query parameters for the descriptive view.
    #[serde(default)]
    pub params: Vec<(String, String)>,
    /// CSS selector of the element holding the label/value table.
    pub container: String,
    pub layout: RowLayout,
    /// Heading that carries the record name, when the table does not.
    #[serde(default)]
    pub title: Option<TitleRule>,
    pub labels: Vec<LabelRule>,
    /// Second view exposing coordinates separately.
    #[serde(default)]
    pub coordinate_view: Option<CoordinateView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RowLayout {
    /// Rows of plain cells; rows with fewer than `value + 1` cells are skipped.
    Positional { label: usize, value: usize },
    /// Rows whose cells are told apart by class.
    Classed {
        label: String,
        icon: String,
        value: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleRule {
    pub selector: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinateView {
    pub params: Vec<(String, String)>,
    pub element_id: String,
    /// Regex with one capture group; must match exactly once.
    pub latitude_pattern: String,
    pub longitude_pattern: String,
    pub latitude_field: String,
    pub longitude_field: String,
}

/// Output properties and geometry of the pipeline's records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSchema {
    pub properties: Vec<PropertySpec>,
    pub geometry: GeometrySpec,
    /// Property used to name records in log lines.
    pub name_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// Text written when an optional property was never supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl PropertySpec {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, text: &str) -> Self {
        self.default = Some(text.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometrySpec {
    pub latitude: String,
    pub longitude: String,
    /// A record without both coordinates fails assembly.
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub on_missing: OnMissingCoordinates,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnMissingCoordinates {
    #[default]
    IncludeAsNull,
    Drop,
}

/// How many detail pages of one listing page are in flight at once.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// One at a time, in row order.
    #[default]
    Sequential,
    /// The whole page at once, bounded only by the connection ceiling.
    Page,
}

impl FanOut {
    pub fn width(self, batch: usize) -> usize {
        match self {
            FanOut::Sequential => 1,
            FanOut::Page => batch.max(1),
        }
    }
}

impl PipelineConfig {
    /// Load a full pipeline definition from a YAML file.
    #[instrument(level = "info")]
    pub fn from_yaml_file(path: &Path) -> Result<Self, HarvestError> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        info!(name = %config.name, "Loaded pipeline definition");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, HarvestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check cross-references that serde cannot.
    pub fn validate(&self) -> Result<(), HarvestError> {
        let mut dictionaries = self.region_dictionary.iter().collect::<Vec<_>>();
        for spec in self.all_field_specs() {
            if let Rule::Translate(name) = &spec.rule {
                dictionaries.push(name);
            }
        }
        if let Some(missing) = dictionaries
            .into_iter()
            .find(|name| !self.dictionaries.contains_key(*name))
        {
            return Err(HarvestError::Config(format!(
                "pipeline '{}' refers to unknown dictionary '{missing}'",
                self.name
            )));
        }
        let listing_table = match &self.listing {
            ListingSource::Paginated { table, .. } => Some(table),
            ListingSource::Index { .. } => None,
        };
        if let Some(table) = self
            .lookups
            .iter()
            .map(|source| &source.table)
            .chain(listing_table)
            .find(|table| table.page_size == 0)
        {
            return Err(HarvestError::Config(format!(
                "page_size of {} must be at least 1",
                table.url_template
            )));
        }
        for source in &self.lookups {
            if source.code_columns.len() != source.level.depth() {
                return Err(HarvestError::Config(format!(
                    "lookup for {:?} needs {} code columns, got {}",
                    source.level,
                    source.level.depth(),
                    source.code_columns.len()
                )));
            }
        }
        if let Some(view) = &self.detail.coordinate_view {
            for pattern in [&view.latitude_pattern, &view.longitude_pattern] {
                regex::Regex::new(pattern)
                    .map_err(|e| HarvestError::Config(format!("bad pattern '{pattern}': {e}")))?;
            }
        }
        Ok(())
    }

    /// A fixed dictionary as a single-code lookup table.
    pub fn dictionary(&self, name: &str) -> Option<LookupTable> {
        self.dictionaries
            .get(name)
            .map(|entries| entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
    }

    fn all_field_specs(&self) -> impl Iterator<Item = &FieldSpec> {
        let columns = match &self.listing {
            ListingSource::Paginated { columns, .. } => columns.as_slice(),
            ListingSource::Index { .. } => &[],
        };
        columns
            .iter()
            .flat_map(|c| c.fields.iter())
            .chain(self.detail.labels.iter().flat_map(|l| l.fields.iter()))
    }
}
