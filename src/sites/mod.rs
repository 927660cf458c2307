//! Built-in pipeline definitions, one per source site.
//!
//! Each definition is a plain [`PipelineConfig`] value for the shared
//! harvester in [`crate::harvest`]. Two of the sites run on the same
//! register software and share their lookup layout and region dictionary.
//!
//! # Supported Sources
//!
//! | Pipeline | Module | Listing | Notes |
//! |----------|--------|---------|-------|
//! | dworysp | [`dworysp`] | Paginated register | Manors and palaces; coordinates mandatory |
//! | zamkisp | [`zamkisp`] | Paginated register | Castles; inline listing fields, type dictionary |
//! | zamkinet | [`zamkinet`] | Alphabetical index | Castle guide; separate coordinate view, page fan-out |

pub mod dworysp;
pub mod zamkinet;
pub mod zamkisp;

pub use dworysp::dworysp;
pub use zamkinet::zamkinet;
pub use zamkisp::zamkisp;

use crate::config::{DEFAULT_PAGE_SIZE, LookupSource, PagedTable, PipelineConfig};
use crate::models::LookupLevel;
use std::collections::BTreeMap;

/// Dictionary name of the voivodeship table in register pipelines.
pub const REGION_DICTIONARY: &str = "wojewodztwa";

const VOIVODESHIPS: [(&str, &str); 16] = [
    ("B", "lubuskie"),
    ("C", "łódzkie"),
    ("D", "dolnośląskie"),
    ("F", "pomorskie"),
    ("G", "śląskie"),
    ("J", "warmińsko-mazurskie"),
    ("K", "podkarpackie"),
    ("L", "lubelskie"),
    ("M", "małopolskie"),
    ("O", "podlaskie"),
    ("P", "kujawsko-pomorskie"),
    ("R", "mazowieckie"),
    ("S", "świętokrzyskie"),
    ("U", "opolskie"),
    ("W", "wielkopolskie"),
    ("Z", "zachodniopomorskie"),
];

/// Every built-in pipeline name.
pub const NAMES: [&str; 3] = ["dworysp", "zamkisp", "zamkinet"];

/// Built-in definition by pipeline name.
pub fn by_name(name: &str) -> Option<PipelineConfig> {
    match name {
        "dworysp" => Some(dworysp()),
        "zamkisp" => Some(zamkisp()),
        "zamkinet" => Some(zamkinet()),
        _ => None,
    }
}

pub(crate) fn dictionary(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

pub(crate) fn voivodeships() -> BTreeMap<String, String> {
    dictionary(&VOIVODESHIPS)
}

/// Listing of the register software: second table in `container_id`.
pub(crate) fn register_table(url_template: String, container_id: &str) -> PagedTable {
    PagedTable {
        url_template,
        page_size: DEFAULT_PAGE_SIZE,
        container_id: container_id.to_string(),
        table_index: 1,
    }
}

/// County and municipality code tables of a register site.
pub(crate) fn register_lookups(site: &str, county_item: u32, municipality_item: u32, container_id: &str) -> Vec<LookupSource> {
    vec![
        LookupSource {
            level: LookupLevel::County,
            table: register_table(
                format!("{site}/index.php?option=com_powiaty&view=powiaty&Itemid={county_item}&limitstart={{limitstart}}"),
                container_id,
            ),
            code_columns: vec![1, 2],
            name_column: 3,
        },
        LookupSource {
            level: LookupLevel::Municipality,
            table: register_table(
                format!("{site}/index.php?option=com_gminy&view=gminy&Itemid={municipality_item}&limitstart={{limitstart}}"),
                container_id,
            ),
            code_columns: vec![1, 2, 3],
            name_column: 4,
        },
    ]
}
