//! Manors and palaces register (`dworyipalace.zamkisp.pl`).
//!
//! Listing rows carry only the detail link; everything else comes from the
//! detail page, including the administrative codes, which are resolved
//! against the site's county and municipality tables.

use super::{REGION_DICTIONARY, register_lookups, register_table, voivodeships};
use crate::config::{
    DetailSource, FanOut, FieldSpec, GeometrySpec, LabelRule, ListingSource, OnMissingCoordinates,
    OutputSchema, PipelineConfig, PropertySpec, RowLayout, Rule, TransportConfig,
};
use crate::models::LookupLevel;
use std::collections::BTreeMap;

const SITE: &str = "https://dworyipalace.zamkisp.pl";
const CONTAINER: &str = "ja-content";

pub fn dworysp() -> PipelineConfig {
    PipelineConfig {
        name: "dworysp".to_string(),
        transport: TransportConfig::default(),
        dictionaries: BTreeMap::from([(REGION_DICTIONARY.to_string(), voivodeships())]),
        region_dictionary: Some(REGION_DICTIONARY.to_string()),
        lookups: register_lookups(SITE, 69, 68, CONTAINER),
        listing: ListingSource::Paginated {
            table: register_table(
                format!("{SITE}/index.php?option=com_dip&view=dip&Itemid=33&limitstart={{limitstart}}"),
                CONTAINER,
            ),
            base_url: SITE.to_string(),
            link_column: 9,
            columns: vec![],
        },
        detail: DetailSource {
            params: vec![],
            container: "#userForm".to_string(),
            layout: RowLayout::Positional { label: 1, value: 2 },
            title: None,
            labels: labels(),
            coordinate_view: None,
        },
        schema: OutputSchema {
            properties: vec![
                PropertySpec::required("nazwa_sp"),
                PropertySpec::required("wojewodztwo"),
                PropertySpec::required("powiat"),
                PropertySpec::required("gmina"),
                PropertySpec::required("dwor_id_sp"),
                PropertySpec::required("zamek_id_sp"),
                PropertySpec::required("twierdza_id_sp"),
                PropertySpec::required("punkt_oporu_id_sp"),
                PropertySpec::required("grod_id_sp"),
                PropertySpec::required("data_wprowadzenia"),
                PropertySpec::required("data_aktualizacji"),
                PropertySpec::required("opis"),
                PropertySpec::required("url"),
            ],
            geometry: GeometrySpec {
                latitude: "szerokosc_geo".to_string(),
                longitude: "dlugosc_geo".to_string(),
                required: true,
                on_missing: OnMissingCoordinates::IncludeAsNull,
            },
            name_field: "nazwa_sp".to_string(),
        },
        fan_out: FanOut::Sequential,
    }
}

fn labels() -> Vec<LabelRule> {
    let single = |label: &str, field: &str, rule: Rule| LabelRule::new(label, vec![FieldSpec::new(field, rule)]);
    vec![
        single("Oznaczenie:", "dwor_id_sp", Rule::Text),
        single("Nazwa:", "nazwa_sp", Rule::Text),
        single("Województwo:", "wojewodztwo", Rule::Code(LookupLevel::Region)),
        single("Powiat:", "powiat", Rule::Code(LookupLevel::County)),
        single("PGA:", "gmina", Rule::Code(LookupLevel::Municipality)),
        single(
            "Koordynaty:",
            "szerokosc_geo",
            Rule::CoordinatePair {
                longitude: "dlugosc_geo".to_string(),
            },
        ),
        single("Zamek:", "zamek_id_sp", Rule::OptionalReference),
        single("Twierdza/Fort:", "twierdza_id_sp", Rule::OptionalReference),
        single("Punkt oporu:", "punkt_oporu_id_sp", Rule::OptionalReference),
        single("Gród:", "grod_id_sp", Rule::OptionalReference),
        single("Opis:", "opis", Rule::RichText),
        single("Data wprowadzenia:", "data_wprowadzenia", Rule::Date),
        single("Aktualizacja danych:", "data_aktualizacji", Rule::Date),
    ]
}
