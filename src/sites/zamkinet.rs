//! Castle guide (`zamki.net.pl`).
//!
//! One alphabetical index lists every castle. Each castle page has two views:
//! `z=1` with the descriptive table, `z=2` with the coordinates in free text.
//! All castles are fetched concurrently, two connections at a time; castles
//! whose coordinates cannot be read are left out of the output.

use crate::config::{
    CoordinateView, DetailSource, FanOut, FieldSpec, GeometrySpec, LabelRule, ListingSource,
    OnMissingCoordinates, OutputSchema, PipelineConfig, PropertySpec, RowLayout, Rule, TitleRule,
    TransportConfig,
};
use std::collections::BTreeMap;

const INDEX_URL: &str = "http://zamki.net.pl/alfabetycznie.php";
const CONTENT: &str = "div.srodek-zp-srodek";

pub fn zamkinet() -> PipelineConfig {
    PipelineConfig {
        name: "zamkinet".to_string(),
        transport: TransportConfig {
            max_connections: 2,
            max_keepalive: 1,
            timeout_secs: 60,
        },
        dictionaries: BTreeMap::new(),
        region_dictionary: None,
        lookups: vec![],
        listing: ListingSource::Index {
            url: INDEX_URL.to_string(),
            anchors: format!("{CONTENT} a[href]"),
        },
        detail: DetailSource {
            params: vec![view("1")],
            container: CONTENT.to_string(),
            layout: RowLayout::Classed {
                label: "opis1".to_string(),
                icon: "opis2".to_string(),
                value: "opis3".to_string(),
            },
            title: Some(TitleRule {
                selector: "div.srodek-zp-gorap h1".to_string(),
                field: "nazwa".to_string(),
            }),
            labels: labels(),
            coordinate_view: Some(CoordinateView {
                params: vec![view("2")],
                element_id: "licznik".to_string(),
                latitude_pattern: r"\(([4-5]\d\.\d+)\)".to_string(),
                longitude_pattern: r"\(([1-2]\d\.\d+)\)".to_string(),
                latitude_field: "szerokosc_geo".to_string(),
                longitude_field: "dlugosc_geo".to_string(),
            }),
        },
        schema: OutputSchema {
            properties: [
                "nazwa",
                "url",
                "stan_tekst",
                "stan_opis",
                "wstep",
                "parking",
                "trudnosc_odnalezienia_skala",
                "trudnosc_odnalezienia_tekst",
                "trudnosc_odnalezienia_opis",
                "trudnosc_dojscia_skala",
                "trudnosc_dojscia_tekst",
                "trudnosc_dojscia_opis",
                "ocena_skala",
                "ocena_tekst",
                "ocena_opis",
            ]
            .into_iter()
            .map(|name| match name {
                "nazwa" | "url" => PropertySpec::required(name),
                _ => PropertySpec::optional(name),
            })
            .collect(),
            geometry: GeometrySpec {
                latitude: "szerokosc_geo".to_string(),
                longitude: "dlugosc_geo".to_string(),
                required: false,
                on_missing: OnMissingCoordinates::Drop,
            },
            name_field: "nazwa".to_string(),
        },
        fan_out: FanOut::Page,
    }
}

fn view(z: &str) -> (String, String) {
    ("z".to_string(), z.to_string())
}

/// Icon score, icon text and description for one rating row.
fn rating(prefix: &str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(&format!("{prefix}_skala"), Rule::IconScore),
        FieldSpec::new(&format!("{prefix}_tekst"), Rule::IconAlt),
        FieldSpec::new(&format!("{prefix}_opis"), Rule::Text),
    ]
}

fn labels() -> Vec<LabelRule> {
    vec![
        LabelRule::new(
            "Stan zachowania:",
            vec![
                FieldSpec::new("stan_tekst", Rule::IconAlt),
                FieldSpec::new("stan_opis", Rule::Text),
            ],
        ),
        LabelRule::new("Wstęp:", vec![FieldSpec::new("wstep", Rule::Text)]),
        LabelRule::new("Parking:", vec![FieldSpec::new("parking", Rule::Text)]),
        LabelRule::new("Trudność odnalezienia:", rating("trudnosc_odnalezienia")),
        LabelRule::new("Trudność dojścia:", rating("trudnosc_dojscia")),
        LabelRule::new("Subiektywna ocena:", rating("ocena")),
    ]
}
