//! Castle register (`zamkisp.pl`).
//!
//! Unlike the manor register, most fields sit inline in the listing row; the
//! detail page only adds the description, plain coordinates and dates.

use super::{REGION_DICTIONARY, dictionary, register_lookups, register_table, voivodeships};
use crate::config::{
    ColumnRule, DetailSource, FanOut, FieldSpec, GeometrySpec, LabelRule, ListingSource,
    OnMissingCoordinates, OutputSchema, PipelineConfig, PropertySpec, RowLayout, Rule,
    TransportConfig,
};
use crate::models::LookupLevel;
use std::collections::BTreeMap;

const SITE: &str = "https://zamkisp.pl";
const CONTAINER: &str = "main_full";

/// Dictionary name of the castle condition codes.
pub const TYPE_DICTIONARY: &str = "typ";

const TYPES: [(&str, &str); 4] = [
    ("M", "zniszczony"),
    ("F", "pozostałości"),
    ("R", "ruiny"),
    ("Z", "zachowany"),
];

pub fn zamkisp() -> PipelineConfig {
    PipelineConfig {
        name: "zamkisp".to_string(),
        transport: TransportConfig::default(),
        dictionaries: BTreeMap::from([
            (REGION_DICTIONARY.to_string(), voivodeships()),
            (TYPE_DICTIONARY.to_string(), dictionary(&TYPES)),
        ]),
        region_dictionary: Some(REGION_DICTIONARY.to_string()),
        lookups: register_lookups(SITE, 53, 62, CONTAINER),
        listing: ListingSource::Paginated {
            table: register_table(
                format!("{SITE}/index.php?option=com_zamki&view=zamki&Itemid=63&limitstart={{limitstart}}"),
                CONTAINER,
            ),
            base_url: SITE.to_string(),
            link_column: 8,
            columns: columns(),
        },
        detail: DetailSource {
            params: vec![],
            container: format!("#{CONTAINER}"),
            layout: RowLayout::Positional { label: 1, value: 2 },
            title: None,
            labels: vec![
                LabelRule::new("Opis:", vec![FieldSpec::new("opis", Rule::RichText)]),
                LabelRule::new("(5x.xxxxx):", vec![FieldSpec::new("szerokosc_geo", Rule::Decimal)]),
                LabelRule::new("(1x.xxxx):", vec![FieldSpec::new("dlugosc_geo", Rule::Decimal)]),
                LabelRule::new("Data wprowadzenia:", vec![FieldSpec::new("data_wprowadzenia", Rule::Date)]),
                LabelRule::new("Aktualizacja danych:", vec![FieldSpec::new("data_aktualizacji", Rule::Date)]),
            ],
            coordinate_view: None,
        },
        schema: OutputSchema {
            properties: vec![
                PropertySpec::required("wojewodztwo"),
                PropertySpec::required("powiat"),
                PropertySpec::required("gmina"),
                PropertySpec::required("zamek_id"),
                PropertySpec::required("nazwa"),
                PropertySpec::required("typ_oryginalny"),
                PropertySpec::required("typ_interpretowany"),
                PropertySpec::optional("data_wprowadzenia"),
                PropertySpec::optional("data_aktualizacji"),
                PropertySpec::optional("opis").with_default(""),
                PropertySpec::required("url"),
            ],
            geometry: GeometrySpec {
                latitude: "szerokosc_geo".to_string(),
                longitude: "dlugosc_geo".to_string(),
                required: false,
                on_missing: OnMissingCoordinates::IncludeAsNull,
            },
            name_field: "nazwa".to_string(),
        },
        fan_out: FanOut::Sequential,
    }
}

/// Listing cells: 1 region, 2 county, 3 id, 4 name, 5 municipality, 7 type.
fn columns() -> Vec<ColumnRule> {
    let column = |column: usize, fields: Vec<FieldSpec>| ColumnRule { column, fields };
    vec![
        column(1, vec![FieldSpec::new("wojewodztwo", Rule::Code(LookupLevel::Region))]),
        column(2, vec![FieldSpec::new("powiat", Rule::Code(LookupLevel::County))]),
        column(3, vec![FieldSpec::new("zamek_id", Rule::Text)]),
        column(4, vec![FieldSpec::new("nazwa", Rule::Text)]),
        column(5, vec![FieldSpec::new("gmina", Rule::Code(LookupLevel::Municipality))]),
        column(
            7,
            vec![
                FieldSpec::new("typ_oryginalny", Rule::Text),
                FieldSpec::new("typ_interpretowany", Rule::Translate(TYPE_DICTIONARY.to_string())),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::CannedFetcher;
    use crate::harvest;
    use crate::harvest::detail::fixtures::register_page;
    use crate::harvest::pager::fixtures::{listing_page, row};
    use crate::models::FieldValue;

    fn lookup_url(option: &str, item: u32, offset: usize) -> String {
        format!("{SITE}/index.php?option=com_{option}&view={option}&Itemid={item}&limitstart={offset}")
    }

    fn listing_url(offset: usize) -> String {
        format!("{SITE}/index.php?option=com_zamki&view=zamki&Itemid=63&limitstart={offset}")
    }

    fn fetcher(detail: String) -> CannedFetcher {
        let link = "<a href=\"/index.php?option=com_zamki&amp;task=view&amp;id=M-06-01\">szczegóły</a>";
        CannedFetcher::new()
            .page(
                &lookup_url("powiaty", 53, 0),
                listing_page(CONTAINER, &[row(&["1", "M", "06", "krakowski"])]),
            )
            .page(&lookup_url("powiaty", 53, 100), listing_page(CONTAINER, &[]))
            .page(
                &lookup_url("gminy", 62, 0),
                listing_page(CONTAINER, &[row(&["1", "M", "06", "07", "Liszki"])]),
            )
            .page(&lookup_url("gminy", 62, 100), listing_page(CONTAINER, &[]))
            .page(
                &listing_url(0),
                listing_page(
                    CONTAINER,
                    &[
                        row(&["Lp.", "Woj.", "Pow.", "Id", "Nazwa", "Gm.", "", "Typ", ""])
                            .replace("td>", "th>"),
                        row(&["1", "M", "06", "M-06-01", "Tenczyn", "07", "", "R", link]),
                    ],
                ),
            )
            .page(&listing_url(100), listing_page(CONTAINER, &[]))
            .page(&format!("{SITE}/index.php?option=com_zamki&task=view&id=M-06-01"), detail)
    }

    #[tokio::test]
    async fn test_inline_and_detail_fields_merge() {
        let detail = register_page(
            CONTAINER,
            &[
                ("Opis:", "<textarea>Ruiny zamku.</textarea>"),
                ("Szerokość (5x.xxxxx):", "50.10012"),
                ("Długość (1x.xxxx):", "19.6402"),
                ("Data wprowadzenia:", "2005-03-12"),
                ("Aktualizacja danych:", "0000-00-00"),
            ],
        );
        let records = harvest::run(&fetcher(detail), &zamkisp()).await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let text = |field: &str| record.get(field).and_then(FieldValue::as_text);
        assert_eq!(text("wojewodztwo"), Some("małopolskie"));
        assert_eq!(text("powiat"), Some("krakowski"));
        assert_eq!(text("gmina"), Some("Liszki"));
        assert_eq!(text("zamek_id"), Some("M-06-01"));
        assert_eq!(text("nazwa"), Some("Tenczyn"));
        assert_eq!(text("typ_oryginalny"), Some("R"));
        assert_eq!(text("typ_interpretowany"), Some("ruiny"));
        assert_eq!(text("opis"), Some("Ruiny zamku."));
        assert_eq!(record.get("data_aktualizacji"), Some(&FieldValue::Null));
        let coordinates = record.coordinates().unwrap();
        assert_eq!(coordinates.latitude(), 50.10012);
        assert_eq!(coordinates.longitude(), 19.6402);
    }

    #[tokio::test]
    async fn test_missing_coordinates_are_kept() {
        let detail = register_page(CONTAINER, &[("Opis:", "<textarea>Brak śladów.</textarea>")]);
        let records = harvest::run(&fetcher(detail), &zamkisp()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].coordinates().is_none());
    }

    #[tokio::test]
    async fn test_missing_description_is_empty_text() {
        let detail = register_page(CONTAINER, &[("Szerokość (5x.xxxxx):", "50.10012")]);
        let records = harvest::run(&fetcher(detail), &zamkisp()).await.unwrap();
        assert_eq!(records[0].get("opis").and_then(FieldValue::as_text), Some(""));
        assert_eq!(records[0].get("data_wprowadzenia"), Some(&FieldValue::Null));
    }
}
