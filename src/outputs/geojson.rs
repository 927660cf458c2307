//! GeoJSON output.
//!
//! Records become point features of a single `FeatureCollection`. Feature
//! properties follow the pipeline's declared schema order. A record without
//! coordinates is written with a `null` geometry or left out, depending on
//! [`OnMissingCoordinates`].
//!
//! # Output Path
//!
//! ```text
//! output_dir/
//! └── <pipeline>_<YYYY-MM-DD>.geojson
//! ```

use crate::config::{OnMissingCoordinates, OutputSchema};
use crate::error::HarvestError;
use crate::models::{FieldValue, Record};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub properties: serde_json::Map<String, serde_json::Value>,
    geometry: Option<Point>,
}

#[derive(Debug, Serialize)]
struct Point {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

/// Project records onto GeoJSON features, applying the missing-coordinates
/// policy.
pub fn to_feature_collection(records: &[Record], schema: &OutputSchema) -> FeatureCollection {
    let mut features = Vec::with_capacity(records.len());
    for record in records {
        let geometry = record.coordinates().map(|c| Point {
            kind: "Point",
            coordinates: c.position(),
        });
        if geometry.is_none() && schema.geometry.on_missing == OnMissingCoordinates::Drop {
            warn!(
                name = record.label(&schema.name_field),
                url = record.url(),
                "Skipping record due to missing coordinates"
            );
            continue;
        }
        let properties = record
            .properties()
            .iter()
            .map(|(name, value)| (name.clone(), to_json(value)))
            .collect();
        features.push(Feature {
            kind: "Feature",
            properties,
            geometry,
        });
    }
    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}

fn to_json(value: &FieldValue) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// `<pipeline>_<date>.geojson` inside `output_dir`.
pub fn output_path(output_dir: &str, pipeline: &str, date: NaiveDate) -> PathBuf {
    Path::new(output_dir).join(format!("{pipeline}_{}.geojson", date.format("%Y-%m-%d")))
}

/// Serialize the whole collection and write it in one go.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_collection(
    collection: &FeatureCollection,
    path: &Path,
) -> Result<(), HarvestError> {
    let json = serde_json::to_string_pretty(collection)?;
    fs::write(path, json).await?;
    info!(features = collection.features.len(), "Wrote GeoJSON file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeometrySpec, PropertySpec};
    use crate::geo::Coordinates;
    use serde_json::json;

    fn schema(on_missing: OnMissingCoordinates) -> OutputSchema {
        OutputSchema {
            properties: vec![PropertySpec::required("nazwa"), PropertySpec::optional("data")],
            geometry: GeometrySpec {
                latitude: "lat".to_string(),
                longitude: "lon".to_string(),
                required: false,
                on_missing,
            },
            name_field: "nazwa".to_string(),
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new(
                "https://x/1".to_string(),
                Some(Coordinates::new(50.12, 20.34).unwrap()),
                vec![
                    ("nazwa".to_string(), FieldValue::Text("Zamek".to_string())),
                    (
                        "data".to_string(),
                        FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()),
                    ),
                ],
            ),
            Record::new(
                "https://x/2".to_string(),
                None,
                vec![
                    ("nazwa".to_string(), FieldValue::Text("Gródek".to_string())),
                    ("data".to_string(), FieldValue::Null),
                ],
            ),
        ]
    }

    #[test]
    fn test_include_as_null_keeps_record() {
        let records = records();
        let collection = to_feature_collection(&records, &schema(OnMissingCoordinates::IncludeAsNull));
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": {"nazwa": "Zamek", "data": "2020-01-31"},
                        "geometry": {"type": "Point", "coordinates": [20.34, 50.12]}
                    },
                    {
                        "type": "Feature",
                        "properties": {"nazwa": "Gródek", "data": null},
                        "geometry": null
                    }
                ]
            })
        );
    }

    #[test]
    fn test_drop_policy_skips_record() {
        let records = records();
        let collection = to_feature_collection(&records, &schema(OnMissingCoordinates::Drop));
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.features[0].properties["nazwa"], "Zamek");
    }

    #[test]
    fn test_property_order_is_schema_order() {
        let records = records();
        let collection = to_feature_collection(&records, &schema(OnMissingCoordinates::Drop));
        let text = serde_json::to_string(&collection).unwrap();
        assert!(text.find("\"nazwa\"").unwrap() < text.find("\"data\"").unwrap());
    }

    #[test]
    fn test_output_path() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();
        assert_eq!(
            output_path("out", "dworysp", date),
            Path::new("out").join("dworysp_2026-02-04.geojson")
        );
    }

    #[tokio::test]
    async fn test_write_collection_is_pretty_utf8() {
        let records = records();
        let collection = to_feature_collection(&records, &schema(OnMissingCoordinates::IncludeAsNull));
        let dir = std::env::temp_dir().join(format!("heritage_harvest_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.geojson");
        write_collection(&collection, &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Gródek"));
        assert!(text.starts_with("{\n  \"type\": \"FeatureCollection\""));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
