//! Record Assembler: listing fields + detail fields -> one immutable [`Record`].

use crate::config::OutputSchema;
use crate::error::HarvestError;
use crate::geo::Coordinates;
use crate::models::{FieldValue, Fragment, Record};

/// Property name under which the detail URL is always available.
pub const URL_FIELD: &str = "url";

/// Merge `listing` and `detail` (detail wins) and project them onto `schema`.
///
/// A required property that was never supplied, or required coordinates that
/// are missing, fail with [`HarvestError::MissingField`]. An optional property
/// that was never supplied takes its default text, else `Null`. A supplied
/// value of [`FieldValue::Null`] counts as present.
pub fn assemble(
    schema: &OutputSchema,
    url: &str,
    listing: Fragment,
    detail: Fragment,
) -> Result<Record, HarvestError> {
    let mut merged = listing.merge(detail);
    merged.set(URL_FIELD, FieldValue::Text(url.to_string()));

    let missing = |field: &str| HarvestError::MissingField {
        url: url.to_string(),
        field: field.to_string(),
    };

    let geometry = &schema.geometry;
    let latitude = merged.get(&geometry.latitude).and_then(FieldValue::as_float);
    let longitude = merged.get(&geometry.longitude).and_then(FieldValue::as_float);
    let coordinates = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(
            Coordinates::new(lat, lon)
                .map_err(|source| HarvestError::field(url, &geometry.latitude, source))?,
        ),
        _ if geometry.required => {
            let absent = if latitude.is_none() {
                &geometry.latitude
            } else {
                &geometry.longitude
            };
            return Err(missing(absent.as_str()));
        }
        _ => None,
    };

    let mut properties = Vec::with_capacity(schema.properties.len());
    for spec in &schema.properties {
        let value = match merged.get(&spec.name) {
            Some(value) => value.clone(),
            None if spec.required => return Err(missing(spec.name.as_str())),
            None => spec.default.clone().map_or(FieldValue::Null, FieldValue::Text),
        };
        properties.push((spec.name.clone(), value));
    }

    Ok(Record::new(url.to_string(), coordinates, properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeometrySpec, OnMissingCoordinates, PropertySpec};

    fn schema(required_geometry: bool) -> OutputSchema {
        OutputSchema {
            properties: vec![
                PropertySpec::required("nazwa"),
                PropertySpec::optional("powiat"),
                PropertySpec::optional("opis"),
                PropertySpec::required("url"),
            ],
            geometry: GeometrySpec {
                latitude: "lat".to_string(),
                longitude: "lon".to_string(),
                required: required_geometry,
                on_missing: OnMissingCoordinates::IncludeAsNull,
            },
            name_field: "nazwa".to_string(),
        }
    }

    fn fragment(pairs: &[(&str, FieldValue)]) -> Fragment {
        let mut f = Fragment::default();
        for (k, v) in pairs {
            f.set(k, v.clone());
        }
        f
    }

    #[test]
    fn test_properties_follow_schema_order() {
        let listing = fragment(&[("nazwa", FieldValue::Text("Dwór".to_string()))]);
        let detail = fragment(&[
            ("opis", FieldValue::Text("Opis".to_string())),
            ("lat", FieldValue::Float(50.0)),
            ("lon", FieldValue::Float(20.0)),
            ("ignored", FieldValue::Integer(1)),
        ]);
        let record = assemble(&schema(true), "https://x/1", listing, detail).unwrap();
        let names = record.properties().iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["nazwa", "powiat", "opis", "url"]);
        assert_eq!(record.get("powiat"), Some(&FieldValue::Null));
        assert_eq!(record.get("url").and_then(FieldValue::as_text), Some("https://x/1"));
        assert_eq!(record.coordinates(), Some(Coordinates::new(50.0, 20.0).unwrap()));
    }

    #[test]
    fn test_missing_required_property_names_field_and_url() {
        let err = assemble(&schema(false), "https://x/2", Fragment::default(), Fragment::default())
            .unwrap_err();
        match err {
            HarvestError::MissingField { url, field } => {
                assert_eq!(url, "https://x/2");
                assert_eq!(field, "nazwa");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_counts_as_present() {
        let detail = fragment(&[("nazwa", FieldValue::Null)]);
        let record = assemble(&schema(false), "https://x/3", Fragment::default(), detail).unwrap();
        assert_eq!(record.get("nazwa"), Some(&FieldValue::Null));
        assert_eq!(record.coordinates(), None);
    }

    #[test]
    fn test_unsupplied_optional_takes_default() {
        let mut schema = schema(false);
        schema.properties[2] = PropertySpec::optional("opis").with_default("");
        let detail = fragment(&[("nazwa", FieldValue::Text("Dwór".to_string()))]);
        let record = assemble(&schema, "https://x/6", Fragment::default(), detail).unwrap();
        assert_eq!(record.get("opis").and_then(FieldValue::as_text), Some(""));
        assert_eq!(record.get("powiat"), Some(&FieldValue::Null));

        let detail = fragment(&[("nazwa", FieldValue::Null), ("opis", FieldValue::Null)]);
        let record = assemble(&schema, "https://x/6", Fragment::default(), detail).unwrap();
        assert_eq!(record.get("opis"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_required_geometry() {
        let detail = fragment(&[
            ("nazwa", FieldValue::Text("Dwór".to_string())),
            ("lat", FieldValue::Float(50.0)),
        ]);
        let err = assemble(&schema(true), "https://x/4", Fragment::default(), detail).unwrap_err();
        assert!(matches!(err, HarvestError::MissingField { ref field, .. } if field == "lon"));
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let detail = fragment(&[
            ("nazwa", FieldValue::Text("Dwór".to_string())),
            ("lat", FieldValue::Float(20.0)),
            ("lon", FieldValue::Float(250.0)),
        ]);
        let err = assemble(&schema(false), "https://x/5", Fragment::default(), detail).unwrap_err();
        assert!(matches!(err, HarvestError::Field { .. }));
    }
}
