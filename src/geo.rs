//! Coordinate normalization.
//!
//! Source sites publish coordinates in two shapes:
//!
//! - two plain decimal cells (`50.0612` and `19.9372`), parsed independently
//!   with [`parse_decimal`];
//! - one annotated string such as `52.1°N; 21.0°E` or `52.1, 21.0`, handled by
//!   [`parse_pair`].
//!
//! Both shapes end in [`Coordinates::new`], which rejects values that cannot
//! lie on the Earth.

use crate::error::ParseFailure;
use itertools::Itertools;

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParseFailure> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ParseFailure::OutOfRange {
                axis: "latitude",
                value: latitude,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ParseFailure::OutOfRange {
                axis: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// GeoJSON position order: `[longitude, latitude]`.
    pub fn position(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Parse one plain decimal cell. Rust's float parser is locale-invariant.
pub fn parse_decimal(text: &str) -> Result<f64, ParseFailure> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseFailure::NotANumber(trimmed.to_string()))
}

/// Parse an annotated `latitude longitude` string.
///
/// Separators (`,` `;`) and degree signs are replaced with spaces. Compass
/// markers (`N` `S` `E` `W`) may stand alone or touch the number; `S` and `W`
/// negate the value they belong to. The first two numbers are read as
/// latitude then longitude.
pub fn parse_pair(text: &str) -> Result<Coordinates, ParseFailure> {
    let cleaned = text.replace(['°', ',', ';'], " ");
    let Some((lat, lon)) = signed_values(&cleaned)?.into_iter().next_tuple() else {
        return Err(ParseFailure::TokenCount(text.trim().to_string()));
    };
    Coordinates::new(lat, lon)
}

fn is_compass(c: char) -> bool {
    matches!(c, 'N' | 'S' | 'E' | 'W')
}

fn is_negative(marker: &str) -> bool {
    marker.contains(['S', 'W'])
}

/// Numbers of a cleaned coordinate string with their hemisphere sign applied.
///
/// A marker touching a number belongs to it. A standalone marker belongs to
/// the preceding number if that one has no marker yet, else to the next one.
fn signed_values(cleaned: &str) -> Result<Vec<f64>, ParseFailure> {
    let mut values: Vec<f64> = Vec::new();
    let mut last_marked = true;
    let mut pending: Option<bool> = None;
    for token in cleaned.split_whitespace() {
        let number = token.trim_matches(is_compass);
        if number.is_empty() {
            let negative = is_negative(token);
            match values.last_mut() {
                Some(value) if !last_marked && pending.is_none() => {
                    if negative {
                        *value = -*value;
                    }
                    last_marked = true;
                }
                _ => pending = Some(negative),
            }
            continue;
        }
        let value = parse_decimal(number)?;
        let carried = pending.take();
        let negative = is_negative(token) || carried == Some(true);
        values.push(if negative { -value } else { value });
        last_marked = carried.is_some() || number.len() != token.len();
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_yield_same_pair() {
        let expected = Coordinates::new(52.1, 21.0).unwrap();
        for text in [
            "52.1, 21.0",
            "52.1°N; 21.0°E",
            "52.1 21.0",
            "52.1;21.0",
            "  52.1°,   21.0° ",
            "52.1\t21.0",
            "52.1 N, 21.0 E",
            "52.1N 21.0E",
            "N 52.1, E 21.0",
            "N52.1 E21.0",
        ] {
            assert_eq!(parse_pair(text).unwrap(), expected, "variant: {text:?}");
        }
    }

    #[test]
    fn test_southern_and_western_markers_negate() {
        let c = parse_pair("33.9 S, 18.4 E").unwrap();
        assert_eq!(c.position(), [18.4, -33.9]);
        let c = parse_pair("40.7N 74.0W").unwrap();
        assert_eq!(c.position(), [-74.0, 40.7]);
        let c = parse_pair("S 33.9, W 70.6").unwrap();
        assert_eq!(c.position(), [-70.6, -33.9]);
    }

    #[test]
    fn test_markers_alone_are_not_numbers() {
        assert_eq!(
            parse_pair("N, E"),
            Err(ParseFailure::TokenCount("N, E".to_string()))
        );
    }

    #[test]
    fn test_single_token_is_rejected() {
        assert_eq!(
            parse_pair("52.1"),
            Err(ParseFailure::TokenCount("52.1".to_string()))
        );
        assert!(parse_pair("").is_err());
    }

    #[test]
    fn test_non_numeric_token_is_rejected() {
        assert_eq!(
            parse_pair("north, 21.0"),
            Err(ParseFailure::NotANumber("north".to_string()))
        );
    }

    #[test]
    fn test_range_is_enforced() {
        assert!(matches!(
            parse_pair("91.0, 21.0"),
            Err(ParseFailure::OutOfRange { axis: "latitude", .. })
        ));
        assert!(matches!(
            Coordinates::new(50.0, -180.5),
            Err(ParseFailure::OutOfRange { axis: "longitude", .. })
        ));
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(" 50.0612 ").unwrap(), 50.0612);
        assert!(parse_decimal("50,0612").is_err());
        assert!(parse_decimal("NaN").is_err());
    }

    #[test]
    fn test_position_is_lon_lat() {
        let c = Coordinates::new(50.12, 20.34).unwrap();
        assert_eq!(c.position(), [20.34, 50.12]);
    }
}
