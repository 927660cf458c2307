//! Error taxonomy for a harvesting run.
//!
//! Every variant is fatal for the run: nothing is retried, no failing record
//! is skipped and no partial output is written. Lookup misses are not errors
//! at all; they resolve to an absent value (see
//! [`crate::models::LookupTable::resolve`]).

use thiserror::Error;

/// Why a single field value could not be normalized.
#[derive(Debug, Error, PartialEq)]
pub enum ParseFailure {
    #[error("'{0}' is not a decimal number")]
    NotANumber(String),
    #[error("expected two coordinate tokens in '{0}'")]
    TokenCount(String),
    #[error("{axis} {value} is outside the range of the Earth")]
    OutOfRange { axis: &'static str, value: f64 },
    #[error("'{0}' is not an ISO date")]
    NotADate(String),
    #[error("no icon score in '{0}'")]
    NoScore(String),
}

/// Fatal failure of a harvesting run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected page structure at {url}: {detail}")]
    Structure { url: String, detail: String },
    #[error("cannot parse field '{field}' at {url}: {source}")]
    Field {
        url: String,
        field: String,
        #[source]
        source: ParseFailure,
    },
    #[error("record from {url} is missing mandatory field '{field}'")]
    MissingField { url: String, field: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl HarvestError {
    pub fn structure(url: &str, detail: impl Into<String>) -> Self {
        HarvestError::Structure {
            url: url.to_string(),
            detail: detail.into(),
        }
    }

    pub fn field(url: &str, field: &str, source: ParseFailure) -> Self {
        HarvestError::Field {
            url: url.to_string(),
            field: field.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_names_url_and_field() {
        let err = HarvestError::field(
            "https://example.com/a",
            "szerokosc_geo",
            ParseFailure::NotANumber("x".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/a"));
        assert!(msg.contains("szerokosc_geo"));
    }

    #[test]
    fn test_structure_error_message() {
        let err = HarvestError::structure("https://example.com/list", "no table");
        assert_eq!(
            err.to_string(),
            "unexpected page structure at https://example.com/list: no table"
        );
    }
}
