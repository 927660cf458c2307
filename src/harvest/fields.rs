//! Turning one cell into typed field values according to a [`Rule`].

use super::markup::{self, IMAGE, TEXTAREA};
use crate::config::{EMPTY_REFERENCE, FieldSpec, Rule, SENTINEL_DATE};
use crate::error::{HarvestError, ParseFailure};
use crate::geo;
use crate::models::{FieldValue, Fragment, LookupKey, LookupLevel, LookupTables};
use chrono::NaiveDate;
use scraper::ElementRef;

/// The cells a rule may read from.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub value: ElementRef<'a>,
    /// Cell holding the row's icon, when the layout has one.
    pub icon: Option<ElementRef<'a>>,
}

impl<'a> Cell<'a> {
    pub fn plain(value: ElementRef<'a>) -> Self {
        Self { value, icon: None }
    }

    fn image(&self) -> Option<ElementRef<'a>> {
        self.icon
            .unwrap_or(self.value)
            .select(&IMAGE)
            .next()
    }
}

/// Administrative codes seen so far while reading one row set, outermost
/// first. A county code is keyed together with the region code read before
/// it, and so on.
#[derive(Debug, Clone, Default)]
pub struct CodeTrail {
    codes: [String; 3],
}

impl CodeTrail {
    fn key(&mut self, level: LookupLevel, code: &str) -> LookupKey {
        let depth = level.depth();
        self.codes[depth - 1] = code.to_string();
        LookupKey::new(self.codes[..depth].iter().cloned())
    }
}

/// Everything a rule needs besides the cell itself.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub url: &'a str,
    pub lookups: &'a LookupTables,
}

/// Apply `spec` to `cell`, writing the result(s) into `fragment`.
pub fn apply(
    spec: &FieldSpec,
    cell: Cell<'_>,
    trail: &mut CodeTrail,
    ctx: &RuleContext<'_>,
    fragment: &mut Fragment,
) -> Result<(), HarvestError> {
    let field = spec.field.as_str();
    let at = |source| HarvestError::field(ctx.url, field, source);

    let value = match &spec.rule {
        Rule::Text => FieldValue::Text(markup::trimmed(cell.value)),
        Rule::OptionalReference => {
            let text = markup::trimmed(cell.value);
            if text.is_empty() || text == EMPTY_REFERENCE {
                FieldValue::Null
            } else {
                FieldValue::Text(text)
            }
        }
        Rule::Code(level) => {
            let key = trail.key(*level, &markup::trimmed(cell.value));
            FieldValue::text_or_null(ctx.lookups.level(*level).resolve(&key))
        }
        Rule::Translate(dictionary) => {
            let code = markup::trimmed(cell.value);
            FieldValue::text_or_null(ctx.lookups.translate(dictionary, &code))
        }
        Rule::CoordinatePair { longitude } => {
            let pair = geo::parse_pair(&markup::text(cell.value)).map_err(at)?;
            fragment.set(longitude, FieldValue::Float(pair.longitude()));
            FieldValue::Float(pair.latitude())
        }
        Rule::Decimal => FieldValue::Float(geo::parse_decimal(&markup::text(cell.value)).map_err(at)?),
        Rule::Date => parse_date(&markup::trimmed(cell.value)).map_err(at)?,
        Rule::RichText => {
            let area = cell.value.select(&TEXTAREA).next().ok_or_else(|| {
                HarvestError::structure(ctx.url, format!("field '{field}' has no text area"))
            })?;
            FieldValue::Text(markup::trimmed(area))
        }
        Rule::IconAlt => FieldValue::text_or_null(cell.image().and_then(|img| img.value().attr("alt"))),
        Rule::IconScore => match cell.image().and_then(|img| img.value().attr("src")) {
            Some(src) => FieldValue::Integer(icon_score(src).map_err(at)?),
            None => FieldValue::Null,
        },
    };
    fragment.set(field, value);
    Ok(())
}

/// ISO date, with the sentinel mapped to [`FieldValue::Null`].
pub fn parse_date(text: &str) -> Result<FieldValue, ParseFailure> {
    if text == SENTINEL_DATE {
        return Ok(FieldValue::Null);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(FieldValue::Date)
        .map_err(|_| ParseFailure::NotADate(text.to_string()))
}

/// Score encoded in an icon file name: `.../trudnosc3.gif` is 3.
fn icon_score(src: &str) -> Result<i64, ParseFailure> {
    let stem = src.rsplit_once('.').map_or(src, |(stem, _)| stem);
    stem.chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(i64::from)
        .ok_or_else(|| ParseFailure::NoScore(src.to_string()))
}
