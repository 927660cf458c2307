//! Data models shared by every harvesting stage.
//!
//! - [`LookupKey`] / [`LookupTable`] / [`LookupTables`]: administrative code
//!   dictionaries, built once per run and read-only afterwards
//! - [`FieldValue`] / [`Fragment`]: typed field values collected while a
//!   listing row or detail page is being read
//! - [`Record`]: the immutable harvested entity produced by the assembler

use crate::geo::Coordinates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Administrative depth of a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupLevel {
    /// Voivodeship, keyed by its own code.
    Region,
    /// County, keyed by region + county code.
    County,
    /// Municipality, keyed by region + county + municipality code.
    Municipality,
}

impl LookupLevel {
    /// Number of codes that make up a key at this level.
    pub fn depth(self) -> usize {
        match self {
            LookupLevel::Region => 1,
            LookupLevel::County => 2,
            LookupLevel::Municipality => 3,
        }
    }
}

/// An ordered tuple of short codes, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(Vec<String>);

impl LookupKey {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codes.into_iter().map(Into::into).collect())
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }
}

/// Code-to-name dictionary for one administrative level.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    names: HashMap<LookupKey, String>,
    overwritten: usize,
}

impl LookupTable {
    /// Insert a name. A colliding key keeps the later name.
    pub fn insert(&mut self, key: LookupKey, name: String) {
        if let Some(previous) = self.names.insert(key.clone(), name) {
            self.overwritten += 1;
            debug!(codes = ?key.codes(), %previous, "Lookup key collision; keeping later name");
        }
    }

    /// Resolve a key. `None` is the explicit absent marker for an unknown code.
    pub fn resolve(&self, key: &LookupKey) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// How many inserts replaced an existing name.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

impl<K, S> FromIterator<(K, S)> for LookupTable
where
    K: Into<String>,
    S: Into<String>,
{
    /// Build a single-code table, as used for the fixed region dictionary.
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        let mut table = LookupTable::default();
        for (code, name) in iter {
            table.insert(LookupKey::new([code]), name.into());
        }
        table
    }
}

/// All lookup levels of one pipeline, plus its fixed translation
/// dictionaries, passed by reference into extraction.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub regions: LookupTable,
    pub counties: LookupTable,
    pub municipalities: LookupTable,
    pub dictionaries: HashMap<String, LookupTable>,
}

impl LookupTables {
    pub fn level(&self, level: LookupLevel) -> &LookupTable {
        match level {
            LookupLevel::Region => &self.regions,
            LookupLevel::County => &self.counties,
            LookupLevel::Municipality => &self.municipalities,
        }
    }

    pub fn level_mut(&mut self, level: LookupLevel) -> &mut LookupTable {
        match level {
            LookupLevel::Region => &mut self.regions,
            LookupLevel::County => &mut self.counties,
            LookupLevel::Municipality => &mut self.municipalities,
        }
    }

    /// Translate a single code through a named dictionary.
    pub fn translate(&self, dictionary: &str, code: &str) -> Option<&str> {
        self.dictionaries
            .get(dictionary)
            .and_then(|table| table.resolve(&LookupKey::new([code])))
    }
}

/// A typed field value. `Null` means "seen but absent".
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Integer(i64),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    pub fn text_or_null(value: Option<&str>) -> Self {
        value.map_or(FieldValue::Null, |s| FieldValue::Text(s.to_string()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Integer(v) => serializer.serialize_i64(*v),
            FieldValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            FieldValue::Null => serializer.serialize_none(),
        }
    }
}

/// Fields read from one listing row or one detail page, keyed by output name.
///
/// A key that is absent was never supplied; a key holding [`FieldValue::Null`]
/// was supplied and resolved to nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    values: BTreeMap<String, FieldValue>,
}

impl Fragment {
    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Overlay `other` on top of `self`; `other` wins on shared keys.
    pub fn merge(mut self, other: Fragment) -> Fragment {
        self.values.extend(other.values);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One harvested site. Only the record assembler can build one.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    url: String,
    coordinates: Option<Coordinates>,
    properties: Vec<(String, FieldValue)>,
}

impl Record {
    pub(crate) fn new(
        url: String,
        coordinates: Option<Coordinates>,
        properties: Vec<(String, FieldValue)>,
    ) -> Self {
        Self {
            url,
            coordinates,
            properties,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Output properties, in the pipeline's declared schema order.
    pub fn properties(&self) -> &[(String, FieldValue)] {
        &self.properties
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.properties
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Display name, for log lines.
    pub fn label(&self, name_field: &str) -> &str {
        self.get(name_field)
            .and_then(FieldValue::as_text)
            .unwrap_or("<unnamed>")
    }
}
