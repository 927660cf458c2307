//! Output generation.
//!
//! # Submodules
//!
//! - [`geojson`]: folds harvested records into one GeoJSON `FeatureCollection`
//!   and writes it to `<pipeline>_<date>.geojson`
//!
//! The file is written once, after the whole run succeeded; a failed run
//! leaves no output behind.

pub mod geojson;
