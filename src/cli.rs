//! Command-line interface definitions for Heritage Harvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! With only the pipeline name given, a run uses the built-in definition and
//! writes into the current directory.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Built-in pipelines, one per source site.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Manors and palaces register
    Dworysp,
    /// Castle register
    Zamkisp,
    /// Castle guide
    Zamkinet,
}

impl Pipeline {
    pub fn name(self) -> &'static str {
        match self {
            Pipeline::Dworysp => "dworysp",
            Pipeline::Zamkisp => "zamkisp",
            Pipeline::Zamkinet => "zamkinet",
        }
    }
}

/// Command-line arguments for the Heritage Harvest application.
///
/// # Examples
///
/// ```sh
/// # Harvest the manor register into the current directory
/// heritage_harvest dworysp
///
/// # Write somewhere else
/// heritage_harvest zamkinet -o ./geojson
///
/// # Dump a built-in definition, edit it, run with it
/// heritage_harvest zamkisp --print-config > zamkisp.yaml
/// heritage_harvest zamkisp -c zamkisp.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Pipeline to run
    #[arg(value_enum)]
    pub pipeline: Pipeline,

    /// Output directory for the GeoJSON file
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Optional path to a YAML pipeline definition replacing the built-in one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective pipeline definition as YAML and exit
    #[arg(long)]
    pub print_config: bool,
}
