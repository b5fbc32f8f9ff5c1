//! Command-line argument definitions for the Chorograph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, map size and zoom,
//! configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Chorograph map renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input TopoJSON file
    #[arg(help = "Path to the input topology")]
    pub input: String,

    /// Path to a JSON array of data records
    #[arg(short, long)]
    pub data: Option<String>,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Width of the map in pixels
    #[arg(long, default_value_t = 600.0)]
    pub width: f64,

    /// Height of the map in pixels
    #[arg(long, default_value_t = 400.0)]
    pub height: f64,

    /// Zoom factor relative to the fitted view
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
