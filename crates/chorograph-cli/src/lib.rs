//! CLI logic for the Chorograph map renderer.
//!
//! This module contains the core CLI logic: load configuration, read the
//! topology and data, build the map, apply the requested zoom and export SVG.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;
pub use error_adapter::ErrorAdapter;

use std::{fs, path::Path};

use log::info;

use chorograph::{ChorographError, MapBuilder, geometry::Size};

/// Run the Chorograph CLI application
///
/// # Errors
///
/// Returns `ChorographError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Topology and data parsing errors
/// - Extraction, bounds and viewport errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), ChorographError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing topology"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let builder = MapBuilder::new(app_config);

    let topology = builder.parse_topology(&fs::read_to_string(&args.input)?)?;
    let data = match &args.data {
        Some(path) => builder.parse_data(&fs::read_to_string(path)?)?,
        None => builder.parse_data("[]")?,
    };

    let mut map = builder.build(topology, data, Size::new(args.width, args.height))?;

    if let Some(zoom) = args.zoom {
        let scale = map.render_state().scale_base() * zoom;
        map.zoom_to(scale)?;
        info!(zoom, scale; "Zoom applied");
    }

    builder.export_svg(&map, Path::new(&args.output))?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
