//! Chorograph - incremental geometry caching and pan/zoom for choropleth maps.
//!
//! A [`Choropleth`] takes a TopoJSON topology, an ordered list of layers and
//! a set of data records, and keeps a render-ready state up to date as those
//! inputs change:
//!
//! - Feature and mesh geometry is decoded once per layer and cached; only
//!   layers that are new (and mesh layers) are decoded again.
//! - Content bounds, base scale and translation are recomputed when the
//!   visible layers or the container size change.
//! - Zoom and pan go through a [`controller::ViewportController`] that keeps
//!   the view centered and within the configured zoom extent.
//!
//! [`MapBuilder`] wires the pieces together from an [`config::AppConfig`]
//! and renders SVG output.

pub mod bounds;
pub mod cache;
pub mod color;
pub mod config;
pub mod controller;
pub mod export;
pub mod extract;
pub mod keyed;
pub mod layer;
pub mod state;
pub mod viewport;

mod error;

pub use chorograph_core::{decode, feature, geometry, simplify, topology};

pub use chorograph_core::TopologyError;
pub use error::ChorographError;
pub use state::{ChangeReason, Choropleth, ChoroplethProps, RenderState};

use std::{path::Path, sync::Arc};

use log::{debug, info};
use serde_json::Value;

use chorograph_core::{geometry::Size, topology::Topology};

use config::AppConfig;
use export::{Exporter, svg::SvgBuilder};
use layer::LayerDescriptor;

/// Builder for loading, updating and rendering choropleth maps.
///
/// # Examples
///
/// ```rust
/// use chorograph::{MapBuilder, config::AppConfig, geometry::Size};
///
/// let source = r#"{
///     "type": "Topology",
///     "objects": {"land": {"type": "Polygon", "arcs": [[0]]}},
///     "arcs": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
/// }"#;
///
/// let builder = MapBuilder::new(AppConfig::default());
/// let topology = builder.parse_topology(source).unwrap();
/// let data = builder.parse_data("[]").unwrap();
///
/// let map = builder.build(topology, data, Size::new(300.0, 300.0)).unwrap();
/// let svg = builder.render_svg(&map).unwrap();
/// assert!(svg.contains("<path"));
/// ```
#[derive(Debug, Default)]
pub struct MapBuilder {
    config: AppConfig,
}

impl MapBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parses a TopoJSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::Topology`] if `source` is not a valid topology.
    pub fn parse_topology(&self, source: &str) -> Result<Arc<Topology>, ChorographError> {
        info!("Parsing topology");
        let topology = Topology::from_json(source)?;
        debug!(
            objects = topology.objects().len(),
            arcs = topology.arcs().len();
            "Topology parsed successfully"
        );
        Ok(Arc::new(topology))
    }

    /// Parses data records from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::Data`] if `source` is not valid JSON and
    /// [`ChorographError::InvalidArgument`] if it is not a JSON array.
    pub fn parse_data(&self, source: &str) -> Result<Arc<Vec<Value>>, ChorographError> {
        match serde_json::from_str::<Value>(source)? {
            Value::Array(records) => {
                debug!(records = records.len(); "Data parsed successfully");
                Ok(Arc::new(records))
            }
            other => Err(ChorographError::invalid_argument(format!(
                "data must be a JSON array of records, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns the configured layers, or one feature layer per topology
    /// object when none are configured.
    pub fn layers(&self, topology: &Topology) -> Vec<LayerDescriptor> {
        if self.config.layers().is_empty() {
            topology
                .objects()
                .keys()
                .map(|name| LayerDescriptor::feature(name.as_str(), name.as_str()))
                .collect()
        } else {
            self.config.layer_descriptors()
        }
    }

    /// Assembles map inputs from the configuration.
    pub fn props(&self, topology: Arc<Topology>, data: Arc<Vec<Value>>, size: Size) -> ChoroplethProps {
        let layers = self.layers(&topology);
        ChoroplethProps::new(topology, layers, size)
            .with_data(data, self.config.data().key_accessor())
            .with_strict_keys(self.config.data().strict_keys())
            .with_viewport(self.config.viewport().clone())
    }

    /// Builds a map from parsed inputs.
    ///
    /// # Errors
    ///
    /// See [`Choropleth::new`].
    pub fn build(
        &self,
        topology: Arc<Topology>,
        data: Arc<Vec<Value>>,
        size: Size,
    ) -> Result<Choropleth, ChorographError> {
        Choropleth::new(self.props(topology, data, size))
    }

    /// Renders the current state of `map` to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::Export`] if a configured style color is invalid.
    pub fn render_svg(&self, map: &Choropleth) -> Result<String, ChorographError> {
        let exporter = self.svg_builder("").build()?;
        let doc = exporter.render_document(&map.render_state(), &map.props().layers);
        info!("SVG rendered successfully");
        Ok(doc.to_string())
    }

    /// Renders the current state of `map` into the SVG file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::Export`] for invalid style colors and
    /// write failures.
    pub fn export_svg(&self, map: &Choropleth, path: &Path) -> Result<(), ChorographError> {
        let mut exporter = self.svg_builder(&path.to_string_lossy()).build()?;
        exporter.export_map(&map.render_state(), &map.props().layers)?;
        Ok(())
    }

    fn svg_builder(&self, file_name: &str) -> SvgBuilder<'_> {
        SvgBuilder::new(file_name)
            .with_style(self.config.style())
            .with_data(self.config.data())
            .with_layers(self.config.layers())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
