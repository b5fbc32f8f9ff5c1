//! SVG export backend.
//!
//! [`SvgBuilder`] resolves style and data settings into an [`Svg`] exporter.
//! The exporter can render a [`RenderState`] into an in-memory
//! [`svg::Document`] or write it to a file through [`Exporter`].

mod layer;
mod path;

use std::{fs::File, io::Write};

use indexmap::{IndexMap, IndexSet};
use log::{debug, error, info};
use svg::{Document, node::element as svg_element};

use chorograph_core::geometry::Size;

use crate::{
    color::Color,
    config::{DataConfig, LayerConfig, StyleConfig},
    export::{self, Exporter},
    layer::LayerDescriptor,
    state::RenderState,
};

/// Builder for [`Svg`] exporters.
///
/// # Examples
///
/// ```
/// # use chorograph::{config::StyleConfig, export::svg::SvgBuilder};
/// let style = StyleConfig::default().with_background_color("white");
/// let exporter = SvgBuilder::new("map.svg").with_style(&style).build().unwrap();
/// assert_eq!(exporter.file_name(), "map.svg");
/// ```
pub struct SvgBuilder<'a> {
    file_name: String,
    style: Option<&'a StyleConfig>,
    data: Option<&'a DataConfig>,
    layers: &'a [LayerConfig],
}

impl<'a> SvgBuilder<'a> {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            style: None,
            data: None,
            layers: &[],
        }
    }

    pub fn with_style(mut self, style: &'a StyleConfig) -> Self {
        self.style = Some(style);
        self
    }

    /// Sets which data fields drive feature fill colors
    pub fn with_data(mut self, data: &'a DataConfig) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the layer configurations whose style overrides apply
    pub fn with_layers(mut self, layers: &'a [LayerConfig]) -> Self {
        self.layers = layers;
        self
    }

    /// Resolves every configured color.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Render`] if a configured color does not parse.
    pub fn build(self) -> Result<Svg, export::Error> {
        let default_style = StyleConfig::default();
        let style = self.style.unwrap_or(&default_style);
        let default_data = DataConfig::default();
        let data = self.data.unwrap_or(&default_data);

        let (color_low, color_high) = style.color_range().map_err(export::Error::Render)?;
        let palette = Palette {
            background: style.background_color().map_err(export::Error::Render)?,
            color_low,
            color_high,
            missing: style.missing_color().map_err(export::Error::Render)?,
            feature_stroke: style.feature_stroke().map_err(export::Error::Render)?,
            feature_stroke_width: style.feature_stroke_width(),
            mesh_stroke: style.mesh_stroke().map_err(export::Error::Render)?,
            mesh_stroke_width: style.mesh_stroke_width(),
            point_radius: style.point_radius(),
            selected_fill: style.selected_fill().map_err(export::Error::Render)?,
            selected_stroke: style.selected_stroke().map_err(export::Error::Render)?,
            selected_stroke_width: style.selected_stroke_width(),
        };

        let layer_styles = self
            .layers
            .iter()
            .map(|layer| Ok((layer.name().to_string(), LayerStyle::resolve(layer)?)))
            .collect::<Result<IndexMap<_, _>, export::Error>>()?;

        Ok(Svg {
            file_name: self.file_name,
            palette,
            layer_styles,
            selected: data.selected().iter().cloned().collect(),
            value_field: data.value_field().to_string(),
            geo_key_field: data.geo_key_field().to_string(),
        })
    }
}

/// Colors and widths resolved from a [`StyleConfig`].
#[derive(Debug, Clone, Copy)]
struct Palette {
    background: Option<Color>,
    color_low: Color,
    color_high: Color,
    missing: Color,
    feature_stroke: Color,
    feature_stroke_width: f64,
    mesh_stroke: Color,
    mesh_stroke_width: f64,
    point_radius: f64,
    selected_fill: Option<Color>,
    selected_stroke: Color,
    selected_stroke_width: f64,
}

/// Style overrides resolved from a [`LayerConfig`].
#[derive(Debug, Clone, Default)]
struct LayerStyle {
    class_name: Option<String>,
    selected_class_name: Option<String>,
    fill: Option<Color>,
    stroke: Option<Color>,
    stroke_width: Option<f64>,
}

impl LayerStyle {
    fn resolve(layer: &LayerConfig) -> Result<Self, export::Error> {
        let style = layer.style();
        Ok(Self {
            class_name: style.class_name().map(str::to_string),
            selected_class_name: style.selected_class_name().map(str::to_string),
            fill: style.fill().map_err(export::Error::Render)?,
            stroke: style.stroke().map_err(export::Error::Render)?,
            stroke_width: style.stroke_width(),
        })
    }
}

/// SVG exporter for choropleth maps.
#[derive(Debug)]
pub struct Svg {
    file_name: String,
    palette: Palette,
    layer_styles: IndexMap<String, LayerStyle>,
    selected: IndexSet<String>,
    value_field: String,
    geo_key_field: String,
}

impl Svg {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Renders the visible layers of `state` into an SVG document sized like
    /// the viewport container.
    pub fn render_document(&self, state: &RenderState, layers: &[LayerDescriptor]) -> Document {
        let size = state.viewport().size();
        let mut doc = Document::new()
            .set("viewBox", format!("0 0 {} {}", size.width(), size.height()))
            .set("width", size.width())
            .set("height", size.height());

        if let Some(background) = self.palette.background {
            doc = doc.add(self.background(size, background));
        }

        let scale = self.color_scale(state);
        for layer in layers.iter().filter(|layer| layer.is_visible()) {
            if let Some(group) = self.render_layer(state, layer, scale.as_ref()) {
                doc = doc.add(group);
            }
        }

        debug!(
            width = size.width(),
            height = size.height(),
            scale = state.scale();
            "SVG document rendered"
        );
        doc
    }

    fn background(&self, size: Size, color: Color) -> svg_element::Rectangle {
        svg_element::Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", size.width())
            .set("height", size.height())
            .set("fill", color)
    }

    /// Writes an SVG document to the configured file
    pub fn write_document(&self, doc: &Document) -> Result<(), export::Error> {
        info!(file_name = self.file_name; "Creating SVG file");
        let f = match File::create(&self.file_name) {
            Ok(file) => file,
            Err(err) => {
                error!(file_name = self.file_name, err:err; "Failed to create SVG file");
                return Err(export::Error::Io(err));
            }
        };

        if let Err(err) = write!(&f, "{doc}") {
            error!(file_name = self.file_name, err:err; "Failed to write SVG content");
            return Err(export::Error::Io(err));
        }

        Ok(())
    }
}

impl Exporter for Svg {
    fn export_map(&mut self, state: &RenderState, layers: &[LayerDescriptor]) -> Result<(), export::Error> {
        let doc = self.render_document(state, layers);
        self.write_document(&doc)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use chorograph_core::topology::Topology;

    use super::*;
    use crate::{
        config::LayerStyleConfig,
        keyed::KeyAccessor,
        layer::LayerKind,
        state::{Choropleth, ChoroplethProps},
    };

    fn map(layers: Vec<LayerDescriptor>) -> Choropleth {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "objects": {
                "regions": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "id": "a"},
                    {"type": "Polygon", "arcs": [[2, -1]], "id": "b"}
                ]},
                "city": {"type": "Point", "coordinates": [5, 5]}
            },
            "arcs": [
                [[10, 0], [10, 10]],
                [[10, 10], [0, 10], [0, 0], [10, 0]],
                [[10, 0], [20, 0], [20, 10], [10, 10]]
            ]
        }))
        .unwrap();

        let props = ChoroplethProps::new(Arc::new(topology), layers, Size::new(200.0, 100.0))
            .with_data(
                Arc::new(vec![json!({"id": "a", "value": 1}), json!({"id": "b", "value": 9})]),
                KeyAccessor::field("id"),
            );
        Choropleth::new(props).unwrap()
    }

    fn attr(name: &str, color: &str) -> String {
        format!(r#"{name}="{}""#, Color::new(color).unwrap())
    }

    #[test]
    fn test_document_structure() {
        let layers = vec![
            LayerDescriptor::feature("regions", "regions"),
            LayerDescriptor::mesh("borders", "regions"),
            LayerDescriptor::feature("city", "city"),
        ];
        let map = map(layers.clone());

        let style = StyleConfig::default()
            .with_background_color("white")
            .with_color_range("#000000", "#ffffff");
        let svg = SvgBuilder::new("unused.svg").with_style(&style).build().unwrap();
        let doc = svg.render_document(&map.render_state(), &layers).to_string();

        assert!(doc.contains(r#"viewBox="0 0 200 100""#));
        assert!(doc.contains("<rect"));
        assert_eq!(doc.matches("<path").count(), 3);
        assert!(doc.contains("<circle"));
        assert!(doc.contains(r#"data-layer="borders""#));
        assert!(doc.contains(r#"fill="none""#));
    }

    #[test]
    fn test_hidden_layers_are_skipped() {
        let layers = vec![
            LayerDescriptor::feature("regions", "regions"),
            LayerDescriptor::feature("city", "city").with_visible(false),
        ];
        let map = map(layers.clone());

        let svg = SvgBuilder::new("unused.svg").build().unwrap();
        let doc = svg.render_document(&map.render_state(), &layers).to_string();

        assert!(!doc.contains("<circle"));
        assert!(!doc.contains("<rect"));
    }

    #[test]
    fn test_selected_features_are_highlighted_and_drawn_last() {
        let layers = vec![LayerDescriptor::feature("regions", "regions")];
        let map = map(layers.clone());

        let style = StyleConfig::default().with_selected_style(Some("#00ff00".to_string()), "#ff0000", 3.0);
        let data = DataConfig::default().with_selected(["a"]);
        let layer_config = [LayerConfig::new("regions", LayerKind::Feature)
            .with_style(LayerStyleConfig::default().with_selected_class_name("picked"))];
        let svg = SvgBuilder::new("unused.svg")
            .with_style(&style)
            .with_data(&data)
            .with_layers(&layer_config)
            .build()
            .unwrap();
        let doc = svg.render_document(&map.render_state(), &layers).to_string();

        assert_eq!(doc.matches(r#"class="selected picked""#).count(), 1);
        assert_eq!(doc.matches(&attr("stroke", "#ff0000")).count(), 1);
        assert!(doc.contains(r#"stroke-width="3""#));
        assert!(doc.contains(&attr("fill", "#00ff00")));

        let b = doc.find(r#"data-key="b""#).unwrap();
        let a = doc.find(r#"data-key="a""#).unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_layer_style_overrides() {
        let layers = vec![
            LayerDescriptor::feature("regions", "regions"),
            LayerDescriptor::mesh("borders", "regions"),
        ];
        let map = map(layers.clone());

        let layer_config = [
            LayerConfig::new("regions", LayerKind::Feature).with_style(
                LayerStyleConfig::default()
                    .with_class_name("land")
                    .with_fill("#123456")
                    .with_stroke("#654321", Some(0.25)),
            ),
            LayerConfig::new("borders", LayerKind::Mesh)
                .with_style(LayerStyleConfig::default().with_stroke("#abcdef", Some(4.0))),
        ];
        let svg = SvgBuilder::new("unused.svg").with_layers(&layer_config).build().unwrap();
        let doc = svg.render_document(&map.render_state(), &layers).to_string();

        assert!(doc.contains(r#"class="layer feature land""#));
        assert_eq!(doc.matches(&attr("fill", "#123456")).count(), 2);
        assert_eq!(doc.matches(&attr("stroke", "#654321")).count(), 2);
        assert!(doc.contains(&attr("stroke", "#abcdef")));
        assert!(doc.contains(r#"stroke-width="4""#));
        assert!(!doc.contains("selected"));
    }

    #[test]
    fn test_invalid_layer_style_color() {
        let layer_config = [LayerConfig::new("regions", LayerKind::Feature)
            .with_style(LayerStyleConfig::default().with_fill("not-a-color"))];
        let result = SvgBuilder::new("unused.svg").with_layers(&layer_config).build();
        assert!(matches!(result, Err(export::Error::Render(_))));
    }

    #[test]
    fn test_invalid_style_color() {
        let style = StyleConfig::default().with_background_color("not-a-color");
        let result = SvgBuilder::new("unused.svg").with_style(&style).build();
        assert!(matches!(result, Err(export::Error::Render(_))));
    }
}
