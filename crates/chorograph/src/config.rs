//! Configuration types for Chorograph maps.
//!
//! This module provides configuration structures that control zoom
//! behaviour, data keying, styling and the layer list. All types implement
//! [`serde::Deserialize`] for flexible loading from external sources, and
//! every field has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section below.
//! - [`ViewportConfig`] - Zoom step and optional zoom extent.
//! - [`DataConfig`] - How data records are keyed, valued and joined to features.
//! - [`StyleConfig`] - Colors and stroke widths used by the SVG exporter.
//! - [`LayerConfig`] - One entry of the layer list.
//! - [`LayerStyleConfig`] - Per-layer style overrides.
//!
//! # Example
//!
//! ```
//! # use chorograph::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.viewport().zoom_step(), 1.1);
//! assert!(config.style().background_color().unwrap().is_none());
//! ```

use serde::Deserialize;

use chorograph_core::decode::MeshFilter;

use crate::{
    color::Color,
    error::ChorographError,
    keyed::KeyAccessor,
    layer::{LayerDescriptor, LayerKind},
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    viewport: ViewportConfig,

    #[serde(default)]
    data: DataConfig,

    #[serde(default)]
    style: StyleConfig,

    /// Layers in drawing order, bottom first.
    #[serde(default)]
    layers: Vec<LayerConfig>,
}

impl AppConfig {
    pub fn new(
        viewport: ViewportConfig,
        data: DataConfig,
        style: StyleConfig,
        layers: Vec<LayerConfig>,
    ) -> Self {
        Self {
            viewport,
            data,
            style,
            layers,
        }
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    pub fn data(&self) -> &DataConfig {
        &self.data
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn layers(&self) -> &[LayerConfig] {
        &self.layers
    }

    /// Converts the configured layers into layer descriptors
    pub fn layer_descriptors(&self) -> Vec<LayerDescriptor> {
        self.layers.iter().map(LayerConfig::to_descriptor).collect()
    }
}

/// Zoom behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Multiplier applied by one zoom-in step; zoom-out divides by it.
    zoom_step: f64,

    /// Smallest allowed scale factor, if any.
    min_scale_factor: Option<f64>,

    /// Largest allowed scale factor, if any.
    max_scale_factor: Option<f64>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_step: 1.1,
            min_scale_factor: None,
            max_scale_factor: None,
        }
    }
}

impl ViewportConfig {
    pub fn new(zoom_step: f64) -> Self {
        Self {
            zoom_step,
            ..Self::default()
        }
    }

    /// Limits the scale factor to `[min, max]`
    pub fn with_scale_extent(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_scale_factor = min;
        self.max_scale_factor = max;
        self
    }

    pub fn zoom_step(&self) -> f64 {
        self.zoom_step
    }

    pub fn min_scale_factor(&self) -> Option<f64> {
        self.min_scale_factor
    }

    pub fn max_scale_factor(&self) -> Option<f64> {
        self.max_scale_factor
    }

    /// Clamps a scale factor to the configured extent
    pub fn clamp_factor(&self, factor: f64) -> f64 {
        let factor = self.min_scale_factor.map_or(factor, |min| factor.max(min));
        self.max_scale_factor.map_or(factor, |max| factor.min(max))
    }

    /// Checks that the zoom step and extent are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::InvalidArgument`] if the zoom step or an
    /// extent bound is not a positive number, or if the extent is empty.
    pub fn validate(&self) -> Result<(), ChorographError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.zoom_step) {
            return Err(ChorographError::invalid_argument(format!(
                "zoom_step must be a positive number, got {}",
                self.zoom_step
            )));
        }
        for bound in [self.min_scale_factor, self.max_scale_factor].into_iter().flatten() {
            if !positive(bound) {
                return Err(ChorographError::invalid_argument(format!(
                    "scale factor bounds must be positive numbers, got {bound}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_scale_factor, self.max_scale_factor) {
            if min > max {
                return Err(ChorographError::invalid_argument(format!(
                    "min_scale_factor {min} exceeds max_scale_factor {max}"
                )));
            }
        }
        Ok(())
    }
}

/// How data records are keyed and joined to features.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Dot-separated path of the key inside each data record.
    key_field: String,

    /// Dot-separated path of the numeric value inside each data record.
    value_field: String,

    /// Feature field joined against the data key; `"id"` reads the feature id,
    /// anything else reads a feature property.
    geo_key_field: String,

    /// Fail on duplicate keys instead of keeping the last record.
    strict_keys: bool,

    /// Feature keys drawn with the selected style.
    selected: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            key_field: "id".to_string(),
            value_field: "value".to_string(),
            geo_key_field: "id".to_string(),
            strict_keys: false,
            selected: Vec::new(),
        }
    }
}

impl DataConfig {
    pub fn new(key_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            value_field: value_field.into(),
            ..Self::default()
        }
    }

    pub fn with_geo_key_field(mut self, field: impl Into<String>) -> Self {
        self.geo_key_field = field.into();
        self
    }

    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    /// Sets the keys of the selected features
    pub fn with_selected<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Returns the key accessor for [`DataConfig::key_field`]
    pub fn key_accessor(&self) -> KeyAccessor {
        KeyAccessor::field(self.key_field.clone())
    }

    pub fn value_field(&self) -> &str {
        &self.value_field
    }

    pub fn geo_key_field(&self) -> &str {
        &self.geo_key_field
    }

    pub fn strict_keys(&self) -> bool {
        self.strict_keys
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }
}

/// Visual styling for exported maps.
///
/// Colors are CSS color strings and are parsed when used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    background_color: Option<String>,

    /// Colors for the lowest and highest data value.
    color_range: [String; 2],

    /// Fill for features without a data value.
    missing_color: String,

    feature_stroke: String,
    feature_stroke_width: f64,

    mesh_stroke: String,
    mesh_stroke_width: f64,

    /// Radius of point features, in pixels.
    point_radius: f64,

    /// Fill of selected features; they keep their data color when unset.
    selected_fill: Option<String>,
    selected_stroke: String,
    selected_stroke_width: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            color_range: ["#fee8c8".to_string(), "#e34a33".to_string()],
            missing_color: "#cccccc".to_string(),
            feature_stroke: "#ffffff".to_string(),
            feature_stroke_width: 0.5,
            mesh_stroke: "#333333".to_string(),
            mesh_stroke_width: 1.0,
            point_radius: 2.0,
            selected_fill: None,
            selected_stroke: "#000000".to_string(),
            selected_stroke_width: 1.5,
        }
    }
}

impl StyleConfig {
    /// Sets the background color string
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Sets the colors of the lowest and highest data value
    pub fn with_color_range(mut self, low: impl Into<String>, high: impl Into<String>) -> Self {
        self.color_range = [low.into(), high.into()];
        self
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_deref()
            .map(Color::new)
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    /// Returns the parsed low and high colors of the value scale.
    ///
    /// # Errors
    ///
    /// Returns an error if either color string cannot be parsed.
    pub fn color_range(&self) -> Result<(Color, Color), String> {
        let [low, high] = &self.color_range;
        let parse = |color: &str| {
            Color::new(color).map_err(|err| format!("Invalid color range in config: {err}"))
        };
        Ok((parse(low)?, parse(high)?))
    }

    /// Returns the parsed fill of features without data.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn missing_color(&self) -> Result<Color, String> {
        Color::new(&self.missing_color).map_err(|err| format!("Invalid missing color in config: {err}"))
    }

    /// Returns the parsed feature outline color.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn feature_stroke(&self) -> Result<Color, String> {
        Color::new(&self.feature_stroke).map_err(|err| format!("Invalid feature stroke in config: {err}"))
    }

    pub fn feature_stroke_width(&self) -> f64 {
        self.feature_stroke_width
    }

    /// Returns the parsed mesh line color.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn mesh_stroke(&self) -> Result<Color, String> {
        Color::new(&self.mesh_stroke).map_err(|err| format!("Invalid mesh stroke in config: {err}"))
    }

    pub fn mesh_stroke_width(&self) -> f64 {
        self.mesh_stroke_width
    }

    pub fn point_radius(&self) -> f64 {
        self.point_radius
    }

    /// Sets the fill and outline of selected features
    pub fn with_selected_style(
        mut self,
        fill: Option<String>,
        stroke: impl Into<String>,
        stroke_width: f64,
    ) -> Self {
        self.selected_fill = fill;
        self.selected_stroke = stroke.into();
        self.selected_stroke_width = stroke_width;
        self
    }

    /// Returns the parsed fill of selected features, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn selected_fill(&self) -> Result<Option<Color>, String> {
        self.selected_fill
            .as_deref()
            .map(Color::new)
            .transpose()
            .map_err(|err| format!("Invalid selected fill in config: {err}"))
    }

    /// Returns the parsed outline color of selected features.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn selected_stroke(&self) -> Result<Color, String> {
        Color::new(&self.selected_stroke)
            .map_err(|err| format!("Invalid selected stroke in config: {err}"))
    }

    pub fn selected_stroke_width(&self) -> f64 {
        self.selected_stroke_width
    }
}

/// Style overrides for a single layer.
///
/// ```toml
/// [[layers]]
/// name = "land"
/// type = "feature"
///
/// [layers.style]
/// class_name = "land"
/// fill = "#e0e0e0"
/// stroke = "#999999"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayerStyleConfig {
    /// Extra CSS class of the layer group.
    class_name: Option<String>,

    /// Extra CSS class of selected features in this layer.
    selected_class_name: Option<String>,

    /// Fill of every feature, replacing the data color.
    fill: Option<String>,

    stroke: Option<String>,
    stroke_width: Option<f64>,
}

impl LayerStyleConfig {
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_selected_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.selected_class_name = Some(class_name.into());
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_stroke(mut self, stroke: impl Into<String>, width: Option<f64>) -> Self {
        self.stroke = Some(stroke.into());
        self.stroke_width = width;
        self
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn selected_class_name(&self) -> Option<&str> {
        self.selected_class_name.as_deref()
    }

    /// Returns the parsed fill override.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn fill(&self) -> Result<Option<Color>, String> {
        self.fill
            .as_deref()
            .map(Color::new)
            .transpose()
            .map_err(|err| format!("Invalid layer fill in config: {err}"))
    }

    /// Returns the parsed stroke override.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string cannot be parsed.
    pub fn stroke(&self) -> Result<Option<Color>, String> {
        self.stroke
            .as_deref()
            .map(Color::new)
            .transpose()
            .map_err(|err| format!("Invalid layer stroke in config: {err}"))
    }

    pub fn stroke_width(&self) -> Option<f64> {
        self.stroke_width
    }
}

/// Named boundary filter usable from configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterConfig {
    #[default]
    All,
    Interior,
    Exterior,
}

impl From<FilterConfig> for MeshFilter {
    fn from(filter: FilterConfig) -> Self {
        match filter {
            FilterConfig::All => MeshFilter::All,
            FilterConfig::Interior => MeshFilter::Interior,
            FilterConfig::Exterior => MeshFilter::Exterior,
        }
    }
}

/// One configured layer.
///
/// ```toml
/// [[layers]]
/// name = "borders"
/// object = "counties"
/// type = "mesh"
/// filter = "interior"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerConfig {
    name: String,

    /// Topology object decoded by this layer; defaults to the layer name.
    #[serde(default)]
    object: Option<String>,

    #[serde(rename = "type")]
    kind: LayerKind,

    #[serde(default)]
    filter: FilterConfig,

    #[serde(default = "default_visible")]
    visible: bool,

    #[serde(default)]
    style: LayerStyleConfig,
}

fn default_visible() -> bool {
    true
}

impl LayerConfig {
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            object: None,
            kind,
            filter: FilterConfig::All,
            visible: true,
            style: LayerStyleConfig::default(),
        }
    }

    pub fn with_style(mut self, style: LayerStyleConfig) -> Self {
        self.style = style;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &str {
        self.object.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn style(&self) -> &LayerStyleConfig {
        &self.style
    }

    pub fn to_descriptor(&self) -> LayerDescriptor {
        LayerDescriptor::new(self.name.clone(), self.object(), self.kind)
            .with_filter(self.filter.into())
            .with_visible(self.visible)
    }
}
