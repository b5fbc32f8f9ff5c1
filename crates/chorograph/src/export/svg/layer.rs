//! SVG rendering for map layers.

use log::{debug, trace};
use svg::node::element as svg_element;

use chorograph_core::feature::{Feature, Geometry};

use super::{LayerStyle, Svg, path::Outline};
use crate::{
    cache::LayerGeometry,
    color::{Color, ColorScale},
    layer::LayerDescriptor,
    state::RenderState,
    viewport::PathProjector,
};

impl Svg {
    /// Builds the color scale over every numeric value in the keyed data.
    pub(super) fn color_scale(&self, state: &RenderState) -> Option<ColorScale> {
        ColorScale::from_values(
            state.keyed_data().values(&self.value_field),
            self.palette.color_low,
            self.palette.color_high,
        )
    }

    /// Renders one layer into a group, or `None` if the layer is not cached.
    ///
    /// Selected features are drawn after the others so that their outline
    /// is not covered by a neighbor's.
    pub(super) fn render_layer(
        &self,
        state: &RenderState,
        layer: &LayerDescriptor,
        scale: Option<&ColorScale>,
    ) -> Option<svg_element::Group> {
        let Some(geometry) = state.cache().get(layer.kind(), layer.name()) else {
            debug!(layer = layer.name(); "Layer has no cached geometry, skipping");
            return None;
        };

        let default_style = LayerStyle::default();
        let style = self.layer_styles.get(layer.name()).unwrap_or(&default_style);

        let class = match &style.class_name {
            Some(class_name) => format!("layer {} {class_name}", layer.kind()),
            None => format!("layer {}", layer.kind()),
        };
        let group = svg_element::Group::new()
            .set("class", class)
            .set("data-layer", layer.name());

        let projector = state.projector();
        let group = match geometry {
            LayerGeometry::Feature(collection) => {
                let (selected, rest): (Vec<_>, Vec<_>) = collection
                    .features
                    .iter()
                    .map(|feature| {
                        let key = feature.key(&self.geo_key_field);
                        let is_selected = key.as_ref().is_some_and(|key| self.selected.contains(key));
                        (feature, key, is_selected)
                    })
                    .partition(|(_, _, is_selected)| *is_selected);

                rest.into_iter()
                    .chain(selected)
                    .filter_map(|(feature, key, is_selected)| {
                        self.render_feature(
                            state,
                            FeatureContext {
                                feature,
                                key,
                                selected: is_selected,
                                style,
                            },
                            projector,
                            scale,
                        )
                    })
                    .fold(group, |group, node| group.add(node))
            }
            LayerGeometry::Mesh(mesh) => match self.render_mesh(&mesh, style, projector) {
                Some(path) => group.add(path),
                None => group,
            },
        };
        Some(group)
    }

    fn render_feature(
        &self,
        state: &RenderState,
        context: FeatureContext<'_>,
        projector: &PathProjector,
        scale: Option<&ColorScale>,
    ) -> Option<svg_element::Group> {
        let FeatureContext {
            feature,
            key,
            selected,
            style,
        } = context;

        let outline = Outline::new(feature.geometry.as_ref()?, projector);
        if outline.is_empty() {
            return None;
        }

        let mut fill = style
            .fill
            .unwrap_or_else(|| self.feature_fill(state, key.as_deref(), scale));
        let mut stroke = style.stroke.unwrap_or(self.palette.feature_stroke);
        let mut stroke_width = style.stroke_width.unwrap_or(self.palette.feature_stroke_width);
        if selected {
            fill = self.palette.selected_fill.unwrap_or(fill);
            stroke = self.palette.selected_stroke;
            stroke_width = self.palette.selected_stroke_width;
        }
        trace!(key:?, selected, fill:%; "Rendering feature");

        let mut group = svg_element::Group::new();
        if selected {
            let class = match &style.selected_class_name {
                Some(class_name) => format!("selected {class_name}"),
                None => "selected".to_string(),
            };
            group = group.set("class", class);
        }
        if let Some(key) = key {
            group = group.set("data-key", key);
        }

        if !outline.data.is_empty() {
            group = group.add(
                svg_element::Path::new()
                    .set("d", outline.data)
                    .set("fill", fill)
                    .set("fill-rule", "evenodd")
                    .set("stroke", stroke)
                    .set("stroke-width", stroke_width),
            );
        }
        for point in outline.points {
            group = group.add(
                svg_element::Circle::new()
                    .set("cx", point.x())
                    .set("cy", point.y())
                    .set("r", self.palette.point_radius)
                    .set("fill", fill),
            );
        }
        Some(group)
    }

    fn feature_fill(&self, state: &RenderState, key: Option<&str>, scale: Option<&ColorScale>) -> Color {
        key.and_then(|key| state.keyed_data().value_of(key, &self.value_field))
            .zip(scale)
            .map(|(value, scale)| scale.color(value))
            .unwrap_or(self.palette.missing)
    }

    fn render_mesh(
        &self,
        mesh: &Geometry,
        style: &LayerStyle,
        projector: &PathProjector,
    ) -> Option<svg_element::Path> {
        let outline = Outline::new(mesh, projector);
        if outline.data.is_empty() {
            return None;
        }

        Some(
            svg_element::Path::new()
                .set("d", outline.data)
                .set("fill", "none")
                .set("stroke", style.stroke.unwrap_or(self.palette.mesh_stroke))
                .set(
                    "stroke-width",
                    style.stroke_width.unwrap_or(self.palette.mesh_stroke_width),
                )
                .set("stroke-linejoin", "round"),
        )
    }
}

/// A feature about to be rendered, with its join key and layer style.
struct FeatureContext<'a> {
    feature: &'a Feature,
    key: Option<String>,
    selected: bool,
    style: &'a LayerStyle,
}
