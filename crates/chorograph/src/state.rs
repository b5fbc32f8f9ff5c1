//! Choropleth state machine.
//!
//! A [`Choropleth`] holds the current inputs ([`ChoroplethProps`]) and the
//! render-ready state derived from them ([`RenderState`]). Updating the
//! inputs runs three steps:
//!
//! 1. [`diff`] compares old and new inputs and names what changed as
//!    [`ChangeReason`]s. Topology, layers and data are compared by identity
//!    (`Arc::ptr_eq`); dimensions by value.
//! 2. [`reduce`] computes a new [`RenderState`] from the previous one and the
//!    reasons, without mutating anything.
//! 3. The new state replaces the old one in a single `Arc` swap.
//!
//! If step 2 fails the previous state stays in place, so readers never see
//! a partially updated state.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use chorograph_core::{
    geometry::{Bounds, Size},
    simplify::{SimplifiedTopology, presimplify},
    topology::Topology,
};

use crate::{
    bounds::compute_bounds,
    cache::GeometryCache,
    config::ViewportConfig,
    controller::{GestureEvent, ViewportController},
    error::ChorographError,
    extract::{extract, pending_layers},
    keyed::{KeyAccessor, KeyedData},
    layer::LayerDescriptor,
    viewport::{PathProjector, ViewportState},
};

/// Inputs of a choropleth map.
#[derive(Debug, Clone)]
pub struct ChoroplethProps {
    pub topology: Arc<Topology>,
    pub layers: Arc<Vec<LayerDescriptor>>,
    pub size: Size,
    pub data: Arc<Vec<Value>>,
    pub key_accessor: KeyAccessor,
    pub strict_keys: bool,
    pub viewport: ViewportConfig,
}

impl ChoroplethProps {
    pub fn new(topology: Arc<Topology>, layers: Vec<LayerDescriptor>, size: Size) -> Self {
        Self {
            topology,
            layers: Arc::new(layers),
            size,
            data: Arc::new(Vec::new()),
            key_accessor: KeyAccessor::field("id"),
            strict_keys: false,
            viewport: ViewportConfig::default(),
        }
    }

    /// Sets the data records and how they are keyed
    pub fn with_data(mut self, data: Arc<Vec<Value>>, key_accessor: KeyAccessor) -> Self {
        self.data = data;
        self.key_accessor = key_accessor;
        self
    }

    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }
}

/// An input that changed between two sets of props.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    TopologyChanged,
    LayersChanged,
    DimensionsChanged,
    DataChanged,
}

/// Names the inputs that differ between `previous` and `next`
pub fn diff(previous: &ChoroplethProps, next: &ChoroplethProps) -> Vec<ChangeReason> {
    let mut reasons = Vec::new();
    if !Arc::ptr_eq(&previous.topology, &next.topology) {
        reasons.push(ChangeReason::TopologyChanged);
    }
    if !Arc::ptr_eq(&previous.layers, &next.layers) {
        reasons.push(ChangeReason::LayersChanged);
    }
    if previous.size != next.size {
        reasons.push(ChangeReason::DimensionsChanged);
    }
    if !Arc::ptr_eq(&previous.data, &next.data) {
        reasons.push(ChangeReason::DataChanged);
    }
    reasons
}

/// Everything a renderer needs to draw the map.
#[derive(Debug, Clone)]
pub struct RenderState {
    topology: Arc<SimplifiedTopology>,
    cache: Arc<GeometryCache>,
    bounds: Bounds,
    viewport: ViewportController,
    projector: PathProjector,
    keyed_data: Arc<KeyedData>,
}

impl RenderState {
    /// Builds the first state for `props`.
    ///
    /// # Errors
    ///
    /// Fails like [`reduce`] would with every change reason set.
    pub fn initial(props: &ChoroplethProps) -> Result<Self, ChorographError> {
        let topology = Arc::new(presimplify(&props.topology));
        let cache = GeometryCache::new().merge(extract(&topology, props.layers.iter())?);
        let bounds = compute_bounds(&cache.visible_geometries(&props.layers))?;
        let viewport = ViewportController::new(props.size, bounds, props.viewport.clone())?;
        let keyed_data = KeyedData::key_by(&props.data, &props.key_accessor, props.strict_keys)?;

        info!(
            layers = cache.len(),
            bounds:? = bounds.to_array(),
            scale = viewport.state().scale();
            "Initial render state built"
        );

        Ok(Self {
            topology,
            cache: Arc::new(cache),
            bounds,
            projector: viewport.projector(),
            viewport,
            keyed_data: Arc::new(keyed_data),
        })
    }

    /// Returns the presimplified topology geometry is decoded from
    pub fn topology(&self) -> &Arc<SimplifiedTopology> {
        &self.topology
    }

    pub fn cache(&self) -> &Arc<GeometryCache> {
        &self.cache
    }

    /// Returns the bounds of the visible layers, in topology coordinates
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_state(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn scale(&self) -> f64 {
        self.viewport.state().scale()
    }

    pub fn scale_base(&self) -> f64 {
        self.viewport.state().scale_base()
    }

    pub fn scale_factor(&self) -> f64 {
        self.viewport.state().scale_factor()
    }

    pub fn projector(&self) -> &PathProjector {
        &self.projector
    }

    pub fn keyed_data(&self) -> &Arc<KeyedData> {
        &self.keyed_data
    }

    fn with_viewport(&self, viewport: ViewportController) -> Self {
        Self {
            projector: viewport.projector(),
            viewport,
            ..self.clone()
        }
    }
}

/// Computes the state that follows `state` when `props` changed for `reasons`.
///
/// - A topology change presimplifies the new topology and starts from an empty
///   cache; a layer change keeps the cache. Either way, visible layers that
///   are not cached (and every visible mesh layer) are extracted and merged
///   in, and bounds are recomputed over the visible layers.
/// - A dimension change, or bounds that moved, recompute the base scale. New
///   bounds reset the view to a centered fit; a resize alone keeps the zoom
///   factor and the point at the container center.
/// - A data change rebuilds the keyed data.
///
/// # Errors
///
/// Returns [`ChorographError::NoGeometry`] when no visible layer has
/// coordinates, and any extraction, scale or keying error. `state` is never
/// modified.
pub fn reduce(
    state: &RenderState,
    props: &ChoroplethProps,
    reasons: &[ChangeReason],
) -> Result<RenderState, ChorographError> {
    let mut next = state.clone();
    let mut bounds_changed = false;

    let topology_changed = reasons.contains(&ChangeReason::TopologyChanged);
    if topology_changed || reasons.contains(&ChangeReason::LayersChanged) {
        let (topology, cache) = if topology_changed {
            (Arc::new(presimplify(&props.topology)), Arc::new(GeometryCache::new()))
        } else {
            (Arc::clone(&state.topology), Arc::clone(&state.cache))
        };

        let pending = pending_layers(&cache, &props.layers);
        debug!(
            topology_changed,
            pending:? = pending.iter().map(|layer| layer.name()).collect::<Vec<_>>();
            "Updating geometry cache"
        );

        let cache = if pending.is_empty() {
            cache
        } else {
            Arc::new(cache.merge(extract(&topology, pending)?))
        };

        let bounds = compute_bounds(&cache.visible_geometries(&props.layers))?;
        bounds_changed = bounds != state.bounds;

        next.topology = topology;
        next.cache = cache;
        next.bounds = bounds;
    }

    next.viewport.set_config(props.viewport.clone())?;
    if bounds_changed {
        next.viewport.refit(props.size, next.bounds)?;
    } else if reasons.contains(&ChangeReason::DimensionsChanged) {
        next.viewport.resize(props.size)?;
    }
    next.projector = next.viewport.projector();

    if reasons.contains(&ChangeReason::DataChanged) {
        next.keyed_data = Arc::new(KeyedData::key_by(
            &props.data,
            &props.key_accessor,
            props.strict_keys,
        )?);
    }

    Ok(next)
}

/// Called with the new viewport after every viewport change.
pub type ViewportHandler = Box<dyn Fn(&ViewportState) + Send + Sync>;

/// A choropleth map: current inputs plus the state derived from them.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use chorograph::{Choropleth, ChoroplethProps, layer::LayerDescriptor};
/// # use chorograph_core::{geometry::Size, topology::Topology};
/// let topology = Arc::new(Topology::from_json(r#"{
///     "type": "Topology",
///     "objects": {"land": {"type": "Polygon", "arcs": [[0]]}},
///     "arcs": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
/// }"#).unwrap());
///
/// let props = ChoroplethProps::new(
///     topology,
///     vec![LayerDescriptor::feature("land", "land")],
///     Size::new(300.0, 300.0),
/// );
///
/// let mut map = Choropleth::new(props).unwrap();
/// assert_eq!(map.render_state().scale(), 30.0);
///
/// map.zoom_to(60.0).unwrap();
/// assert_eq!(map.render_state().scale_factor(), 2.0);
/// ```
pub struct Choropleth {
    props: ChoroplethProps,
    state: Arc<RenderState>,
    on_viewport_change: Option<ViewportHandler>,
}

impl std::fmt::Debug for Choropleth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Choropleth")
            .field("props", &self.props)
            .field("state", &self.state)
            .field("on_viewport_change", &self.on_viewport_change.is_some())
            .finish()
    }
}

impl Choropleth {
    /// Builds a map from its initial inputs.
    ///
    /// # Errors
    ///
    /// See [`RenderState::initial`].
    pub fn new(props: ChoroplethProps) -> Result<Self, ChorographError> {
        let state = RenderState::initial(&props)?;
        Ok(Self {
            props,
            state: Arc::new(state),
            on_viewport_change: None,
        })
    }

    /// Registers a handler called after every viewport change
    pub fn with_viewport_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ViewportState) + Send + Sync + 'static,
    {
        self.on_viewport_change = Some(Box::new(handler));
        self
    }

    pub fn props(&self) -> &ChoroplethProps {
        &self.props
    }

    /// Returns a snapshot of the current render state
    pub fn render_state(&self) -> Arc<RenderState> {
        Arc::clone(&self.state)
    }

    /// Replaces the inputs and recomputes what they affect.
    ///
    /// Returns the reasons that triggered recomputation; an empty list means
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// See [`reduce`]. On error both the inputs and the render state keep
    /// their previous values.
    pub fn update(&mut self, props: ChoroplethProps) -> Result<Vec<ChangeReason>, ChorographError> {
        let reasons = diff(&self.props, &props);
        if reasons.is_empty() {
            return Ok(reasons);
        }

        let next = reduce(&self.state, &props, &reasons)?;
        let viewport_changed = next.viewport_state() != self.state.viewport_state();

        info!(reasons:?; "Render state updated");
        self.props = props;
        self.state = Arc::new(next);
        if viewport_changed {
            self.notify_viewport();
        }
        Ok(reasons)
    }

    /// Applies a gesture event.
    ///
    /// # Errors
    ///
    /// See [`ViewportController::handle`].
    pub fn handle_gesture(&mut self, event: GestureEvent) -> Result<(), ChorographError> {
        self.apply_viewport(|viewport| viewport.handle(event))
    }

    /// Zooms to `scale` about the container center.
    ///
    /// # Errors
    ///
    /// See [`ViewportController::zoom_to`].
    pub fn zoom_to(&mut self, scale: f64) -> Result<(), ChorographError> {
        self.apply_viewport(|viewport| viewport.zoom_to(scale))
    }

    /// Zooms in by one zoom step.
    ///
    /// # Errors
    ///
    /// See [`ViewportController::zoom_to`].
    pub fn zoom_in(&mut self) -> Result<(), ChorographError> {
        self.apply_viewport(ViewportController::zoom_in)
    }

    /// Zooms out by one zoom step.
    ///
    /// # Errors
    ///
    /// See [`ViewportController::zoom_to`].
    pub fn zoom_out(&mut self) -> Result<(), ChorographError> {
        self.apply_viewport(ViewportController::zoom_out)
    }

    /// Restores the fitted, centered view.
    ///
    /// # Errors
    ///
    /// See [`ViewportController::zoom_reset`].
    pub fn zoom_reset(&mut self) -> Result<(), ChorographError> {
        self.apply_viewport(ViewportController::zoom_reset)
    }

    fn apply_viewport(
        &mut self,
        change: impl FnOnce(&mut ViewportController) -> Result<(), ChorographError>,
    ) -> Result<(), ChorographError> {
        let mut viewport = self.state.viewport().clone();
        change(&mut viewport)?;
        self.state = Arc::new(self.state.with_viewport(viewport));
        self.notify_viewport();
        Ok(())
    }

    fn notify_viewport(&self) {
        if let Some(handler) = &self.on_viewport_change {
            handler(self.state.viewport_state());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chorograph_core::geometry::Point;
    use serde_json::json;

    use super::*;

    fn topology() -> Arc<Topology> {
        Arc::new(
            Topology::from_value(json!({
                "type": "Topology",
                "objects": {
                    "left": {"type": "Polygon", "arcs": [[0]], "id": "l"},
                    "right": {"type": "Polygon", "arcs": [[1]], "id": "r"},
                    "dot": {"type": "Point", "coordinates": [3, 3]}
                },
                "arcs": [
                    [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                    [[10, 0], [20, 0], [20, 10], [10, 10], [10, 0]]
                ]
            }))
            .unwrap(),
        )
    }

    fn props(layers: Vec<LayerDescriptor>) -> ChoroplethProps {
        ChoroplethProps::new(topology(), layers, Size::new(300.0, 300.0))
    }

    #[test]
    fn test_diff() {
        let a = props(vec![LayerDescriptor::feature("left", "left")]);

        let mut b = a.clone();
        assert!(diff(&a, &b).is_empty());

        b.size = Size::new(1.0, 1.0);
        b.layers = Arc::new((*a.layers).clone());
        b.data = Arc::new(vec![json!({})]);
        assert_eq!(
            diff(&a, &b),
            vec![
                ChangeReason::LayersChanged,
                ChangeReason::DimensionsChanged,
                ChangeReason::DataChanged
            ]
        );

        // Equal contents, new value: still a new topology.
        b.topology = Arc::new((*a.topology).clone());
        assert_eq!(diff(&a, &b)[0], ChangeReason::TopologyChanged);
    }

    #[test]
    fn test_layer_change_refits_to_new_bounds() {
        let mut map = Choropleth::new(props(vec![LayerDescriptor::feature("left", "left")])).unwrap();
        map.zoom_to(90.0).unwrap();

        let mut next = map.props().clone();
        next.layers = Arc::new(vec![
            LayerDescriptor::feature("left", "left"),
            LayerDescriptor::feature("right", "right"),
        ]);
        map.update(next).unwrap();

        let state = map.render_state();
        assert_eq!(state.bounds().to_array(), [[0.0, 0.0], [20.0, 10.0]]);
        assert_eq!(state.scale(), 15.0);
        assert_eq!(state.scale_factor(), 1.0);
        assert_eq!(state.viewport_state().translate(), Point::new(0.0, 75.0));
    }

    #[test]
    fn test_hiding_a_layer_keeps_its_cache_entry() {
        let mut map = Choropleth::new(props(vec![
            LayerDescriptor::feature("left", "left"),
            LayerDescriptor::feature("right", "right"),
        ]))
        .unwrap();

        let mut next = map.props().clone();
        next.layers = Arc::new(vec![
            LayerDescriptor::feature("left", "left"),
            LayerDescriptor::feature("right", "right").with_visible(false),
        ]);
        map.update(next).unwrap();

        let state = map.render_state();
        assert!(state.cache().feature("right").is_some());
        assert_eq!(state.bounds().to_array(), [[0.0, 0.0], [10.0, 10.0]]);
    }

    #[test]
    fn test_topology_change_clears_cache() {
        let mut map = Choropleth::new(props(vec![
            LayerDescriptor::feature("left", "left"),
            LayerDescriptor::feature("right", "right"),
        ]))
        .unwrap();
        let old_topology = Arc::clone(map.render_state().topology());

        let mut next = map.props().clone();
        next.topology = topology();
        next.layers = Arc::new(vec![LayerDescriptor::feature("left", "left")]);
        map.update(next).unwrap();

        let state = map.render_state();
        assert!(!Arc::ptr_eq(state.topology(), &old_topology));
        assert!(state.topology().is_derived_from(&map.props().topology));
        assert!(state.cache().feature("right").is_none());
        assert_eq!(state.cache().len(), 1);
    }

    #[test]
    fn test_same_topology_is_not_presimplified_again() {
        let mut map = Choropleth::new(props(vec![LayerDescriptor::feature("left", "left")])).unwrap();
        let simplified = Arc::clone(map.render_state().topology());

        let mut next = map.props().clone();
        next.layers = Arc::new(vec![
            LayerDescriptor::feature("left", "left"),
            LayerDescriptor::mesh("edges", "right"),
        ]);
        assert_eq!(map.update(next).unwrap(), vec![ChangeReason::LayersChanged]);
        assert!(Arc::ptr_eq(map.render_state().topology(), &simplified));

        let mut next = map.props().clone();
        next.size = Size::new(500.0, 200.0);
        assert_eq!(map.update(next).unwrap(), vec![ChangeReason::DimensionsChanged]);
        assert!(Arc::ptr_eq(map.render_state().topology(), &simplified));

        map.zoom_in().unwrap();
        assert!(Arc::ptr_eq(map.render_state().topology(), &simplified));
    }

    #[test]
    fn test_resize_keeps_zoom_factor() {
        let mut map = Choropleth::new(props(vec![LayerDescriptor::feature("left", "left")])).unwrap();
        map.zoom_to(60.0).unwrap();

        let mut next = map.props().clone();
        next.size = Size::new(600.0, 600.0);
        let reasons = map.update(next).unwrap();

        assert_eq!(reasons, vec![ChangeReason::DimensionsChanged]);
        let state = map.render_state();
        assert_eq!(state.scale_base(), 60.0);
        assert_eq!(state.scale(), 120.0);
        assert_eq!(state.scale_factor(), 2.0);
    }

    #[test]
    fn test_data_change_rebuilds_keyed_data() {
        let mut map = Choropleth::new(props(vec![LayerDescriptor::feature("left", "left")])).unwrap();
        assert!(map.render_state().keyed_data().is_empty());

        let next = map
            .props()
            .clone()
            .with_data(Arc::new(vec![json!({"id": "l", "value": 4})]), KeyAccessor::field("id"));
        let reasons = map.update(next).unwrap();

        assert_eq!(reasons, vec![ChangeReason::DataChanged]);
        assert_eq!(map.render_state().keyed_data().value_of("l", "value"), Some(4.0));
    }

    #[test]
    fn test_failed_update_keeps_previous_state() {
        let mut map = Choropleth::new(props(vec![LayerDescriptor::feature("left", "left")])).unwrap();
        let before = map.render_state();

        let mut next = map.props().clone();
        next.layers = Arc::new(vec![LayerDescriptor::feature("ghost", "missing")]);
        assert!(map.update(next).is_err());

        let mut degenerate = map.props().clone();
        degenerate.layers = Arc::new(vec![LayerDescriptor::feature("dot", "dot")]);
        assert!(matches!(
            map.update(degenerate),
            Err(ChorographError::DegenerateBounds { .. })
        ));

        assert!(Arc::ptr_eq(&map.render_state(), &before));
        assert_eq!(map.props().layers.len(), 1);
    }

    #[test]
    fn test_viewport_handler_sees_every_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut map = Choropleth::new(props(vec![LayerDescriptor::feature("left", "left")]))
            .unwrap()
            .with_viewport_handler(move |state| sink.lock().unwrap().push(state.scale()));

        map.zoom_in().unwrap();
        map.zoom_reset().unwrap();
        assert!(map.zoom_to(-1.0).is_err());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], 30.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn topology() -> Arc<Topology> {
        Arc::new(
            Topology::from_value(json!({
                "type": "Topology",
                "objects": {
                    "left": {"type": "Polygon", "arcs": [[0]]},
                    "right": {"type": "Polygon", "arcs": [[1]]}
                },
                "arcs": [
                    [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                    [[10, 0], [20, 5], [20, 10], [10, 10], [10, 0]]
                ]
            }))
            .unwrap(),
        )
    }

    /// 0: absent, 1: hidden, 2: visible
    fn layer_list(left: u8, right: u8, edges: u8) -> Vec<LayerDescriptor> {
        [
            (left, LayerDescriptor::feature("left", "left")),
            (right, LayerDescriptor::feature("right", "right")),
            (edges, LayerDescriptor::mesh("edges", "right")),
        ]
        .into_iter()
        .filter(|(state, _)| *state > 0)
        .map(|(state, layer)| layer.with_visible(state == 2))
        .collect()
    }

    proptest! {
        #[test]
        fn cached_layers_survive_layer_changes(
            steps in prop::collection::vec((0..3u8, 0..3u8, 0..3u8), 1..8),
        ) {
            let mut map = Choropleth::new(ChoroplethProps::new(
                topology(),
                vec![LayerDescriptor::feature("left", "left")],
                Size::new(300.0, 300.0),
            ))
            .unwrap();

            for (left, right, edges) in steps {
                let before = map.render_state();
                let layers = layer_list(left, right, edges);
                let mesh_visible = edges == 2;

                let mut next = map.props().clone();
                next.layers = Arc::new(layers);

                if map.update(next).is_err() {
                    // Nothing visible: the previous state stays in place
                    prop_assert!(Arc::ptr_eq(&map.render_state(), &before));
                    continue;
                }

                let after = map.render_state();
                for (name, collection) in before.cache().features() {
                    let cached = after.cache().feature(name);
                    prop_assert!(cached.is_some_and(|cached| Arc::ptr_eq(cached, collection)));
                }
                for (name, mesh) in before.cache().meshes() {
                    let cached = after.cache().mesh(name);
                    prop_assert!(cached.is_some());
                    if !mesh_visible {
                        prop_assert!(cached.is_some_and(|cached| Arc::ptr_eq(cached, mesh)));
                    }
                }
            }
        }
    }
}
