//! Viewport controller.
//!
//! The controller is the only owner of [`ViewportState`]. Gesture input
//! reaches it as immutable [`GestureEvent`]s; programmatic zooms are plain
//! method calls. Every mutator validates its input before touching any state,
//! so a rejected call leaves the controller exactly as it was.
//!
//! ```text
//!            Start / Tick                Tick
//!   Idle ───────────────────► Gesture ◄──────┐
//!    ▲                          │  └─────────┘
//!    └────────── End ───────────┘
//! ```
//!
//! `zoom_to`, `zoom_in`, `zoom_out` and `zoom_reset` complete synchronously
//! and do not change the phase.

use log::{debug, trace};

use chorograph_core::geometry::{Bounds, Point, Size};

use crate::{
    config::ViewportConfig,
    error::ChorographError,
    viewport::{PathProjector, ViewportState, calc_center_point, calc_scale, calc_translate},
};

/// Whether a pan/zoom gesture is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GesturePhase {
    #[default]
    Idle,
    Gesture,
}

/// One step of a pan/zoom gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTick {
    /// Multiplier applied to the current scale; must be positive
    pub scale_delta: f64,
    /// Offset added to the current translate, in screen pixels.
    ///
    /// For a zooming tick this is the offset that keeps the zoom anchor
    /// fixed; it is scaled down when the zoom extent clamps the scale.
    pub translate_delta: Point,
}

impl GestureTick {
    pub fn new(scale_delta: f64, translate_delta: Point) -> Self {
        Self {
            scale_delta,
            translate_delta,
        }
    }

    /// A pure pan
    pub fn pan(dx: f64, dy: f64) -> Self {
        Self::new(1.0, Point::new(dx, dy))
    }

    /// Returns the translate delta matching the scale multiplier actually
    /// applied.
    ///
    /// A zooming tick's delta is the offset of a zoom about some anchor `a`,
    /// `(a - t) * (1 - scale_delta)`. When the extent clamps the zoom to
    /// `applied`, the same anchor yields `(a - t) * (1 - applied)`, so the
    /// delta is rescaled by `(1 - applied) / (1 - scale_delta)`. Pure pans
    /// pass through unchanged.
    fn clamped_translate_delta(&self, applied: f64, clamped: bool) -> Point {
        if !clamped || self.scale_delta == 1.0 {
            return self.translate_delta;
        }
        self.translate_delta
            .scale((1.0 - applied) / (1.0 - self.scale_delta))
    }

    fn validate(&self) -> Result<(), ChorographError> {
        if !(self.scale_delta.is_finite() && self.scale_delta > 0.0) {
            return Err(ChorographError::invalid_argument(format!(
                "gesture scale delta must be a positive number, got {}",
                self.scale_delta
            )));
        }
        if !self.translate_delta.is_finite() {
            return Err(ChorographError::invalid_argument(
                "gesture translate delta must be finite",
            ));
        }
        Ok(())
    }
}

/// Input from a gesture source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Start,
    Tick(GestureTick),
    End,
}

/// Pan/zoom state machine over a [`ViewportState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    size: Size,
    bounds: Bounds,
    state: ViewportState,
    phase: GesturePhase,
    config: ViewportConfig,
}

impl ViewportController {
    /// Creates a controller with `bounds` fitted into a container of `size`.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::InvalidArgument`] for an unusable size or
    /// configuration and [`ChorographError::DegenerateBounds`] for bounds
    /// with zero width or height.
    pub fn new(size: Size, bounds: Bounds, config: ViewportConfig) -> Result<Self, ChorographError> {
        config.validate()?;
        let state = ViewportState::fit(size, bounds)?;
        Ok(Self {
            size,
            bounds,
            state,
            phase: GesturePhase::Idle,
            config,
        })
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn projector(&self) -> PathProjector {
        self.state.projector()
    }

    /// Replaces the zoom configuration without moving the view.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::InvalidArgument`] if the configuration is invalid.
    pub fn set_config(&mut self, config: ViewportConfig) -> Result<(), ChorographError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Fits new content bounds, discarding any pan and zoom.
    ///
    /// # Errors
    ///
    /// Same as [`ViewportController::new`].
    pub fn refit(&mut self, size: Size, bounds: Bounds) -> Result<(), ChorographError> {
        let state = ViewportState::fit(size, bounds)?;
        debug!(scale = state.scale(), translate:? = state.translate(); "Viewport refitted");
        self.size = size;
        self.bounds = bounds;
        self.state = state;
        Ok(())
    }

    /// Adapts to a new container size, keeping the zoom factor and the topology
    /// point shown at the container center.
    ///
    /// # Errors
    ///
    /// Same as [`ViewportController::new`].
    pub fn resize(&mut self, size: Size) -> Result<(), ChorographError> {
        let center = calc_center_point(self.size, self.state.scale(), self.state.translate());
        let scale_base = calc_scale(size, self.bounds)?;
        let scale = scale_base * self.state.scale_factor();
        let translate = calc_translate(size, scale, None, Some(center))?;

        debug!(scale_base, scale, center:?; "Viewport resized");
        self.size = size;
        self.state = ViewportState::new(scale, scale_base, translate);
        Ok(())
    }

    /// Zooms to `target_scale` about the container center.
    ///
    /// The target is clamped to the configured scale factor extent. The
    /// topology point at the container center stays there.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::InvalidArgument`] if `target_scale` is not a
    /// positive number.
    pub fn zoom_to(&mut self, target_scale: f64) -> Result<(), ChorographError> {
        if !(target_scale.is_finite() && target_scale > 0.0) {
            return Err(ChorographError::invalid_argument(format!(
                "zoom scale must be a positive number, got {target_scale}"
            )));
        }

        let scale = self.clamp_scale(target_scale);
        let center = calc_center_point(self.size, self.state.scale(), self.state.translate());
        let translate = calc_translate(self.size, scale, None, Some(center))?;

        debug!(target_scale, scale, center:?; "Zoomed to scale");
        self.state = ViewportState::new(scale, self.state.scale_base(), translate);
        Ok(())
    }

    /// Zooms in by one zoom step.
    ///
    /// # Errors
    ///
    /// Same as [`ViewportController::zoom_to`].
    pub fn zoom_in(&mut self) -> Result<(), ChorographError> {
        self.zoom_to(self.state.scale() * self.config.zoom_step())
    }

    /// Zooms out by one zoom step.
    ///
    /// # Errors
    ///
    /// Same as [`ViewportController::zoom_to`].
    pub fn zoom_out(&mut self) -> Result<(), ChorographError> {
        self.zoom_to(self.state.scale() / self.config.zoom_step())
    }

    /// Restores the fitted, centered view.
    ///
    /// # Errors
    ///
    /// Same as [`ViewportController::new`].
    pub fn zoom_reset(&mut self) -> Result<(), ChorographError> {
        let scale = self.state.scale_base();
        let translate = calc_translate(self.size, scale, Some(self.bounds), None)?;

        debug!(scale, translate:?; "Zoom reset");
        self.state = ViewportState::new(scale, scale, translate);
        Ok(())
    }

    /// Applies one gesture event.
    ///
    /// A tick received while idle starts a gesture implicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::InvalidArgument`] for a tick with a
    /// non-positive scale delta or a non-finite translate delta.
    pub fn handle(&mut self, event: GestureEvent) -> Result<(), ChorographError> {
        match event {
            GestureEvent::Start => self.phase = GesturePhase::Gesture,
            GestureEvent::End => self.phase = GesturePhase::Idle,
            GestureEvent::Tick(tick) => {
                tick.validate()?;

                let current = self.state.scale();
                let requested = current * tick.scale_delta;
                let scale = self.clamp_scale(requested);
                let translate = self
                    .state
                    .translate()
                    .add_point(tick.clamped_translate_delta(scale / current, scale != requested));

                trace!(scale, translate:?; "Gesture tick");
                self.phase = GesturePhase::Gesture;
                self.state = ViewportState::new(scale, self.state.scale_base(), translate);
            }
        }
        Ok(())
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        let base = self.state.scale_base();
        self.config.clamp_factor(scale / base) * base
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn controller_strategy() -> impl Strategy<Value = ViewportController> {
        (
            -500.0..500.0f64,
            -500.0..500.0f64,
            1.0..200.0f64,
            1.0..200.0f64,
            50.0..1500.0f64,
            50.0..1500.0f64,
        )
            .prop_map(|(x, y, w, h, width, height)| {
                ViewportController::new(
                    Size::new(width, height),
                    Bounds::new(x, y, x + w, y + h),
                    ViewportConfig::default(),
                )
                .unwrap()
            })
    }

    proptest! {
        #[test]
        fn zoom_round_trip_restores_fit(
            mut controller in controller_strategy(),
            factor in 0.05..40.0f64,
            dx in -300.0..300.0f64,
            dy in -300.0..300.0f64,
        ) {
            let fitted = *controller.state();

            controller.handle(GestureEvent::Tick(GestureTick::pan(dx, dy))).unwrap();
            controller.zoom_to(fitted.scale_base() * factor).unwrap();
            controller.zoom_reset().unwrap();

            let state = controller.state();
            prop_assert_eq!(state.scale(), state.scale_base());
            prop_assert_eq!(state.scale_factor(), 1.0);
            prop_assert!(approx_eq!(f64, state.translate().x(), fitted.translate().x(), epsilon = 1e-6));
            prop_assert!(approx_eq!(f64, state.translate().y(), fitted.translate().y(), epsilon = 1e-6));
        }

        #[test]
        fn clamped_gesture_zoom_keeps_anchor_on_screen(
            controller in controller_strategy(),
            max_factor in 1.0..4.0f64,
            scale_delta in 0.1..10.0f64,
            ax in 0.0..1.0f64,
            ay in 0.0..1.0f64,
        ) {
            prop_assume!((scale_delta - 1.0).abs() > 1e-3);

            let mut controller = controller;
            controller
                .set_config(ViewportConfig::default().with_scale_extent(Some(1.0), Some(max_factor)))
                .unwrap();

            let size = controller.size();
            let anchor = Point::new(ax * size.width(), ay * size.height());
            let state = *controller.state();
            let topology_anchor = anchor.sub_point(state.translate()).scale(1.0 / state.scale());
            let delta = anchor.sub_point(state.translate()).scale(1.0 - scale_delta);

            controller.handle(GestureEvent::Tick(GestureTick::new(scale_delta, delta))).unwrap();

            let factor = controller.state().scale_factor();
            prop_assert!(factor >= 1.0 - 1e-9 && factor <= max_factor + 1e-9);
            let after = controller.projector().project(topology_anchor);
            prop_assert!(approx_eq!(f64, after.x(), anchor.x(), epsilon = 1e-4));
            prop_assert!(approx_eq!(f64, after.y(), anchor.y(), epsilon = 1e-4));
        }

        #[test]
        fn zoom_to_keeps_center_point_on_screen(
            mut controller in controller_strategy(),
            factor in 0.05..40.0f64,
            dx in -300.0..300.0f64,
            dy in -300.0..300.0f64,
        ) {
            controller.handle(GestureEvent::Tick(GestureTick::pan(dx, dy))).unwrap();

            let size = controller.size();
            let center = calc_center_point(size, controller.state().scale(), controller.state().translate());
            let before = controller.projector().project(center);

            controller.zoom_to(controller.state().scale_base() * factor).unwrap();
            let after = controller.projector().project(center);

            prop_assert!(approx_eq!(f64, before.x(), after.x(), epsilon = 1e-6));
            prop_assert!(approx_eq!(f64, before.y(), after.y(), epsilon = 1e-6));
            prop_assert!(approx_eq!(f64, controller.state().scale_factor(), factor, epsilon = 1e-9));
        }
    }
}
