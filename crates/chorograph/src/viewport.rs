//! Viewport transform.
//!
//! The map is drawn through a single affine transform,
//! `screen = point * scale + translate`. This module holds that transform
//! ([`ViewportState`]), the projector derived from it ([`PathProjector`]) and
//! the arithmetic used to fit bounds into a container and to zoom about a
//! point.

use chorograph_core::{
    feature::Position,
    geometry::{Bounds, Point, Size},
};

use crate::error::ChorographError;

/// Scale and translate of the map at rest.
///
/// `scale == scale_base * scale_factor` holds after every recompute.
/// `scale_base` only depends on the container size and content bounds;
/// `scale_factor` only depends on user zoom (1.0 means fit to container).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    scale: f64,
    scale_base: f64,
    scale_factor: f64,
    translate: Point,
}

impl ViewportState {
    /// Fits `bounds` into a container of `size`, centered, at zoom factor 1.
    ///
    /// # Errors
    ///
    /// See [`calc_scale`].
    pub fn fit(size: Size, bounds: Bounds) -> Result<Self, ChorographError> {
        let scale = calc_scale(size, bounds)?;
        let translate = calc_translate(size, scale, Some(bounds), None)?;
        Ok(Self {
            scale,
            scale_base: scale,
            scale_factor: 1.0,
            translate,
        })
    }

    pub(crate) fn new(scale: f64, scale_base: f64, translate: Point) -> Self {
        Self {
            scale,
            scale_base,
            scale_factor: scale / scale_base,
            translate,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the scale at which the content bounds fit the container
    pub fn scale_base(&self) -> f64 {
        self.scale_base
    }

    /// Returns the user zoom relative to [`ViewportState::scale_base`]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    /// Derives the projector for this transform
    pub fn projector(&self) -> PathProjector {
        PathProjector::new(self.scale, self.translate)
    }
}

/// Maps topology coordinates to screen coordinates for rendering.
///
/// Besides the affine transform, the projector decides which presimplified
/// positions are visible at the current scale: a position is emitted only if
/// its effective area `z` is at least `1 / scale²`, that is, if it spans at
/// least one square pixel on screen. Zooming in therefore restores detail
/// that zooming out removed.
///
/// # Examples
///
/// ```
/// # use chorograph::viewport::PathProjector;
/// # use chorograph_core::{feature::Position, geometry::Point};
/// let projector = PathProjector::new(10.0, Point::new(5.0, 0.0));
///
/// let screen = projector.project(Point::new(1.0, 2.0));
/// assert_eq!(screen, Point::new(15.0, 20.0));
///
/// // 0.001 < 1 / 10², so the position is culled
/// assert!(projector.project_position(&Position::with_area(1.0, 2.0, 0.001)).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjector {
    scale: f64,
    translate: Point,
    min_area: f64,
}

impl PathProjector {
    pub fn new(scale: f64, translate: Point) -> Self {
        Self {
            scale,
            translate,
            min_area: 1.0 / scale / scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    /// Returns the smallest effective area that is still visible
    pub fn min_area(&self) -> f64 {
        self.min_area
    }

    /// Maps a topology point to screen space
    pub fn project(&self, point: Point) -> Point {
        point.scale(self.scale).add_point(self.translate)
    }

    /// Returns true if a position with effective area `z` is drawn at this scale
    pub fn is_visible(&self, z: f64) -> bool {
        z >= self.min_area
    }

    /// Projects a position, or returns `None` if it is culled at this scale
    pub fn project_position(&self, position: &Position) -> Option<Point> {
        self.is_visible(position.z)
            .then(|| self.project(position.point()))
    }

    /// Maps a screen point back to topology space
    pub fn invert(&self, screen: Point) -> Point {
        screen.sub_point(self.translate).scale(1.0 / self.scale)
    }
}

/// Returns the largest scale at which `bounds` fit inside a container of `size`.
///
/// # Errors
///
/// Returns [`ChorographError::InvalidArgument`] if `size` is not strictly
/// positive and [`ChorographError::DegenerateBounds`] if `bounds` have zero
/// width or height.
///
/// # Examples
///
/// ```
/// # use chorograph::viewport::calc_scale;
/// # use chorograph_core::geometry::{Bounds, Size};
/// let scale = calc_scale(Size::new(300.0, 150.0), Bounds::new(0.0, 0.0, 10.0, 10.0)).unwrap();
/// assert_eq!(scale, 15.0);
/// ```
pub fn calc_scale(size: Size, bounds: Bounds) -> Result<f64, ChorographError> {
    if !size.is_positive() {
        return Err(ChorographError::invalid_argument(format!(
            "container size must be positive, got {}x{}",
            size.width(),
            size.height()
        )));
    }
    if bounds.is_degenerate() || !bounds.width().is_finite() || !bounds.height().is_finite() {
        return Err(ChorographError::degenerate_bounds(bounds));
    }

    Ok((size.width() / bounds.width()).min(size.height() / bounds.height()))
}

/// Computes the translate for a container of `size` at `scale`.
///
/// Exactly one of `bounds` and `center` must be given:
/// - with `bounds`, the scaled bounds are centered in the container;
/// - with `center`, the topology point `center` is placed at the container
///   center, which keeps it fixed on screen across a zoom when it was
///   obtained from [`calc_center_point`].
///
/// # Errors
///
/// Returns [`ChorographError::InvalidArgument`] if both or neither of
/// `bounds` and `center` are given, or if `scale` is not a positive number.
pub fn calc_translate(
    size: Size,
    scale: f64,
    bounds: Option<Bounds>,
    center: Option<Point>,
) -> Result<Point, ChorographError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ChorographError::invalid_argument(format!(
            "scale must be a positive number, got {scale}"
        )));
    }

    match (bounds, center) {
        (Some(bounds), None) => Ok(Point::new(
            (size.width() - scale * (bounds.min_x() + bounds.max_x())) / 2.0,
            (size.height() - scale * (bounds.min_y() + bounds.max_y())) / 2.0,
        )),
        (None, Some(center)) => Ok(size.center().sub_point(center.scale(scale))),
        (Some(_), Some(_)) => Err(ChorographError::invalid_argument(
            "calc_translate takes either bounds or a center point, not both",
        )),
        (None, None) => Err(ChorographError::invalid_argument(
            "calc_translate requires bounds or a center point",
        )),
    }
}

/// Returns the topology point currently shown at the center of the container
pub fn calc_center_point(size: Size, scale: f64, translate: Point) -> Point {
    size.center().sub_point(translate).scale(1.0 / scale)
}
