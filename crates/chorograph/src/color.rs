//! Colors and the value color scale.
//!
//! [`Color`] wraps `DynamicColor` from the color crate so that CSS color
//! strings from configuration can be parsed once and written into SVG
//! attributes. [`ColorScale`] maps data values onto a gradient between two
//! colors.

use std::str::FromStr;

use color::{ColorSpaceTag, DynamicColor, HueDirection};

/// A parsed CSS color.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Parses a CSS color string such as `"#ff0000"`, `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chorograph::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Returns the color between `self` (`t = 0`) and `other` (`t = 1`),
    /// interpolated in Oklab.
    pub fn mix(self, other: Color, t: f32) -> Self {
        let color = self
            .color
            .interpolate(other.color, ColorSpaceTag::Oklab, HueDirection::default())
            .eval(t.clamp(0.0, 1.0));
        Self { color }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl From<Color> for svg::node::Value {
    fn from(color: Color) -> Self {
        Self::from(color.to_string())
    }
}

/// Linear mapping from a numeric domain to a color gradient.
///
/// Values outside the domain are clamped to the end colors. A domain with no
/// extent maps every value to the low color.
///
/// # Examples
///
/// ```
/// use chorograph::color::{Color, ColorScale};
///
/// let low = Color::new("white").unwrap();
/// let high = Color::new("black").unwrap();
/// let scale = ColorScale::new((0.0, 10.0), low, high);
///
/// assert_eq!(scale.color(-5.0), low);
/// assert_eq!(scale.color(10.0), high);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    domain: (f64, f64),
    low: Color,
    high: Color,
}

impl ColorScale {
    pub fn new(domain: (f64, f64), low: Color, high: Color) -> Self {
        Self { domain, low, high }
    }

    /// Builds a scale whose domain spans `values`, or `None` if there are none
    pub fn from_values(
        values: impl IntoIterator<Item = f64>,
        low: Color,
        high: Color,
    ) -> Option<Self> {
        let domain = values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |domain: Option<(f64, f64)>, value| match domain {
                Some((min, max)) => Some((min.min(value), max.max(value))),
                None => Some((value, value)),
            })?;
        Some(Self::new(domain, low, high))
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Returns the color for `value`
    pub fn color(&self, value: f64) -> Color {
        let (min, max) = self.domain;
        let extent = max - min;
        if !(extent > 0.0) {
            return self.low;
        }

        let t = ((value - min) / extent).clamp(0.0, 1.0);
        if t <= 0.0 {
            self.low
        } else if t >= 1.0 {
            self.high
        } else {
            self.low.mix(self.high, t as f32)
        }
    }
}
