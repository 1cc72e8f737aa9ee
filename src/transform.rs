//! Pixel <-> graph coordinate transformation
//!
//! This module implements the mapping between pixel positions on the chart
//! image and graph-space values, for linear and logarithmic axes.
//!
//! Logarithmic axes interpolate in exponent space: axis bounds are base-10
//! exponents and the interpolated value is an exponent `e`. Whether a caller
//! stores `e` or `10^e` is their choice, see [`LogRepresentation`].
//!
//! Pixel Y grows downward while graph Y grows upward, so the Y axis is
//! inverted on both directions of the mapping.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibration::{AxisRange, CalibrationRegion};
use crate::config::ScaleKind;

/// Floor applied before taking `log10`, and to near-zero axis spans
pub const LOG_EPSILON: f64 = 1e-12;

/// Errors from mapping a coordinate through a calibration region
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("invalid calibration region: {reason}")]
    InvalidRegion { reason: String },
    #[error("non-finite {what}: {value}")]
    NonFiniteInput { what: &'static str, value: f64 },
    #[error("{what} of 10^{exponent} underflows to zero")]
    Underflow { what: &'static str, exponent: f64 },
}

impl TransformError {
    pub(crate) fn invalid_region(reason: impl Into<String>) -> Self {
        Self::InvalidRegion {
            reason: reason.into(),
        }
    }
}

fn finite(what: &'static str, value: f64) -> Result<f64, TransformError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TransformError::NonFiniteInput { what, value })
    }
}

/// How a value on a logarithmic axis is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRepresentation {
    /// The base-10 exponent (`2.0` for 100)
    Exponent,
    /// The value itself (`100.0`)
    #[default]
    Actual,
}

impl LogRepresentation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogRepresentation::Exponent => "exponent",
            LogRepresentation::Actual => "actual",
        }
    }

    /// Convert an exponent into this representation
    pub fn from_exponent(&self, exponent: f64) -> f64 {
        match self {
            LogRepresentation::Exponent => exponent,
            LogRepresentation::Actual => to_actual_value(exponent),
        }
    }

    /// Convert a value in this representation into an exponent
    pub fn to_exponent(&self, value: f64) -> f64 {
        match self {
            LogRepresentation::Exponent => value,
            LogRepresentation::Actual => to_exponent(value),
        }
    }

    /// Guess how previously stored log-axis values were written
    ///
    /// Values that are absent, non-positive, or all within half a decade of
    /// the configured exponent bounds are taken to be exponents.
    pub fn infer(values: &[f64], axis_min: f64, axis_max: f64) -> Self {
        if values.is_empty() || values.iter().any(|&v| v <= 0.0) {
            return LogRepresentation::Exponent;
        }

        if axis_min.is_finite() && axis_max.is_finite() {
            let (lo, hi) = if axis_min <= axis_max {
                (axis_min, axis_max)
            } else {
                (axis_max, axis_min)
            };
            if values.iter().all(|&v| v >= lo - 0.5 && v <= hi + 0.5) {
                return LogRepresentation::Exponent;
            }
        }

        LogRepresentation::Actual
    }
}

/// `log10(value)`, with values at or below zero floored to [`LOG_EPSILON`]
pub fn to_exponent(value: f64) -> f64 {
    value.max(LOG_EPSILON).log10()
}

/// `10^exponent`
pub fn to_actual_value(exponent: f64) -> f64 {
    10f64.powf(exponent)
}

/// A position in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A graph-space value pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: f64,
    pub y: f64,
}

impl GraphPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Result of a pixel -> graph mapping
///
/// Holds the interpolated value per axis: a plain value on linear axes and
/// an exponent on logarithmic ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphCoords {
    pub x: f64,
    pub y: f64,
    pub x_scale: ScaleKind,
    pub y_scale: ScaleKind,
}

impl GraphCoords {
    /// Exponent form: logarithmic axes report `e`
    pub fn to_exponent(&self) -> GraphPoint {
        GraphPoint::new(self.x, self.y)
    }

    /// Actual-value form: logarithmic axes report `10^e`
    pub fn to_actual_value(&self) -> GraphPoint {
        self.represented(LogRepresentation::Actual)
    }

    /// Form chosen by `repr`; linear axes are unaffected
    pub fn represented(&self, repr: LogRepresentation) -> GraphPoint {
        let pick = |scale: ScaleKind, v: f64| match scale {
            ScaleKind::Linear => v,
            ScaleKind::Logarithmic => repr.from_exponent(v),
        };
        GraphPoint::new(pick(self.x_scale, self.x), pick(self.y_scale, self.y))
    }

    /// Form chosen by `repr`, refusing values an `f64` cannot hold
    ///
    /// Use this for anything that gets stored: `10^e` overflows to infinity
    /// above about `e = 308` and underflows to zero below about `e = -323`.
    pub fn stored(&self, repr: LogRepresentation) -> Result<GraphPoint, TransformError> {
        let shown = self.represented(repr);
        let check = |what: &'static str, scale: ScaleKind, exponent: f64, value: f64| {
            let value = finite(what, value)?;
            if scale.is_logarithmic() && repr == LogRepresentation::Actual && value == 0.0 {
                return Err(TransformError::Underflow { what, exponent });
            }
            Ok(value)
        };
        Ok(GraphPoint::new(
            check("graph x", self.x_scale, self.x, shown.x)?,
            check("graph y", self.y_scale, self.y, shown.y)?,
        ))
    }
}

/// One axis of the mapping: a pixel span against a resolved value range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    range: AxisRange,
    origin: f64,
    size: f64,
    /// Pixel direction runs against value direction (the Y axis)
    inverted: bool,
}

impl AxisMapping {
    pub fn new(range: AxisRange, origin: f64, size: f64, inverted: bool) -> Self {
        Self {
            range,
            origin,
            size,
            inverted,
        }
    }

    pub fn scale(&self) -> ScaleKind {
        self.range.scale
    }

    /// Pixel coordinate to interpolated value (exponent on log axes)
    ///
    /// No clamping: pixels outside the box extrapolate.
    pub fn to_value(&self, pixel: f64) -> f64 {
        let t = (pixel - self.origin) / self.size;
        let span = self.range.span();
        if self.inverted {
            self.range.max - t * span
        } else {
            self.range.min + t * span
        }
    }

    /// Graph value to pixel coordinate
    ///
    /// `value` is in the axis' linear space: the exponent on log axes.
    pub fn to_pixel(&self, value: f64) -> f64 {
        let mut span = self.range.span();
        if span.abs() < LOG_EPSILON {
            span = LOG_EPSILON.copysign(span);
        }
        let t = (value - self.range.min) / span;
        if self.inverted {
            self.origin + (1.0 - t) * self.size
        } else {
            self.origin + t * self.size
        }
    }

    /// Bring a stored graph value into the axis' linear space
    pub fn linearize(&self, value: f64, repr: LogRepresentation) -> f64 {
        match self.range.scale {
            ScaleKind::Linear => value,
            ScaleKind::Logarithmic => {
                if repr == LogRepresentation::Actual && value <= 0.0 {
                    tracing::warn!(
                        "Non-positive value {} on logarithmic axis floored to {:e}",
                        value,
                        LOG_EPSILON
                    );
                }
                repr.to_exponent(value)
            }
        }
    }
}

/// Bidirectional mapping for a validated calibration region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    x: AxisMapping,
    y: AxisMapping,
}

impl CoordinateTransform {
    /// Build the transform, refusing regions that cannot be mapped through
    pub fn from_calibration(calibration: &CalibrationRegion) -> Result<Self, TransformError> {
        calibration.validate()?;

        let r = calibration.normalized();
        let x = AxisMapping::new(calibration.x_axis.resolve(), r.x, r.width, false);
        let y = AxisMapping::new(calibration.y_axis.resolve(), r.y, r.height, true);

        Ok(Self { x, y })
    }

    pub fn x_axis(&self) -> &AxisMapping {
        &self.x
    }

    pub fn y_axis(&self) -> &AxisMapping {
        &self.y
    }

    /// Pixel position to graph coordinates
    pub fn to_graph(&self, px: f64, py: f64) -> Result<GraphCoords, TransformError> {
        let px = finite("pixel x", px)?;
        let py = finite("pixel y", py)?;

        let coords = GraphCoords {
            x: self.x.to_value(px),
            y: self.y.to_value(py),
            x_scale: self.x.scale(),
            y_scale: self.y.scale(),
        };
        tracing::debug!("pixel ({}, {}) -> graph ({}, {})", px, py, coords.x, coords.y);
        Ok(coords)
    }

    /// Graph values to pixel position; log-axis values are actual values
    pub fn to_pixel(&self, gx: f64, gy: f64) -> Result<PixelPoint, TransformError> {
        self.to_pixel_as(gx, gy, LogRepresentation::Actual)
    }

    /// Graph values to pixel position, log-axis values read as `repr`
    pub fn to_pixel_as(
        &self,
        gx: f64,
        gy: f64,
        repr: LogRepresentation,
    ) -> Result<PixelPoint, TransformError> {
        let gx = finite("graph x", gx)?;
        let gy = finite("graph y", gy)?;

        let pixel = PixelPoint::new(
            self.x.to_pixel(self.x.linearize(gx, repr)),
            self.y.to_pixel(self.y.linearize(gy, repr)),
        );
        tracing::debug!("graph ({}, {}) -> pixel ({}, {})", gx, gy, pixel.x, pixel.y);
        Ok(pixel)
    }

    /// Map a batch of graph points; the first failure fails the batch
    pub fn to_pixel_batch(
        &self,
        points: &[GraphPoint],
        repr: LogRepresentation,
    ) -> Result<Vec<PixelPoint>, TransformError> {
        points
            .par_iter()
            .map(|p| self.to_pixel_as(p.x, p.y, repr))
            .collect()
    }
}

/// Map a pixel position through `region`
pub fn to_graph(px: f64, py: f64, region: &CalibrationRegion) -> Result<GraphCoords, TransformError> {
    CoordinateTransform::from_calibration(region)?.to_graph(px, py)
}

/// Map graph values (actual values on log axes) back to a pixel position
pub fn to_pixel(gx: f64, gy: f64, region: &CalibrationRegion) -> Result<PixelPoint, TransformError> {
    CoordinateTransform::from_calibration(region)?.to_pixel(gx, gy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{AxisConfig, PixelRegion};

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn linear_region() -> CalibrationRegion {
        CalibrationRegion::new(
            PixelRegion::new(0.0, 0.0, 100.0, 100.0),
            AxisConfig::linear(0.0, 10.0),
            AxisConfig::linear(0.0, 10.0),
        )
    }

    fn log_region() -> CalibrationRegion {
        CalibrationRegion::new(
            PixelRegion::new(40.0, 25.0, 320.0, 180.0),
            AxisConfig::logarithmic(-2.0, 3.0),
            AxisConfig::logarithmic(0.0, 6.0),
        )
    }

    #[test]
    fn test_linear_scenario() {
        let region = linear_region();

        let p = to_graph(50.0, 50.0, &region).unwrap().to_exponent();
        assert!(approx(p.x, 5.0, 1e-12) && approx(p.y, 5.0, 1e-12));

        let p = to_graph(0.0, 0.0, &region).unwrap().to_exponent();
        assert!(approx(p.x, 0.0, 1e-12) && approx(p.y, 10.0, 1e-12));

        let p = to_graph(100.0, 100.0, &region).unwrap().to_exponent();
        assert!(approx(p.x, 10.0, 1e-12) && approx(p.y, 0.0, 1e-12));
    }

    #[test]
    fn test_log_scenario() {
        let region = CalibrationRegion::new(
            PixelRegion::new(0.0, 0.0, 100.0, 100.0),
            AxisConfig::logarithmic(0.0, 2.0),
            AxisConfig::linear(0.0, 10.0),
        );
        let coords = to_graph(50.0, 0.0, &region).unwrap();
        assert!(approx(coords.to_exponent().x, 1.0, 1e-12));
        assert!(approx(coords.to_actual_value().x, 10.0, 1e-9));
        // Linear Y is the same in both forms
        assert_eq!(coords.to_exponent().y, coords.to_actual_value().y);
    }

    #[test]
    fn test_y_axis_inversion() {
        let region = CalibrationRegion::new(
            PixelRegion::new(20.0, 30.0, 200.0, 150.0),
            AxisConfig::linear(-5.0, 5.0),
            AxisConfig::linear(100.0, 400.0),
        );
        let top = to_graph(60.0, 30.0, &region).unwrap();
        let bottom = to_graph(60.0, 180.0, &region).unwrap();
        assert!(approx(top.y, 400.0, 1e-9));
        assert!(approx(bottom.y, 100.0, 1e-9));
    }

    #[test]
    fn test_linear_round_trip_inside_and_outside() {
        let region = CalibrationRegion::new(
            PixelRegion::new(137.5, 42.0, -96.25, 310.0),
            AxisConfig::linear(-3.5, 12.25),
            AxisConfig::linear(1e-6, 9e-6),
        );
        let transform = CoordinateTransform::from_calibration(&region).unwrap();
        let samples = [
            (41.25, 42.0),
            (90.0, 200.0),
            (137.5, 352.0),
            (-50.0, -75.0),
            (400.0, 1000.0),
        ];
        for (px, py) in samples {
            let g = transform.to_graph(px, py).unwrap().to_actual_value();
            let back = transform.to_pixel(g.x, g.y).unwrap();
            assert!(approx(back.x, px, 1e-9), "x: {} vs {}", back.x, px);
            assert!(approx(back.y, py, 1e-9), "y: {} vs {}", back.y, py);
        }
    }

    #[test]
    fn test_log_round_trip_actual_values() {
        let region = log_region();
        let transform = CoordinateTransform::from_calibration(&region).unwrap();
        for (px, py) in [(40.0, 25.0), (123.0, 77.0), (360.0, 205.0), (10.0, 250.0)] {
            let g = transform.to_graph(px, py).unwrap().to_actual_value();
            assert!(g.x > 0.0 && g.y > 0.0);
            let back = transform.to_pixel(g.x, g.y).unwrap();
            assert!(approx(back.x, px, px.abs().max(1.0) * 1e-6));
            assert!(approx(back.y, py, py.abs().max(1.0) * 1e-6));
        }
    }

    #[test]
    fn test_log_round_trip_exponent_values() {
        let region = log_region();
        let transform = CoordinateTransform::from_calibration(&region).unwrap();
        let g = transform.to_graph(200.0, 100.0).unwrap().to_exponent();
        let back = transform
            .to_pixel_as(g.x, g.y, LogRepresentation::Exponent)
            .unwrap();
        assert!(approx(back.x, 200.0, 1e-9));
        assert!(approx(back.y, 100.0, 1e-9));
    }

    #[test]
    fn test_non_positive_log_value_is_floored() {
        let region = CalibrationRegion::new(
            PixelRegion::new(0.0, 0.0, 100.0, 100.0),
            AxisConfig::logarithmic(-12.0, 0.0),
            AxisConfig::linear(0.0, 1.0),
        );
        let zero = to_pixel(0.0, 0.5, &region).unwrap();
        let negative = to_pixel(-4.0, 0.5, &region).unwrap();
        // Both land on exponent -12, the left edge
        assert!(approx(zero.x, 0.0, 1e-9));
        assert!(approx(negative.x, 0.0, 1e-9));
        assert!(zero.x.is_finite() && zero.y.is_finite());
    }

    #[test]
    fn test_monotonic_in_x() {
        let region = linear_region();
        let transform = CoordinateTransform::from_calibration(&region).unwrap();
        let mut prev = f64::NEG_INFINITY;
        for i in -10..=110 {
            let x = transform.to_graph(i as f64, 50.0).unwrap().x;
            assert!(x > prev);
            prev = x;
        }

        let mut inverted = region;
        inverted.x_axis = AxisConfig::linear(10.0, 0.0);
        let transform = CoordinateTransform::from_calibration(&inverted).unwrap();
        let mut prev = f64::INFINITY;
        for i in -10..=110 {
            let x = transform.to_graph(i as f64, 50.0).unwrap().x;
            assert!(x < prev);
            prev = x;
        }
    }

    #[test]
    fn test_degenerate_region_rejected() {
        let mut region = linear_region();
        region.region.width = 0.0;
        assert!(!region.is_valid());
        assert!(matches!(
            to_graph(10.0, 10.0, &region),
            Err(TransformError::InvalidRegion { .. })
        ));
        assert!(matches!(
            to_pixel(1.0, 1.0, &region),
            Err(TransformError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let region = linear_region();
        assert!(matches!(
            to_graph(f64::NAN, 1.0, &region),
            Err(TransformError::NonFiniteInput { what: "pixel x", .. })
        ));
        assert!(matches!(
            to_pixel(1.0, f64::INFINITY, &region),
            Err(TransformError::NonFiniteInput { what: "graph y", .. })
        ));
    }

    #[test]
    fn test_unit_multiplier_applied_once() {
        // Bounds pre-multiplied by the caller
        let pre = CalibrationRegion::new(
            PixelRegion::new(0.0, 0.0, 200.0, 100.0),
            AxisConfig::linear(0.0, 50e-6),
            AxisConfig::linear(0.0, 3e3),
        );
        // Bounds in display units with multipliers resolved by the config
        let display = CalibrationRegion::new(
            PixelRegion::new(0.0, 0.0, 200.0, 100.0),
            AxisConfig::linear(0.0, 50.0).with_unit_multiplier(1e-6),
            AxisConfig::linear(0.0, 3.0).with_unit_multiplier(1e3),
        );
        let a = to_graph(73.0, 41.0, &pre).unwrap();
        let b = to_graph(73.0, 41.0, &display).unwrap();
        assert!(approx(a.x, b.x, 1e-18));
        assert!(approx(a.y, b.y, 1e-9));

        let pa = to_pixel(a.x, a.y, &pre).unwrap();
        let pb = to_pixel(a.x, a.y, &display).unwrap();
        assert!(approx(pa.x, pb.x, 1e-9) && approx(pa.y, pb.y, 1e-9));
    }

    #[test]
    fn test_batch_conversion_is_atomic() {
        let transform = CoordinateTransform::from_calibration(&linear_region()).unwrap();
        let ok = transform
            .to_pixel_batch(
                &[GraphPoint::new(0.0, 0.0), GraphPoint::new(10.0, 10.0)],
                LogRepresentation::Actual,
            )
            .unwrap();
        assert_eq!(ok, vec![PixelPoint::new(0.0, 100.0), PixelPoint::new(100.0, 0.0)]);

        let err = transform.to_pixel_batch(
            &[GraphPoint::new(1.0, 1.0), GraphPoint::new(f64::NAN, 1.0)],
            LogRepresentation::Actual,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_infer_log_representation() {
        assert_eq!(LogRepresentation::infer(&[], 0.0, 3.0), LogRepresentation::Exponent);
        assert_eq!(
            LogRepresentation::infer(&[-1.0, 2.0], 0.0, 3.0),
            LogRepresentation::Exponent
        );
        assert_eq!(
            LogRepresentation::infer(&[0.5, 1.7, 3.2], 0.0, 3.0),
            LogRepresentation::Exponent
        );
        assert_eq!(
            LogRepresentation::infer(&[5.0, 120.0, 900.0], 0.0, 3.0),
            LogRepresentation::Actual
        );
        // Reversed bounds behave the same
        assert_eq!(
            LogRepresentation::infer(&[1.0, 2.0], 3.0, 0.0),
            LogRepresentation::Exponent
        );
    }

    #[test]
    fn test_stored_refuses_unrepresentable_values() {
        let region = CalibrationRegion::new(
            PixelRegion::new(0.0, 0.0, 100.0, 100.0),
            AxisConfig::logarithmic(0.0, 200.0),
            AxisConfig::logarithmic(-200.0, 0.0),
        );

        // x exponent 400
        let high = to_graph(200.0, 50.0, &region).unwrap();
        assert!(approx(high.to_exponent().x, 400.0, 1e-9));
        assert!(matches!(
            high.stored(LogRepresentation::Actual),
            Err(TransformError::NonFiniteInput { what: "graph x", .. })
        ));

        // y exponent -400
        let low = to_graph(50.0, 200.0, &region).unwrap();
        assert!(matches!(
            low.stored(LogRepresentation::Actual),
            Err(TransformError::Underflow { what: "graph y", .. })
        ));

        // Exponents themselves are fine
        let p = high.stored(LogRepresentation::Exponent).unwrap();
        assert!(approx(p.x, 400.0, 1e-9));

        let inside = to_graph(50.0, 50.0, &region).unwrap();
        let p = inside.stored(LogRepresentation::Actual).unwrap();
        assert!(approx(p.x.log10(), 100.0, 1e-9));
    }

    #[test]
    fn test_exponent_helpers() {
        assert!(approx(to_exponent(1000.0), 3.0, 1e-12));
        assert!(approx(to_exponent(0.0), -12.0, 1e-12));
        assert!(approx(to_actual_value(-2.0), 0.01, 1e-15));
    }
}
