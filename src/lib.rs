//! GraphCalibrate - pixel to graph coordinate calibration
//!
//! Maps clicks on a chart image to graph-space values and back, given a
//! calibration box drawn on the image and the axis ranges it stands for.
//! Axes may be linear or logarithmic; logarithmic bounds are exponents.

pub mod calibration;
pub mod config;
pub mod diagnostics;
pub mod export;
pub mod import;
pub mod points;
pub mod transform;

pub use calibration::{AxisConfig, CalibrationRegion, PixelRegion};
pub use config::{Config, ScaleKind, UnitPrefix};
pub use points::{CapturedPoint, PointOrigin, PointSet};
pub use transform::{
    to_graph, to_pixel, CoordinateTransform, GraphPoint, LogRepresentation, PixelPoint,
    TransformError,
};
