//! CSV export and the persisted curve record

use serde::{Deserialize, Serialize};

use crate::config::{AxisSettings, CalibrationSettings, ScaleKind};
use crate::points::PointSet;
use crate::transform::{GraphPoint, LogRepresentation};

/// Render points as `X Value,Y Value` CSV with fixed precision
///
/// Non-finite values are written as `Invalid`.
pub fn to_csv(points: &[GraphPoint], precision: usize) -> String {
    let cell = |v: f64| {
        if v.is_finite() {
            format!("{:.*}", precision, v)
        } else {
            "Invalid".to_string()
        }
    };

    let mut csv = String::from("X Value,Y Value\n");
    for p in points {
        csv.push_str(&format!("{},{}\n", cell(p.x), cell(p.y)));
    }
    csv
}

/// One stored point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPointRecord {
    pub x_value: f64,
    pub y_value: f64,
}

/// A curve as handed to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub curve_name: String,
    pub x_scale: ScaleKind,
    pub y_scale: ScaleKind,
    #[serde(default)]
    pub x_unit: Option<String>,
    #[serde(default)]
    pub y_unit: Option<String>,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub data_points: Vec<DataPointRecord>,
}

fn unit_field(axis: &AxisSettings) -> Option<String> {
    (!axis.unit.is_empty()).then(|| axis.unit.as_str().to_string())
}

/// Re-express a stored value in another log representation
fn convert(scale: ScaleKind, value: f64, from: LogRepresentation, to: LogRepresentation) -> f64 {
    match scale {
        ScaleKind::Linear => value,
        ScaleKind::Logarithmic if from == to => value,
        ScaleKind::Logarithmic => to.from_exponent(from.to_exponent(value)),
    }
}

impl CurveRecord {
    /// Build a record from the calibration settings and captured points
    ///
    /// Log-axis values are written as `repr`; points with non-finite values
    /// are dropped.
    pub fn from_points(
        curve_name: impl Into<String>,
        settings: &CalibrationSettings,
        points: &PointSet,
        repr: LogRepresentation,
    ) -> Self {
        let (x_axis, y_axis) = (&settings.x_axis, &settings.y_axis);
        let from = points.representation();

        let data_points: Vec<_> = points
            .iter()
            .map(|p| DataPointRecord {
                x_value: convert(x_axis.scale, p.graph.x, from, repr),
                y_value: convert(y_axis.scale, p.graph.y, from, repr),
            })
            .filter(|r| r.x_value.is_finite() && r.y_value.is_finite())
            .collect();

        if data_points.len() < points.len() {
            tracing::warn!(
                "Dropped {} points with non-finite values",
                points.len() - data_points.len()
            );
        }

        Self {
            curve_name: curve_name.into(),
            x_scale: x_axis.scale,
            y_scale: y_axis.scale,
            x_unit: unit_field(x_axis),
            y_unit: unit_field(y_axis),
            x_min: x_axis.min,
            x_max: x_axis.max,
            y_min: y_axis.min,
            y_max: y_axis.max,
            temperature: None,
            data_points,
        }
    }

    pub fn graph_points(&self) -> Vec<GraphPoint> {
        self.data_points
            .iter()
            .map(|d| GraphPoint::new(d.x_value, d.y_value))
            .collect()
    }

    /// Best guess of how each log axis' stored values are written
    ///
    /// `None` for linear axes.
    pub fn inferred_representation(&self) -> (Option<LogRepresentation>, Option<LogRepresentation>) {
        let infer = |scale: ScaleKind, values: Vec<f64>, min: f64, max: f64| {
            scale
                .is_logarithmic()
                .then(|| LogRepresentation::infer(&values, min, max))
        };
        (
            infer(
                self.x_scale,
                self.data_points.iter().map(|d| d.x_value).collect(),
                self.x_min,
                self.x_max,
            ),
            infer(
                self.y_scale,
                self.data_points.iter().map(|d| d.y_value).collect(),
                self.y_min,
                self.y_max,
            ),
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}
