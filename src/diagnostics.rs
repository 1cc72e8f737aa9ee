//! Hover readout diagnostics
//!
//! While the cursor moves over the image, the live graph readout can hint
//! at a misconfigured calibration: a readout that barely moves, or one that
//! stays at zero well inside the box. [`ReadoutMonitor`] watches successive
//! samples and reports those cases. Display timing (debounce, hold) is left
//! to the caller.

use crate::calibration::CalibrationRegion;
use crate::transform::{GraphPoint, PixelPoint};

/// Cursor travel, in pixels, before a flat readout counts as stuck
pub const STUCK_MIN_MOVE: f64 = 20.0;

/// Readout change below this fraction of the axis span counts as flat
pub const STUCK_RELATIVE_CHANGE: f64 = 0.002;

/// Consecutive stuck samples before warning
pub const STUCK_SAMPLES: u32 = 2;

/// Hysteresis margin from the box edges, in pixels
pub const EDGE_GAP: f64 = 12.0;

/// Readouts below this magnitude count as zero
pub const ZERO_THRESHOLD: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadoutWarning {
    /// Coordinates are constant; scale kind or bounds likely wrong
    Zero,
    /// Coordinates barely change while the cursor moves
    Stuck,
}

impl ReadoutWarning {
    pub fn message(&self) -> &'static str {
        match self {
            ReadoutWarning::Zero => {
                "Coordinates are constant. Check that the axis scale (Linear/Logarithmic) and min/max values match the graph."
            }
            ReadoutWarning::Stuck => {
                "Coordinates are barely changing while you move. Verify scale, min/max, and units match the graph."
            }
        }
    }
}

/// Tracks hover samples for one calibration
#[derive(Debug, Clone)]
pub struct ReadoutMonitor {
    calibration: CalibrationRegion,
    previous: Option<(PixelPoint, GraphPoint)>,
    stuck_samples: u32,
}

impl ReadoutMonitor {
    pub fn new(calibration: CalibrationRegion) -> Self {
        Self {
            calibration,
            previous: None,
            stuck_samples: 0,
        }
    }

    /// Cursor left the image
    pub fn reset(&mut self) {
        self.previous = None;
        self.stuck_samples = 0;
    }

    /// Readout in display units, undoing the unit multiplier
    fn display(&self, graph: GraphPoint) -> GraphPoint {
        GraphPoint::new(
            graph.x / self.calibration.x_axis.effective_multiplier(),
            graph.y / self.calibration.y_axis.effective_multiplier(),
        )
    }

    /// Feed the next hover sample, returning the warning to show, if any
    pub fn observe(&mut self, pixel: PixelPoint, graph: GraphPoint) -> Option<ReadoutWarning> {
        if !self.calibration.is_valid() {
            self.reset();
            return None;
        }

        let shown = self.display(graph);
        let stuck_now = self
            .previous
            .is_some_and(|(prev_pixel, prev_shown)| self.is_flat(prev_pixel, prev_shown, pixel, shown));
        self.previous = Some((pixel, shown));

        if stuck_now {
            self.stuck_samples += 1;
        } else {
            self.stuck_samples = 0;
        }

        if self.is_zero(pixel, shown) {
            Some(ReadoutWarning::Zero)
        } else if self.stuck_samples >= STUCK_SAMPLES {
            Some(ReadoutWarning::Stuck)
        } else {
            None
        }
    }

    fn is_flat(&self, prev_pixel: PixelPoint, prev: GraphPoint, pixel: PixelPoint, shown: GraphPoint) -> bool {
        let moved = (pixel.x - prev_pixel.x).hypot(pixel.y - prev_pixel.y);
        if moved <= STUCK_MIN_MOVE {
            return false;
        }

        let delta = (shown.x - prev.x).abs().max((shown.y - prev.y).abs());
        let (x_axis, y_axis) = (&self.calibration.x_axis, &self.calibration.y_axis);
        let span = (x_axis.max - x_axis.min)
            .abs()
            .max((y_axis.max - y_axis.min).abs())
            .max(1.0);

        delta / span < STUCK_RELATIVE_CHANGE
    }

    fn is_zero(&self, pixel: PixelPoint, shown: GraphPoint) -> bool {
        let r = self.calibration.normalized();
        let gap = EDGE_GAP * 2.0;
        let inside_x = pixel.x > r.x + gap && pixel.x < r.x + r.width - gap;
        let inside_y = pixel.y > r.y + gap && pixel.y < r.y + r.height - gap;

        (inside_x && shown.x.abs() < ZERO_THRESHOLD) || (inside_y && shown.y.abs() < ZERO_THRESHOLD)
    }
}
