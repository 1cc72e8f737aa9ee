//! Calibration region: the drawn pixel box and the axis ranges it maps to

use serde::{Deserialize, Serialize};

use crate::config::ScaleKind;
use crate::transform::TransformError;

/// Smallest width/height a handle resize may shrink the box to
pub const MIN_REGION_SIZE: f64 = 20.0;

/// Hit radius for resize handles, in pixels
pub const HANDLE_RADIUS: f64 = 12.0;

/// The calibration rectangle on the source image, in pixels
///
/// Width and height may be negative when the box was dragged right-to-left
/// or bottom-to-top; [`PixelRegion::normalized`] fixes that up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resize handle of the calibration box: a corner or an edge midpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

impl ResizeHandle {
    /// Every handle, in hit-test priority order
    pub fn all() -> &'static [ResizeHandle] {
        &[
            ResizeHandle::TopLeft,
            ResizeHandle::TopRight,
            ResizeHandle::BottomLeft,
            ResizeHandle::BottomRight,
            ResizeHandle::Top,
            ResizeHandle::Bottom,
            ResizeHandle::Left,
            ResizeHandle::Right,
        ]
    }

    fn moves_left(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::BottomLeft | ResizeHandle::Left
        )
    }

    fn moves_right(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopRight | ResizeHandle::BottomRight | ResizeHandle::Right
        )
    }

    fn moves_top(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::TopRight | ResizeHandle::Top
        )
    }

    fn moves_bottom(&self) -> bool {
        matches!(
            self,
            ResizeHandle::BottomLeft | ResizeHandle::BottomRight | ResizeHandle::Bottom
        )
    }
}

impl PixelRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Region spanned by a drag from `start` to `end`, in either direction
    pub fn from_drag(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            x: start.0,
            y: start.1,
            width: end.0 - start.0,
            height: end.1 - start.1,
        }
    }

    /// Same rectangle with non-negative width/height
    pub fn normalized(&self) -> Self {
        let mut r = *self;
        if r.width < 0.0 {
            r.x += r.width;
            r.width = r.width.abs();
        }
        if r.height < 0.0 {
            r.y += r.height;
            r.height = r.height.abs();
        }
        r
    }

    /// True if the normalized box has no usable area
    pub fn is_degenerate(&self) -> bool {
        let r = self.normalized();
        let finite = r.x.is_finite() && r.y.is_finite() && r.width.is_finite() && r.height.is_finite();
        !finite || r.width <= 0.0 || r.height <= 0.0
    }

    /// Whether a pixel lies inside the normalized box (edges included)
    pub fn contains(&self, px: f64, py: f64) -> bool {
        let r = self.normalized();
        px >= r.x && px <= r.x + r.width && py >= r.y && py <= r.y + r.height
    }

    /// Pixel position of a handle on the normalized box
    pub fn handle_position(&self, handle: ResizeHandle) -> (f64, f64) {
        let r = self.normalized();
        let x = if handle.moves_left() {
            r.x
        } else if handle.moves_right() {
            r.x + r.width
        } else {
            r.x + r.width / 2.0
        };
        let y = if handle.moves_top() {
            r.y
        } else if handle.moves_bottom() {
            r.y + r.height
        } else {
            r.y + r.height / 2.0
        };
        (x, y)
    }

    /// Handle under the cursor, if any; corners win over edge midpoints
    pub fn handle_at(&self, px: f64, py: f64, radius: f64) -> Option<ResizeHandle> {
        ResizeHandle::all().iter().copied().find(|&handle| {
            let (hx, hy) = self.handle_position(handle);
            (px - hx).hypot(py - hy) <= radius
        })
    }

    /// Drag a handle by `(dx, dy)`
    ///
    /// Only the edges the handle touches follow the drag; edge-midpoint
    /// handles ignore the other component. Width and height are then raised
    /// to [`MIN_REGION_SIZE`] and, given image `bounds`, the box is clamped
    /// onto the image. Either step can shift the far edges too.
    pub fn resize_handle(
        &self,
        handle: ResizeHandle,
        dx: f64,
        dy: f64,
        bounds: Option<(f64, f64)>,
    ) -> Self {
        let start = self.normalized();
        let mut r = start;

        if handle.moves_left() {
            r.x = start.x + dx;
            r.width = start.width - dx;
        } else if handle.moves_right() {
            r.width = start.width + dx;
        }
        if handle.moves_top() {
            r.y = start.y + dy;
            r.height = start.height - dy;
        } else if handle.moves_bottom() {
            r.height = start.height + dy;
        }

        r.width = r.width.max(MIN_REGION_SIZE);
        r.height = r.height.max(MIN_REGION_SIZE);

        if let Some((max_w, max_h)) = bounds {
            r.x = r.x.max(0.0);
            r.y = r.y.max(0.0);
            if r.x + r.width > max_w {
                r.width = max_w - r.x;
            }
            if r.y + r.height > max_h {
                r.height = max_h - r.y;
            }
        }

        r
    }
}

/// Axis configuration as entered, with its unit multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub scale: ScaleKind,
    /// Display-unit bound; an exponent on logarithmic axes
    pub min: f64,
    /// Display-unit bound; an exponent on logarithmic axes
    pub max: f64,
    /// Positive factor, only meaningful for linear axes
    pub unit_multiplier: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::linear(0.0, 100.0)
    }
}

impl AxisConfig {
    pub fn new(scale: ScaleKind, min: f64, max: f64, unit_multiplier: f64) -> Self {
        Self {
            scale,
            min,
            max,
            unit_multiplier,
        }
    }

    pub fn linear(min: f64, max: f64) -> Self {
        Self::new(ScaleKind::Linear, min, max, 1.0)
    }

    /// Logarithmic axis spanning `10^min_exp ..= 10^max_exp`
    pub fn logarithmic(min_exp: f64, max_exp: f64) -> Self {
        Self::new(ScaleKind::Logarithmic, min_exp, max_exp, 1.0)
    }

    pub fn with_unit_multiplier(mut self, unit_multiplier: f64) -> Self {
        self.unit_multiplier = unit_multiplier;
        self
    }

    /// Multiplier that actually applies: exponents are never scaled
    pub fn effective_multiplier(&self) -> f64 {
        match self.scale {
            ScaleKind::Linear => self.unit_multiplier,
            ScaleKind::Logarithmic => 1.0,
        }
    }

    /// Bounds in the unit space the transform works in
    pub fn resolve(&self) -> AxisRange {
        let m = self.effective_multiplier();
        AxisRange {
            scale: self.scale,
            min: self.min * m,
            max: self.max * m,
        }
    }

    fn validate(&self, axis: &str) -> Result<(), TransformError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(TransformError::invalid_region(format!(
                "{} axis bounds must be finite",
                axis
            )));
        }
        if !self.unit_multiplier.is_finite() || self.unit_multiplier <= 0.0 {
            return Err(TransformError::invalid_region(format!(
                "{} axis unit multiplier must be positive, got {}",
                axis, self.unit_multiplier
            )));
        }
        let range = self.resolve();
        if range.min == range.max {
            return Err(TransformError::invalid_region(format!(
                "{} axis range is degenerate (min == max == {})",
                axis, self.min
            )));
        }
        Ok(())
    }
}

/// Resolved axis bounds, unit multiplier already applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub scale: ScaleKind,
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// The pixel box together with the axes it is calibrated against
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationRegion {
    pub region: PixelRegion,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
}

impl CalibrationRegion {
    pub fn new(region: PixelRegion, x_axis: AxisConfig, y_axis: AxisConfig) -> Self {
        Self {
            region,
            x_axis,
            y_axis,
        }
    }

    /// The pixel box with non-negative extents
    pub fn normalized(&self) -> PixelRegion {
        self.region.normalized()
    }

    /// Check the region, reporting why it cannot be mapped through
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.region.is_degenerate() {
            let r = self.normalized();
            return Err(TransformError::invalid_region(format!(
                "calibration box has no area ({} x {})",
                r.width, r.height
            )));
        }
        self.x_axis.validate("x")?;
        self.y_axis.validate("y")?;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Same axes over a new pixel box
    pub fn resized(&self, region: PixelRegion) -> Self {
        Self { region, ..*self }
    }
}
