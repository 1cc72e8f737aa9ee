//! Digitized point collection
//!
//! Points keep insertion order, which is their row number in any listing.
//! Provenance decides the mapping direction: captured points come from a
//! pixel, imported and edited points from graph values.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationRegion;
use crate::transform::{
    CoordinateTransform, GraphPoint, LogRepresentation, PixelPoint, TransformError,
};

/// Click radius for deleting a point, in pixels
pub const DELETE_RADIUS: f64 = 8.0;

/// Where a point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointOrigin {
    Captured,
    Imported,
    Edited,
}

/// A single digitized sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapturedPoint {
    pub id: usize,
    /// Placement on the image, if one has been derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel: Option<PixelPoint>,
    pub graph: GraphPoint,
    pub origin: PointOrigin,
}

impl CapturedPoint {
    pub fn is_imported(&self) -> bool {
        self.origin == PointOrigin::Imported
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PointError {
    #[error("no point with id {0}")]
    NotFound(usize),
    #[error("point {0} was imported and cannot be changed")]
    ImportedReadOnly(usize),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Ordered set of points for one curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    points: Vec<CapturedPoint>,
    next_id: usize,
    /// Form of stored graph values on logarithmic axes
    representation: LogRepresentation,
}

impl Default for PointSet {
    fn default() -> Self {
        Self::new(LogRepresentation::default())
    }
}

impl PointSet {
    pub fn new(representation: LogRepresentation) -> Self {
        Self {
            points: Vec::new(),
            next_id: 1,
            representation,
        }
    }

    pub fn representation(&self) -> LogRepresentation {
        self.representation
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapturedPoint> {
        self.points.iter()
    }

    pub fn get(&self, id: usize) -> Option<&CapturedPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Graph values in insertion order
    pub fn graph_values(&self) -> Vec<GraphPoint> {
        self.points.iter().map(|p| p.graph).collect()
    }

    fn push(&mut self, pixel: Option<PixelPoint>, graph: GraphPoint, origin: PointOrigin) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.points.push(CapturedPoint {
            id,
            pixel,
            graph,
            origin,
        });
        id
    }

    /// Record a click, mapping it to graph space
    pub fn capture(
        &mut self,
        px: f64,
        py: f64,
        calibration: &CalibrationRegion,
    ) -> Result<usize, PointError> {
        let transform = CoordinateTransform::from_calibration(calibration)?;
        let graph = transform.to_graph(px, py)?.stored(self.representation)?;
        Ok(self.push(Some(PixelPoint::new(px, py)), graph, PointOrigin::Captured))
    }

    /// Record a click only if it falls inside the calibration box
    pub fn capture_in_box(
        &mut self,
        px: f64,
        py: f64,
        calibration: &CalibrationRegion,
    ) -> Result<Option<usize>, PointError> {
        calibration.validate()?;
        if !calibration.region.contains(px, py) {
            tracing::debug!("Ignoring click at ({}, {}) outside calibration box", px, py);
            return Ok(None);
        }
        self.capture(px, py, calibration).map(Some)
    }

    /// Add graph-space values, placing each on the image
    ///
    /// Nothing is added unless every value maps.
    pub fn import(
        &mut self,
        values: &[GraphPoint],
        calibration: &CalibrationRegion,
    ) -> Result<Vec<usize>, PointError> {
        let transform = CoordinateTransform::from_calibration(calibration)?;
        let pixels = transform.to_pixel_batch(values, self.representation)?;

        let ids = values
            .iter()
            .zip(pixels)
            .map(|(&graph, pixel)| self.push(Some(pixel), graph, PointOrigin::Imported))
            .collect::<Vec<_>>();

        tracing::info!("Imported {} points", ids.len());
        Ok(ids)
    }

    /// Replace every point with an imported set
    pub fn replace(
        &mut self,
        values: &[GraphPoint],
        calibration: &CalibrationRegion,
    ) -> Result<Vec<usize>, PointError> {
        let mut fresh = PointSet::new(self.representation);
        fresh.next_id = self.next_id;
        let ids = fresh.import(values, calibration)?;
        *self = fresh;
        Ok(ids)
    }

    fn editable_index(&self, id: usize) -> Result<usize, PointError> {
        let idx = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or(PointError::NotFound(id))?;
        if self.points[idx].is_imported() {
            tracing::warn!("Refusing to modify imported point {}", id);
            return Err(PointError::ImportedReadOnly(id));
        }
        Ok(idx)
    }

    /// Overwrite a point's graph values and re-place it
    pub fn edit(
        &mut self,
        id: usize,
        gx: f64,
        gy: f64,
        calibration: &CalibrationRegion,
    ) -> Result<(), PointError> {
        let idx = self.editable_index(id)?;
        let transform = CoordinateTransform::from_calibration(calibration)?;
        let pixel = transform.to_pixel_as(gx, gy, self.representation)?;

        let point = &mut self.points[idx];
        point.graph = GraphPoint::new(gx, gy);
        point.pixel = Some(pixel);
        point.origin = PointOrigin::Edited;
        Ok(())
    }

    /// Remove a point by ID
    pub fn delete(&mut self, id: usize) -> Result<CapturedPoint, PointError> {
        let idx = self.editable_index(id)?;
        Ok(self.points.remove(idx))
    }

    /// Remove the first non-imported point placed within `radius` of a click
    pub fn delete_near(&mut self, px: f64, py: f64, radius: f64) -> Option<CapturedPoint> {
        let idx = self.points.iter().position(|p| {
            !p.is_imported()
                && p.pixel
                    .is_some_and(|pix| (px - pix.x).hypot(py - pix.y) <= radius)
        })?;
        Some(self.points.remove(idx))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Re-place every point after the calibration box changed
    ///
    /// Graph values are kept; pixels follow the new box. On error no point
    /// is touched.
    pub fn rederive_pixels(&mut self, calibration: &CalibrationRegion) -> Result<(), PointError> {
        let transform = CoordinateTransform::from_calibration(calibration).map_err(|e| {
            tracing::warn!("Cannot re-place points: {}", e);
            e
        })?;
        let pixels = transform.to_pixel_batch(&self.graph_values(), self.representation)?;

        for (point, pixel) in self.points.iter_mut().zip(pixels) {
            point.pixel = Some(pixel);
        }
        Ok(())
    }

    /// Placed points ordered by pixel X, for drawing a connecting line
    pub fn sorted_by_x(&self) -> Vec<&CapturedPoint> {
        let mut placed: Vec<_> = self
            .points
            .iter()
            .filter(|p| p.pixel.is_some_and(|pix| pix.x.is_finite() && pix.y.is_finite()))
            .collect();
        placed.sort_by(|a, b| {
            let ax = a.pixel.map_or(0.0, |p| p.x);
            let bx = b.pixel.map_or(0.0, |p| p.x);
            ax.total_cmp(&bx)
        });
        placed
    }
}
