//! View-Fit Controller
//!
//! Computes one focal point for a whole batch and asks the canvas to move
//! there. Point batches centre on the arithmetic mean, areal batches on the
//! centre of their combined bounding box.

use crate::RenderError;
use crate::canvas::{MapCanvas, ViewTransition};
use geomap_core::LatLng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_point(point: LatLng) -> Self {
        Self {
            south: point.latitude,
            west: point.longitude,
            north: point.latitude,
            east: point.longitude,
        }
    }

    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::from_point(*first);
        for point in rest {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.latitude);
        self.north = self.north.max(point.latitude);
        self.west = self.west.min(point.longitude);
        self.east = self.east.max(point.longitude);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStrategy {
    /// Arithmetic mean of latitude and longitude, for point entities.
    Mean,
    /// Bounding-box centre, for areal entities.
    BoundsCenter,
}

pub fn mean_point(points: &[LatLng]) -> Result<LatLng, RenderError> {
    if points.is_empty() {
        return Err(RenderError::EmptyBatch);
    }
    let n = points.len() as f64;
    let (lat, lng) = points.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.latitude, lng + p.longitude)
    });
    Ok(LatLng::new(lat / n, lng / n))
}

pub fn bounds_center(points: &[LatLng]) -> Result<LatLng, RenderError> {
    Bounds::from_points(points)
        .map(|b| b.center())
        .ok_or(RenderError::EmptyBatch)
}

pub fn focal_point(points: &[LatLng], strategy: FitStrategy) -> Result<LatLng, RenderError> {
    match strategy {
        FitStrategy::Mean => mean_point(points),
        FitStrategy::BoundsCenter => bounds_center(points),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFitController {
    /// Zoom used after placing individually addressable entities.
    pub entity_zoom: f64,
    /// Zoom used after repopulating a bulk layer group.
    pub layer_zoom: f64,
}

impl Default for ViewFitController {
    fn default() -> Self {
        Self {
            entity_zoom: 8.0,
            layer_zoom: 6.0,
        }
    }
}

impl ViewFitController {
    pub fn new(entity_zoom: f64, layer_zoom: f64) -> Self {
        Self {
            entity_zoom,
            layer_zoom,
        }
    }

    /// Recenter on a batch of entities. An empty batch leaves the viewport
    /// untouched.
    pub fn fit_entities<C: MapCanvas + ?Sized>(
        &self,
        canvas: &mut C,
        points: &[LatLng],
        strategy: FitStrategy,
    ) -> Option<LatLng> {
        self.fit_to(canvas, points, strategy, self.entity_zoom, ViewTransition::Jump)
    }

    /// Fly to a freshly populated layer group.
    pub fn fit_layer<C: MapCanvas + ?Sized>(
        &self,
        canvas: &mut C,
        points: &[LatLng],
        strategy: FitStrategy,
    ) -> Option<LatLng> {
        self.fit_to(canvas, points, strategy, self.layer_zoom, ViewTransition::Animate)
    }

    pub fn fit_to<C: MapCanvas + ?Sized>(
        &self,
        canvas: &mut C,
        points: &[LatLng],
        strategy: FitStrategy,
        zoom: f64,
        transition: ViewTransition,
    ) -> Option<LatLng> {
        match focal_point(points, strategy) {
            Ok(center) => {
                tracing::debug!("Fitting view to {} at zoom {}", center, zoom);
                canvas.set_viewport(center, zoom, transition);
                Some(center)
            }
            Err(err) => {
                tracing::debug!("Skipping view fit: {}", err);
                None
            }
        }
    }
}
