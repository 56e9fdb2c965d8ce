use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod feature;

pub use catalog::{DataKind, LayerInfo, ProjectInfo};
pub use descriptor::{
    CircleDescriptor, CircleStyle, EntityDescriptor, IconSize, IconSpec, LineDescriptor,
    MarkerDescriptor, PolygonDescriptor, PopupSpec, RouteDescriptor,
};
pub use error::DescriptorError;
pub use feature::{FeatureCollection, GeoFeature, Geometry, LayerFeature, LayerPayload, Shape};

/// A WGS84 coordinate pair. Latitude first, unlike GeoJSON positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DescriptorError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LatLng({}, {})", self.latitude, self.longitude)
    }
}

/// Stable identity of an individually addressable entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CSS class carried by every edge drawn from this entity.
    pub fn edge_class(&self) -> String {
        format!("{}-event", self.0)
    }

    /// CSS class carried by this entity's permanent label.
    pub fn label_class(&self) -> String {
        format!("{}-marker-label", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Marker,
    Circle,
    Polygon,
    Route,
}

impl EntityKind {
    /// Areal kinds are centred on their bounding box, point kinds on their mean.
    pub fn is_areal(&self) -> bool {
        matches!(self, EntityKind::Polygon | EntityKind::Route)
    }
}

/// Semantic category of a bulk layer group. One group exists per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerCategory {
    Markers,
    Polygons,
    Clusters,
    Heat,
    Routes,
}

impl LayerCategory {
    pub const ALL: [LayerCategory; 5] = [
        LayerCategory::Markers,
        LayerCategory::Polygons,
        LayerCategory::Clusters,
        LayerCategory::Heat,
        LayerCategory::Routes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LayerCategory::Markers => "markers",
            LayerCategory::Polygons => "polygons",
            LayerCategory::Clusters => "clusters",
            LayerCategory::Heat => "heat",
            LayerCategory::Routes => "routes",
        }
    }

    /// Group a backend layer lands in, given how this deployment draws points.
    pub fn for_layer(kind: DataKind, rendering: PointRendering) -> Option<LayerCategory> {
        match kind {
            DataKind::Point => Some(rendering.category()),
            DataKind::Polygon => Some(LayerCategory::Polygons),
            DataKind::Unsupported => None,
        }
    }
}

impl fmt::Display for LayerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How point layers are drawn in a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PointRendering {
    #[default]
    Markers,
    CircleMarkers,
    Heat,
    Cluster,
}

impl PointRendering {
    pub fn category(&self) -> LayerCategory {
        match self {
            PointRendering::Markers | PointRendering::CircleMarkers => LayerCategory::Markers,
            PointRendering::Heat => LayerCategory::Heat,
            PointRendering::Cluster => LayerCategory::Clusters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_range_check() {
        assert!(LatLng::new(10.0, 20.0).is_valid());
        assert!(LatLng::new(-90.0, 180.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, f64::NAN).is_valid());

        let err = LatLng::new(0.0, 200.0).validate().unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_entity_id_classes() {
        let id = EntityId::from("truck-7");
        assert_eq!(id.edge_class(), "truck-7-event");
        assert_eq!(id.label_class(), "truck-7-marker-label");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""truck-7""#);
    }

    #[test]
    fn test_category_for_layer() {
        assert_eq!(
            LayerCategory::for_layer(DataKind::Point, PointRendering::Heat),
            Some(LayerCategory::Heat)
        );
        assert_eq!(
            LayerCategory::for_layer(DataKind::Point, PointRendering::CircleMarkers),
            Some(LayerCategory::Markers)
        );
        assert_eq!(
            LayerCategory::for_layer(DataKind::Polygon, PointRendering::Cluster),
            Some(LayerCategory::Polygons)
        );
        assert_eq!(
            LayerCategory::for_layer(DataKind::Unsupported, PointRendering::Markers),
            None
        );
    }
}
