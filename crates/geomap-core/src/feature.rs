//! GeoJSON payloads as delivered by the layer data endpoint, and the typed
//! `LayerFeature` they are converted into at the data-source boundary.

use crate::{DescriptorError, LatLng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON position: `[longitude, latitude, (altitude)]`.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    /// Any other geometry type, such as `GeometryCollection`.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    /// `null` in GeoJSON for unlocated features.
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<GeoFeature>,
}

/// The layer data endpoint returns either a bare feature array or a
/// `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LayerPayload {
    Features(Vec<GeoFeature>),
    Collection(FeatureCollection),
}

impl LayerPayload {
    pub fn into_features(self) -> Vec<GeoFeature> {
        match self {
            LayerPayload::Features(features) => features,
            LayerPayload::Collection(collection) => collection.features,
        }
    }
}

/// Validated geometry in latitude/longitude order.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(LatLng),
    MultiPoint(Vec<LatLng>),
    Line(Vec<LatLng>),
    /// Outer ring first, holes after.
    Polygon(Vec<Vec<LatLng>>),
    MultiPolygon(Vec<Vec<Vec<LatLng>>>),
}

impl Shape {
    /// Every vertex, flattened.
    pub fn points(&self) -> Vec<LatLng> {
        match self {
            Shape::Point(p) => vec![*p],
            Shape::MultiPoint(points) | Shape::Line(points) => points.clone(),
            Shape::Polygon(rings) => rings.iter().flatten().copied().collect(),
            Shape::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().copied().collect()
            }
        }
    }

    pub fn is_areal(&self) -> bool {
        matches!(self, Shape::Polygon(_) | Shape::MultiPolygon(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerFeature {
    pub properties: Map<String, Value>,
    pub shape: Shape,
}

impl LayerFeature {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn to_lat_lng(position: &Position) -> Result<LatLng, DescriptorError> {
    match position.as_slice() {
        [longitude, latitude, ..] => {
            let point = LatLng::new(*latitude, *longitude);
            point.validate()?;
            Ok(point)
        }
        other => Err(DescriptorError::MalformedPosition(other.len())),
    }
}

fn to_path(positions: &[Position]) -> Result<Vec<LatLng>, DescriptorError> {
    positions.iter().map(to_lat_lng).collect()
}

fn to_rings(rings: &[Vec<Position>]) -> Result<Vec<Vec<LatLng>>, DescriptorError> {
    let rings = rings
        .iter()
        .map(|ring| to_path(ring))
        .collect::<Result<Vec<_>, _>>()?;
    match rings.first() {
        Some(outer) if outer.len() >= 3 => Ok(rings),
        outer => Err(DescriptorError::TooFewVertices {
            kind: "Polygon",
            required: 3,
            found: outer.map(Vec::len).unwrap_or(0),
        }),
    }
}

impl GeoFeature {
    pub fn into_layer_feature(self) -> Result<LayerFeature, DescriptorError> {
        let geometry = self
            .geometry
            .as_ref()
            .ok_or(DescriptorError::MissingGeometry)?;
        let shape = match geometry {
            Geometry::Point { coordinates } => Shape::Point(to_lat_lng(coordinates)?),
            Geometry::MultiPoint { coordinates } => Shape::MultiPoint(to_path(coordinates)?),
            Geometry::LineString { coordinates } => {
                let line = to_path(coordinates)?;
                if line.len() < 2 {
                    return Err(DescriptorError::TooFewVertices {
                        kind: "LineString",
                        required: 2,
                        found: line.len(),
                    });
                }
                Shape::Line(line)
            }
            Geometry::Polygon { coordinates } => Shape::Polygon(to_rings(coordinates)?),
            Geometry::MultiPolygon { coordinates } => Shape::MultiPolygon(
                coordinates
                    .iter()
                    .map(|polygon| to_rings(polygon))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Geometry::Unsupported => return Err(DescriptorError::UnsupportedGeometry),
        };
        Ok(LayerFeature {
            properties: self.properties.unwrap_or_default(),
            shape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_swaps_axis_order() {
        let json = r#"{
            "type": "Feature",
            "properties": {"color": "red"},
            "geometry": {"type": "Point", "coordinates": [20.5, 10.25]}
        }"#;
        let feature: GeoFeature = serde_json::from_str(json).unwrap();
        let feature = feature.into_layer_feature().unwrap();
        assert_eq!(feature.shape, Shape::Point(LatLng::new(10.25, 20.5)));
        assert_eq!(feature.property_str("color"), Some("red"));
    }

    #[test]
    fn test_payload_accepts_collection_and_array() {
        let array = r#"[{"geometry": {"type": "Point", "coordinates": [1, 2]}}]"#;
        let collection = r#"{
            "type": "FeatureCollection",
            "features": [{"properties": null, "geometry": {"type": "Point", "coordinates": [1, 2, 30]}}]
        }"#;

        let a: LayerPayload = serde_json::from_str(array).unwrap();
        let c: LayerPayload = serde_json::from_str(collection).unwrap();
        assert_eq!(a.into_features().len(), 1);

        let features = c.into_features();
        assert_eq!(features.len(), 1);
        let feature = features.into_iter().next().unwrap().into_layer_feature().unwrap();
        assert!(feature.properties.is_empty());
        assert_eq!(feature.shape, Shape::Point(LatLng::new(2.0, 1.0)));
    }

    #[test]
    fn test_polygon_validation() {
        let feature = GeoFeature {
            properties: None,
            geometry: Some(Geometry::Polygon {
                coordinates: vec![vec![vec![0.0, 0.0], vec![1.0, 1.0]]],
            }),
        };
        assert!(matches!(
            feature.into_layer_feature(),
            Err(DescriptorError::TooFewVertices { found: 2, .. })
        ));

        let malformed = GeoFeature {
            properties: None,
            geometry: Some(Geometry::Point {
                coordinates: vec![1.0],
            }),
        };
        assert_eq!(
            malformed.into_layer_feature(),
            Err(DescriptorError::MalformedPosition(1))
        );
    }

    #[test]
    fn test_null_and_unsupported_geometry_parse_but_do_not_convert() {
        let json = r#"[
            {"properties": {"name": "nowhere"}, "geometry": null},
            {"properties": {}},
            {"geometry": {"type": "GeometryCollection", "geometries": []}}
        ]"#;
        let features = serde_json::from_str::<LayerPayload>(json)
            .unwrap()
            .into_features();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].geometry, None);
        assert_eq!(features[2].geometry, Some(Geometry::Unsupported));

        let errors: Vec<DescriptorError> = features
            .into_iter()
            .map(|f| f.into_layer_feature().unwrap_err())
            .collect();
        assert_eq!(
            errors,
            vec![
                DescriptorError::MissingGeometry,
                DescriptorError::MissingGeometry,
                DescriptorError::UnsupportedGeometry,
            ]
        );
    }

    #[test]
    fn test_shape_points_flatten() {
        let shape = Shape::MultiPolygon(vec![
            vec![vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 1.0),
                LatLng::new(1.0, 1.0),
            ]],
            vec![vec![
                LatLng::new(5.0, 5.0),
                LatLng::new(5.0, 6.0),
                LatLng::new(6.0, 6.0),
            ]],
        ]);
        assert_eq!(shape.points().len(), 6);
        assert!(shape.is_areal());
    }
}
