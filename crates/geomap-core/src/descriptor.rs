//! Typed entity descriptors.
//!
//! Each individually addressable entity enters the map through one of these
//! variants. Descriptors are validated before any primitive is built.

use crate::{DescriptorError, EntityId, EntityKind, LatLng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupSpec {
    pub enabled: bool,
    pub content: String,
    #[serde(default)]
    pub opened: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSpec {
    pub url: String,
    #[serde(default)]
    pub size: Option<IconSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    /// Radius in meters.
    pub radius: f64,
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            fill_color: "#3388ff".to_string(),
            fill_opacity: 0.2,
            radius: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescriptor {
    pub id: EntityId,
    pub name: String,
    pub coordinates: LatLng,
    #[serde(default)]
    pub icon: Option<IconSpec>,
    #[serde(default)]
    pub draggable: bool,
    #[serde(default)]
    pub popup: Option<PopupSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleDescriptor {
    pub id: EntityId,
    pub coordinates: LatLng,
    #[serde(default)]
    pub style: CircleStyle,
    #[serde(default)]
    pub popup: Option<PopupSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonDescriptor {
    pub id: EntityId,
    pub coordinates: Vec<LatLng>,
    #[serde(default)]
    pub popup: Option<PopupSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub id: EntityId,
    pub waypoints: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDescriptor {
    Marker(MarkerDescriptor),
    Circle(CircleDescriptor),
    Polygon(PolygonDescriptor),
    Route(RouteDescriptor),
}

impl EntityDescriptor {
    pub fn id(&self) -> &EntityId {
        match self {
            EntityDescriptor::Marker(m) => &m.id,
            EntityDescriptor::Circle(c) => &c.id,
            EntityDescriptor::Polygon(p) => &p.id,
            EntityDescriptor::Route(r) => &r.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDescriptor::Marker(_) => EntityKind::Marker,
            EntityDescriptor::Circle(_) => EntityKind::Circle,
            EntityDescriptor::Polygon(_) => EntityKind::Polygon,
            EntityDescriptor::Route(_) => EntityKind::Route,
        }
    }

    /// Coordinates in drawing order: one for point kinds, the ring or
    /// waypoint list otherwise.
    pub fn points(&self) -> &[LatLng] {
        match self {
            EntityDescriptor::Marker(m) => std::slice::from_ref(&m.coordinates),
            EntityDescriptor::Circle(c) => std::slice::from_ref(&c.coordinates),
            EntityDescriptor::Polygon(p) => &p.coordinates,
            EntityDescriptor::Route(r) => &r.waypoints,
        }
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.id().as_str().trim().is_empty() {
            return Err(DescriptorError::EmptyId);
        }
        for point in self.points() {
            point.validate()?;
        }
        match self {
            EntityDescriptor::Polygon(p) if p.coordinates.len() < 3 => {
                Err(DescriptorError::TooFewVertices {
                    kind: "Polygon",
                    required: 3,
                    found: p.coordinates.len(),
                })
            }
            EntityDescriptor::Route(r) if r.waypoints.len() < 2 => {
                Err(DescriptorError::TooFewVertices {
                    kind: "Route",
                    required: 2,
                    found: r.waypoints.len(),
                })
            }
            EntityDescriptor::Circle(c)
                if !(c.style.radius.is_finite() && c.style.radius > 0.0) =>
            {
                Err(DescriptorError::InvalidRadius(c.style.radius))
            }
            _ => Ok(()),
        }
    }
}

impl From<MarkerDescriptor> for EntityDescriptor {
    fn from(value: MarkerDescriptor) -> Self {
        EntityDescriptor::Marker(value)
    }
}

impl From<CircleDescriptor> for EntityDescriptor {
    fn from(value: CircleDescriptor) -> Self {
        EntityDescriptor::Circle(value)
    }
}

impl From<PolygonDescriptor> for EntityDescriptor {
    fn from(value: PolygonDescriptor) -> Self {
        EntityDescriptor::Polygon(value)
    }
}

impl From<RouteDescriptor> for EntityDescriptor {
    fn from(value: RouteDescriptor) -> Self {
        EntityDescriptor::Route(value)
    }
}

/// A line between two registered entities, resolved by id when drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDescriptor {
    pub source_id: EntityId,
    pub target_id: EntityId,
}

impl LineDescriptor {
    pub fn new(source_id: impl Into<EntityId>, target_id: impl Into<EntityId>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: &str, lat: f64, lng: f64) -> EntityDescriptor {
        EntityDescriptor::Marker(MarkerDescriptor {
            id: id.into(),
            name: id.to_string(),
            coordinates: LatLng::new(lat, lng),
            icon: None,
            draggable: false,
            popup: None,
        })
    }

    #[test]
    fn test_marker_deserialization() {
        let json = r#"{
            "kind": "marker",
            "id": "m1",
            "name": "Depot",
            "coordinates": {"latitude": 10.0, "longitude": 20.0},
            "popup": {"enabled": true, "content": "<b>Depot</b>"}
        }"#;
        let descriptor: EntityDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind(), EntityKind::Marker);
        assert_eq!(descriptor.id().as_str(), "m1");
        assert_eq!(descriptor.points(), &[LatLng::new(10.0, 20.0)]);
        match descriptor {
            EntityDescriptor::Marker(m) => {
                let popup = m.popup.unwrap();
                assert!(popup.enabled);
                assert!(!popup.opened);
                assert!(!m.draggable);
            }
            other => panic!("Expected marker, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_style_camel_case() {
        let json = r#"{
            "kind": "circle",
            "id": "c1",
            "coordinates": {"latitude": 1.0, "longitude": 2.0},
            "style": {"color": "red", "fillColor": "pink", "fillOpacity": 0.5, "radius": 300.0}
        }"#;
        let descriptor: EntityDescriptor = serde_json::from_str(json).unwrap();
        let EntityDescriptor::Circle(circle) = descriptor else {
            panic!("Expected circle");
        };
        assert_eq!(circle.style.fill_color, "pink");
        assert_eq!(circle.style.radius, 300.0);
    }

    #[test]
    fn test_validation() {
        assert!(marker("a", 10.0, 20.0).validate().is_ok());
        assert_eq!(
            marker("  ", 10.0, 20.0).validate(),
            Err(DescriptorError::EmptyId)
        );
        assert!(matches!(
            marker("a", 100.0, 20.0).validate(),
            Err(DescriptorError::InvalidCoordinate { .. })
        ));

        let polygon = EntityDescriptor::Polygon(PolygonDescriptor {
            id: "p".into(),
            coordinates: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            popup: None,
        });
        assert_eq!(
            polygon.validate(),
            Err(DescriptorError::TooFewVertices {
                kind: "Polygon",
                required: 3,
                found: 2
            })
        );

        let circle = EntityDescriptor::Circle(CircleDescriptor {
            id: "c".into(),
            coordinates: LatLng::new(0.0, 0.0),
            style: CircleStyle {
                radius: 0.0,
                ..CircleStyle::default()
            },
            popup: None,
        });
        assert_eq!(circle.validate(), Err(DescriptorError::InvalidRadius(0.0)));
    }

    #[test]
    fn test_line_descriptor_camel_case() {
        let line: LineDescriptor =
            serde_json::from_str(r#"{"sourceId": "a", "targetId": "b"}"#).unwrap();
        assert_eq!(line, LineDescriptor::new("a", "b"));
    }
}
