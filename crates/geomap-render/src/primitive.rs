use crate::style::{HeatOptions, PathStyle};
use geomap_core::LatLng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub content: String,
    pub open: bool,
    pub auto_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelDirection {
    Top,
    Bottom,
    Left,
    Right,
}

/// Permanent tooltip rendered next to a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    /// Space separated class list.
    pub class_name: String,
    pub direction: LabelDirection,
    pub offset: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPrimitive {
    pub position: LatLng,
    pub title: Option<String>,
    pub icon: Option<Icon>,
    pub draggable: bool,
    pub label: Option<Label>,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleMarkerPrimitive {
    pub center: LatLng,
    pub radius_px: f64,
    pub style: PathStyle,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CirclePrimitive {
    pub center: LatLng,
    pub radius_m: f64,
    pub style: PathStyle,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonPrimitive {
    /// One entry per polygon; each polygon is its outer ring followed by holes.
    pub polygons: Vec<Vec<Vec<LatLng>>>,
    pub style: PathStyle,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylinePrimitive {
    pub points: Vec<LatLng>,
    pub style: PathStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatPrimitive {
    pub points: Vec<LatLng>,
    pub options: HeatOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPrimitive {
    pub members: Vec<MarkerPrimitive>,
}

/// Waypoints handed to the routing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePrimitive {
    pub waypoints: Vec<LatLng>,
}

/// A renderable object the canvas understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Marker(MarkerPrimitive),
    CircleMarker(CircleMarkerPrimitive),
    Circle(CirclePrimitive),
    Polygon(PolygonPrimitive),
    Polyline(PolylinePrimitive),
    Heat(HeatPrimitive),
    Cluster(ClusterPrimitive),
    Route(RoutePrimitive),
}

impl Primitive {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Primitive::Marker(_) => "marker",
            Primitive::CircleMarker(_) => "circle_marker",
            Primitive::Circle(_) => "circle",
            Primitive::Polygon(_) => "polygon",
            Primitive::Polyline(_) => "polyline",
            Primitive::Heat(_) => "heat",
            Primitive::Cluster(_) => "cluster",
            Primitive::Route(_) => "route",
        }
    }

    pub fn points(&self) -> Vec<LatLng> {
        match self {
            Primitive::Marker(m) => vec![m.position],
            Primitive::CircleMarker(c) => vec![c.center],
            Primitive::Circle(c) => vec![c.center],
            Primitive::Polygon(p) => p.polygons.iter().flatten().flatten().copied().collect(),
            Primitive::Polyline(l) => l.points.clone(),
            Primitive::Heat(h) => h.points.clone(),
            Primitive::Cluster(c) => c.members.iter().map(|m| m.position).collect(),
            Primitive::Route(r) => r.waypoints.clone(),
        }
    }

    /// Class tokens on the primitive's own element.
    pub fn element_classes(&self) -> Vec<&str> {
        let style = match self {
            Primitive::CircleMarker(c) => Some(&c.style),
            Primitive::Circle(c) => Some(&c.style),
            Primitive::Polygon(p) => Some(&p.style),
            Primitive::Polyline(l) => Some(&l.style),
            _ => None,
        };
        style
            .and_then(|s| s.class_name.as_deref())
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Class tokens on the marker's label element, if it has one.
    pub fn label_classes(&self) -> Vec<&str> {
        match self {
            Primitive::Marker(MarkerPrimitive {
                label: Some(label), ..
            }) => label.class_name.split_whitespace().collect(),
            _ => Vec::new(),
        }
    }
}
