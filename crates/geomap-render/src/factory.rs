//! Geo Primitive Factory
//!
//! Stateless conversion from typed descriptors and validated layer features
//! into canvas primitives. Nothing here touches the canvas.

use crate::primitive::{
    CircleMarkerPrimitive, CirclePrimitive, ClusterPrimitive, HeatPrimitive, Icon, Label,
    LabelDirection, MarkerPrimitive, PolygonPrimitive, PolylinePrimitive, Popup, Primitive,
    RoutePrimitive,
};
use crate::style::{
    CIRCLE_MARKER_RADIUS, DEFAULT_PIN_ICON_URL, ENTITY_ICON_SIZE, FEATURE_ICON_SIZE, HeatOptions,
    LABEL_EXTRA_CLASS, LABEL_OFFSET, POPUP_VALUE_MAX_CHARS, PathStyle,
};
use geomap_core::{
    EntityDescriptor, EntityId, LatLng, LayerCategory, LayerFeature, PointRendering, PopupSpec,
    Shape,
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct GeoPrimitiveFactory {
    point_rendering: PointRendering,
    heat: HeatOptions,
}

impl GeoPrimitiveFactory {
    pub fn new(point_rendering: PointRendering, heat: HeatOptions) -> Self {
        Self {
            point_rendering,
            heat,
        }
    }

    pub fn point_rendering(&self) -> PointRendering {
        self.point_rendering
    }

    // ------------------------------------------------------------------------
    // Individually addressable entities
    // ------------------------------------------------------------------------

    pub fn entity(&self, descriptor: &EntityDescriptor) -> Primitive {
        match descriptor {
            EntityDescriptor::Marker(marker) => Primitive::Marker(MarkerPrimitive {
                position: marker.coordinates,
                title: Some(marker.name.clone()),
                icon: marker.icon.as_ref().map(|icon| {
                    let size = icon.size.unwrap_or(ENTITY_ICON_SIZE);
                    Icon {
                        url: icon.url.clone(),
                        width: size.width,
                        height: size.height,
                    }
                }),
                draggable: marker.draggable,
                label: Some(Label {
                    text: marker.name.clone(),
                    class_name: format!("{} {}", marker.id.label_class(), LABEL_EXTRA_CLASS),
                    direction: LabelDirection::Bottom,
                    offset: LABEL_OFFSET,
                }),
                popup: popup_from_spec(marker.popup.as_ref()),
            }),
            EntityDescriptor::Circle(circle) => Primitive::Circle(CirclePrimitive {
                center: circle.coordinates,
                radius_m: circle.style.radius,
                style: PathStyle::entity_circle(&circle.style),
                popup: popup_from_spec(circle.popup.as_ref()),
            }),
            EntityDescriptor::Polygon(polygon) => Primitive::Polygon(PolygonPrimitive {
                polygons: vec![vec![polygon.coordinates.clone()]],
                style: PathStyle::entity_polygon(),
                popup: popup_from_spec(polygon.popup.as_ref()),
            }),
            EntityDescriptor::Route(route) => self.route(&route.waypoints),
        }
    }

    pub fn edge(&self, source_id: &EntityId, from: LatLng, to: LatLng) -> Primitive {
        Primitive::Polyline(PolylinePrimitive {
            points: vec![from, to],
            style: PathStyle::edge(source_id),
        })
    }

    pub fn route(&self, waypoints: &[LatLng]) -> Primitive {
        Primitive::Route(RoutePrimitive {
            waypoints: waypoints.to_vec(),
        })
    }

    // ------------------------------------------------------------------------
    // Bulk layer features
    // ------------------------------------------------------------------------

    /// Primitives for one bulk group. Heat and cluster groups collapse every
    /// point into a single primitive; an empty input yields nothing.
    pub fn features(&self, category: LayerCategory, features: &[LayerFeature]) -> Vec<Primitive> {
        match category {
            LayerCategory::Markers => features
                .iter()
                .flat_map(|f| self.point_primitives(f))
                .collect(),
            LayerCategory::Polygons => features.iter().flat_map(area_primitives).collect(),
            LayerCategory::Heat => {
                let points: Vec<LatLng> = features.iter().flat_map(feature_points).collect();
                if points.is_empty() {
                    return Vec::new();
                }
                vec![Primitive::Heat(HeatPrimitive {
                    points,
                    options: self.heat.clone(),
                })]
            }
            // Cluster members carry no popup.
            LayerCategory::Clusters => {
                let members: Vec<MarkerPrimitive> = features
                    .iter()
                    .flat_map(|f| {
                        feature_points(f)
                            .into_iter()
                            .map(move |point| MarkerPrimitive {
                                popup: None,
                                ..feature_marker(point, &f.properties, None)
                            })
                    })
                    .collect();
                if members.is_empty() {
                    return Vec::new();
                }
                vec![Primitive::Cluster(ClusterPrimitive { members })]
            }
            LayerCategory::Routes => features
                .iter()
                .filter_map(|f| match &f.shape {
                    Shape::Line(points) | Shape::MultiPoint(points) if points.len() >= 2 => {
                        Some(self.route(points))
                    }
                    _ => {
                        tracing::warn!("Skipping non-line feature in routes layer");
                        None
                    }
                })
                .collect(),
        }
    }

    fn point_primitives(&self, feature: &LayerFeature) -> Vec<Primitive> {
        feature_points(feature)
            .into_iter()
            .map(|point| match self.point_rendering {
                PointRendering::CircleMarkers => Primitive::CircleMarker(CircleMarkerPrimitive {
                    center: point,
                    radius_px: CIRCLE_MARKER_RADIUS,
                    style: PathStyle::feature_circle_marker(feature.property_str("color")),
                    popup: Some(property_popup(&feature.properties)),
                }),
                _ => Primitive::Marker(feature_marker(
                    point,
                    &feature.properties,
                    feature.property_str("color_or_img"),
                )),
            })
            .collect()
    }
}

/// Points of a point-like feature; other shapes are skipped with a warning.
fn feature_points(feature: &LayerFeature) -> Vec<LatLng> {
    match &feature.shape {
        Shape::Point(point) => vec![*point],
        Shape::MultiPoint(points) => points.clone(),
        other => {
            tracing::warn!("Skipping {} feature in point layer", shape_name(other));
            Vec::new()
        }
    }
}

fn shape_name(shape: &Shape) -> &'static str {
    match shape {
        Shape::Point(_) => "Point",
        Shape::MultiPoint(_) => "MultiPoint",
        Shape::Line(_) => "LineString",
        Shape::Polygon(_) => "Polygon",
        Shape::MultiPolygon(_) => "MultiPolygon",
    }
}

fn feature_marker(
    point: LatLng,
    properties: &Map<String, Value>,
    icon_url: Option<&str>,
) -> MarkerPrimitive {
    MarkerPrimitive {
        position: point,
        title: None,
        icon: Some(Icon {
            url: icon_url.unwrap_or(DEFAULT_PIN_ICON_URL).to_string(),
            width: FEATURE_ICON_SIZE.width,
            height: FEATURE_ICON_SIZE.height,
        }),
        draggable: false,
        label: None,
        popup: Some(property_popup(properties)),
    }
}

/// Polygon layers draw whatever geometry they are given.
fn area_primitives(feature: &LayerFeature) -> Vec<Primitive> {
    let style = PathStyle::feature_polygon(feature.property_str("color"));
    let popup = Some(property_popup(&feature.properties));
    match &feature.shape {
        Shape::Polygon(rings) => vec![Primitive::Polygon(PolygonPrimitive {
            polygons: vec![rings.clone()],
            style,
            popup,
        })],
        Shape::MultiPolygon(polygons) => vec![Primitive::Polygon(PolygonPrimitive {
            polygons: polygons.clone(),
            style,
            popup,
        })],
        Shape::Line(points) => vec![Primitive::Polyline(PolylinePrimitive {
            points: points.clone(),
            style,
        })],
        Shape::Point(point) => vec![Primitive::Marker(feature_marker(
            *point,
            &feature.properties,
            None,
        ))],
        Shape::MultiPoint(points) => points
            .iter()
            .map(|p| Primitive::Marker(feature_marker(*p, &feature.properties, None)))
            .collect(),
    }
}

fn popup_from_spec(spec: Option<&PopupSpec>) -> Option<Popup> {
    spec.filter(|p| p.enabled).map(|p| Popup {
        content: p.content.clone(),
        open: p.opened,
        auto_close: false,
    })
}

fn property_popup(properties: &Map<String, Value>) -> Popup {
    Popup {
        content: property_table(properties),
        open: false,
        auto_close: true,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn display_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(POPUP_VALUE_MAX_CHARS).collect()
}

/// HTML table of feature properties. `imageUrl` renders as an image below
/// the table instead of a row.
pub fn property_table(properties: &Map<String, Value>) -> String {
    let heading = properties
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Feature");

    let mut html = format!(
        "<h4 class=\"text-primary\">{}</h4><div class=\"container\"><table class=\"table table-striped\"><thead><tr><th>Properties</th><th>Value</th></tr></thead><tbody>",
        escape_html(heading)
    );
    let mut images = Vec::new();

    for (key, value) in properties {
        if key == "imageUrl" {
            if let Some(url) = value.as_str() {
                images.push(url);
            }
            continue;
        }
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(key),
            escape_html(&display_value(value))
        ));
    }
    html.push_str("</tbody></table>");

    for url in images {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"Image\" width=\"200px\" height=\"200px\">",
            escape_html(url)
        ));
    }
    html.push_str("</div>");
    html
}
