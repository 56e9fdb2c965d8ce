use geomap_core::{EntityId, LatLng, LayerFeature, MarkerDescriptor, Shape};
use serde_json::{Map, Value};

/// Markers spread over a grid, ids `m0..m{count}`.
pub fn synthetic_markers(count: usize) -> Vec<MarkerDescriptor> {
    (0..count)
        .map(|i| MarkerDescriptor {
            id: EntityId::new(format!("m{}", i)),
            name: format!("Marker {}", i),
            coordinates: grid_point(i),
            icon: None,
            draggable: false,
            popup: None,
        })
        .collect()
}

/// Square polygon features with a handful of properties each.
pub fn synthetic_polygons(count: usize) -> Vec<LayerFeature> {
    (0..count)
        .map(|i| {
            let origin = grid_point(i);
            let mut properties = Map::new();
            properties.insert("name".to_string(), Value::from(format!("District {}", i)));
            properties.insert("population".to_string(), Value::from(i * 1000));
            properties.insert("color".to_string(), Value::from("#22aa66"));
            LayerFeature {
                properties,
                shape: Shape::Polygon(vec![vec![
                    origin,
                    LatLng::new(origin.latitude, origin.longitude + 0.5),
                    LatLng::new(origin.latitude + 0.5, origin.longitude + 0.5),
                    LatLng::new(origin.latitude + 0.5, origin.longitude),
                ]]),
            }
        })
        .collect()
}

fn grid_point(i: usize) -> LatLng {
    LatLng::new((i % 150) as f64 * 0.5 - 75.0, (i / 150) as f64 * 0.5 - 170.0)
}
