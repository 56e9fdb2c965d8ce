use async_trait::async_trait;
use geomap_app::{MapController, ToggleOutcome};
use geomap_core::{
    DataKind, GeoFeature, Geometry, LayerCategory, LayerFeature, LayerInfo, PointRendering,
    ProjectInfo,
};
use geomap_events::{Event, EventBus, Notification};
use geomap_render::{MapView, MapViewConfig, Primitive, RecordingCanvas, ViewTransition};
use geomap_source::{DataSource, MemoryDataSource, SourceError};
use std::sync::Arc;
use tokio::sync::Notify;

const POINTS: &str = "10";
const DISTRICTS: &str = "20";

fn point(lng: f64, lat: f64) -> GeoFeature {
    GeoFeature {
        properties: serde_json::json!({"name": "Lamp"}).as_object().cloned(),
        geometry: Some(Geometry::Point {
            coordinates: vec![lng, lat],
        }),
    }
}

fn square(origin: f64) -> GeoFeature {
    GeoFeature {
        properties: None,
        geometry: Some(Geometry::Polygon {
            coordinates: vec![vec![
                vec![origin, origin],
                vec![origin + 2.0, origin],
                vec![origin + 2.0, origin + 2.0],
                vec![origin, origin + 2.0],
                vec![origin, origin],
            ]],
        }),
    }
}

fn backend() -> MemoryDataSource {
    MemoryDataSource::new()
        .with_project(
            ProjectInfo {
                id: "1".to_string(),
                name: "City".to_string(),
            },
            vec![
                LayerInfo {
                    id: POINTS.to_string(),
                    name: "Lamps".to_string(),
                    data_kind: DataKind::Point,
                },
                LayerInfo {
                    id: DISTRICTS.to_string(),
                    name: "Districts".to_string(),
                    data_kind: DataKind::Polygon,
                },
            ],
        )
        .with_layer_data(POINTS, vec![point(20.0, 10.0), point(40.0, 30.0)])
        .with_layer_data(DISTRICTS, vec![square(0.0), square(10.0)])
}

fn view(config: MapViewConfig) -> MapView<RecordingCanvas> {
    MapView::new(RecordingCanvas::new(), config)
}

/// Holds every layer fetch until the test releases it.
struct GatedSource {
    inner: MemoryDataSource,
    started: Notify,
    release: Notify,
}

impl GatedSource {
    fn new(inner: MemoryDataSource) -> Self {
        Self {
            inner,
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl DataSource for GatedSource {
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>, SourceError> {
        self.inner.list_projects().await
    }

    async fn list_layers(&self, project_id: &str) -> Result<Vec<LayerInfo>, SourceError> {
        self.inner.list_layers(project_id).await
    }

    async fn fetch_layer_data(&self, layer_id: &str) -> Result<Vec<LayerFeature>, SourceError> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.fetch_layer_data(layer_id).await
    }
}

/// Toggle on, toggle off while the fetch is pending, then let the fetch
/// resolve.
async fn on_off_race(
    controller: &MapController<RecordingCanvas, GatedSource>,
) -> ToggleOutcome {
    let source = Arc::clone(controller.source());
    let toggle_on = controller.toggle_layer(DISTRICTS, true);
    let toggle_off = async {
        source.started.notified().await;
        let cleared = controller.toggle_layer(DISTRICTS, false).await.unwrap();
        assert!(matches!(cleared, ToggleOutcome::Cleared { .. }));
        source.release.notify_one();
    };
    let (on, ()) = tokio::join!(toggle_on, toggle_off);
    on.unwrap()
}

#[tokio::test]
async fn test_toggle_on_populates_group_and_fits_once() {
    let controller = MapController::new(view(MapViewConfig::default()), backend());
    let layers = controller.select_project("1").await.unwrap();
    assert_eq!(layers.len(), 2);

    let outcome = controller.toggle_layer(DISTRICTS, true).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Applied {
            category: LayerCategory::Polygons,
            placed: 2
        }
    );

    controller.with_view(|view| {
        let requests = view.canvas().viewport_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].center.latitude, 6.0);
        assert_eq!(requests[0].center.longitude, 6.0);
        assert_eq!(requests[0].zoom, 6.0);
        assert_eq!(requests[0].transition, ViewTransition::Animate);
    });
}

#[tokio::test]
async fn test_toggle_off_then_on_refetches() {
    let controller = MapController::new(view(MapViewConfig::default()), backend());
    controller.select_project("1").await.unwrap();

    controller.toggle_layer(POINTS, true).await.unwrap();
    let cleared = controller.toggle_layer(POINTS, false).await.unwrap();
    assert_eq!(
        cleared,
        ToggleOutcome::Cleared {
            category: LayerCategory::Markers,
            removed: 2
        }
    );
    assert!(controller.with_view(|view| view.groups().is_empty(LayerCategory::Markers)));

    controller.toggle_layer(POINTS, true).await.unwrap();
    assert_eq!(
        controller.source().fetch_log(),
        vec![POINTS.to_string(), POINTS.to_string()]
    );
    assert_eq!(controller.checked_layers(), vec![POINTS.to_string()]);
}

#[tokio::test]
async fn test_point_rendering_selects_group() {
    let config = MapViewConfig {
        point_rendering: PointRendering::Heat,
        ..MapViewConfig::default()
    };
    let controller = MapController::new(view(config), backend());
    controller.select_project("1").await.unwrap();

    let outcome = controller.toggle_layer(POINTS, true).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Applied {
            category: LayerCategory::Heat,
            placed: 1
        }
    );
    controller.with_view(|view| {
        let handle = view.groups().handles(LayerCategory::Heat)[0];
        let Primitive::Heat(heat) = &view.canvas().get(handle).unwrap().primitive else {
            panic!("Expected heat primitive");
        };
        assert_eq!(heat.points.len(), 2);
        assert_eq!(view.canvas().viewport().unwrap().center.latitude, 20.0);
    });
}

#[tokio::test]
async fn test_fetch_failure_keeps_prior_group() {
    let controller = MapController::new(view(MapViewConfig::default()), backend());
    let notifications = controller.events();
    controller.select_project("1").await.unwrap();
    controller.toggle_layer(DISTRICTS, true).await.unwrap();

    controller.source().set_failing(DISTRICTS, true);
    let bus = EventBus::new();
    bus.publish(Event::LayerToggled {
        layer_id: DISTRICTS.to_string(),
        checked: true,
    });
    assert_eq!(controller.pump(&bus).await, 1);

    assert_eq!(
        controller.with_view(|view| view.groups().len(LayerCategory::Polygons)),
        2
    );
    let failed = notifications
        .try_iter()
        .find(|n| matches!(n, Notification::LayerFetchFailed { .. }));
    match failed {
        Some(Notification::LayerFetchFailed { layer_id, reason, .. }) => {
            assert_eq!(layer_id, DISTRICTS);
            assert!(reason.contains("500"));
        }
        other => panic!("Expected LayerFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stale_response_discarded_with_guard() {
    let controller = MapController::new(
        view(MapViewConfig::default()),
        GatedSource::new(backend()),
    );
    let notifications = controller.events();
    controller.select_project("1").await.unwrap();

    let outcome = on_off_race(&controller).await;

    assert_eq!(
        outcome,
        ToggleOutcome::Stale {
            category: LayerCategory::Polygons,
            sequence: 1
        }
    );
    assert!(controller.with_view(|view| view.groups().is_empty(LayerCategory::Polygons)));
    assert!(controller.with_view(|view| view.canvas().primitive_count() == 0));
    assert!(
        notifications
            .try_iter()
            .any(|n| matches!(n, Notification::StaleResponseDiscarded { .. }))
    );
}

#[tokio::test]
async fn test_stale_response_applies_without_guard() {
    let config = MapViewConfig {
        sequencing_guard: false,
        ..MapViewConfig::default()
    };
    let controller = MapController::new(view(config), GatedSource::new(backend()));
    controller.select_project("1").await.unwrap();

    let outcome = on_off_race(&controller).await;

    assert_eq!(
        outcome,
        ToggleOutcome::Applied {
            category: LayerCategory::Polygons,
            placed: 2
        }
    );
    assert_eq!(
        controller.with_view(|view| view.groups().len(LayerCategory::Polygons)),
        2
    );
    assert!(controller.checked_layers().is_empty());
}

#[tokio::test]
async fn test_pump_handles_events_in_order() {
    let controller = MapController::new(view(MapViewConfig::default()), backend());
    let notifications = controller.events();
    let bus = EventBus::new();
    bus.publish(Event::ProjectSelected {
        project_id: "1".to_string(),
    });
    bus.publish(Event::LayerToggled {
        layer_id: POINTS.to_string(),
        checked: true,
    });

    assert_eq!(controller.pump(&bus).await, 2);
    assert_eq!(controller.current_project().as_deref(), Some("1"));

    let received: Vec<Notification> = notifications.try_iter().collect();
    assert!(matches!(received[0], Notification::LayersListed { .. }));
    assert!(matches!(
        received[1],
        Notification::LayerApplied {
            category: LayerCategory::Markers,
            primitive_count: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn test_drawn_shapes_reach_the_bus() {
    let controller = MapController::new(view(MapViewConfig::default()), backend());
    let notifications = controller.events();
    let bus = EventBus::new();

    let handle = controller.with_view(|view| {
        view.canvas_mut().simulate_shape_drawn(
            "Polyline",
            Primitive::Route(geomap_render::primitive::RoutePrimitive {
                waypoints: vec![
                    geomap_core::LatLng::new(0.0, 0.0),
                    geomap_core::LatLng::new(1.0, 1.0),
                ],
            }),
        )
    });
    assert_eq!(controller.forward_canvas_events(&bus), 1);
    controller.pump(&bus).await;

    assert_eq!(
        notifications.try_recv().unwrap(),
        Notification::ShapeCreated {
            shape: "Polyline".to_string(),
            primitive_id: handle.0
        }
    );
}
