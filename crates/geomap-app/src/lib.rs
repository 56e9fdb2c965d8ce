mod error;

pub use error::ControllerError;

use crossbeam_channel::{Receiver, Sender, unbounded};
use geomap_core::{LayerCategory, LayerInfo, ProjectInfo};
use geomap_events::{Event, EventBus, Notification, new_correlation_id};
use geomap_project::InitialScene;
use geomap_render::{CanvasEvent, MapCanvas, MapView, ReplaceOutcome};
use geomap_source::DataSource;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// What a layer toggle ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied { category: LayerCategory, placed: usize },
    Cleared { category: LayerCategory, removed: usize },
    /// The fetch resolved after its group was cleared or refreshed again.
    Stale { category: LayerCategory, sequence: u64 },
    /// The layer's data kind has no group to draw into.
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub markers: usize,
    pub circles: usize,
    pub polygons: usize,
    pub routes: usize,
    pub lines: usize,
}

struct ControllerState<C: MapCanvas> {
    view: MapView<C>,
    project_id: Option<String>,
    layers: HashMap<String, LayerInfo>,
    checked: BTreeSet<String>,
}

/// Headless orchestrator between the control surface, the data backend and
/// one `MapView`.
///
/// The state lock is never held across a fetch, so other toggles can run
/// while a request is pending.
pub struct MapController<C: MapCanvas, S: DataSource> {
    state: Arc<Mutex<ControllerState<C>>>,
    source: Arc<S>,
    events_tx: Sender<Notification>,
    events_rx: Receiver<Notification>,
}

impl<C: MapCanvas, S: DataSource> Clone for MapController<C, S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            source: Arc::clone(&self.source),
            events_tx: self.events_tx.clone(),
            events_rx: self.events_rx.clone(),
        }
    }
}

impl<C: MapCanvas, S: DataSource> MapController<C, S> {
    pub fn new(view: MapView<C>, source: S) -> Self {
        Self::with_shared_source(view, Arc::new(source))
    }

    pub fn with_shared_source(view: MapView<C>, source: Arc<S>) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                view,
                project_id: None,
                layers: HashMap::new(),
                checked: BTreeSet::new(),
            })),
            source,
            events_tx,
            events_rx,
        }
    }

    /// Outbound notifications, in the order they were produced.
    pub fn events(&self) -> Receiver<Notification> {
        self.events_rx.clone()
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events_tx.send(notification);
    }

    /// Run `f` against the view while holding the state lock.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut MapView<C>) -> R) -> R {
        f(&mut self.state.lock().view)
    }

    pub fn current_project(&self) -> Option<String> {
        self.state.lock().project_id.clone()
    }

    pub fn checked_layers(&self) -> Vec<String> {
        self.state.lock().checked.iter().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Projects and layers
    // ------------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<ProjectInfo>, ControllerError> {
        match self.source.list_projects().await {
            Ok(projects) => {
                tracing::info!("Fetched {} projects", projects.len());
                Ok(projects)
            }
            Err(err) => {
                tracing::error!("Failed to fetch projects: {}", err);
                self.notify(Notification::ProjectFetchFailed {
                    project_id: None,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Fetch the project's layer catalogue and make it current. Groups drawn
    /// for the previous project are left as they are.
    pub async fn select_project(&self, project_id: &str) -> Result<Vec<LayerInfo>, ControllerError> {
        tracing::info!("Selected project: {}", project_id);
        let layers = match self.source.list_layers(project_id).await {
            Ok(layers) => layers,
            Err(err) => {
                tracing::error!("Failed to fetch layers for project {}: {}", project_id, err);
                self.notify(Notification::ProjectFetchFailed {
                    project_id: Some(project_id.to_string()),
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };

        {
            let mut s = self.state.lock();
            s.project_id = Some(project_id.to_string());
            s.layers = layers
                .iter()
                .map(|layer| (layer.id.clone(), layer.clone()))
                .collect();
        }

        self.notify(Notification::LayersListed {
            project_id: project_id.to_string(),
            layers: layers.clone(),
        });
        Ok(layers)
    }

    /// Off clears the layer's group. On issues a refresh ticket, fetches
    /// fresh data and replaces the group with it; nothing is cached between
    /// toggles.
    pub async fn toggle_layer(
        &self,
        layer_id: &str,
        checked: bool,
    ) -> Result<ToggleOutcome, ControllerError> {
        let (category, ticket) = {
            let mut s = self.state.lock();
            if s.project_id.is_none() {
                return Err(ControllerError::NoProjectSelected);
            }
            let layer = s
                .layers
                .get(layer_id)
                .ok_or_else(|| ControllerError::UnknownLayer(layer_id.to_string()))?;
            let rendering = s.view.factory().point_rendering();
            let Some(category) = LayerCategory::for_layer(layer.data_kind, rendering) else {
                tracing::warn!(
                    "Layer {} has unsupported data kind {:?}, ignoring toggle",
                    layer_id,
                    layer.data_kind
                );
                return Ok(ToggleOutcome::Ignored);
            };

            if !checked {
                s.checked.remove(layer_id);
                let removed = s.view.clear_layer(category);
                drop(s);
                self.notify(Notification::LayerCleared {
                    layer_id: layer_id.to_string(),
                    category,
                });
                return Ok(ToggleOutcome::Cleared { category, removed });
            }

            s.checked.insert(layer_id.to_string());
            (category, s.view.begin_refresh(category))
        };

        let correlation_id = new_correlation_id();
        tracing::debug!(
            "Fetching layer {} into {} (ticket #{}, {})",
            layer_id,
            category,
            ticket.sequence,
            correlation_id
        );

        let features = match self.source.fetch_layer_data(layer_id).await {
            Ok(features) => features,
            Err(err) => {
                tracing::error!("Failed to fetch layer {}: {}", layer_id, err);
                self.notify(Notification::LayerFetchFailed {
                    layer_id: layer_id.to_string(),
                    reason: err.to_string(),
                    correlation_id,
                });
                return Err(err.into());
            }
        };

        let outcome = self.state.lock().view.apply_layer(ticket, &features);
        match outcome {
            ReplaceOutcome::Applied { placed, .. } => {
                self.notify(Notification::LayerApplied {
                    layer_id: layer_id.to_string(),
                    category,
                    primitive_count: placed,
                    correlation_id,
                });
                Ok(ToggleOutcome::Applied { category, placed })
            }
            ReplaceOutcome::Stale { sequence, .. } => {
                self.notify(Notification::StaleResponseDiscarded {
                    layer_id: layer_id.to_string(),
                    category,
                    sequence,
                    correlation_id,
                });
                Ok(ToggleOutcome::Stale { category, sequence })
            }
        }
    }

    // ------------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------------

    /// Errors are logged and reported as notifications; the affected group
    /// keeps whatever it showed before.
    pub async fn handle_event(&self, event: &Event) {
        match event {
            Event::ProjectSelected { project_id } => {
                if let Err(err) = self.select_project(project_id).await {
                    tracing::warn!("Project selection failed: {}", err);
                }
            }
            Event::LayerToggled { layer_id, checked } => {
                if let Err(err) = self.toggle_layer(layer_id, *checked).await {
                    tracing::warn!("Layer toggle failed: {}", err);
                }
            }
            Event::ShapeCreated {
                shape,
                primitive_id,
            } => {
                tracing::info!("Shape created: {} (#{})", shape, primitive_id);
                self.notify(Notification::ShapeCreated {
                    shape: shape.clone(),
                    primitive_id: *primitive_id,
                });
            }
        }
    }

    /// Handle every pending bus event, one at a time, in publish order.
    pub async fn pump(&self, bus: &EventBus) -> usize {
        let events = bus.drain();
        for event in &events {
            self.handle_event(event).await;
        }
        events.len()
    }

    /// Publish shapes drawn on the canvas onto the bus.
    pub fn forward_canvas_events(&self, bus: &EventBus) -> usize {
        let events = self.state.lock().view.drain_canvas_events();
        let count = events.len();
        for event in events {
            match event {
                CanvasEvent::ShapeCreated { shape, handle } => bus.publish(Event::ShapeCreated {
                    shape,
                    primitive_id: handle.0,
                }),
            }
        }
        count
    }

    // ------------------------------------------------------------------------
    // Scene and lifecycle
    // ------------------------------------------------------------------------

    /// Draw a configured scene: entity batches first, then the lines between
    /// them.
    pub fn load_scene(&self, scene: &InitialScene) -> Result<SceneSummary, ControllerError> {
        let mut s = self.state.lock();
        let view = &mut s.view;
        let summary = SceneSummary {
            markers: view.add_markers(&scene.markers)?,
            circles: view.add_circles(&scene.circles)?,
            polygons: view.add_polygons(&scene.polygons)?,
            routes: view.add_routes(&scene.routes)?,
            lines: view.add_lines(&scene.lines),
        };
        tracing::info!("Loaded scene: {:?}", summary);
        Ok(summary)
    }

    /// Detach everything from the canvas and forget the selected project.
    pub fn teardown(&self) -> usize {
        let removed = {
            let mut s = self.state.lock();
            s.project_id = None;
            s.layers.clear();
            s.checked.clear();
            s.view.reset()
        };
        let message = format!("Map torn down ({} primitives detached)", removed);
        tracing::info!("{}", message);
        self.notify(Notification::StatusUpdate { message });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomap_core::{DataKind, GeoFeature, Geometry, LatLng, MarkerDescriptor};
    use geomap_render::{MapViewConfig, RecordingCanvas};
    use geomap_source::MemoryDataSource;

    fn controller() -> MapController<RecordingCanvas, MemoryDataSource> {
        let source = MemoryDataSource::new()
            .with_project(
                ProjectInfo {
                    id: "1".to_string(),
                    name: "City".to_string(),
                },
                vec![
                    LayerInfo {
                        id: "10".to_string(),
                        name: "Lamps".to_string(),
                        data_kind: DataKind::Point,
                    },
                    LayerInfo {
                        id: "11".to_string(),
                        name: "Raster".to_string(),
                        data_kind: DataKind::Unsupported,
                    },
                ],
            )
            .with_layer_data(
                "10",
                vec![GeoFeature {
                    properties: None,
                    geometry: Some(Geometry::Point {
                        coordinates: vec![20.0, 10.0],
                    }),
                }],
            );
        MapController::new(
            MapView::new(RecordingCanvas::new(), MapViewConfig::default()),
            source,
        )
    }

    #[tokio::test]
    async fn test_toggle_requires_project() {
        let controller = controller();
        let err = controller.toggle_layer("10", true).await.unwrap_err();
        assert!(matches!(err, ControllerError::NoProjectSelected));
    }

    #[tokio::test]
    async fn test_unsupported_layer_is_ignored() {
        let controller = controller();
        controller.select_project("1").await.unwrap();
        assert_eq!(
            controller.toggle_layer("11", true).await.unwrap(),
            ToggleOutcome::Ignored
        );
        assert!(matches!(
            controller.toggle_layer("99", true).await.unwrap_err(),
            ControllerError::UnknownLayer(_)
        ));
        assert!(controller.source().fetch_log().is_empty());
    }

    #[test]
    fn test_scene_then_teardown() {
        let controller = controller();
        let scene = InitialScene {
            markers: vec![MarkerDescriptor {
                id: "depot".into(),
                name: "Depot".to_string(),
                coordinates: LatLng::new(1.0, 1.0),
                icon: None,
                draggable: false,
                popup: None,
            }],
            ..InitialScene::default()
        };
        let summary = controller.load_scene(&scene).unwrap();
        assert_eq!(summary.markers, 1);
        assert!(controller.with_view(|view| view.data_exists()));

        assert!(controller.load_scene(&scene).is_err());

        let notifications = controller.events();
        assert_eq!(controller.teardown(), 1);
        assert!(!controller.with_view(|view| view.data_exists()));
        assert_eq!(controller.with_view(|view| view.canvas().primitive_count()), 0);
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::StatusUpdate {
                message: "Map torn down (1 primitives detached)".to_string()
            }
        );
    }
}
