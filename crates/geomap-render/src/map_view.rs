//! `MapView` composes the registry, the layer groups, the relationship
//! resolver and view fitting around one owned canvas. It is the single
//! instance the application hands around; there is no global lookup.

use crate::RenderError;
use crate::canvas::{CanvasEvent, MapCanvas, PrimitiveHandle, ViewTransition};
use crate::factory::GeoPrimitiveFactory;
use crate::layer_group::{LayerGroupManager, RefreshTicket, ReplaceOutcome};
use crate::registry::{EntityRegistry, ViewEntity};
use crate::relations::RelationshipResolver;
use crate::style::HeatOptions;
use crate::view_fit::{FitStrategy, ViewFitController};
use crate::visibility::{FilterSummary, apply_visible};
use crossbeam_channel::Receiver;
use geomap_core::{
    CircleDescriptor, DescriptorError, EntityDescriptor, EntityId, LatLng, LayerCategory,
    LayerFeature, LineDescriptor, MarkerDescriptor, PointRendering, PolygonDescriptor,
    RouteDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewConfig {
    pub entity_zoom: f64,
    pub layer_zoom: f64,
    pub point_rendering: PointRendering,
    pub sequencing_guard: bool,
    pub heat: HeatOptions,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        let fit = ViewFitController::default();
        Self {
            entity_zoom: fit.entity_zoom,
            layer_zoom: fit.layer_zoom,
            point_rendering: PointRendering::default(),
            sequencing_guard: true,
            heat: HeatOptions::default(),
        }
    }
}

/// Fit strategy for a bulk group once it has been repopulated. Route groups
/// are not fitted.
fn layer_fit_strategy(category: LayerCategory) -> Option<FitStrategy> {
    match category {
        LayerCategory::Polygons => Some(FitStrategy::BoundsCenter),
        LayerCategory::Markers | LayerCategory::Heat | LayerCategory::Clusters => {
            Some(FitStrategy::Mean)
        }
        LayerCategory::Routes => None,
    }
}

pub struct MapView<C: MapCanvas> {
    canvas: C,
    canvas_events: Receiver<CanvasEvent>,
    factory: GeoPrimitiveFactory,
    registry: EntityRegistry,
    groups: LayerGroupManager,
    edges: RelationshipResolver,
    fit: ViewFitController,
    config: MapViewConfig,
}

impl<C: MapCanvas> MapView<C> {
    pub fn new(canvas: C, config: MapViewConfig) -> Self {
        let canvas_events = canvas.user_events();
        Self {
            canvas,
            canvas_events,
            factory: GeoPrimitiveFactory::new(config.point_rendering, config.heat.clone()),
            registry: EntityRegistry::new(),
            groups: LayerGroupManager::new(config.sequencing_guard),
            edges: RelationshipResolver::new(),
            fit: ViewFitController::new(config.entity_zoom, config.layer_zoom),
            config,
        }
    }

    pub fn init_view(&mut self, center: LatLng, zoom: f64) {
        self.canvas.set_viewport(center, zoom, ViewTransition::Jump);
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Add one entity without moving the view.
    pub fn add_entity(&mut self, descriptor: &EntityDescriptor) -> Result<&ViewEntity, RenderError> {
        self.registry.add(&mut self.canvas, &self.factory, descriptor)
    }

    fn add_batch(&mut self, descriptors: Vec<EntityDescriptor>) -> Result<Vec<LatLng>, RenderError> {
        self.registry
            .add_batch(&mut self.canvas, &self.factory, &descriptors)?;
        Ok(descriptors
            .iter()
            .flat_map(|d| d.points().iter().copied())
            .collect())
    }

    /// Place a batch of markers, then recenter once on their mean position.
    pub fn add_markers(&mut self, markers: &[MarkerDescriptor]) -> Result<usize, RenderError> {
        let points = self.add_batch(markers.iter().cloned().map(Into::into).collect())?;
        self.fit
            .fit_entities(&mut self.canvas, &points, FitStrategy::Mean);
        Ok(markers.len())
    }

    pub fn add_circles(&mut self, circles: &[CircleDescriptor]) -> Result<usize, RenderError> {
        self.add_batch(circles.iter().cloned().map(Into::into).collect())?;
        Ok(circles.len())
    }

    /// Place a batch of polygons, then recenter once on their combined
    /// bounding box.
    pub fn add_polygons(&mut self, polygons: &[PolygonDescriptor]) -> Result<usize, RenderError> {
        let points = self.add_batch(polygons.iter().cloned().map(Into::into).collect())?;
        self.fit
            .fit_entities(&mut self.canvas, &points, FitStrategy::BoundsCenter);
        Ok(polygons.len())
    }

    pub fn add_routes(&mut self, routes: &[RouteDescriptor]) -> Result<usize, RenderError> {
        self.add_batch(routes.iter().cloned().map(Into::into).collect())?;
        Ok(routes.len())
    }

    /// Geometry change, modelled as remove-then-recreate.
    pub fn update_entity(&mut self, descriptor: &EntityDescriptor) -> Result<&ViewEntity, RenderError> {
        self.registry
            .replace(&mut self.canvas, &self.factory, descriptor)
    }

    pub fn remove_entity(&mut self, id: &EntityId) -> Result<(), RenderError> {
        self.registry.remove(&mut self.canvas, id)
    }

    pub fn has_entity(&self, id: &EntityId) -> bool {
        self.registry.has(id)
    }

    pub fn data_exists(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn filter_entities(&mut self, visible_ids: &HashSet<EntityId>) -> FilterSummary {
        apply_visible(&mut self.registry, &mut self.canvas, visible_ids)
    }

    /// Center on an arbitrary set of coordinates at the entity zoom.
    pub fn fit_to(&mut self, points: &[LatLng], strategy: FitStrategy) -> Option<LatLng> {
        self.fit.fit_entities(&mut self.canvas, points, strategy)
    }

    // ========================================================================
    // Edges
    // ========================================================================

    pub fn add_lines(&mut self, lines: &[LineDescriptor]) -> usize {
        self.edges
            .draw_edges(&self.registry, &mut self.canvas, &self.factory, lines)
    }

    pub fn update_line(&mut self, line: &LineDescriptor) -> Option<PrimitiveHandle> {
        self.edges
            .update_edge(&self.registry, &mut self.canvas, &self.factory, line)
    }

    // ========================================================================
    // Layer groups
    // ========================================================================

    pub fn begin_refresh(&mut self, category: LayerCategory) -> RefreshTicket {
        self.groups.begin_refresh(category)
    }

    /// Repopulate the ticket's group from fetched features and fit the view
    /// to it once. A stale ticket changes nothing.
    pub fn apply_layer(&mut self, ticket: RefreshTicket, features: &[LayerFeature]) -> ReplaceOutcome {
        let primitives = self.factory.features(ticket.category, features);
        let outcome = self
            .groups
            .replace_with_ticket(&mut self.canvas, ticket, primitives);
        if outcome.is_applied() {
            self.fit_group(ticket.category);
        }
        outcome
    }

    /// Untracked replace. Supersedes any refresh in flight for the group.
    pub fn replace_layer(&mut self, category: LayerCategory, features: &[LayerFeature]) -> usize {
        let primitives = self.factory.features(category, features);
        let placed = self.groups.replace(&mut self.canvas, category, primitives);
        self.fit_group(category);
        placed
    }

    fn fit_group(&mut self, category: LayerCategory) {
        if let Some(strategy) = layer_fit_strategy(category) {
            self.fit
                .fit_layer(&mut self.canvas, self.groups.points(category), strategy);
        }
    }

    pub fn clear_layer(&mut self, category: LayerCategory) -> usize {
        self.groups.clear(&mut self.canvas, category)
    }

    /// Replace the active route with one through `waypoints`.
    pub fn set_routing(&mut self, waypoints: &[LatLng]) -> Result<usize, RenderError> {
        validate_waypoints(waypoints).map_err(|source| RenderError::InvalidDescriptor {
            id: EntityId::from("routing"),
            source,
        })?;
        let route = self.factory.route(waypoints);
        Ok(self
            .groups
            .replace(&mut self.canvas, LayerCategory::Routes, vec![route]))
    }

    pub fn clear_routing(&mut self) -> usize {
        self.groups.clear(&mut self.canvas, LayerCategory::Routes)
    }

    // ========================================================================
    // Canvas events and lifecycle
    // ========================================================================

    /// Shapes the user finished drawing since the last call.
    pub fn drain_canvas_events(&self) -> Vec<CanvasEvent> {
        self.canvas_events.try_iter().collect()
    }

    /// Detach every entity and edge and halt any view animation. Layer
    /// groups are left alone.
    pub fn clear(&mut self) -> usize {
        let edges = self.edges.clear(&mut self.canvas);
        let entities = self.registry.clear_all(&mut self.canvas);
        tracing::info!("Cleared {} entities and {} edges", entities, edges);
        entities + edges
    }

    /// `clear` plus every layer group.
    pub fn reset(&mut self) -> usize {
        let removed = self.clear() + self.groups.clear_all(&mut self.canvas);
        self.canvas.stop_animation();
        removed
    }

    pub fn teardown(mut self) -> C {
        self.reset();
        self.canvas
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn groups(&self) -> &LayerGroupManager {
        &self.groups
    }

    pub fn edges(&self) -> &RelationshipResolver {
        &self.edges
    }

    pub fn factory(&self) -> &GeoPrimitiveFactory {
        &self.factory
    }

    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }
}

fn validate_waypoints(waypoints: &[LatLng]) -> Result<(), DescriptorError> {
    if waypoints.len() < 2 {
        return Err(DescriptorError::TooFewVertices {
            kind: "Route",
            required: 2,
            found: waypoints.len(),
        });
    }
    waypoints.iter().try_for_each(LatLng::validate)
}
