//! The map canvas collaborator.
//!
//! The core never assumes a rendering technology. Anything that can place,
//! remove and restyle primitives and move its viewport implements
//! [`MapCanvas`]. [`RecordingCanvas`] keeps everything in memory and is what
//! the headless driver and the tests render into.

use crate::primitive::Primitive;
use crossbeam_channel::{Receiver, Sender, unbounded};
use geomap_core::LatLng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque reference to a primitive placed on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrimitiveHandle(pub u64);

impl fmt::Display for PrimitiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewTransition {
    /// Set the view immediately.
    Jump,
    /// Animated flight to the target.
    Animate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasEvent {
    /// The user finished drawing a shape with the canvas drawing tools.
    ShapeCreated {
        shape: String,
        handle: PrimitiveHandle,
    },
}

pub trait MapCanvas {
    fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveHandle;

    /// Detach a primitive. Returns `false` when it was already detached.
    fn remove_primitive(&mut self, handle: PrimitiveHandle) -> bool;

    fn set_viewport(&mut self, center: LatLng, zoom: f64, transition: ViewTransition);

    /// Halt any in-flight viewport animation.
    fn stop_animation(&mut self);

    fn set_opacity(&mut self, handle: PrimitiveHandle, opacity: f32);

    /// Set the opacity of every rendered element carrying `class_name`.
    fn set_class_opacity(&mut self, class_name: &str, opacity: f32);

    /// Stream of user interaction events.
    fn user_events(&self) -> Receiver<CanvasEvent>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPrimitive {
    pub primitive: Primitive,
    pub opacity: f32,
    pub label_opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRequest {
    pub center: LatLng,
    pub zoom: f64,
    pub transition: ViewTransition,
}

/// In-memory canvas. Animations never complete on their own; they stay
/// in flight until stopped or replaced by a jump.
pub struct RecordingCanvas {
    next_handle: u64,
    placed: BTreeMap<PrimitiveHandle, PlacedPrimitive>,
    class_opacity: HashMap<String, f32>,
    viewport: Option<Viewport>,
    requests: Vec<ViewportRequest>,
    animating: bool,
    stop_count: usize,
    events_tx: Sender<CanvasEvent>,
    events_rx: Receiver<CanvasEvent>,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            next_handle: 1,
            placed: BTreeMap::new(),
            class_opacity: HashMap::new(),
            viewport: None,
            requests: Vec::new(),
            animating: false,
            stop_count: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.placed.len()
    }

    pub fn contains(&self, handle: PrimitiveHandle) -> bool {
        self.placed.contains_key(&handle)
    }

    pub fn get(&self, handle: PrimitiveHandle) -> Option<&PlacedPrimitive> {
        self.placed.get(&handle)
    }

    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveHandle, &PlacedPrimitive)> {
        self.placed.iter().map(|(handle, placed)| (*handle, placed))
    }

    pub fn count_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for placed in self.placed.values() {
            *counts.entry(placed.primitive.kind_label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn opacity(&self, handle: PrimitiveHandle) -> Option<f32> {
        self.placed.get(&handle).map(|p| p.opacity)
    }

    pub fn label_opacity(&self, handle: PrimitiveHandle) -> Option<f32> {
        self.placed.get(&handle).map(|p| p.label_opacity)
    }

    pub fn class_opacity(&self, class_name: &str) -> Option<f32> {
        self.class_opacity.get(class_name).copied()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn viewport_requests(&self) -> &[ViewportRequest] {
        &self.requests
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    /// Place a user-drawn primitive and emit the matching `ShapeCreated`.
    pub fn simulate_shape_drawn(&mut self, shape: &str, primitive: Primitive) -> PrimitiveHandle {
        let handle = self.add_primitive(primitive);
        let _ = self.events_tx.send(CanvasEvent::ShapeCreated {
            shape: shape.to_string(),
            handle,
        });
        handle
    }
}

impl MapCanvas for RecordingCanvas {
    fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next_handle);
        self.next_handle += 1;
        tracing::trace!("canvas: add {} {}", primitive.kind_label(), handle);
        self.placed.insert(
            handle,
            PlacedPrimitive {
                primitive,
                opacity: 1.0,
                label_opacity: 1.0,
            },
        );
        handle
    }

    fn remove_primitive(&mut self, handle: PrimitiveHandle) -> bool {
        tracing::trace!("canvas: remove {}", handle);
        self.placed.remove(&handle).is_some()
    }

    fn set_viewport(&mut self, center: LatLng, zoom: f64, transition: ViewTransition) {
        tracing::trace!("canvas: viewport {} z{} {:?}", center, zoom, transition);
        self.viewport = Some(Viewport { center, zoom });
        self.animating = transition == ViewTransition::Animate;
        self.requests.push(ViewportRequest {
            center,
            zoom,
            transition,
        });
    }

    fn stop_animation(&mut self) {
        self.animating = false;
        self.stop_count += 1;
    }

    fn set_opacity(&mut self, handle: PrimitiveHandle, opacity: f32) {
        if let Some(placed) = self.placed.get_mut(&handle) {
            placed.opacity = opacity;
        }
    }

    fn set_class_opacity(&mut self, class_name: &str, opacity: f32) {
        self.class_opacity.insert(class_name.to_string(), opacity);
        for placed in self.placed.values_mut() {
            let element_hit = placed.primitive.element_classes().contains(&class_name);
            let label_hit = placed.primitive.label_classes().contains(&class_name);
            if element_hit {
                placed.opacity = opacity;
            }
            if label_hit {
                placed.label_opacity = opacity;
            }
        }
    }

    fn user_events(&self) -> Receiver<CanvasEvent> {
        self.events_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{PolylinePrimitive, RoutePrimitive};
    use crate::style::PathStyle;
    use geomap_core::EntityId;

    fn edge(source: &str) -> Primitive {
        Primitive::Polyline(PolylinePrimitive {
            points: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            style: PathStyle::edge(&EntityId::from(source)),
        })
    }

    #[test]
    fn test_remove_reports_already_detached() {
        let mut canvas = RecordingCanvas::new();
        let handle = canvas.add_primitive(edge("a"));
        assert!(canvas.remove_primitive(handle));
        assert!(!canvas.remove_primitive(handle));
        assert_eq!(canvas.primitive_count(), 0);
    }

    #[test]
    fn test_class_opacity_targets_tagged_elements() {
        let mut canvas = RecordingCanvas::new();
        let a = canvas.add_primitive(edge("a"));
        let b = canvas.add_primitive(edge("b"));

        canvas.set_class_opacity("a-event", 0.0);

        assert_eq!(canvas.opacity(a), Some(0.0));
        assert_eq!(canvas.opacity(b), Some(1.0));
        assert_eq!(canvas.class_opacity("a-event"), Some(0.0));
    }

    #[test]
    fn test_animation_state() {
        let mut canvas = RecordingCanvas::new();
        canvas.set_viewport(LatLng::new(1.0, 2.0), 6.0, ViewTransition::Animate);
        assert!(canvas.is_animating());
        canvas.stop_animation();
        assert!(!canvas.is_animating());
        assert_eq!(canvas.stop_count(), 1);
        assert_eq!(canvas.viewport_requests().len(), 1);
    }

    #[test]
    fn test_shape_drawn_event() {
        let mut canvas = RecordingCanvas::new();
        let events = canvas.user_events();
        let handle = canvas.simulate_shape_drawn(
            "Line",
            Primitive::Route(RoutePrimitive {
                waypoints: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0)],
            }),
        );
        assert_eq!(
            events.try_recv().unwrap(),
            CanvasEvent::ShapeCreated {
                shape: "Line".to_string(),
                handle
            }
        );
    }
}
